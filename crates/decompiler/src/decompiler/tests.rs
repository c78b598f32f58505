use crate::{
  disassembler::Opcode,
  script::{DataType, Script, Symbol, SymbolData},
  syntax::{AccessExpr, AssignOp, Code, Conditional, Decl, Expression}
};

use super::*;

struct Asm {
  code: Vec<u8>
}

impl Asm {
  fn new() -> Self {
    Self { code: Vec::new() }
  }

  fn op(mut self, op: Opcode) -> Self {
    self.code.push(op as u8);
    self
  }

  fn with(mut self, op: Opcode, data: i32) -> Self {
    self.code.push(op as u8);
    self.code.extend_from_slice(&data.to_le_bytes());
    self
  }

  fn finish(self) -> Vec<u8> {
    self.code
  }
}

fn function(index: usize, name: &str, address: u32, parameters: u32) -> Symbol {
  let mut sym = Symbol::new(index, name, DataType::Function);
  sym.flags.constant = true;
  sym.address = address;
  sym.size = parameters;
  sym
}

fn variable(index: usize, name: &str, ty: DataType) -> Symbol {
  Symbol::new(index, name, ty)
}

fn access(target: usize) -> AccessExpr {
  AccessExpr {
    target,
    index: None,
    scope: None
  }
}

#[test]
fn recovers_if_else_from_branches() {
  let code = Asm::new()
    .with(Opcode::PushInt, 1) // 0
    .with(Opcode::JumpIfZero, 26) // 5
    .with(Opcode::PushInt, 5) // 10
    .with(Opcode::PushVar, 1) // 15
    .op(Opcode::Assign) // 20
    .with(Opcode::Jump, 37) // 21
    .with(Opcode::PushInt, 7) // 26
    .with(Opcode::PushVar, 1) // 31
    .op(Opcode::Assign) // 36
    .op(Opcode::Return) // 37
    .finish();
  let script = Script::new(
    vec![
      function(0, "TEST", 0, 0),
      variable(1, "X", DataType::Int),
    ],
    code
  );

  let mut decompiler = Decompiler::new(&script).unwrap();
  let body = decompiler.decompile(0).unwrap().unwrap();

  assert_eq!(body.code.len(), 1);
  let Code::If(stmt) = &body.code[0] else {
    panic!("expected an if statement, got {:?}", body.code[0]);
  };
  assert_eq!(stmt.condition, Expression::Int(1));
  assert_eq!(
    stmt.body.code,
    vec![Code::Assign {
      target: access(1),
      op:     AssignOp::Assign,
      value:  Expression::Int(5)
    }]
  );
  match stmt.next.as_deref() {
    Some(Conditional::Else(alt)) => {
      assert_eq!(
        alt.code,
        vec![Code::Assign {
          target: access(1),
          op:     AssignOp::Assign,
          value:  Expression::Int(7)
        }]
      );
    }
    other => panic!("expected an else branch, got {other:?}")
  }
}

#[test]
fn collapses_else_if_chains() {
  let code = Asm::new()
    .with(Opcode::PushInt, 1) // 0
    .with(Opcode::JumpIfZero, 26) // 5
    .with(Opcode::PushInt, 5) // 10
    .with(Opcode::PushVar, 2) // 15
    .op(Opcode::Assign) // 20
    .with(Opcode::Jump, 47) // 21
    .with(Opcode::PushInt, 2) // 26
    .with(Opcode::JumpIfZero, 47) // 31
    .with(Opcode::PushInt, 7) // 36
    .with(Opcode::PushVar, 2) // 41
    .op(Opcode::Assign) // 46
    .op(Opcode::Return) // 47
    .finish();
  let script = Script::new(
    vec![
      function(0, "TEST", 0, 0),
      variable(1, "Y", DataType::Int),
      variable(2, "X", DataType::Int),
    ],
    code
  );

  let mut decompiler = Decompiler::new(&script).unwrap();
  let body = decompiler.decompile(0).unwrap().unwrap();
  let Code::If(stmt) = &body.code[0] else {
    panic!("expected an if statement");
  };
  match stmt.next.as_deref() {
    Some(Conditional::ElseIf(inner)) => {
      assert_eq!(inner.condition, Expression::Int(2));
      assert!(inner.next.is_none());
    }
    other => panic!("expected an else-if, got {other:?}")
  }

  // With the collapse disabled the raw shape survives.
  let mut decompiler = Decompiler::new(&script).unwrap();
  decompiler.set_options(DecompilerOptions {
    generate_else_if: false,
    ..Default::default()
  });
  let body = decompiler.decompile(0).unwrap().unwrap();
  let Code::If(stmt) = &body.code[0] else {
    panic!("expected an if statement");
  };
  match stmt.next.as_deref() {
    Some(Conditional::Else(alt)) => {
      assert!(matches!(alt.code.as_slice(), [Code::If(_)]));
    }
    other => panic!("expected a plain else, got {other:?}")
  }
}

#[test]
fn nested_early_returns_stay_explicit() {
  let code = Asm::new()
    .with(Opcode::PushInt, 1) // 0
    .with(Opcode::JumpIfZero, 11) // 5
    .op(Opcode::Return) // 10
    .with(Opcode::PushInt, 7) // 11
    .with(Opcode::PushVar, 1) // 16
    .op(Opcode::Assign) // 21
    .op(Opcode::Return) // 22
    .finish();
  let script = Script::new(
    vec![
      function(0, "TEST", 0, 0),
      variable(1, "X", DataType::Int),
    ],
    code
  );

  let mut decompiler = Decompiler::new(&script).unwrap();
  let body = decompiler.decompile(0).unwrap().unwrap();

  // The branch return renders; the trailing epilogue return does not.
  assert_eq!(body.code.len(), 2);
  match &body.code[0] {
    Code::If(stmt) => {
      assert_eq!(stmt.body.code, vec![Code::Return(None)]);
      assert!(stmt.next.is_none());
    }
    other => panic!("expected an if statement, got {other:?}")
  }
  assert_eq!(
    body.code[1],
    Code::Assign {
      target: access(1),
      op:     AssignOp::Assign,
      value:  Expression::Int(7)
    }
  );
}

#[test]
fn external_calls_require_the_external_flag() {
  let code = Asm::new()
    .with(Opcode::PushInt, 42)
    .with(Opcode::CallExternal, 1)
    .op(Opcode::Return)
    .finish();
  let symbols = |external: bool| {
    let mut print = function(1, "PRINT", 0, 1);
    print.flags.external = external;
    vec![
      function(0, "MAIN", 0, 0),
      print,
      variable(2, "PRINT.S", DataType::Int),
    ]
  };

  let script = Script::new(symbols(true), code.clone());
  let mut decompiler = Decompiler::new(&script).unwrap();
  let body = decompiler.decompile(0).unwrap().unwrap();
  match &body.code[0] {
    Code::Expression(Expression::Call(call)) => {
      assert_eq!(call.target, 1);
      assert_eq!(call.args, vec![Expression::Int(42)]);
    }
    other => panic!("expected a call statement, got {other:?}")
  }

  // A BE to a function the table does not mark external is rejected.
  let script = Script::new(symbols(false), code);
  let mut decompiler = Decompiler::new(&script).unwrap();
  assert!(matches!(
    decompiler.decompile(0),
    Err(DecompileError::InvalidCallTarget { index: 1 })
  ));
}

#[test]
fn plain_stores_keep_their_integer_literals() {
  let bits = std::f32::consts::PI.to_bits() as i32;
  let code = Asm::new()
    .with(Opcode::PushInt, bits)
    .with(Opcode::PushVar, 1)
    .op(Opcode::Assign)
    .op(Opcode::Return)
    .finish();
  let script = Script::new(
    vec![
      function(0, "TEST", 0, 0),
      variable(1, "F", DataType::Float),
    ],
    code
  );

  let mut decompiler = Decompiler::new(&script).unwrap();
  let body = decompiler.decompile(0).unwrap().unwrap();

  // Only MOVF carries float semantics; a plain store into a float slot
  // keeps the raw word.
  assert_eq!(
    body.code,
    vec![Code::Assign {
      target: access(1),
      op:     AssignOp::Assign,
      value:  Expression::Int(bits)
    }]
  );
}

#[test]
fn reinterprets_float_assignments() {
  let bits = std::f32::consts::PI.to_bits() as i32;
  let code = Asm::new()
    .with(Opcode::PushInt, bits)
    .with(Opcode::PushVar, 1)
    .op(Opcode::AssignFloat)
    .op(Opcode::Return)
    .finish();
  let script = Script::new(
    vec![
      function(0, "TEST", 0, 0),
      variable(1, "F", DataType::Float),
    ],
    code
  );

  let mut decompiler = Decompiler::new(&script).unwrap();
  let body = decompiler.decompile(0).unwrap().unwrap();

  assert_eq!(
    body.code,
    vec![Code::Assign {
      target: access(1),
      op:     AssignOp::Assign,
      value:  Expression::Float(std::f32::consts::PI)
    }]
  );
}

#[test]
fn coerces_float_arguments_by_parameter_type() {
  let bits = 2.5f32.to_bits() as i32;
  let code = Asm::new()
    .with(Opcode::PushInt, bits)
    .with(Opcode::Call, 100)
    .op(Opcode::Return)
    .finish();
  let script = Script::new(
    vec![
      function(0, "MAIN", 0, 0),
      function(1, "SET_SPEED", 100, 1),
      variable(2, "SET_SPEED.S", DataType::Float),
    ],
    code
  );

  let mut decompiler = Decompiler::new(&script).unwrap();
  let body = decompiler.decompile(0).unwrap().unwrap();

  match &body.code[0] {
    Code::Expression(Expression::Call(call)) => {
      assert_eq!(call.target, 1);
      assert_eq!(call.args, vec![Expression::Float(2.5)]);
    }
    other => panic!("expected a call statement, got {other:?}")
  }
}

#[test]
fn skips_parameter_binding_stores() {
  let code = Asm::new()
    .with(Opcode::PushVar, 1) // binds the parameter
    .op(Opcode::Assign)
    .with(Opcode::PushInt, 1)
    .with(Opcode::PushVar, 2)
    .op(Opcode::Assign)
    .op(Opcode::Return)
    .finish();
  let script = Script::new(
    vec![
      function(0, "FOO", 0, 1),
      variable(1, "FOO.A", DataType::Int),
      variable(2, "X", DataType::Int),
    ],
    code
  );

  let mut decompiler = Decompiler::new(&script).unwrap();
  let body = decompiler.decompile(0).unwrap().unwrap();

  assert_eq!(
    body.code,
    vec![Code::Assign {
      target: access(2),
      op:     AssignOp::Assign,
      value:  Expression::Int(1)
    }]
  );

  // The dotted parameter is owned by its function, not the file scope.
  assert!(!decompiler.declarations().is_top_level(1));
  assert!(decompiler.declarations().is_top_level(2));
}

#[test]
fn inlines_generated_literal_slots() {
  let mut pool = variable(2, "\u{ff}10000", DataType::String);
  pool.flags.constant = true;
  pool.flags.generated = true;
  pool.data = SymbolData::Strings(vec!["HELLO".to_owned()]);

  let code = Asm::new()
    .with(Opcode::PushVar, 2)
    .with(Opcode::PushVar, 1)
    .op(Opcode::AssignString)
    .op(Opcode::Return)
    .finish();
  let script = Script::new(
    vec![
      function(0, "FOO", 0, 0),
      variable(1, "GREETING", DataType::String),
      pool,
    ],
    code
  );

  let mut decompiler = Decompiler::new(&script).unwrap();
  let body = decompiler.decompile(0).unwrap().unwrap();
  assert_eq!(
    body.code,
    vec![Code::Assign {
      target: access(1),
      op:     AssignOp::Assign,
      value:  Expression::String("HELLO".to_owned())
    }]
  );

  decompiler.set_options(DecompilerOptions {
    generate_string_literals: false,
    ..Default::default()
  });
  let body = decompiler.decompile(0).unwrap().unwrap();
  assert_eq!(
    body.code,
    vec![Code::Assign {
      target: access(1),
      op:     AssignOp::Assign,
      value:  Expression::Access(access(2))
    }]
  );
}

#[test]
fn resolves_instance_references_above_threshold() {
  let mut npc = Symbol::new(3, "MY_NPC", DataType::Instance);
  npc.flags.constant = true;

  let code = Asm::new()
    .with(Opcode::PushInt, 3)
    .with(Opcode::Call, 100)
    .op(Opcode::Return)
    .finish();
  let script = Script::new(
    vec![
      function(0, "MAIN", 0, 0),
      function(1, "CALLEE", 100, 1),
      variable(2, "CALLEE.SLF", DataType::Instance),
      npc,
    ],
    code
  );

  // Below the default threshold the argument stays numeric.
  let mut decompiler = Decompiler::new(&script).unwrap();
  let body = decompiler.decompile(0).unwrap().unwrap();
  match &body.code[0] {
    Code::Expression(Expression::Call(call)) => {
      assert_eq!(call.args, vec![Expression::Int(3)]);
    }
    other => panic!("expected a call statement, got {other:?}")
  }

  decompiler.set_options(DecompilerOptions {
    instance_reference_threshold: 2,
    ..Default::default()
  });
  let body = decompiler.decompile(0).unwrap().unwrap();
  match &body.code[0] {
    Code::Expression(Expression::Call(call)) => {
      assert_eq!(call.args, vec![Expression::Access(access(3))]);
    }
    other => panic!("expected a call statement, got {other:?}")
  }
}

#[test]
fn resolves_function_references_bound_to_func_slots() {
  let code = Asm::new()
    .with(Opcode::PushInt, 3)
    .with(Opcode::Call, 100)
    .op(Opcode::Return)
    .finish();
  let script = Script::new(
    vec![
      function(0, "MAIN", 0, 0),
      function(1, "REGISTER", 100, 1),
      variable(2, "REGISTER.CB", DataType::Function),
      function(3, "HANDLER", 200, 0),
    ],
    code
  );

  let mut decompiler = Decompiler::new(&script).unwrap();
  let body = decompiler.decompile(0).unwrap().unwrap();

  match &body.code[0] {
    Code::Expression(Expression::Call(call)) => {
      assert_eq!(call.args, vec![Expression::FunctionRef(3)]);
    }
    other => panic!("expected a call statement, got {other:?}")
  }
}

#[test]
fn qualifies_member_access_with_active_instance() {
  let mut member = variable(1, "C_NPC.ATTR", DataType::Int);
  member.flags.member = true;
  let mut instance = Symbol::new(2, "SELF", DataType::Instance);
  instance.flags.constant = true;
  instance.parent = Some(0);

  let code = Asm::new()
    .with(Opcode::SetInstance, 2)
    .with(Opcode::PushInt, 5)
    .with(Opcode::PushVar, 1)
    .op(Opcode::Assign)
    .op(Opcode::Return)
    .finish();
  let script = Script::new(
    vec![
      Symbol::new(0, "C_NPC", DataType::Class),
      member,
      instance,
      function(3, "MAIN", 0, 0),
    ],
    code
  );

  let mut decompiler = Decompiler::new(&script).unwrap();
  let body = decompiler.decompile(3).unwrap().unwrap();

  assert_eq!(
    body.code,
    vec![Code::Assign {
      target: AccessExpr {
        target: 1,
        index:  None,
        scope:  Some(2)
      },
      op:     AssignOp::Assign,
      value:  Expression::Int(5)
    }]
  );
}

#[test]
fn rebuilding_after_an_options_reset_is_stable() {
  let code = Asm::new()
    .with(Opcode::PushInt, 1)
    .with(Opcode::JumpIfZero, 26)
    .with(Opcode::PushInt, 5)
    .with(Opcode::PushVar, 1)
    .op(Opcode::Assign)
    .with(Opcode::Jump, 37)
    .with(Opcode::PushInt, 7)
    .with(Opcode::PushVar, 1)
    .op(Opcode::Assign)
    .op(Opcode::Return)
    .finish();
  let script = Script::new(
    vec![
      function(0, "TEST", 0, 0),
      variable(1, "X", DataType::Int),
    ],
    code
  );

  let mut decompiler = Decompiler::new(&script).unwrap();
  let first = decompiler.decompile(0).unwrap().unwrap().clone();

  decompiler.set_options(DecompilerOptions::default());
  let second = decompiler.decompile(0).unwrap().unwrap();

  assert_eq!(&first, second);
}

#[test]
fn export_skips_failing_declarations() {
  let code = Asm::new()
    .op(Opcode::Return) // GOOD at 0
    .with(Opcode::Call, 9999) // BAD at 1
    .op(Opcode::Return)
    .finish();
  let script = Script::new(
    vec![function(0, "GOOD", 0, 0), function(1, "BAD", 1, 0)],
    code
  );

  let mut decompiler = Decompiler::new(&script).unwrap();
  let result = decompiler.export();

  assert_eq!(result.failures.len(), 1);
  assert_eq!(result.failures[0].symbol, 1);
  assert_eq!(result.failures[0].name, "BAD");
  assert!(matches!(
    result.failures[0].error,
    DecompileError::UnresolvedCallTarget { target: 9999 }
  ));

  let file = result.files.get(&0).expect("file 0 should be emitted");
  assert!(file.contains("func void GOOD()"));
  assert!(!file.contains("BAD"));
}

#[test]
fn scope_members_follow_dotted_prefixes() {
  let mut attr = variable(1, "C_NPC.ATTR", DataType::Int);
  attr.flags.member = true;
  let mut flags = variable(2, "C_NPC.FLAGS", DataType::Int);
  flags.flags.member = true;

  let script = Script::new(
    vec![
      Symbol::new(0, "C_NPC", DataType::Class),
      attr,
      flags,
      function(3, "FOO", 0, 1),
      variable(4, "FOO.A", DataType::Int),
      variable(5, "FOO.TMP", DataType::Int),
      variable(6, "X", DataType::Int),
    ],
    vec![Opcode::Return as u8]
  );

  let decompiler = Decompiler::new(&script).unwrap();
  match decompiler.declarations().get(0) {
    Some(Decl::Class(class)) => assert_eq!(class.members, vec![1, 2]),
    other => panic!("expected a class declaration, got {other:?}")
  }
  match decompiler.declarations().get(3) {
    Some(Decl::Function(func)) => {
      assert_eq!(func.parameters, vec![4]);
      assert_eq!(func.locals, vec![5]);
    }
    other => panic!("expected a function declaration, got {other:?}")
  }
}

#[test]
fn repeated_lookups_resolve_to_the_same_declaration() {
  let script = Script::new(vec![function(0, "FOO", 0, 0)], vec![Opcode::Return as u8]);
  let mut decompiler = Decompiler::new(&script).unwrap();

  let first = decompiler.decl_for(0).unwrap() as *const Decl;
  let second = decompiler.decl_for(0).unwrap() as *const Decl;
  assert!(std::ptr::eq(first, second));
}

#[test]
fn symbol_info_lists_metadata() {
  let script = Script::new(vec![function(0, "GOOD", 0, 0)], vec![60]);
  let decompiler = Decompiler::new(&script).unwrap();
  let info = decompiler.symbol_info(0).unwrap();

  assert!(info.contains("Name: GOOD"));
  assert!(info.contains("Index: 0"));
  assert!(info.contains(" Const: true"));
  assert!(info.contains("Parent Index: -1"));
  assert!(decompiler.symbol_info(99).is_none());
}
