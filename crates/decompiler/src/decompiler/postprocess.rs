use crate::{
  script::DataType,
  syntax::{
    AccessExpr, Block, BuiltinType, Code, Conditional, Decl, Expression, IfStmt, TypeRef
  }
};

use super::Decompiler;

/// Readability passes over a freshly interpreted body.
///
/// The VM traffics exclusively in 32-bit words, so floats, function
/// references and instance references all surface as plain integers; these
/// passes recover the intended representation where the declared type of the
/// receiving slot reveals it. `scope` lists the symbols local to the
/// declaration being processed.
impl<'s> Decompiler<'s> {
  pub(super) fn postprocess(&self, block: &mut Block, scope: &[usize]) {
    for code in &mut block.code {
      self.postprocess_code(code, scope);
    }
  }

  fn postprocess_code(&self, code: &mut Code, scope: &[usize]) {
    match code {
      Code::Expression(expr) => self.postprocess_expression(expr, scope),
      Code::Assign { target, value, .. } => {
        self.postprocess_expression(value, scope);
        if let Some(ty) = self.decls.variable_type(target.target) {
          self.retype(value, ty, scope, false);
        }
      }
      Code::Return(value) => {
        if let Some(value) = value {
          self.postprocess_expression(value, scope);
        }
      }
      Code::If(stmt) => self.postprocess_if(stmt, scope)
    }
  }

  fn postprocess_if(&self, stmt: &mut IfStmt, scope: &[usize]) {
    self.postprocess_expression(&mut stmt.condition, scope);
    self.postprocess(&mut stmt.body, scope);

    if let Some(next) = stmt.next.as_mut() {
      match next.as_mut() {
        Conditional::ElseIf(inner) => self.postprocess_if(inner, scope),
        Conditional::Else(body) => self.postprocess(body, scope)
      }
    }

    if !self.options.generate_else_if {
      return;
    }

    // `else { if … }` with nothing beside the inner if is a compiled
    // `else if` chain.
    if let Some(next) = stmt.next.take() {
      match *next {
        Conditional::Else(mut body) => {
          match body.code.pop() {
            Some(Code::If(inner)) if body.code.is_empty() => {
              stmt.next = Some(Box::new(Conditional::ElseIf(inner)));
            }
            Some(last) => {
              body.code.push(last);
              stmt.next = Some(Box::new(Conditional::Else(body)));
            }
            None => stmt.next = Some(Box::new(Conditional::Else(body)))
          }
        }
        other => stmt.next = Some(Box::new(other))
      }
    }
  }

  fn postprocess_expression(&self, expr: &mut Expression, scope: &[usize]) {
    match expr {
      Expression::Binary { left, right, .. } => {
        self.postprocess_expression(left, scope);
        self.postprocess_expression(right, scope);
      }
      Expression::Unary { operand, .. } => self.postprocess_expression(operand, scope),
      Expression::Access(access) => {
        if let Some(index) = access.index.as_mut() {
          self.postprocess_expression(index, scope);
        }
      }
      Expression::Call(call) => {
        let parameters: Vec<Option<TypeRef>> = match self.decls.get(call.target) {
          Some(Decl::Function(function)) => {
            function
              .parameters
              .iter()
              .map(|&parameter| self.decls.variable_type(parameter))
              .collect()
          }
          _ => Vec::new()
        };

        for (position, arg) in call.args.iter_mut().enumerate() {
          self.postprocess_expression(arg, scope);
          if let Some(Some(ty)) = parameters.get(position) {
            self.retype(arg, *ty, scope, true);
          }
        }
      }
      Expression::Array(values) => {
        for value in values {
          self.postprocess_expression(value, scope);
        }
      }
      Expression::Int(_)
      | Expression::Float(_)
      | Expression::String(_)
      | Expression::FunctionRef(_) => {}
    }
  }

  /// Rewrites an integer literal flowing into a typed slot into the
  /// representation the slot's type implies.
  fn retype(&self, expr: &mut Expression, ty: TypeRef, scope: &[usize], argument: bool) {
    let Expression::Int(value) = *expr else {
      return;
    };

    match ty {
      // Float recovery is a call-argument rule only: float stores already
      // surface through their dedicated assignment opcode.
      TypeRef::Builtin(BuiltinType::Float) => {
        if argument {
          *expr = Expression::Float(f32::from_bits(value as u32));
        }
      }
      TypeRef::Builtin(BuiltinType::Func) => {
        if self.options.resolve_function_references {
          if let Some(reference) = self.function_reference(value) {
            *expr = reference;
          }
        }
      }
      // Instance handles are plain words to the VM, so instance- and
      // class-typed slots are treated like int slots here; external
      // signatures declare their instance parameters either way.
      TypeRef::Builtin(BuiltinType::Int)
      | TypeRef::Builtin(BuiltinType::Instance)
      | TypeRef::Class(_) => {
        if self.options.resolve_instance_references {
          if let Some(reference) = self.instance_reference(value, scope) {
            *expr = reference;
          }
        }
      }
      _ => {}
    }
  }

  /// An integer bound to a `func` slot is the target's symbol index.
  fn function_reference(&self, value: i32) -> Option<Expression> {
    let index = usize::try_from(value).ok()?;
    let sym = self.script.symbol_by_index(index)?;
    if sym.ty != DataType::Function || !sym.flags.constant {
      return None;
    }
    Some(Expression::FunctionRef(index))
  }

  /// An integer bound to an instance-capable slot may be an instance's
  /// symbol index. Small values stay literal; the candidate must be an
  /// instance that is legitimately reachable from here: a compile-time
  /// constant, a top-level declaration, or a member of the current scope.
  fn instance_reference(&self, value: i32, scope: &[usize]) -> Option<Expression> {
    if value <= self.options.instance_reference_threshold {
      return None;
    }
    let index = value as usize;
    let sym = self.script.symbol_by_index(index)?;
    if sym.ty != DataType::Instance {
      return None;
    }
    if !sym.flags.constant && !self.decls.is_top_level(index) && !scope.contains(&index) {
      return None;
    }

    Some(Expression::Access(AccessExpr {
      target: index,
      index: None,
      scope: None
    }))
  }
}
