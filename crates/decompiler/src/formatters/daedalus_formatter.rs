use crate::syntax::{
  AccessExpr, Block, Code, Conditional, Decl, Declarations, Expression, IfStmt, TypeRef
};

use super::SourceBuilder;

/// Renders recovered declarations back into Daedalus source.
///
/// Statement terminators for whole top-level declarations are left to the
/// caller, so exports can decide what goes between them.
pub struct DaedalusFormatter<'d> {
  decls: &'d Declarations
}

impl<'d> DaedalusFormatter<'d> {
  pub fn new(decls: &'d Declarations) -> Self {
    Self { decls }
  }

  pub fn write_decl<B: SourceBuilder>(&self, b: &mut B, index: usize) {
    let Some(decl) = self.decls.get(index) else {
      return;
    };

    match decl {
      Decl::Class(class) => {
        b.keyword("class").space().text(&class.name).text(" {");
        b.indented(|b| {
          for &member in &class.members {
            b.newline();
            self.write_var_header(b, member);
            b.text(";");
          }
        });
        b.newline().text("}");
      }
      Decl::Prototype(prototype) => {
        b.keyword("prototype").space().text(&prototype.name);
        b.text("(")
          .reference(&self.name(prototype.parent), prototype.parent)
          .text(")");
        if let Some(body) = &prototype.body {
          self.write_body(b, body);
        }
      }
      Decl::Instance(instance) => {
        b.keyword("instance").space().text(&instance.name);
        if let Some(parent) = instance.parent_prototype.or(instance.parent_class) {
          b.text("(").reference(&self.name(parent), parent).text(")");
        }
        if let Some(body) = &instance.body {
          self.write_body(b, body);
        }
      }
      Decl::Function(function) => {
        b.keyword("func").space();
        self.write_type(b, function.return_type);
        b.space().text(&function.name).text("(");
        for (position, &parameter) in function.parameters.iter().enumerate() {
          if position > 0 {
            b.text(", ");
          }
          self.write_var_header(b, parameter);
        }
        b.text(") {");
        b.indented(|b| {
          for &local in &function.locals {
            b.newline();
            self.write_var_header(b, local);
            b.text(";");
          }
          if let Some(body) = &function.body {
            self.write_block(b, body);
          }
        });
        b.newline().text("}");
      }
      Decl::Variable(variable) => {
        match &variable.value {
          Some(value) => {
            b.keyword("const").space();
            self.write_type(b, variable.ty);
            b.space().text(&variable.name).text(" = ");
            self.write_expression(b, value);
          }
          None => {
            b.keyword("var").space();
            self.write_type(b, variable.ty);
            b.space().text(&variable.name);
          }
        }
      }
      Decl::VariableArray(array) => {
        match &array.value {
          Some(value) => {
            b.keyword("const").space();
            self.write_type(b, array.ty);
            b.space().text(&array.name).text("[");
            self.write_expression(b, &array.element_count);
            b.text("] = ");
            self.write_expression(b, value);
          }
          None => {
            b.keyword("var").space();
            self.write_type(b, array.ty);
            b.space().text(&array.name).text("[");
            self.write_expression(b, &array.element_count);
            b.text("]");
          }
        }
      }
    }
  }

  pub fn write_expression<B: SourceBuilder>(&self, b: &mut B, expr: &Expression) {
    match expr {
      Expression::Int(value) => {
        b.int(*value);
      }
      Expression::Float(value) => {
        b.float(*value);
      }
      Expression::String(value) => {
        b.string(value);
      }
      Expression::Array(values) => {
        b.text("{");
        for (position, value) in values.iter().enumerate() {
          if position > 0 {
            b.text(", ");
          }
          self.write_expression(b, value);
        }
        b.text("}");
      }
      Expression::Access(access) => self.write_access(b, access),
      Expression::Binary { op, left, right } => {
        self.write_operand(b, left, op.precedence());
        b.text(&format!(" {} ", op.token()));
        self.write_operand(b, right, op.precedence());
      }
      Expression::Unary { op, operand } => {
        b.text(op.token());
        if matches!(operand.as_ref(), Expression::Binary { .. }) {
          b.text("(");
          self.write_expression(b, operand);
          b.text(")");
        } else {
          self.write_expression(b, operand);
        }
      }
      Expression::Call(call) => {
        b.reference(&self.name(call.target), call.target).text("(");
        for (position, arg) in call.args.iter().enumerate() {
          if position > 0 {
            b.text(", ");
          }
          self.write_expression(b, arg);
        }
        b.text(")");
      }
      Expression::FunctionRef(target) => {
        b.reference(&self.name(*target), *target);
      }
    }
  }

  fn write_body<B: SourceBuilder>(&self, b: &mut B, body: &Block) {
    b.text(" {");
    b.indented(|b| self.write_block(b, body));
    b.newline().text("}");
  }

  fn write_block<B: SourceBuilder>(&self, b: &mut B, block: &Block) {
    for code in &block.code {
      b.newline();
      self.write_code(b, code);
      b.text(";");
    }
  }

  fn write_code<B: SourceBuilder>(&self, b: &mut B, code: &Code) {
    match code {
      Code::Expression(expr) => self.write_expression(b, expr),
      Code::Assign { target, op, value } => {
        self.write_access(b, target);
        b.text(&format!(" {} ", op.token()));
        self.write_expression(b, value);
      }
      Code::Return(None) => {
        b.keyword("return");
      }
      Code::Return(Some(value)) => {
        b.keyword("return").space();
        self.write_expression(b, value);
      }
      Code::If(stmt) => self.write_if(b, stmt)
    }
  }

  fn write_if<B: SourceBuilder>(&self, b: &mut B, stmt: &IfStmt) {
    b.keyword("if").text(" (");
    self.write_expression(b, &stmt.condition);
    b.text(") {");
    b.indented(|b| self.write_block(b, &stmt.body));
    b.newline().text("}");

    if let Some(next) = &stmt.next {
      match next.as_ref() {
        Conditional::ElseIf(inner) => {
          b.space().keyword("else").space();
          self.write_if(b, inner);
        }
        Conditional::Else(body) => {
          b.space().keyword("else").text(" {");
          b.indented(|b| self.write_block(b, body));
          b.newline().text("}");
        }
      }
    }
  }

  fn write_access<B: SourceBuilder>(&self, b: &mut B, access: &AccessExpr) {
    if let Some(scope) = access.scope {
      b.reference(&self.name(scope), scope).text(".");
    }
    b.reference(&self.name(access.target), access.target);

    match &access.index {
      Some(index) => {
        b.text("[");
        self.write_expression(b, index);
        b.text("]");
      }
      // A bare mention of an array reads its first element.
      None => {
        if matches!(self.decls.get(access.target), Some(Decl::VariableArray(_))) {
          b.text("[0]");
        }
      }
    }
  }

  /// `var <type> <name>`, as used for parameters, locals and class members.
  fn write_var_header<B: SourceBuilder>(&self, b: &mut B, index: usize) {
    match self.decls.get(index) {
      Some(Decl::Variable(variable)) => {
        b.keyword("var").space();
        self.write_type(b, variable.ty);
        b.space().text(&variable.name);
      }
      Some(Decl::VariableArray(array)) => {
        b.keyword("var").space();
        self.write_type(b, array.ty);
        b.space().text(&array.name).text("[");
        self.write_expression(b, &array.element_count);
        b.text("]");
      }
      Some(Decl::Instance(instance)) => {
        b.keyword("var").space();
        match instance.parent_class {
          Some(class) => {
            b.reference(&self.name(class), class);
          }
          None => {
            b.keyword("instance");
          }
        }
        b.space().text(&instance.name);
      }
      _ => {}
    }
  }

  fn write_type<B: SourceBuilder>(&self, b: &mut B, ty: TypeRef) {
    match ty {
      TypeRef::Builtin(builtin) => {
        b.keyword(builtin.name());
      }
      TypeRef::Class(index) => {
        b.reference(&self.name(index), index);
      }
    }
  }

  /// Parenthesizes an operand exactly when it is itself a binary expression
  /// whose operator binds weaker than the parent's.
  fn write_operand<B: SourceBuilder>(
    &self,
    b: &mut B,
    operand: &Expression,
    parent_precedence: u32
  ) {
    let needs_parens = match operand {
      Expression::Binary { op, .. } => op.precedence() > parent_precedence,
      _ => false
    };

    if needs_parens {
      b.text("(");
      self.write_expression(b, operand);
      b.text(")");
    } else {
      self.write_expression(b, operand);
    }
  }

  fn name(&self, index: usize) -> String {
    self
      .decls
      .get(index)
      .map(|decl| decl.name().to_owned())
      .unwrap_or_else(|| format!("sym_{index}"))
  }
}
