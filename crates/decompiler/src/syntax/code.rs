use crate::disassembler::Opcode;

use super::{AccessExpr, Expression};

/// An ordered sequence of statements. Owns its children exclusively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
  pub code: Vec<Code>
}

impl Block {
  pub fn new() -> Self {
    Default::default()
  }
}

/// A single statement inside a body.
#[derive(Debug, Clone, PartialEq)]
pub enum Code {
  /// A bare expression in statement position: a void call, or an operand
  /// the interpreter had to flush off the stack.
  Expression(Expression),
  Assign {
    target: AccessExpr,
    op:     AssignOp,
    value:  Expression
  },
  Return(Option<Expression>),
  If(IfStmt)
}

/// One link of an if/else-if/else cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
  pub condition: Expression,
  pub body:      Block,
  pub next:      Option<Box<Conditional>>
}

#[derive(Debug, Clone, PartialEq)]
pub enum Conditional {
  ElseIf(IfStmt),
  Else(Block)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
  Assign,
  Add,
  Subtract,
  Multiply,
  Divide
}

impl AssignOp {
  /// Every `MOV*` opcode maps to an assignment; only the compound integer
  /// forms carry an arithmetic operator.
  pub fn from_opcode(op: Opcode) -> Self {
    match op {
      Opcode::AssignAdd => Self::Add,
      Opcode::AssignSubtract => Self::Subtract,
      Opcode::AssignMultiply => Self::Multiply,
      Opcode::AssignDivide => Self::Divide,
      _ => Self::Assign
    }
  }

  pub fn token(&self) -> &'static str {
    match self {
      Self::Assign => "=",
      Self::Add => "+=",
      Self::Subtract => "-=",
      Self::Multiply => "*=",
      Self::Divide => "/="
    }
  }
}
