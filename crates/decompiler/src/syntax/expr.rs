use crate::disassembler::Opcode;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
  Int(i32),
  Float(f32),
  String(String),
  Array(Vec<Expression>),
  Access(AccessExpr),
  Binary {
    op:    BinaryOp,
    left:  Box<Expression>,
    right: Box<Expression>
  },
  Unary {
    op:      UnaryOp,
    operand: Box<Expression>
  },
  Call(CallExpr),
  /// A reference to a function used as a value, e.g. a callback assigned to
  /// a `func` variable. Carries the function's symbol index.
  FunctionRef(usize)
}

/// A read of a variable, optionally indexed, optionally qualified by the
/// instance that was active when the access was interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessExpr {
  pub target: usize,
  pub index:  Option<Box<Expression>>,
  pub scope:  Option<usize>
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
  pub target: usize,
  pub args:   Vec<Expression>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Subtract,
  Multiply,
  Divide,
  Modulo,
  BitwiseAnd,
  BitwiseOr,
  LogicalAnd,
  LogicalOr,
  ShiftLeft,
  ShiftRight,
  Less,
  LessOrEqual,
  Greater,
  GreaterOrEqual,
  Equal,
  NotEqual
}

impl BinaryOp {
  pub fn from_opcode(op: Opcode) -> Option<Self> {
    match op {
      Opcode::Add => Some(Self::Add),
      Opcode::Subtract => Some(Self::Subtract),
      Opcode::Multiply => Some(Self::Multiply),
      Opcode::Divide => Some(Self::Divide),
      Opcode::Modulo => Some(Self::Modulo),
      Opcode::BitwiseAnd => Some(Self::BitwiseAnd),
      Opcode::BitwiseOr => Some(Self::BitwiseOr),
      Opcode::LogicalAnd => Some(Self::LogicalAnd),
      Opcode::LogicalOr => Some(Self::LogicalOr),
      Opcode::ShiftLeft => Some(Self::ShiftLeft),
      Opcode::ShiftRight => Some(Self::ShiftRight),
      Opcode::Less => Some(Self::Less),
      Opcode::LessOrEqual => Some(Self::LessOrEqual),
      Opcode::Greater => Some(Self::Greater),
      Opcode::GreaterOrEqual => Some(Self::GreaterOrEqual),
      Opcode::Equal => Some(Self::Equal),
      Opcode::NotEqual => Some(Self::NotEqual),
      _ => None
    }
  }

  pub fn token(&self) -> &'static str {
    match self {
      Self::Add => "+",
      Self::Subtract => "-",
      Self::Multiply => "*",
      Self::Divide => "/",
      Self::Modulo => "%",
      Self::BitwiseAnd => "&",
      Self::BitwiseOr => "|",
      Self::LogicalAnd => "&&",
      Self::LogicalOr => "||",
      Self::ShiftLeft => "<<",
      Self::ShiftRight => ">>",
      Self::Less => "<",
      Self::LessOrEqual => "<=",
      Self::Greater => ">",
      Self::GreaterOrEqual => ">=",
      Self::Equal => "==",
      Self::NotEqual => "!="
    }
  }

  /// C-style precedence level; a larger value binds weaker.
  pub fn precedence(&self) -> u32 {
    match self {
      Self::Multiply | Self::Divide | Self::Modulo => 5,
      Self::Add | Self::Subtract => 6,
      Self::ShiftLeft | Self::ShiftRight => 7,
      Self::Less | Self::LessOrEqual | Self::Greater | Self::GreaterOrEqual => 9,
      Self::Equal | Self::NotEqual => 10,
      Self::BitwiseAnd => 11,
      Self::BitwiseOr => 13,
      Self::LogicalAnd => 14,
      Self::LogicalOr => 15
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
  Plus,
  Minus,
  LogicalNot,
  BitwiseNot
}

impl UnaryOp {
  pub fn from_opcode(op: Opcode) -> Option<Self> {
    match op {
      Opcode::Plus => Some(Self::Plus),
      Opcode::Negate => Some(Self::Minus),
      Opcode::Not => Some(Self::LogicalNot),
      Opcode::Complement => Some(Self::BitwiseNot),
      _ => None
    }
  }

  pub fn token(&self) -> &'static str {
    match self {
      Self::Plus => "+",
      Self::Minus => "-",
      Self::LogicalNot => "!",
      Self::BitwiseNot => "~"
    }
  }
}
