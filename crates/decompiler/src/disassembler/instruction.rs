use num_enum::TryFromPrimitive;

/// The Daedalus VM opcode set.
///
/// The discriminants are the raw byte values found in the bytecode segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum Opcode {
  Add            = 0,
  Subtract       = 1,
  Multiply       = 2,
  Divide         = 3,
  Modulo         = 4,
  BitwiseOr      = 5,
  BitwiseAnd     = 6,
  Less           = 7,
  Greater        = 8,
  Assign         = 9,
  LogicalOr      = 11,
  LogicalAnd     = 12,
  ShiftLeft      = 13,
  ShiftRight     = 14,
  LessOrEqual    = 15,
  Equal          = 16,
  NotEqual       = 17,
  GreaterOrEqual = 18,
  AssignAdd      = 19,
  AssignSubtract = 20,
  AssignMultiply = 21,
  AssignDivide   = 22,
  Plus           = 30,
  Negate         = 31,
  Not            = 32,
  Complement     = 33,
  Nop            = 45,
  Return         = 60,
  Call           = 61,
  CallExternal   = 62,
  PushInt        = 64,
  PushVar        = 65,
  PushInstance   = 67,
  AssignString   = 70,
  AssignStringRef = 71,
  AssignFunc     = 72,
  AssignFloat    = 73,
  AssignInstance = 74,
  Jump           = 75,
  JumpIfZero     = 76,
  SetInstance    = 80,
  PushArrayVar   = 245
}

impl Opcode {
  /// The ZenGin assembler mnemonic, used by the raw disassembly listing.
  pub fn mnemonic(&self) -> &'static str {
    match self {
      Self::Add => "ADD",
      Self::Subtract => "SUB",
      Self::Multiply => "MUL",
      Self::Divide => "DIV",
      Self::Modulo => "MOD",
      Self::BitwiseOr => "OR",
      Self::BitwiseAnd => "ANDB",
      Self::Less => "LT",
      Self::Greater => "GT",
      Self::Assign => "MOVI",
      Self::LogicalOr => "ORR",
      Self::LogicalAnd => "AND",
      Self::ShiftLeft => "LSL",
      Self::ShiftRight => "LSR",
      Self::LessOrEqual => "LTE",
      Self::Equal => "EQ",
      Self::NotEqual => "NEQ",
      Self::GreaterOrEqual => "GTE",
      Self::AssignAdd => "ADDMOVI",
      Self::AssignSubtract => "SUBMOVI",
      Self::AssignMultiply => "MULMOVI",
      Self::AssignDivide => "DIVMOVI",
      Self::Plus => "PLUS",
      Self::Negate => "NEGATE",
      Self::Not => "NOT",
      Self::Complement => "CMPL",
      Self::Nop => "NOP",
      Self::Return => "RSR",
      Self::Call => "BL",
      Self::CallExternal => "BE",
      Self::PushInt => "PUSHI",
      Self::PushVar => "PUSHV",
      Self::PushInstance => "PUSHVI",
      Self::AssignString => "MOVS",
      Self::AssignStringRef => "MOVSS",
      Self::AssignFunc => "MOVVF",
      Self::AssignFloat => "MOVF",
      Self::AssignInstance => "MOVVI",
      Self::Jump => "B",
      Self::JumpIfZero => "BZ",
      Self::SetInstance => "GMOVI",
      Self::PushArrayVar => "PUSHVV"
    }
  }
}

/// A decoded instruction.
///
/// `data` is the 32-bit immediate (literal value, symbol index or jump
/// target, depending on the opcode); `index` is the extra element index byte
/// only `PUSHVV` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
  pub op:      Opcode,
  pub address: u32,
  pub size:    u32,
  pub data:    i32,
  pub index:   u8
}
