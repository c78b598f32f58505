use std::fmt;

use num_enum::TryFromPrimitive;

/// The declared type of a symbol-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
pub enum DataType {
  Void      = 0,
  Float     = 1,
  Int       = 2,
  String    = 3,
  Class     = 4,
  Function  = 5,
  Prototype = 6,
  Instance  = 7
}

impl fmt::Display for DataType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Void => "void",
      Self::Float => "float",
      Self::Int => "int",
      Self::String => "string",
      Self::Class => "class",
      Self::Function => "func",
      Self::Prototype => "prototype",
      Self::Instance => "instance"
    };
    write!(f, "{name}")
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolFlags {
  pub constant:  bool,
  pub member:    bool,
  pub external:  bool,
  pub merged:    bool,
  pub generated: bool
}

/// Compile-time payload of a const symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SymbolData {
  #[default]
  None,
  Ints(Vec<i32>),
  Floats(Vec<f32>),
  Strings(Vec<String>)
}

/// One entry of the compiled script's symbol table.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
  pub index:         usize,
  pub name:          String,
  pub address:       u32,
  pub size:          u32,
  pub ty:            DataType,
  pub return_type:   DataType,
  pub flags:         SymbolFlags,
  pub parent:        Option<usize>,
  pub member_offset: i32,
  pub class_size:    i32,
  pub file_index:    u32,
  pub line_start:    u32,
  pub line_count:    u32,
  pub char_start:    u32,
  pub char_count:    u32,
  pub data:          SymbolData
}

impl Symbol {
  /// A blank symbol of the given kind. Callers fill in the remaining fields.
  pub fn new(index: usize, name: impl Into<String>, ty: DataType) -> Self {
    Self {
      index,
      name: name.into(),
      address: 0,
      size: 1,
      ty,
      return_type: DataType::Void,
      flags: Default::default(),
      parent: None,
      member_offset: 0,
      class_size: 0,
      file_index: 0,
      line_start: 0,
      line_count: 0,
      char_start: 0,
      char_count: 0,
      data: Default::default()
    }
  }

  pub fn get_int(&self, index: usize) -> Option<i32> {
    match &self.data {
      SymbolData::Ints(values) => values.get(index).copied(),
      _ => None
    }
  }

  pub fn get_float(&self, index: usize) -> Option<f32> {
    match &self.data {
      SymbolData::Floats(values) => values.get(index).copied(),
      _ => None
    }
  }

  pub fn get_string(&self, index: usize) -> Option<&str> {
    match &self.data {
      SymbolData::Strings(values) => values.get(index).map(String::as_str),
      _ => None
    }
  }
}
