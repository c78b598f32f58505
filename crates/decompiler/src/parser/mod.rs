use std::path::Path;

use binary_reader::{BinaryReader, Endian};
use thiserror::Error;

use crate::script::{DataType, Script, Symbol, SymbolData, SymbolFlags};

const FLAG_CONST: u32 = 1 << 0;
const FLAG_RETURN: u32 = 1 << 1;
const FLAG_MEMBER: u32 = 1 << 2;
const FLAG_EXTERNAL: u32 = 1 << 3;
const FLAG_MERGED: u32 = 1 << 4;
const FLAG_GENERATED: u32 = 1 << 5;

/// Loads a compiled `.DAT` container from disk.
pub fn parse_dat_file(path: impl AsRef<Path>) -> Result<Script, ParseError> {
  let data = std::fs::read(path)?;
  parse_dat(&data)
}

/// Parses a compiled `.DAT` container: a version byte, the symbol table and
/// the bytecode segment. All integers are little-endian.
pub fn parse_dat(data: &[u8]) -> Result<Script, ParseError> {
  let mut reader = BinaryReader::from_u8(data);
  reader.set_endian(Endian::Little);

  let _version = reader.read_u8()?;

  let count = reader.read_u32()? as usize;
  // The by-name sort permutation; lookups here go by index and address only.
  reader.read_bytes(count * 4)?;

  let mut symbols = Vec::with_capacity(count);
  for index in 0..count {
    symbols.push(read_symbol(&mut reader, index)?);
  }

  let code_size = reader.read_u32()? as usize;
  let code = reader.read_bytes(code_size)?.to_vec();

  Ok(Script::new(symbols, code))
}

fn read_symbol(reader: &mut BinaryReader, index: usize) -> Result<Symbol, ParseError> {
  let named = reader.read_u32()?;
  let name = if named != 0 {
    read_zstring(reader)?
  } else {
    String::new()
  };

  // For functions this word is the return type, for members their offset
  // into the owning class.
  let off_cls_ret = reader.read_i32()?;

  let packed = reader.read_u32()?;
  let count = packed & 0xFFF;
  let raw_type = (packed >> 12) & 0xF;
  let raw_flags = (packed >> 16) & 0x3F;

  let ty = DataType::try_from(raw_type).map_err(|_| {
    ParseError::UnknownDataType {
      index,
      raw: raw_type
    }
  })?;

  let mut sym = Symbol::new(index, name, ty);
  sym.size = count;
  sym.member_offset = off_cls_ret;
  sym.flags = SymbolFlags {
    constant:  raw_flags & FLAG_CONST != 0,
    member:    raw_flags & FLAG_MEMBER != 0,
    external:  raw_flags & FLAG_EXTERNAL != 0,
    merged:    raw_flags & FLAG_MERGED != 0,
    generated: raw_flags & FLAG_GENERATED != 0
  };

  if ty == DataType::Function && raw_flags & FLAG_RETURN != 0 {
    sym.return_type = DataType::try_from(off_cls_ret as u32).map_err(|_| {
      ParseError::UnknownDataType {
        index,
        raw: off_cls_ret as u32
      }
    })?;
  }

  sym.file_index = reader.read_u32()? & 0x7FFFF;
  sym.line_start = reader.read_u32()? & 0x7FFFF;
  sym.line_count = reader.read_u32()? & 0x7FFFF;
  sym.char_start = reader.read_u32()? & 0xFF_FFFF;
  sym.char_count = reader.read_u32()? & 0xFF_FFFF;

  // Members carry no payload of their own; their storage lives in the
  // instances of the owning class.
  if !sym.flags.member {
    match ty {
      DataType::Float => {
        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
          values.push(reader.read_f32()?);
        }
        sym.data = SymbolData::Floats(values);
      }
      DataType::Int => {
        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
          values.push(reader.read_i32()?);
        }
        sym.data = SymbolData::Ints(values);
      }
      DataType::String => {
        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
          values.push(read_zstring(reader)?);
        }
        sym.data = SymbolData::Strings(values);
      }
      DataType::Class => {
        sym.class_size = reader.read_i32()?;
      }
      DataType::Function | DataType::Prototype | DataType::Instance => {
        sym.address = reader.read_i32()? as u32;
      }
      DataType::Void => {}
    }
  }

  let parent = reader.read_i32()?;
  sym.parent = (parent >= 0).then_some(parent as usize);

  Ok(sym)
}

/// A newline-terminated string in the game's single-byte codepage.
fn read_zstring(reader: &mut BinaryReader) -> Result<String, ParseError> {
  let mut out = String::new();
  loop {
    let byte = reader.read_u8()?;
    if byte == b'\n' {
      return Ok(out);
    }
    out.push(byte as char);
  }
}

#[derive(Debug, Error)]
pub enum ParseError {
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error("symbol {index} declares unknown data type {raw}")]
  UnknownDataType { index: usize, raw: u32 }
}
