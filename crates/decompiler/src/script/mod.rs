mod symbol;

use std::collections::HashMap;

pub use symbol::*;

use crate::disassembler::{decode, DisassembleError, Instruction};

/// A loaded Daedalus script: the symbol table plus the raw bytecode blob.
///
/// Symbols are immutable once the script is constructed; every lookup the
/// decompiler performs goes through this type.
#[derive(Debug)]
pub struct Script {
  symbols:    Vec<Symbol>,
  code:       Vec<u8>,
  by_address: HashMap<u32, usize>
}

impl Script {
  pub fn new(symbols: Vec<Symbol>, code: Vec<u8>) -> Self {
    let mut by_address: HashMap<u32, usize> = Default::default();
    for sym in &symbols {
      // Functions, prototypes and instances carry a code address. The first
      // symbol at an address wins, matching the compiler's emission order.
      if sym.address != 0 || sym.ty == DataType::Function {
        by_address.entry(sym.address).or_insert(sym.index);
      }
    }

    Self {
      symbols,
      code,
      by_address
    }
  }

  pub fn symbols(&self) -> &[Symbol] {
    &self.symbols
  }

  pub fn symbol_by_index(&self, index: usize) -> Option<&Symbol> {
    self.symbols.get(index)
  }

  pub fn symbol_by_address(&self, address: u32) -> Option<&Symbol> {
    self
      .by_address
      .get(&address)
      .and_then(|&index| self.symbols.get(index))
  }

  pub fn instruction_at(&self, address: u32) -> Result<Instruction, DisassembleError> {
    decode(&self.code, address)
  }

  pub fn code(&self) -> &[u8] {
    &self.code
  }
}
