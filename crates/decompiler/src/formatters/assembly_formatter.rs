use std::fmt::Write;

use itertools::Itertools;

use crate::{
  disassembler::{disassemble_routine, DisassembleError, Instruction, Opcode},
  script::Script
};

/// Renders the raw instruction listing of a routine, one line per
/// instruction with its address, encoded bytes, mnemonic and a comment
/// naming the referenced symbol where the operand resolves to one.
pub struct AssemblyFormatter<'s> {
  script: &'s Script
}

impl<'s> AssemblyFormatter<'s> {
  pub fn new(script: &'s Script) -> Self {
    Self { script }
  }

  pub fn format_routine(&self, address: u32) -> Result<String, DisassembleError> {
    let mut out = String::new();
    for instruction in disassemble_routine(self.script.code(), address)? {
      let _ = writeln!(out, "{}", self.format_instruction(&instruction));
    }
    Ok(out)
  }

  pub fn format_instruction(&self, instruction: &Instruction) -> String {
    let at = instruction.address as usize;
    let bytes = self.script.code()[at..at + instruction.size as usize]
      .iter()
      .map(|byte| format!("{byte:02X}"))
      .join(" ");

    let operand = match instruction.op {
      Opcode::PushArrayVar => format!(" {} +{}", instruction.data, instruction.index),
      op if has_operand(op) => format!(" {}", instruction.data),
      _ => String::new()
    };

    let mut line = format!(
      "{:08}: {:<18} {}{}",
      instruction.address,
      bytes,
      instruction.op.mnemonic(),
      operand
    );

    if let Some(name) = self.operand_name(instruction) {
      let _ = write!(line, " ; {name}");
    }
    line
  }

  fn operand_name(&self, instruction: &Instruction) -> Option<&str> {
    let sym = match instruction.op {
      Opcode::Call => self.script.symbol_by_address(instruction.data as u32)?,
      Opcode::CallExternal
      | Opcode::PushVar
      | Opcode::PushInstance
      | Opcode::PushArrayVar
      | Opcode::SetInstance => self.script.symbol_by_index(instruction.data as usize)?,
      _ => return None
    };
    Some(&sym.name)
  }
}

fn has_operand(op: Opcode) -> bool {
  matches!(
    op,
    Opcode::Jump
      | Opcode::JumpIfZero
      | Opcode::Call
      | Opcode::CallExternal
      | Opcode::PushInt
      | Opcode::PushVar
      | Opcode::PushInstance
      | Opcode::SetInstance
      | Opcode::PushArrayVar
  )
}
