mod instruction;

use thiserror::Error;

pub use instruction::*;

/// Decodes the single instruction starting at `address`.
pub fn decode(code: &[u8], address: u32) -> Result<Instruction, DisassembleError> {
  let at = address as usize;
  let raw = *code
    .get(at)
    .ok_or(DisassembleError::OutOfBounds { address })?;
  let op =
    Opcode::try_from(raw).map_err(|_| DisassembleError::UnknownOpcode { raw, address })?;

  let (size, data, index) = match op {
    Opcode::Jump
    | Opcode::JumpIfZero
    | Opcode::Call
    | Opcode::CallExternal
    | Opcode::PushInt
    | Opcode::PushVar
    | Opcode::PushInstance
    | Opcode::SetInstance => (5, read_i32(code, at + 1, address)?, 0),
    Opcode::PushArrayVar => {
      (
        6,
        read_i32(code, at + 1, address)?,
        *code
          .get(at + 5)
          .ok_or(DisassembleError::OutOfBounds { address })?
      )
    }
    _ => (1, 0, 0)
  };

  Ok(Instruction {
    op,
    address,
    size,
    data,
    index
  })
}

/// Decodes the instructions of the routine starting at `address`.
///
/// Daedalus emits strictly forward-branching code per routine, so the listing
/// ends at the first return that lies beyond every branch target seen so far.
pub fn disassemble_routine(
  code: &[u8],
  address: u32
) -> Result<Vec<Instruction>, DisassembleError> {
  let mut instructions = Vec::new();
  let mut offset = address;
  let mut after = address;

  loop {
    let instruction = decode(code, offset)?;
    offset += instruction.size;

    if matches!(instruction.op, Opcode::Jump | Opcode::JumpIfZero) {
      after = after.max(instruction.data as u32);
    }

    let done = instruction.op == Opcode::Return && offset > after;
    instructions.push(instruction);

    if done {
      return Ok(instructions);
    }
  }
}

fn read_i32(code: &[u8], at: usize, address: u32) -> Result<i32, DisassembleError> {
  let bytes = code
    .get(at..at + 4)
    .ok_or(DisassembleError::OutOfBounds { address })?;
  Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DisassembleError {
  #[error("unknown opcode {raw:#04x} at address {address}")]
  UnknownOpcode { raw: u8, address: u32 },
  #[error("instruction at address {address} exceeds the code segment")]
  OutOfBounds { address: u32 }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_plain_opcode() {
    let code = [Opcode::Add as u8];
    let instruction = decode(&code, 0).unwrap();
    assert_eq!(instruction.op, Opcode::Add);
    assert_eq!(instruction.size, 1);
  }

  #[test]
  fn decodes_immediate_operand() {
    let mut code = vec![Opcode::PushInt as u8];
    code.extend_from_slice(&1337i32.to_le_bytes());
    let instruction = decode(&code, 0).unwrap();
    assert_eq!(instruction.op, Opcode::PushInt);
    assert_eq!(instruction.size, 5);
    assert_eq!(instruction.data, 1337);
  }

  #[test]
  fn decodes_indexed_access() {
    let mut code = vec![Opcode::PushArrayVar as u8];
    code.extend_from_slice(&7i32.to_le_bytes());
    code.push(3);
    let instruction = decode(&code, 0).unwrap();
    assert_eq!(instruction.size, 6);
    assert_eq!(instruction.data, 7);
    assert_eq!(instruction.index, 3);
  }

  #[test]
  fn rejects_unknown_opcode() {
    assert_eq!(
      decode(&[0xAA], 0),
      Err(DisassembleError::UnknownOpcode {
        raw:     0xAA,
        address: 0
      })
    );
  }

  #[test]
  fn rejects_truncated_operand() {
    let code = [Opcode::PushInt as u8, 0x01];
    assert_eq!(
      decode(&code, 0),
      Err(DisassembleError::OutOfBounds { address: 0 })
    );
  }
}
