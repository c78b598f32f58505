use crate::{
  disassembler::{Instruction, Opcode},
  script::DataType,
  syntax::{
    AccessExpr, AssignOp, BinaryOp, Block, CallExpr, Code, Conditional, Expression, IfStmt,
    UnaryOp
  }
};

use super::{variable_value, DecompileError, Decompiler};

/// A value still sitting on the simulated VM stack: the instruction that
/// produced it plus the instance register at the time it was pushed.
#[derive(Debug, Clone, Copy)]
pub(super) struct StackFrame {
  instruction: Instruction,
  context:     Option<usize>
}

/// How a block stopped consuming instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Terminator {
  /// The routine's own `RSR`.
  Return,
  /// An unconditional branch out of the block, carrying its target.
  Jump(u32),
  /// The block ran into its upper address limit.
  FallThrough
}

pub(super) struct BlockResult {
  pub block:      Block,
  pub terminator: Terminator
}

impl<'s> Decompiler<'s> {
  /// Interprets `[address, limit)` into a statement block.
  ///
  /// `parameter_count` is the number of leading stores that bind the
  /// routine's parameters and produce no statements; `outermost`
  /// distinguishes the routine body from nested branch blocks,
  /// whose `RSR` is an early exit rather than the end of interpretation.
  pub(super) fn decompile_block(
    &mut self,
    address: u32,
    limit: u32,
    parameter_count: usize,
    returns_value: bool,
    outermost: bool
  ) -> Result<BlockResult, DecompileError> {
    let script = self.script;
    let mut block = Block::new();
    let mut stack: Vec<StackFrame> = Vec::new();
    let mut context: Option<usize> = None;
    let mut ignored = parameter_count;
    let mut offset = address;

    while offset < limit {
      let instruction = script.instruction_at(offset)?;
      let next = offset + instruction.size;

      match instruction.op {
        Opcode::Assign
        | Opcode::AssignAdd
        | Opcode::AssignSubtract
        | Opcode::AssignMultiply
        | Opcode::AssignDivide
        | Opcode::AssignString
        | Opcode::AssignStringRef
        | Opcode::AssignFunc
        | Opcode::AssignFloat
        | Opcode::AssignInstance => {
          if ignored > 0 {
            // Parameter binding: the caller's argument is not on our
            // simulated stack, only the target the routine pushed is.
            ignored -= 1;
            stack.pop();
          } else {
            let is_float = instruction.op == Opcode::AssignFloat;
            let target = match self.decompile_expression(&mut stack, false)? {
              Expression::Access(access) => access,
              _ => return Err(DecompileError::MalformedAssignmentTarget { address: offset })
            };
            let value = self.decompile_expression(&mut stack, is_float)?;
            self.flush_stack(&mut stack, &mut block)?;
            block.code.push(Code::Assign {
              target,
              op: AssignOp::from_opcode(instruction.op),
              value
            });
          }
        }
        Opcode::Nop => {}
        Opcode::Return => {
          let value = if returns_value && !stack.is_empty() {
            Some(self.decompile_expression(&mut stack, false)?)
          } else {
            None
          };
          self.flush_stack(&mut stack, &mut block)?;

          if outermost {
            if value.is_some() {
              block.code.push(Code::Return(value));
            }
            return Ok(BlockResult {
              block,
              terminator: Terminator::Return
            });
          }
          // An early exit out of a branch; interpretation of the enclosing
          // region continues behind it.
          block.code.push(Code::Return(value));
        }
        Opcode::Call => {
          let sym = script
            .symbol_by_address(instruction.data as u32)
            .ok_or(DecompileError::UnresolvedCallTarget {
              target: instruction.data
            })?;

          if sym.ty == DataType::Prototype {
            // Instance bodies call their prototype's initializer first; the
            // rendered `instance X(Proto)` header already expresses that.
          } else if sym.return_type == DataType::Void {
            stack.push(StackFrame {
              instruction,
              context
            });
            let call = self.decompile_expression(&mut stack, false)?;
            self.flush_stack(&mut stack, &mut block)?;
            block.code.push(Code::Expression(call));
          } else {
            stack.push(StackFrame {
              instruction,
              context
            });
          }
        }
        Opcode::CallExternal => {
          let sym = script
            .symbol_by_index(instruction.data as usize)
            .ok_or(DecompileError::UnresolvedCallTarget {
              target: instruction.data
            })?;

          if sym.return_type == DataType::Void {
            stack.push(StackFrame {
              instruction,
              context
            });
            let call = self.decompile_expression(&mut stack, false)?;
            self.flush_stack(&mut stack, &mut block)?;
            block.code.push(Code::Expression(call));
          } else {
            stack.push(StackFrame {
              instruction,
              context
            });
          }
        }
        Opcode::Jump => {
          self.flush_stack(&mut stack, &mut block)?;
          return Ok(BlockResult {
            block,
            terminator: Terminator::Jump(instruction.data as u32)
          });
        }
        Opcode::JumpIfZero => {
          let condition = self.decompile_expression(&mut stack, false)?;
          self.flush_stack(&mut stack, &mut block)?;

          let target = instruction.data as u32;
          let body = self.decompile_block(next, target, 0, returns_value, false)?;
          let mut stmt = IfStmt {
            condition,
            body: body.block,
            next: None
          };

          match body.terminator {
            Terminator::FallThrough => {
              offset = target;
            }
            Terminator::Jump(join) => {
              // The then branch jumps over an else region that runs up to
              // the join point.
              let alt = self.decompile_block(target, join, 0, returns_value, false)?;
              stmt.next = Some(Box::new(Conditional::Else(alt.block)));
              offset = join;
            }
            Terminator::Return => {
              return Err(DecompileError::MalformedConditional { address: offset })
            }
          }

          block.code.push(Code::If(stmt));
          continue;
        }
        Opcode::SetInstance => {
          context = Some(instruction.data as usize);
        }
        _ => {
          stack.push(StackFrame {
            instruction,
            context
          });
          // The context register feeds exactly one member access.
          if matches!(
            instruction.op,
            Opcode::PushVar | Opcode::PushInstance | Opcode::PushArrayVar
          ) {
            let consumed = script
              .symbol_by_index(instruction.data as usize)
              .map(|sym| sym.flags.member)
              .unwrap_or(false);
            if consumed {
              context = None;
            }
          }
        }
      }

      offset = next;
    }

    self.flush_stack(&mut stack, &mut block)?;
    Ok(BlockResult {
      block,
      terminator: Terminator::FallThrough
    })
  }

  /// Pops one value off the simulated stack and rebuilds the expression that
  /// produced it, recursing through operands.
  ///
  /// A pop from an empty stack yields `0`: the value came from outside the
  /// interpreted region (the VM would read whatever the caller left there).
  fn decompile_expression(
    &mut self,
    stack: &mut Vec<StackFrame>,
    is_float: bool
  ) -> Result<Expression, DecompileError> {
    let script = self.script;
    let frame = match stack.pop() {
      Some(frame) => frame,
      None => return Ok(Expression::Int(0))
    };
    let instruction = frame.instruction;

    if let Some(op) = BinaryOp::from_opcode(instruction.op) {
      // Postfix evaluation order: the right operand was pushed last.
      let right = self.decompile_expression(stack, false)?;
      let left = self.decompile_expression(stack, false)?;
      return Ok(Expression::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right)
      });
    }

    if let Some(op) = UnaryOp::from_opcode(instruction.op) {
      let operand = self.decompile_expression(stack, false)?;
      return Ok(Expression::Unary {
        op,
        operand: Box::new(operand)
      });
    }

    match instruction.op {
      Opcode::Call => {
        let sym = script
          .symbol_by_address(instruction.data as u32)
          .ok_or(DecompileError::UnresolvedCallTarget {
            target: instruction.data
          })?;
        if sym.ty != DataType::Function || !sym.flags.constant {
          return Err(DecompileError::InvalidCallTarget { index: sym.index });
        }
        self.decompile_call(stack, sym.index, sym.size as usize)
      }
      Opcode::CallExternal => {
        let index = instruction.data as usize;
        let sym =
          script
            .symbol_by_index(index)
            .ok_or(DecompileError::UnresolvedCallTarget {
              target: instruction.data
            })?;
        if sym.ty != DataType::Function || !sym.flags.constant || !sym.flags.external {
          return Err(DecompileError::InvalidCallTarget { index });
        }
        self.decompile_call(stack, index, sym.size as usize)
      }
      Opcode::PushInt => {
        if is_float {
          // MOVF reinterprets the pushed word as an IEEE 754 single.
          Ok(Expression::Float(f32::from_bits(instruction.data as u32)))
        } else {
          Ok(Expression::Int(instruction.data))
        }
      }
      Opcode::PushVar | Opcode::PushInstance => {
        self.decompile_access(frame, instruction.data as usize, None)
      }
      Opcode::PushArrayVar => {
        self.decompile_access(
          frame,
          instruction.data as usize,
          Some(Expression::Int(instruction.index as i32))
        )
      }
      // Anything else producing a value would already have been consumed as
      // a statement; fall back to its raw immediate.
      _ => Ok(Expression::Int(instruction.data))
    }
  }

  fn decompile_call(
    &mut self,
    stack: &mut Vec<StackFrame>,
    target: usize,
    arity: usize
  ) -> Result<Expression, DecompileError> {
    self.ensure_declaration(target)?;

    // Arguments pop in reverse of their source order.
    let mut args = Vec::with_capacity(arity);
    for _ in 0..arity {
      args.push(self.decompile_expression(stack, false)?);
    }
    args.reverse();

    Ok(Expression::Call(CallExpr { target, args }))
  }

  fn decompile_access(
    &mut self,
    frame: StackFrame,
    target: usize,
    index: Option<Expression>
  ) -> Result<Expression, DecompileError> {
    let sym = self
      .script
      .symbol_by_index(target)
      .ok_or(DecompileError::UnresolvedSymbol { index: target })?;

    if self.options.generate_string_literals && sym.flags.generated && !sym.flags.member {
      // Compiler-generated symbols are literal pool slots; inline the value
      // they were generated for instead of naming the slot.
      if sym.flags.constant {
        if let Some(value) = variable_value(sym) {
          return Ok(value);
        }
      }
      if sym.ty == DataType::Instance && sym.address == 0 {
        return Ok(Expression::Int(0));
      }
    }

    self.ensure_declaration(target)?;

    let scope = if sym.flags.member { frame.context } else { None };
    if let Some(ctx) = scope {
      self.ensure_declaration(ctx)?;
    }

    Ok(Expression::Access(AccessExpr {
      target,
      index: index.map(Box::new),
      scope
    }))
  }

  /// Drains leftover stack values into expression statements, preserving the
  /// order in which they were produced.
  fn flush_stack(
    &mut self,
    stack: &mut Vec<StackFrame>,
    block: &mut Block
  ) -> Result<(), DecompileError> {
    let mut flushed = Vec::new();
    while !stack.is_empty() {
      flushed.push(self.decompile_expression(stack, false)?);
    }
    flushed.reverse();
    block
      .code
      .extend(flushed.into_iter().map(Code::Expression));
    Ok(())
  }
}
