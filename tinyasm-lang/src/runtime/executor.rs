//! Instruction executor
//!
//! Executes a single source line against a register bank and a memory. A
//! failing instruction is aborted before it writes anything, so a diagnostic
//! never leaves half an instruction applied.

use thiserror::Error;

use super::memory::Memory;
use super::parser::{self, Line, Mnemonic};
use super::registers::{Register, RegisterBank};

/// Per-instruction diagnostics. None of them stop a run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecError {
    #[error("unknown instruction: {0}")]
    UnknownInstruction(String),

    #[error("malformed operands for {mnemonic}: '{operands}'")]
    MalformedOperands { mnemonic: String, operands: String },

    #[error("unknown register '{0}'")]
    UnknownRegister(String),

    #[error("register {0} cannot be written by instructions")]
    ReadOnlyRegister(Register),

    #[error("invalid immediate '{0}'")]
    InvalidImmediate(String),

    #[error("memory address {addr} out of range (memory has {size} cells)")]
    AddressOutOfRange { addr: i64, size: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Executed(Mnemonic),
    Skipped,
}

/// Resolve a register that an instruction is about to overwrite.
fn destination(regs: &RegisterBank, name: &str) -> Result<Register, ExecError> {
    let reg = regs.resolve(name)?;
    if reg == Register::IP {
        return Err(ExecError::ReadOnlyRegister(reg));
    }
    Ok(reg)
}

pub fn execute(line: &str, regs: &mut RegisterBank, mem: &mut Memory) -> Result<Outcome, ExecError> {
    let (mnemonic, [first, second]) = match parser::parse_line(line)? {
        Line::Blank => return Ok(Outcome::Skipped),
        Line::Instruction { mnemonic, operands } => (mnemonic, operands),
    };

    match mnemonic {
        Mnemonic::MOV => {
            // mov <dst>, <imm>
            let dst = destination(regs, first)?;
            let value = parser::parse_immediate(second)?;
            regs.put(dst, value);
        }
        Mnemonic::ADD => {
            // add <dst>, <imm>
            let dst = destination(regs, first)?;
            let value = parser::parse_immediate(second)?;
            regs.put(dst, regs.get(dst).wrapping_add(value));
        }
        Mnemonic::STORE => {
            // store <src>, <addr>
            let src = regs.resolve(first)?;
            let addr = parser::parse_immediate(second)?;
            mem.write(addr, regs.get(src))?;
        }
        Mnemonic::LOAD => {
            // load <dst>, <addr>
            let dst = destination(regs, first)?;
            let addr = parser::parse_immediate(second)?;
            let value = mem.read(addr)?;
            regs.put(dst, value);
        }
    }

    log::trace!("execute: {:?} {}, {}", mnemonic, first, second);
    Ok(Outcome::Executed(mnemonic))
}
