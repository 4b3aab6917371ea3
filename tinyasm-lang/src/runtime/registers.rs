//! Register file of the toy machine
//!
//! Registers form a closed set. A bank is built for either the base set
//! (`AX BX CX DX IP`) or the extended set used by the remote backend, and only
//! ever holds the registers of that set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::executor::ExecError;

const REGISTER_COUNT: usize = 13;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Register {
    AX = 0x00,
    BX = 0x01,
    CX = 0x02,
    DX = 0x03,

    // Index and pointer registers
    SI = 0x04,
    DI = 0x05,
    BP = 0x06,
    SP = 0x07,
    IP = 0x08,

    // Segment registers
    CS = 0x09,
    DS = 0x0A,
    SS = 0x0B,
    ES = 0x0C,
}

impl Register {
    /// Canonical display order, base registers first.
    pub const ALL: [Register; REGISTER_COUNT] = [
        Register::AX,
        Register::BX,
        Register::CX,
        Register::DX,
        Register::SI,
        Register::DI,
        Register::BP,
        Register::SP,
        Register::IP,
        Register::CS,
        Register::DS,
        Register::SS,
        Register::ES,
    ];

    pub const BASE: [Register; 5] = [
        Register::AX,
        Register::BX,
        Register::CX,
        Register::DX,
        Register::IP,
    ];

    pub const SEGMENTS: [Register; 4] = [Register::CS, Register::DS, Register::SS, Register::ES];

    pub fn name(self) -> &'static str {
        match self {
            Register::AX => "AX",
            Register::BX => "BX",
            Register::CX => "CX",
            Register::DX => "DX",
            Register::SI => "SI",
            Register::DI => "DI",
            Register::BP => "BP",
            Register::SP => "SP",
            Register::IP => "IP",
            Register::CS => "CS",
            Register::DS => "DS",
            Register::SS => "SS",
            Register::ES => "ES",
        }
    }

    /// Position in [`Register::ALL`], used to order rendered rows.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Register {
    type Err = ExecError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let upper = name.trim().to_ascii_uppercase();
        Register::ALL
            .iter()
            .copied()
            .find(|reg| reg.name() == upper)
            .ok_or(ExecError::UnknownRegister(upper))
    }
}

/// Which registers a bank carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterSet {
    #[default]
    Base,
    Extended,
}

impl RegisterSet {
    pub fn registers(self) -> &'static [Register] {
        match self {
            RegisterSet::Base => &Register::BASE,
            RegisterSet::Extended => &Register::ALL,
        }
    }

    pub fn contains(self, reg: Register) -> bool {
        self.registers().contains(&reg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterBank {
    set: RegisterSet,
    values: [i64; REGISTER_COUNT],
}

impl RegisterBank {
    pub fn new(set: RegisterSet) -> Self {
        Self {
            set,
            values: [0; REGISTER_COUNT],
        }
    }

    pub fn set(&self) -> RegisterSet {
        self.set
    }

    /// Resolve a register name from source text against this bank.
    pub fn resolve(&self, name: &str) -> Result<Register, ExecError> {
        let reg: Register = name.parse()?;
        if self.set.contains(reg) {
            Ok(reg)
        } else {
            Err(ExecError::UnknownRegister(reg.name().to_string()))
        }
    }

    pub fn get(&self, reg: Register) -> i64 {
        self.values[reg.index()]
    }

    /// Write a register. Writes to registers outside the bank's set are dropped,
    /// callers resolve names through [`RegisterBank::resolve`] first.
    pub fn put(&mut self, reg: Register, value: i64) {
        if self.set.contains(reg) {
            self.values[reg.index()] = value;
        }
    }

    pub fn clear(&mut self) {
        self.values = [0; REGISTER_COUNT];
    }

    /// Registers of the active set with their values, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Register, i64)> + '_ {
        self.set
            .registers()
            .iter()
            .map(move |&reg| (reg, self.get(reg)))
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new(RegisterSet::Base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("ax".parse::<Register>().unwrap(), Register::AX);
        assert_eq!(" Ds ".parse::<Register>().unwrap(), Register::DS);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "EAX".parse::<Register>().unwrap_err();
        assert_eq!(err, ExecError::UnknownRegister("EAX".to_string()));
    }

    #[test]
    fn base_bank_rejects_extended_registers() {
        let bank = RegisterBank::new(RegisterSet::Base);
        assert!(bank.resolve("bx").is_ok());
        assert_eq!(
            bank.resolve("si").unwrap_err(),
            ExecError::UnknownRegister("SI".to_string())
        );
    }

    #[test]
    fn every_register_of_the_set_is_present() {
        let bank = RegisterBank::new(RegisterSet::Extended);
        let names: Vec<_> = bank.iter().map(|(reg, _)| reg.name()).collect();
        assert_eq!(names.len(), 13);
        assert_eq!(names[0], "AX");
        assert_eq!(names[12], "ES");
        assert!(bank.iter().all(|(_, value)| value == 0));
    }

    #[test]
    fn clear_zeroes_everything() {
        let mut bank = RegisterBank::new(RegisterSet::Base);
        bank.put(Register::AX, 7);
        bank.put(Register::IP, 3);
        bank.clear();
        assert!(bank.iter().all(|(_, value)| value == 0));
    }
}
