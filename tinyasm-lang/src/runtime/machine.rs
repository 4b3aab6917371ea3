//! Program driver of the toy machine
//!
//! A [`Machine`] is one session: the loaded program, the cursor into it, the
//! register bank and the memory. Nothing is global, several machines can live
//! side by side.

use serde::{Deserialize, Serialize};

use super::executor::{self, ExecError, Outcome};
use super::memory::{DEFAULT_MEMORY_SIZE, Memory};
use super::registers::{Register, RegisterBank, RegisterSet};
use super::snapshot::StateSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub memory_size: usize,
    pub register_set: RegisterSet,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            register_set: RegisterSet::Base,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Empty,
    Loaded,
    Stepping,
    Halted,
}

/// A diagnostic tied to the source line that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiagnostic {
    pub line: usize,
    pub text: String,
    pub error: ExecError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Lines visited, blank and comment lines included.
    pub executed: usize,
    pub diagnostics: Vec<LineDiagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Executed {
        line: usize,
        text: String,
        diagnostic: Option<ExecError>,
    },
    EndOfProgram,
}

#[derive(Debug, Clone)]
pub struct Machine {
    config: MachineConfig,
    state: DriverState,

    pub program: Vec<String>,
    pub cursor: usize,

    pub registers: RegisterBank,
    pub memory: Memory,
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        Self {
            config,
            state: DriverState::Empty,
            program: Vec::new(),
            cursor: 0,
            registers: RegisterBank::new(config.register_set),
            memory: Memory::new(config.memory_size),
        }
    }

    pub fn config(&self) -> MachineConfig {
        self.config
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.program.len()
    }

    /// Replace the program. Registers and memory keep their values, only the
    /// cursor and IP go back to the first line.
    pub fn load(&mut self, text: &str) {
        self.program = text.lines().map(|l| l.trim().to_string()).collect();
        self.cursor = 0;
        self.sync_ip();
        self.state = DriverState::Loaded;

        log::debug!("load: {} lines", self.program.len());
    }

    fn sync_ip(&mut self) {
        self.registers.put(Register::IP, self.cursor as i64);
    }

    /// Execute the line under the cursor and move past it.
    fn cycle(&mut self) -> (usize, Result<Outcome, ExecError>) {
        let line = self.cursor;
        let result = executor::execute(&self.program[line], &mut self.registers, &mut self.memory);

        self.cursor += 1;
        self.sync_ip();

        if let Err(err) = &result {
            log::warn!("line {}: {}", line + 1, err);
        }

        (line, result)
    }

    /// Run every remaining line. Diagnostics are collected, they never stop the loop.
    pub fn run_to_completion(&mut self) -> RunReport {
        let mut report = RunReport::default();

        while !self.is_finished() {
            let (line, result) = self.cycle();
            report.executed += 1;

            if let Err(error) = result {
                report.diagnostics.push(LineDiagnostic {
                    line,
                    text: self.program[line].clone(),
                    error,
                });
            }
        }

        self.state = DriverState::Halted;
        log::debug!(
            "run: {} lines, {} diagnostics",
            report.executed,
            report.diagnostics.len()
        );

        report
    }

    pub fn step(&mut self) -> StepOutcome {
        if self.is_finished() {
            return StepOutcome::EndOfProgram;
        }

        let (line, result) = self.cycle();
        self.state = if self.is_finished() {
            DriverState::Halted
        } else {
            DriverState::Stepping
        };

        StepOutcome::Executed {
            line,
            text: self.program[line].clone(),
            diagnostic: result.err(),
        }
    }

    /// Zero registers, memory and the cursor. The loaded program is kept.
    pub fn reset(&mut self) {
        self.registers.clear();
        self.memory.clear();
        self.cursor = 0;
        self.sync_ip();

        self.state = if self.program.is_empty() {
            DriverState::Empty
        } else {
            DriverState::Loaded
        };
    }

    pub fn dump(&self) -> &[i64] {
        self.memory.cells()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            registers: self
                .registers
                .iter()
                .map(|(reg, value)| (reg.name().to_string(), value))
                .collect(),
            flags: None,
            ip: Some(self.registers.get(Register::IP)),
            memory: Some(self.memory.cells().to_vec()),
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}
