//! Interpreter for a tiny teaching assembly language
//!
//! Four instructions (`MOV`, `ADD`, `STORE`, `LOAD`) over a small register file
//! and a fixed-size memory, driven line by line by a [`Machine`].

pub mod runtime;

pub use runtime::executor::{ExecError, Outcome};
pub use runtime::machine::{DriverState, LineDiagnostic, Machine, MachineConfig, RunReport, StepOutcome};
pub use runtime::memory::Memory;
pub use runtime::registers::{Register, RegisterBank, RegisterSet};
pub use runtime::render::{MemoryLayout, RenderConfig, StateView, render};
pub use runtime::snapshot::StateSnapshot;
