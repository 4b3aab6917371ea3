//! Reference execution backend
//!
//! Implements the backend side of the wire protocol on top of a local
//! [`Machine`] with the extended register set. It is what [`LocalTransport`]
//! talks to, for offline use and for exercising the client.
//!
//! [`LocalTransport`]: crate::transport::LocalTransport

use serde_json::Value;
use tinyasm_lang::runtime::parser;
use tinyasm_lang::{Machine, MachineConfig, Register, RegisterSet, StateSnapshot, StepOutcome};

use crate::protocol::{Endpoint, LoadRequest, Response, Segments};

pub const BACKEND_MEMORY_SIZE: usize = 256;

pub struct Backend {
    machine: Machine,
}

impl Backend {
    pub fn new(config: MachineConfig) -> Self {
        Self {
            machine: Machine::new(config),
        }
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Backend state as sent on the wire, memory as little-endian bytes.
    pub fn state(&self) -> StateSnapshot {
        let mut snapshot = self.machine.snapshot();
        snapshot.memory = Some(self.memory_bytes());
        snapshot
    }

    fn memory_bytes(&self) -> Vec<i64> {
        self.machine
            .memory
            .to_le_bytes()
            .into_iter()
            .map(i64::from)
            .collect()
    }

    /// Answer one request with a status code and a response body.
    pub fn handle(&mut self, endpoint: Endpoint, body: &Value) -> (u16, Response) {
        log::debug!("backend: {} {}", endpoint, body);

        match endpoint {
            Endpoint::Load => match serde_json::from_value::<LoadRequest>(body.clone()) {
                Ok(request) => self.load(request),
                Err(err) => (400, Response::error(format!("invalid load request: {}", err))),
            },
            Endpoint::Run => (200, self.run()),
            Endpoint::Step => (200, self.step()),
            Endpoint::Reset => (200, self.reset()),
            Endpoint::Dump => (200, self.dump()),
        }
    }

    fn load(&mut self, request: LoadRequest) -> (u16, Response) {
        if request.code.trim().is_empty() {
            return (400, Response::error("no code received"));
        }

        self.machine.load(&request.code);
        self.apply_segments(request.segments);

        let mut response = Response::message("program loaded");
        response.state = Some(self.state());
        (200, response)
    }

    fn apply_segments(&mut self, segments: Segments) {
        let values = [segments.cs, segments.ds, segments.ss, segments.es];
        for (reg, value) in Register::SEGMENTS.into_iter().zip(values) {
            self.machine.registers.put(reg, value);
        }
    }

    /// Step once, appending what happened to `logs`. Returns false at the end
    /// of the program.
    fn step_into(&mut self, logs: &mut Vec<String>) -> bool {
        match self.machine.step() {
            StepOutcome::EndOfProgram => false,
            StepOutcome::Executed {
                line,
                text,
                diagnostic,
            } => {
                let code = parser::strip_comment(&text);
                if !code.is_empty() {
                    logs.push(format!("[IP={:04X}] {}", line, code));
                }
                if let Some(err) = diagnostic {
                    logs.push(format!("error on line {}: {}", line + 1, err));
                }
                true
            }
        }
    }

    fn run(&mut self) -> Response {
        let mut logs = Vec::new();
        while self.step_into(&mut logs) {}

        Response {
            logs: Some(logs),
            state: Some(self.state()),
            ..Response::default()
        }
    }

    fn step(&mut self) -> Response {
        let mut logs = Vec::new();
        if !self.step_into(&mut logs) {
            logs.push("end of program".to_string());
        }

        Response {
            logs: Some(logs),
            state: Some(self.state()),
            ..Response::default()
        }
    }

    fn reset(&mut self) -> Response {
        self.machine.reset();

        let mut response = Response::message("simulator reset");
        response.state = Some(self.state());
        response
    }

    fn dump(&self) -> Response {
        let mut response = Response::message("memory dumped");
        response.memory = Some(self.memory_bytes());
        response
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::new(MachineConfig {
            memory_size: BACKEND_MEMORY_SIZE,
            register_set: RegisterSet::Extended,
        })
    }
}
