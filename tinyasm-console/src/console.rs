//! Console front-end
//!
//! Holds what the page shows: the editor text, the console log and the
//! rendered register/memory panels. The five actions mirror the page's
//! buttons and run either against a local [`Machine`] or a remote backend.
//! Failures end up in the log, never as errors to the caller.

use std::fmt;

use tinyasm_lang::{Machine, RenderConfig, StateSnapshot, StateView, StepOutcome, render};

use crate::client::{ClientResult, RemoteClient};
use crate::protocol::{Response, Segments};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub text: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Level::Info => write!(f, "{}", self.text),
            Level::Error => write!(f, "error: {}", self.text),
        }
    }
}

pub enum Mode<T: Transport> {
    Local(Machine),
    Remote {
        client: RemoteClient<T>,
        segments: Segments,
    },
}

pub struct Console<T: Transport> {
    mode: Mode<T>,
    render_config: RenderConfig,

    pub editor: String,
    log: Vec<LogEntry>,
    log_epoch: usize,
    view: StateView,
}

impl<T: Transport> Console<T> {
    pub fn local(machine: Machine, render_config: RenderConfig) -> Self {
        let view = render(&machine.snapshot(), &render_config);
        Self {
            mode: Mode::Local(machine),
            render_config,
            editor: String::new(),
            log: Vec::new(),
            log_epoch: 0,
            view,
        }
    }

    pub fn remote(client: RemoteClient<T>, segments: Segments, render_config: RenderConfig) -> Self {
        Self {
            mode: Mode::Remote { client, segments },
            render_config,
            editor: String::new(),
            log: Vec::new(),
            log_epoch: 0,
            view: StateView::default(),
        }
    }

    pub fn mode(&self) -> &Mode<T> {
        &self.mode
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Bumped every time an action clears the log.
    pub fn log_epoch(&self) -> usize {
        self.log_epoch
    }

    pub fn view(&self) -> &StateView {
        &self.view
    }

    /// Buttons are disabled while a remote request is in flight.
    pub fn controls_enabled(&self) -> bool {
        match &self.mode {
            Mode::Local(_) => true,
            Mode::Remote { client, .. } => !client.is_busy(),
        }
    }

    fn clear_log(&mut self) {
        self.log.clear();
        self.log_epoch += 1;
    }

    fn info(&mut self, text: impl Into<String>) {
        self.log.push(LogEntry {
            level: Level::Info,
            text: text.into(),
        });
    }

    fn error(&mut self, text: impl Into<String>) {
        self.log.push(LogEntry {
            level: Level::Error,
            text: text.into(),
        });
    }

    fn show(&mut self, snapshot: &StateSnapshot) {
        self.view = render(snapshot, &self.render_config);
    }

    fn show_local(&mut self) {
        if let Mode::Local(machine) = &self.mode {
            let snapshot = machine.snapshot();
            self.show(&snapshot);
        }
    }

    /// Log the remote failure, or hand the response back.
    fn remote_reply(&mut self, result: ClientResult<Response>) -> Option<Response> {
        match result {
            Ok(response) => Some(response),
            Err(err) => {
                self.error(err.to_string());
                None
            }
        }
    }

    /// Surface backend logs in order, then its state if there is one.
    fn absorb(&mut self, response: &Response) {
        for line in response.logs.iter().flatten() {
            self.info(line.clone());
        }
        if let Some(state) = &response.state {
            self.show(state);
        }
    }

    fn append_memory(&mut self, memory: Vec<i64>) {
        let snapshot = StateSnapshot {
            memory: Some(memory),
            ..StateSnapshot::default()
        };
        let view = render(&snapshot, &self.render_config);

        self.info("memory dump:");
        for row in &view.memory {
            self.info(row.to_string());
        }
        if view.hidden_memory_rows > 0 {
            self.info(format!("... {} more", view.hidden_memory_rows));
        }
    }

    pub fn load(&mut self) {
        match &mut self.mode {
            Mode::Local(machine) => {
                machine.load(&self.editor);
                self.clear_log();
                self.info("> program loaded");
                self.show_local();
            }
            Mode::Remote { client, segments } => {
                let result = client.load(&self.editor, *segments);
                if let Some(response) = self.remote_reply(result) {
                    self.clear_log();
                    let message = response.message.as_deref().unwrap_or("program loaded");
                    self.info(format!("> {}", message));
                    self.absorb(&response);
                }
            }
        }
    }

    pub fn run(&mut self) {
        match &mut self.mode {
            Mode::Local(machine) => {
                let report = machine.run_to_completion();
                self.clear_log();
                self.info("> running program...");
                for diag in &report.diagnostics {
                    self.error(format!("line {}: {}", diag.line + 1, diag.error));
                }
                self.info("execution finished");
                self.show_local();
            }
            Mode::Remote { client, .. } => {
                let result = client.run();
                if let Some(response) = self.remote_reply(result) {
                    self.clear_log();
                    self.info("> running program...");
                    self.absorb(&response);
                    if let Some(message) = &response.message {
                        self.info(message.clone());
                    }
                    self.info("execution finished");
                }
            }
        }
    }

    pub fn step(&mut self) {
        match &mut self.mode {
            Mode::Local(machine) => match machine.step() {
                StepOutcome::EndOfProgram => self.info("end of program"),
                StepOutcome::Executed {
                    text, diagnostic, ..
                } => {
                    self.info(format!("executing: {}", text));
                    if let Some(err) = diagnostic {
                        self.error(err.to_string());
                    }
                    self.show_local();
                }
            },
            Mode::Remote { client, .. } => {
                let result = client.step();
                if let Some(response) = self.remote_reply(result) {
                    self.absorb(&response);
                }
            }
        }
    }

    pub fn reset(&mut self) {
        match &mut self.mode {
            Mode::Local(machine) => {
                machine.reset();
                self.clear_log();
                self.info("> simulator reset");
                self.show_local();
            }
            Mode::Remote { client, .. } => {
                let result = client.reset();
                if let Some(response) = self.remote_reply(result) {
                    self.clear_log();
                    let message = response.message.as_deref().unwrap_or("simulator reset");
                    self.info(format!("> {}", message));
                    self.absorb(&response);
                }
            }
        }
    }

    pub fn dump(&mut self) {
        match &mut self.mode {
            Mode::Local(machine) => {
                let cells = machine.dump().to_vec();
                self.append_memory(cells);
            }
            Mode::Remote { client, .. } => {
                let result = client.dump();
                if let Some(response) = self.remote_reply(result) {
                    match response.memory {
                        Some(memory) => self.append_memory(memory),
                        None => {
                            let message = response.message.as_deref().unwrap_or("no memory returned");
                            self.info(message.to_string());
                        }
                    }
                }
            }
        }
    }
}
