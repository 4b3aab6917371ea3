//! Projects a [`StateSnapshot`] into display rows for the register, flag and
//! memory panels. Nothing here knows about the presentation layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::registers::Register;
use super::snapshot::StateSnapshot;

/// How the memory sequence of a snapshot is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryLayout {
    /// Every entry is one cell.
    Cells,
    /// Entries are bytes, shown as little-endian 16-bit words.
    ByteWords,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub memory_layout: MemoryLayout,
    pub max_memory_rows: Option<usize>,
    pub hex_width: usize,
}

impl RenderConfig {
    /// The local interpreter keeps whole cells.
    pub fn local() -> Self {
        Self {
            memory_layout: MemoryLayout::Cells,
            max_memory_rows: None,
            hex_width: 4,
        }
    }

    /// Backends send raw bytes and usually far more memory than fits a panel.
    pub fn remote() -> Self {
        Self {
            memory_layout: MemoryLayout::ByteWords,
            max_memory_rows: Some(64),
            hex_width: 4,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::local()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRow {
    pub name: String,
    pub value: i64,
    pub hex: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagRow {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRow {
    pub address: usize,
    pub value: i64,
    pub hex: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateView {
    pub registers: Vec<RegisterRow>,
    pub ip: Option<RegisterRow>,
    pub flags: Vec<FlagRow>,
    pub memory: Vec<MemoryRow>,
    /// Memory rows left out by `max_memory_rows`.
    pub hidden_memory_rows: usize,
}

pub fn format_hex(value: i64, width: usize) -> String {
    if value < 0 {
        format!("-0x{:0width$X}", value.unsigned_abs(), width = width)
    } else {
        format!("0x{:0width$X}", value, width = width)
    }
}

/// Group a byte stream into little-endian 16-bit words. A trailing odd byte
/// becomes a word with a zero high byte.
pub fn bytes_to_words(bytes: &[i64]) -> Vec<i64> {
    bytes
        .chunks(2)
        .map(|pair| {
            let low = pair[0] & 0xFF;
            let high = pair.get(1).map_or(0, |b| b & 0xFF);
            low | (high << 8)
        })
        .collect()
}

fn register_row(name: &str, value: i64, cfg: &RenderConfig) -> RegisterRow {
    RegisterRow {
        name: name.to_ascii_uppercase(),
        value,
        hex: format_hex(value, cfg.hex_width),
    }
}

/// Known registers in canonical order, anything else a backend sends after
/// them by name.
fn register_order(name: &str) -> (usize, String) {
    let upper = name.to_ascii_uppercase();
    match upper.parse::<Register>() {
        Ok(reg) => (reg.index(), upper),
        Err(_) => (usize::MAX, upper),
    }
}

pub fn render(snapshot: &StateSnapshot, cfg: &RenderConfig) -> StateView {
    let mut registers: Vec<_> = snapshot
        .registers
        .iter()
        .map(|(name, &value)| register_row(name, value, cfg))
        .collect();
    registers.sort_by_key(|row| register_order(&row.name));

    let ip = snapshot
        .ip
        .map(|value| register_row("IP", value, cfg))
        .or_else(|| registers.iter().find(|row| row.name == "IP").cloned());

    let flags = snapshot
        .flags
        .iter()
        .flatten()
        .map(|(name, &value)| FlagRow {
            name: name.to_ascii_uppercase(),
            value,
        })
        .collect();

    let entries = match (&snapshot.memory, cfg.memory_layout) {
        (None, _) => Vec::new(),
        (Some(cells), MemoryLayout::Cells) => cells.clone(),
        (Some(bytes), MemoryLayout::ByteWords) => bytes_to_words(bytes),
    };
    let stride = match cfg.memory_layout {
        MemoryLayout::Cells => 1,
        MemoryLayout::ByteWords => 2,
    };
    let shown = cfg.max_memory_rows.unwrap_or(entries.len()).min(entries.len());

    let memory = entries
        .iter()
        .take(shown)
        .enumerate()
        .map(|(i, &value)| MemoryRow {
            address: i * stride,
            value,
            hex: format_hex(value, cfg.hex_width),
        })
        .collect();

    StateView {
        registers,
        ip,
        flags,
        memory,
        hidden_memory_rows: entries.len() - shown,
    }
}

impl fmt::Display for RegisterRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.name, self.hex, self.value)
    }
}

impl fmt::Display for FlagRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

impl fmt::Display for MemoryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:04X}] -> {} ({})", self.address, self.hex, self.value)
    }
}

impl fmt::Display for StateView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "------------------------------------------------------------")?;
        for row in &self.registers {
            writeln!(f, "{}", row)?;
        }
        if let Some(ip) = &self.ip {
            if !self.registers.iter().any(|row| row.name == "IP") {
                writeln!(f, "{}", ip)?;
            }
        }

        if !self.flags.is_empty() {
            let flags: Vec<String> = self.flags.iter().map(|flag| flag.to_string()).collect();
            writeln!(f, "FLAGS [{}]", flags.join(" "))?;
        }

        writeln!(f, "------------------------------------------------------------")?;
        for row in &self.memory {
            writeln!(f, "{}", row)?;
        }
        if self.hidden_memory_rows > 0 {
            writeln!(f, "... {} more", self.hidden_memory_rows)?;
        }

        Ok(())
    }
}
