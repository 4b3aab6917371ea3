//! Line parser for the toy assembly syntax
//!
//! One instruction per line: a mnemonic followed by a comma separated operand
//! pair, e.g. `MOV AX, 10`. Everything after a `;` is a comment. There is no
//! AST, every line is parsed again when it executes.

use std::str::FromStr;

use super::executor::ExecError;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    MOV = 0x01,
    ADD = 0x02,
    STORE = 0x03,
    LOAD = 0x04,
}

impl FromStr for Mnemonic {
    type Err = ExecError;

    fn from_str(word: &str) -> Result<Self, Self::Err> {
        let upper = word.to_ascii_uppercase();
        match upper.as_str() {
            "MOV" => Ok(Mnemonic::MOV),
            "ADD" => Ok(Mnemonic::ADD),
            "STORE" => Ok(Mnemonic::STORE),
            "LOAD" => Ok(Mnemonic::LOAD),
            _ => Err(ExecError::UnknownInstruction(upper)),
        }
    }
}

/// A parsed source line. Operands are kept as text and resolved at execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'l> {
    Blank,
    Instruction {
        mnemonic: Mnemonic,
        operands: [&'l str; 2],
    },
}

/// Drop the comment part of a line and trim what is left.
pub fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(pos) => line[..pos].trim(),
        None => line.trim(),
    }
}

pub fn parse_line(line: &str) -> Result<Line<'_>, ExecError> {
    let code = strip_comment(line);
    if code.is_empty() {
        return Ok(Line::Blank);
    }

    let (word, rest) = match code.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (code, ""),
    };
    let mnemonic: Mnemonic = word.parse()?;

    let operands: Vec<&str> = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(str::trim).collect()
    };

    match operands.as_slice() {
        [first, second] if !first.is_empty() && !second.is_empty() => Ok(Line::Instruction {
            mnemonic,
            operands: [*first, *second],
        }),
        _ => Err(ExecError::MalformedOperands {
            mnemonic: format!("{:?}", mnemonic),
            operands: rest.to_string(),
        }),
    }
}

/// Parse an integer literal: optional sign, then decimal or a `0x`, `0b`,
/// `0o` prefixed number.
pub fn parse_immediate(text: &str) -> Result<i64, ExecError> {
    let invalid = || ExecError::InvalidImmediate(text.to_string());

    let trimmed = text.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(hex) = lower.strip_prefix("0x") {
        (16, hex)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (2, bin)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        (8, oct)
    } else {
        (10, lower.as_str())
    };

    // from_str_radix would accept a second sign
    if body.is_empty() || body.starts_with(['+', '-']) {
        return Err(invalid());
    }

    // i128 so that i64::MIN survives the negation
    let magnitude = i128::from_str_radix(body, radix).map_err(|_| invalid())?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).map_err(|_| invalid())
}
