//! Size strings with binary unit suffixes
//!
//! Sizes are written as an integer with an optional unit: `K`, `M`, `G`,
//! `T` or `P` (base 1024, case-insensitive). A bare number is bytes.

use thiserror::Error;

const UNITS: [(char, u32); 5] = [('K', 1), ('M', 2), ('G', 3), ('T', 4), ('P', 5)];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeError {
    #[error("empty size")]
    Empty,
    #[error("'{0}' is not a whole number")]
    InvalidNumber(String),
    #[error("unknown unit '{0}', expected one of K, M, G, T, P")]
    UnknownUnit(char),
    #[error("'{0}' does not fit in 64 bits")]
    Overflow(String),
}

fn multiplier(power: u32) -> u64 {
    1024u64.pow(power)
}

/// Parse a size string into bytes
pub fn parse_size(input: &str) -> Result<u64, SizeError> {
    let text = input.trim();
    let last = text.chars().last().ok_or(SizeError::Empty)?;

    let (digits, power) = if last.is_ascii_alphabetic() {
        let unit = last.to_ascii_uppercase();
        let power = UNITS
            .iter()
            .find(|(u, _)| *u == unit)
            .map(|(_, p)| *p)
            .ok_or(SizeError::UnknownUnit(last))?;
        (text[..text.len() - last.len_utf8()].trim_end(), power)
    } else {
        (text, 0)
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SizeError::InvalidNumber(digits.to_string()));
    }
    let value: u64 = digits
        .parse()
        .map_err(|_| SizeError::Overflow(text.to_string()))?;
    value
        .checked_mul(multiplier(power))
        .ok_or_else(|| SizeError::Overflow(text.to_string()))
}

/// Format bytes with the largest unit that divides them exactly
///
/// `parse_size(&format_size(n)) == n` for every `n`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0".to_string();
    }
    for (unit, power) in UNITS.iter().rev() {
        let m = multiplier(*power);
        if bytes % m == 0 {
            return format!("{}{}", bytes / m, unit);
        }
    }
    bytes.to_string()
}
