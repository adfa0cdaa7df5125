//! Utility functions for the seal CLI

pub mod reader;

use std::num::ParseIntError;

/// Parse a decimal or `0x` prefixed hexadecimal integer
pub fn parse_u64(value: &str) -> Result<u64, ParseIntError> {
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    }
}
