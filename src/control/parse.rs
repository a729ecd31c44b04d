/*!
 * Numeric Input Parsing
 * Unsigned integers with automatic base detection
 */

use crate::memory::{MemoryError, MemoryResult};

/// Parse an unsigned 64-bit integer, detecting the base from its prefix
///
/// `0x`/`0X` selects hexadecimal, a leading `0` octal, anything else
/// decimal. One leading `+` and one trailing newline are accepted.
pub fn parse_u64(input: &str) -> MemoryResult<u64> {
    let s = input.strip_suffix('\n').unwrap_or(input);
    let s = s.strip_prefix('+').unwrap_or(s);

    let (digits, radix) = match s.as_bytes() {
        [b'0', b'x' | b'X', rest @ ..] if rest.first().is_some_and(u8::is_ascii_hexdigit) => {
            (&s[2..], 16)
        }
        [b'0', _, ..] => (&s[1..], 8),
        _ => (s, 10),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid(input));
    }

    u64::from_str_radix(digits, radix)
        .map_err(|_| MemoryError::invalid_argument(format!("{:?} is out of range", input.trim_end())))
}

fn invalid(input: &str) -> MemoryError {
    MemoryError::invalid_argument(format!("{:?} is not an unsigned integer", input.trim_end()))
}
