//! Hex text for element payloads: `--hex` input and the `hex` output field.

use std::fmt::Write as _;

use crate::exit::{CliError, CliResult, USAGE};

/// Lowercase, two digits per byte, no separators.
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Parse hex digits of either case. An optional `0x` prefix and any
/// whitespace between digits are ignored.
pub fn decode(input: &str) -> CliResult<Vec<u8>> {
    let trimmed = input.trim();
    let digits: Vec<u8> = trimmed
        .strip_prefix("0x")
        .unwrap_or(trimmed)
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    if digits.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "--hex needs an even number of digits"));
    }

    digits
        .chunks(2)
        .map(|pair| match (digit_value(pair[0]), digit_value(pair[1])) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(CliError::new(
                USAGE,
                format!("invalid hex digits: {}", String::from_utf8_lossy(pair)),
            )),
        })
        .collect()
}

fn digit_value(digit: u8) -> Option<u8> {
    char::from(digit).to_digit(16).map(|v| v as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_is_lowercase_and_padded() {
        assert_eq!(encode(&[0x00, 0x0a, 0xff]), "000aff");
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn decode_accepts_prefix_case_and_whitespace() {
        assert_eq!(decode("0xdeadBEEF").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode("00 11\n22").unwrap(), vec![0x00, 0x11, 0x22]);
    }

    #[test]
    fn decode_rejects_bad_input() {
        assert_eq!(decode("abc").unwrap_err().code, USAGE);
        assert_eq!(decode("zz").unwrap_err().code, USAGE);
        assert_eq!(decode("0x0x00").unwrap_err().code, USAGE);
    }

    #[test]
    fn printed_hex_is_accepted_as_input() {
        let element = [0x00, 0x7f, 0x80, 0xff, b'a'];
        assert_eq!(decode(&encode(&element)).unwrap(), element);
        assert_eq!(decode(&encode(&element).to_uppercase()).unwrap(), element);
    }
}
