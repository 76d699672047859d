//! Numeric literal helpers shared by the operand resolver and the `ORG` directive.

/// Convert a decimal literal into two hex digits holding its low byte.
///
/// Values are first clamped into `0..=0xFFFF`. Returns `None` if `text` is not a number.
pub fn decimal_to_hex(text: &str) -> Option<String> {
    let value: i64 = text.trim().parse().ok()?;
    let value = value.clamp(0, 0xFFFF);
    Some(format!("{:02X}", value & 0xFF))
}

/// Convert hex text into bytes, most significant first.
///
/// A leading `$`, `0x` or `0X` is stripped and any non-hex characters are discarded. An odd
/// number of digits is padded with a leading zero. Empty input gives no bytes.
pub fn hex_to_bytes(text: &str) -> Vec<u8> {
    let text = text
        .strip_prefix('$')
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    let mut digits: Vec<u8> = text
        .chars()
        .filter_map(|c| c.to_digit(16))
        .map(|d| d as u8)
        .collect();
    if digits.len() % 2 != 0 {
        digits.insert(0, 0);
    }
    digits
        .chunks_exact(2)
        .map(|pair| (pair[0] << 4) | pair[1])
        .collect()
}

/// Parse an address written in hex, with an optional leading `$`.
pub fn parse_hex_address(text: &str) -> Option<u16> {
    let digits = text.strip_prefix('$').unwrap_or(text);
    if digits.is_empty() {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_low_byte() {
        assert_eq!(decimal_to_hex("5").as_deref(), Some("05"));
        assert_eq!(decimal_to_hex("255").as_deref(), Some("FF"));
        assert_eq!(decimal_to_hex("256").as_deref(), Some("00"));
        assert_eq!(decimal_to_hex("300").as_deref(), Some("2C"));
    }

    #[test]
    fn decimal_clamps() {
        assert_eq!(decimal_to_hex("-4").as_deref(), Some("00"));
        assert_eq!(decimal_to_hex("70000").as_deref(), Some("FF"));
    }

    #[test]
    fn decimal_rejects_words() {
        assert_eq!(decimal_to_hex("abc"), None);
        assert_eq!(decimal_to_hex(""), None);
    }

    #[test]
    fn hex_bytes() {
        assert_eq!(hex_to_bytes("05"), vec![0x05]);
        assert_eq!(hex_to_bytes("$1234"), vec![0x12, 0x34]);
        assert_eq!(hex_to_bytes("0x0060"), vec![0x00, 0x60]);
        assert_eq!(hex_to_bytes("0XaB"), vec![0xAB]);
    }

    #[test]
    fn hex_padding_and_cleaning() {
        assert_eq!(hex_to_bytes("F"), vec![0x0F]);
        assert_eq!(hex_to_bytes("123"), vec![0x01, 0x23]);
        assert_eq!(hex_to_bytes("1g2"), vec![0x12]);
        assert!(hex_to_bytes("").is_empty());
        assert!(hex_to_bytes("$").is_empty());
        assert!(hex_to_bytes("xyz").is_empty());
    }

    #[test]
    fn hex_address() {
        assert_eq!(parse_hex_address("$0050"), Some(0x0050));
        assert_eq!(parse_hex_address("100"), Some(0x0100));
        assert_eq!(parse_hex_address("$"), None);
        assert_eq!(parse_hex_address("$10000"), None);
        assert_eq!(parse_hex_address("START"), None);
    }
}
