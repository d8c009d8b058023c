//! Additive checksum used by the bridge register protocol.

/// Low byte of the sum of all `bytes`.
///
/// # Examples
///
/// ```
/// use regbridge_protocol::checksum;
///
/// assert_eq!(checksum(&[0xEF, 0xEF, 0x00, 0x06]), 0xE4);
/// assert_eq!(checksum(&[]), 0x00);
/// ```
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Space separated upper-case hex rendering, used for frame tracing.
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(checksum(&[0xFF, 0x01]), 0x00);
        assert_eq!(checksum(&[0xFF, 0xFF, 0xFF]), 0xFD);
    }

    #[test]
    fn test_checksum_matches_wide_sum() {
        let bytes: Vec<u8> = (0..=255).collect();
        let wide: u32 = bytes.iter().map(|&b| b as u32).sum();
        assert_eq!(checksum(&bytes), (wide & 0xFF) as u8);
    }

    #[test]
    fn test_hex_dump() {
        assert_eq!(hex_dump(&[0xEF, 0x0A, 0x00]), "EF 0A 00");
        assert_eq!(hex_dump(&[]), "");
    }
}
