use crate::error::{NcmError, Result};

pub fn parse_hex_array<const N: usize>(hex_str: &str) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    let bytes =
        hex::decode(hex_str.trim()).map_err(|e| NcmError::format(format!("invalid hex: {e}")))?;
    if bytes.len() != N {
        return Err(NcmError::format(format!(
            "expected {N} bytes ({} hex chars), got {}",
            N * 2,
            bytes.len()
        )));
    }
    out.copy_from_slice(&bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_length() {
        let k: [u8; 4] = parse_hex_array(" 0a0B0c0D\n").unwrap();
        assert_eq!(k, [0x0a, 0x0b, 0x0c, 0x0d]);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(parse_hex_array::<16>("0011").is_err());
        assert!(parse_hex_array::<2>("zz11").is_err());
    }
}
