//! Fixed keys and XOR masks baked into every container.

use super::hex::parse_hex_array;
use crate::error::Result;

/// AES-128 key wrapping the per-track key blob.
pub const CORE_KEY_HEX: &str = "687A4852416D736F356B496E62617857";
/// AES-128 key wrapping the metadata blob.
pub const META_KEY_HEX: &str = "2331346C6A6B5F215C5D2630553C2728";

pub const KEY_BLOB_XOR: u8 = 0x64;
pub const META_BLOB_XOR: u8 = 0x63;

/// Literal prefix in front of the key material (`neteasecloudmusic`).
pub const KEY_PREFIX_LEN: usize = 17;
/// Literal prefix in front of the base64 metadata (`163 key(Don't modify):`).
pub const META_B64_PREFIX_LEN: usize = 22;
/// Literal prefix in front of the metadata JSON (`music:`).
pub const META_JSON_PREFIX_LEN: usize = 6;

pub fn core_key() -> Result<[u8; 16]> {
    parse_hex_array::<16>(CORE_KEY_HEX)
}

pub fn meta_key() -> Result<[u8; 16]> {
    parse_hex_array::<16>(META_KEY_HEX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_keys_are_ascii() {
        assert_eq!(&core_key().unwrap(), b"hzHRAmso5kInbaxW");
        assert_eq!(&meta_key().unwrap(), b"#14ljk_!\\]&0U<'(");
    }
}
