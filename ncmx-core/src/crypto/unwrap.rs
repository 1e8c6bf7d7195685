use aes::Aes128;
use aes::cipher::{BlockDecrypt, KeyInit, generic_array::GenericArray};

use crate::error::{NcmError, Result};

pub const BLOCK_LEN: usize = 16;

/// AES-128-ECB, no IV. The buffer must hold whole blocks.
pub fn aes_ecb_decrypt_in_place(key: &[u8; 16], buf: &mut [u8]) -> Result<()> {
    if buf.is_empty() || buf.len() % BLOCK_LEN != 0 {
        return Err(NcmError::format(format!(
            "ciphertext length {} is not a positive multiple of {BLOCK_LEN}",
            buf.len()
        )));
    }
    let cipher = Aes128::new(GenericArray::from_slice(key));
    for block in buf.chunks_mut(BLOCK_LEN) {
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
    }
    Ok(())
}

/// Strip trailing padding: the last byte counts how many bytes to drop.
pub fn unpad(buf: &mut Vec<u8>) -> Result<()> {
    let n = match buf.last() {
        Some(&n) => n as usize,
        None => return Err(NcmError::Padding("empty plaintext".into())),
    };
    if n == 0 || n > buf.len() {
        return Err(NcmError::Padding(format!(
            "pad count {n} invalid for {} plaintext bytes",
            buf.len()
        )));
    }
    buf.truncate(buf.len() - n);
    Ok(())
}

/// Decrypt and unpad one embedded blob.
pub fn unwrap_blob(key: &[u8; 16], mut blob: Vec<u8>) -> Result<Vec<u8>> {
    aes_ecb_decrypt_in_place(key, &mut blob)?;
    unpad(&mut blob)?;
    Ok(blob)
}
