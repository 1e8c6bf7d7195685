//! Per-track key recovery, the 256-entry key schedule and the keystream
//! lookup table derived from it.

use super::keys::{KEY_PREFIX_LEN, core_key};
use super::unwrap::unwrap_blob;
use crate::error::{NcmError, Result};

/// Recovered per-track key. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyMaterial(Vec<u8>);

impl KeyMaterial {
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(NcmError::format("empty key material"));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Unwrap a key blob whose XOR mask has already been removed.
    pub fn recover(blob: Vec<u8>) -> Result<Self> {
        let plain = unwrap_blob(&core_key()?, blob)?;
        if plain.len() <= KEY_PREFIX_LEN {
            return Err(NcmError::format(format!(
                "key blob unwraps to {} bytes, need more than {KEY_PREFIX_LEN}",
                plain.len()
            )));
        }
        Self::new(plain[KEY_PREFIX_LEN..].to_vec())
    }
}

/// Byte permutation of 0..=255 derived from the key material.
#[derive(Clone, PartialEq, Eq)]
pub struct KeySchedule([u8; 256]);

impl KeySchedule {
    pub fn new(key: &KeyMaterial) -> Self {
        let k = key.as_bytes();
        let mut p = [0u8; 256];
        for (i, v) in p.iter_mut().enumerate() {
            *v = i as u8;
        }

        let mut last: u8 = 0;
        let mut cursor = 0usize;
        for i in 0..256 {
            let swap = p[i];
            let c = swap.wrapping_add(last).wrapping_add(k[cursor]);
            cursor = (cursor + 1) % k.len();
            // Order matters: read p[c] before writing it.
            p[i] = p[c as usize];
            p[c as usize] = swap;
            last = c;
        }
        Self(p)
    }

    pub fn as_bytes(&self) -> &[u8; 256] {
        &self.0
    }
}

impl std::fmt::Debug for KeySchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("KeySchedule").field(&hex::encode(self.0)).finish()
    }
}

/// `T[j] = P[P[j] + P[P[j] + j]]`, all indices mod 256.
#[derive(Clone, PartialEq, Eq)]
pub struct KeystreamTable([u8; 256]);

impl KeystreamTable {
    pub fn new(schedule: &KeySchedule) -> Self {
        let p = schedule.as_bytes();
        let mut t = [0u8; 256];
        for (j, out) in t.iter_mut().enumerate() {
            let pj = p[j];
            let inner = p[pj.wrapping_add(j as u8) as usize];
            *out = p[pj.wrapping_add(inner) as usize];
        }
        Self(t)
    }

    pub fn from_key(key: &KeyMaterial) -> Self {
        Self::new(&KeySchedule::new(key))
    }

    pub fn as_bytes(&self) -> &[u8; 256] {
        &self.0
    }

    /// XOR `buf` in place, `offset` being the absolute payload position of
    /// `buf[0]`.
    pub fn apply(&self, offset: u64, buf: &mut [u8]) {
        let mut g = (offset.wrapping_add(1) & 0xff) as u8;
        for b in buf.iter_mut() {
            *b ^= self.0[g as usize];
            g = g.wrapping_add(1);
        }
    }
}

impl std::fmt::Debug for KeystreamTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("KeystreamTable").field(&hex::encode(self.0)).finish()
    }
}
