use std::io::{self, Read};

use crate::crypto::keys::{KEY_BLOB_XOR, META_BLOB_XOR};
use crate::error::{NcmError, Result};

pub const MAGIC: &[u8; 8] = b"CTENFDAM";
pub const MAGIC_GAP: u64 = 2;
pub const CHECKSUM_LEN: u64 = 4;
pub const COVER_GAP: u64 = 5;

/// Parsed fixed layout of one container, with both blobs already unmasked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerLayout {
    pub key_blob: Vec<u8>,
    pub meta_blob: Vec<u8>,
    pub cover_off: u64,
    pub cover_len: u64,
    /// Absolute file offset of the first payload byte.
    pub payload_off: u64,
    pub payload_len: u64,
}

/// Counts every byte taken from the inner reader.
struct Tracked<R> {
    inner: R,
    pos: u64,
    file_len: u64,
}

impl<R: Read> Tracked<R> {
    fn remaining(&self) -> u64 {
        self.file_len.saturating_sub(self.pos)
    }

    fn fill(&mut self, buf: &mut [u8], what: &str) -> Result<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.pos += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(NcmError::format(
                format!("truncated container while reading {what} at offset {}", self.pos),
            )),
            Err(e) => Err(e.into()),
        }
    }

    fn skip(&mut self, n: u64, what: &str) -> Result<()> {
        if n > self.remaining() {
            return Err(NcmError::format(format!(
                "truncated container: {what} needs {n} bytes, {} left",
                self.remaining()
            )));
        }
        let k = io::copy(&mut (&mut self.inner).take(n), &mut io::sink())?;
        if k != n {
            return Err(NcmError::format(format!("truncated container in {what}")));
        }
        self.pos += n;
        Ok(())
    }

    fn le32(&mut self, what: &str) -> Result<u32> {
        let mut b = [0u8; 4];
        self.fill(&mut b, what)?;
        Ok(u32::from_le_bytes(b))
    }

    fn masked_field(&mut self, mask: u8, what: &str) -> Result<Vec<u8>> {
        let len = self.le32(what)? as u64;
        if len > self.remaining() {
            return Err(NcmError::format(format!(
                "{what} length {len} exceeds the {} bytes left",
                self.remaining()
            )));
        }
        let mut v = vec![0u8; len as usize];
        self.fill(&mut v, what)?;
        for b in &mut v {
            *b ^= mask;
        }
        Ok(v)
    }
}

impl ContainerLayout {
    /// Parse from the start of a container `file_len` bytes long.
    pub fn read_from(r: impl Read, file_len: u64) -> Result<Self> {
        let mut t = Tracked {
            inner: r,
            pos: 0,
            file_len,
        };

        let mut magic = [0u8; 8];
        t.fill(&mut magic, "magic")?;
        if &magic != MAGIC {
            return Err(NcmError::format(format!(
                "bad magic {}, expected {}",
                hex::encode(magic),
                hex::encode(MAGIC)
            )));
        }
        t.skip(MAGIC_GAP, "header gap")?;

        let key_blob = t.masked_field(KEY_BLOB_XOR, "key blob")?;
        let meta_blob = t.masked_field(META_BLOB_XOR, "metadata blob")?;

        t.skip(CHECKSUM_LEN, "checksum")?;
        t.skip(COVER_GAP, "cover gap")?;
        let cover_len = t.le32("cover length")? as u64;
        let cover_off = t.pos;
        t.skip(cover_len, "cover image")?;

        let payload_off = t.pos;
        Ok(Self {
            key_blob,
            meta_blob,
            cover_off,
            cover_len,
            payload_off,
            payload_len: file_len.saturating_sub(payload_off),
        })
    }
}
