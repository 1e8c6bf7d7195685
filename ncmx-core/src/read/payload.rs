use std::io::{self, Read, Write};

use crate::crypto::keybox::KeystreamTable;
use crate::error::{NcmError, Result};

pub const DEFAULT_BUF_SIZE: usize = 0x40000; // 256 KiB

/// Decipher exactly `len` payload bytes from `src` into `dst`.
///
/// The keystream index is derived from the absolute payload position, so
/// the result does not depend on `buf_size` or on how `src` splits reads.
pub fn decrypt_payload<R: Read + ?Sized, W: Write + ?Sized>(
    src: &mut R,
    len: u64,
    table: &KeystreamTable,
    dst: &mut W,
    buf_size: usize,
) -> Result<u64> {
    let mut buf = vec![0u8; buf_size.max(1)];
    let mut pos = 0u64;
    while pos < len {
        let want = usize::try_from(len - pos)
            .unwrap_or(usize::MAX)
            .min(buf.len());
        let n = match src.read(&mut buf[..want]) {
            Ok(0) => {
                return Err(NcmError::format(format!(
                    "payload ended at {pos} of {len} bytes"
                )));
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        table.apply(pos, &mut buf[..n]);
        dst.write_all(&buf[..n])?;
        pos += n as u64;
    }
    Ok(pos)
}

/// `Read` adapter deciphering the payload on the fly.
pub struct PayloadReader<R> {
    inner: R,
    table: KeystreamTable,
    pos: u64,
}

impl<R: Read> PayloadReader<R> {
    pub fn new(inner: R, table: KeystreamTable) -> Self {
        Self {
            inner,
            table,
            pos: 0,
        }
    }

    pub fn position(&self) -> u64 {
        self.pos
    }
}

impl<R: Read> Read for PayloadReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.table.apply(self.pos, &mut buf[..n]);
        self.pos += n as u64;
        Ok(n)
    }
}
