use std::io::{Result, Write};

/// Write adapter that digests and counts everything passing through.
pub struct HashingForward<W: Write> {
    inner: W,
    hasher: blake3::Hasher,
    pub written: u64,
}

impl<W: Write> HashingForward<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: blake3::Hasher::new(),
            written: 0,
        }
    }

    /// Flush and hand back the writer with the hex digest.
    pub fn finish(mut self) -> Result<(W, String)> {
        self.inner.flush()?;
        let digest = self.hasher.finalize().to_hex().to_string();
        Ok((self.inner, digest))
    }
}

impl<W: Write> Write for HashingForward<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self.inner.write(buf)?;
        // only what the inner writer accepted
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}
