#![allow(dead_code)]

use aes::Aes128;
use aes::cipher::{BlockEncrypt, KeyInit, generic_array::GenericArray};
use base64::Engine;
use std::path::{Path, PathBuf};

pub const CORE_KEY: &[u8; 16] = b"hzHRAmso5kInbaxW";
pub const META_KEY: &[u8; 16] = b"#14ljk_!\\]&0U<'(";

/// Independent keystream: schedule plus table, written out with plain indices.
pub fn reference_table(k: &[u8]) -> [u8; 256] {
    let mut p: Vec<usize> = (0..256).collect();
    let (mut last, mut off) = (0usize, 0usize);
    for i in 0..256 {
        let swap = p[i];
        let c = (swap + last + k[off] as usize) & 0xff;
        off = (off + 1) % k.len();
        p[i] = p[c];
        p[c] = swap;
        last = c;
    }
    let mut t = [0u8; 256];
    for j in 0..256 {
        t[j] = p[(p[j] + p[(p[j] + j) & 0xff]) & 0xff] as u8;
    }
    t
}

pub fn ecb_encrypt_padded(key: &[u8; 16], plain: &[u8]) -> Vec<u8> {
    let pad = 16 - plain.len() % 16;
    let mut buf = plain.to_vec();
    buf.extend(std::iter::repeat_n(pad as u8, pad));
    let cipher = Aes128::new(GenericArray::from_slice(key));
    for block in buf.chunks_mut(16) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
    buf
}

pub struct Fixture {
    pub key: Vec<u8>,
    pub meta_json: String,
    pub cover: Vec<u8>,
    pub audio: Vec<u8>,
    /// Overrides the wrapped key blob (already encrypted, before masking).
    pub raw_key_blob: Option<Vec<u8>>,
}

impl Fixture {
    pub fn new(key: &[u8], format: &str, audio: Vec<u8>) -> Self {
        Self {
            key: key.to_vec(),
            meta_json: format!(r#"{{"musicName":"t","artist":[["a",1]],"format":"{format}"}}"#),
            cover: Vec::new(),
            audio,
            raw_key_blob: None,
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut out = b"CTENFDAM".to_vec();
        out.extend_from_slice(&[0x01, 0x70]);

        let key_blob = self.raw_key_blob.clone().unwrap_or_else(|| {
            let mut plain = b"neteasecloudmusic".to_vec();
            plain.extend_from_slice(&self.key);
            ecb_encrypt_padded(CORE_KEY, &plain)
        });
        out.extend_from_slice(&(key_blob.len() as u32).to_le_bytes());
        out.extend(key_blob.iter().map(|b| b ^ 0x64));

        let mut meta_plain = b"music:".to_vec();
        meta_plain.extend_from_slice(self.meta_json.as_bytes());
        let b64 = base64::engine::general_purpose::STANDARD
            .encode(ecb_encrypt_padded(META_KEY, &meta_plain));
        let mut meta_blob = b"163 key(Don't modify):".to_vec();
        meta_blob.extend_from_slice(b64.as_bytes());
        out.extend_from_slice(&(meta_blob.len() as u32).to_le_bytes());
        out.extend(meta_blob.iter().map(|b| b ^ 0x63));

        out.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        out.extend_from_slice(&[0; 5]);
        out.extend_from_slice(&(self.cover.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.cover);

        let t = reference_table(&self.key);
        out.extend(
            self.audio
                .iter()
                .enumerate()
                .map(|(p, b)| b ^ t[(p + 1) & 0xff]),
        );
        out
    }

    pub fn write_to(&self, dir: &Path, stem: &str) -> PathBuf {
        let p = dir.join(format!("{stem}.ncm"));
        std::fs::write(&p, self.bytes()).unwrap();
        p
    }
}

pub fn sample_audio(len: usize) -> Vec<u8> {
    let mut x = 0x9e37_79b9u32;
    (0..len)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            x as u8
        })
        .collect()
}
