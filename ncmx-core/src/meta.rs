use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::keys::{META_B64_PREFIX_LEN, META_JSON_PREFIX_LEN, meta_key};
use crate::crypto::unwrap::{BLOCK_LEN, aes_ecb_decrypt_in_place, unpad};
use crate::error::{NcmError, Result};

/// Track record embedded in the container. Only `format` drives decoding;
/// the rest is informational and parsed leniently.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(rename = "musicName", default)]
    pub music_name: Option<String>,
    #[serde(rename = "musicId", default)]
    pub music_id: Option<Value>,
    /// `[[name, id], ...]` as stored upstream.
    #[serde(default)]
    pub artist: Option<Vec<Vec<Value>>>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub bitrate: Option<f64>,
    /// Milliseconds.
    #[serde(default)]
    pub duration: Option<f64>,
}

impl TrackMetadata {
    /// Unwrap a metadata blob whose XOR mask has already been removed.
    pub fn recover(blob: &[u8]) -> Result<Self> {
        if blob.len() < META_B64_PREFIX_LEN {
            return Err(NcmError::metadata(format!(
                "metadata blob is {} bytes, shorter than its {META_B64_PREFIX_LEN}-byte prefix",
                blob.len()
            )));
        }
        let mut ct = STANDARD
            .decode(&blob[META_B64_PREFIX_LEN..])
            .map_err(|e| NcmError::metadata(format!("base64: {e}")))?;
        if ct.is_empty() || ct.len() % BLOCK_LEN != 0 {
            return Err(NcmError::metadata(format!(
                "encrypted metadata is {} bytes, not whole blocks",
                ct.len()
            )));
        }
        aes_ecb_decrypt_in_place(&meta_key()?, &mut ct)?;
        unpad(&mut ct)?;
        if ct.len() < META_JSON_PREFIX_LEN {
            return Err(NcmError::metadata("decrypted metadata lacks its prefix"));
        }
        let text = std::str::from_utf8(&ct[META_JSON_PREFIX_LEN..])
            .map_err(|e| NcmError::metadata(format!("utf-8: {e}")))?;
        Self::parse(text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| NcmError::metadata(format!("json: {e}")))
    }

    /// Output container format (`mp3`, `flac`, ...). Missing is an error.
    pub fn output_format(&self) -> Result<&str> {
        match self.format.as_deref().map(str::trim) {
            Some(f) if !f.is_empty() && f.bytes().all(|b| b.is_ascii_alphanumeric()) => Ok(f),
            Some(f) if !f.is_empty() => Err(NcmError::metadata(format!(
                "unsafe format extension: {f:?}"
            ))),
            _ => Err(NcmError::metadata("metadata has no format field")),
        }
    }

    pub fn artists(&self) -> Vec<String> {
        self.artist
            .iter()
            .flatten()
            .filter_map(|a| a.first().and_then(Value::as_str))
            .map(String::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typical_record() {
        let m = TrackMetadata::parse(
            r#"{"musicId":1234,"musicName":"Song","artist":[["A",1],["B",2]],
                "album":"LP","bitrate":320000,"duration":215000,"format":"flac",
                "mvId":0,"alias":[]}"#,
        )
        .unwrap();
        assert_eq!(m.output_format().unwrap(), "flac");
        assert_eq!(m.artists(), vec!["A", "B"]);
        assert_eq!(m.duration, Some(215_000.0));
    }

    #[test]
    fn missing_format_is_a_metadata_error() {
        let m = TrackMetadata::parse(r#"{"musicName":"x"}"#).unwrap();
        assert!(matches!(m.output_format(), Err(NcmError::Metadata(_))));
        let m = TrackMetadata::parse(r#"{"format":"  "}"#).unwrap();
        assert!(matches!(m.output_format(), Err(NcmError::Metadata(_))));
    }

    #[test]
    fn path_like_format_is_refused() {
        let m = TrackMetadata::parse(r#"{"format":"../../etc"}"#).unwrap();
        assert!(matches!(m.output_format(), Err(NcmError::Metadata(_))));
    }

    #[test]
    fn non_string_format_is_a_metadata_error() {
        assert!(matches!(
            TrackMetadata::parse(r#"{"format":3}"#),
            Err(NcmError::Metadata(_))
        ));
    }

    #[test]
    fn garbage_blobs_are_metadata_errors() {
        assert!(matches!(
            TrackMetadata::recover(b"short"),
            Err(NcmError::Metadata(_))
        ));
        let mut blob = vec![b'x'; META_B64_PREFIX_LEN];
        blob.extend_from_slice(b"!!not base64!!");
        assert!(matches!(
            TrackMetadata::recover(&blob),
            Err(NcmError::Metadata(_))
        ));
        let mut blob = vec![b'x'; META_B64_PREFIX_LEN];
        blob.extend_from_slice(b"AAAA");
        assert!(matches!(
            TrackMetadata::recover(&blob),
            Err(NcmError::Metadata(_))
        ));
    }
}
