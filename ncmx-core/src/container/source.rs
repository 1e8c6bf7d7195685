use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use memmap2::Mmap;
use serde::{Deserialize, Serialize};

use super::header::{ContainerLayout, MAGIC};
use crate::error::{NcmError, Result};

/// How container bytes are pulled off disk. Both produce identical output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadStrategy {
    #[default]
    Buffered,
    Mapped,
}

pub trait ContainerSource: Send {
    fn layout(&self) -> &ContainerLayout;

    /// Reader over exactly the payload region, positioned at its start.
    fn payload(&mut self) -> Result<Box<dyn Read + Send + '_>>;
}

pub fn open_container(path: &Path, strategy: ReadStrategy) -> Result<Box<dyn ContainerSource>> {
    match strategy {
        ReadStrategy::Buffered => Ok(Box::new(BufferedContainer::open(path)?)),
        ReadStrategy::Mapped => Ok(Box::new(MappedContainer::open(path)?)),
    }
}

pub struct BufferedContainer {
    reader: BufReader<File>,
    layout: ContainerLayout,
}

impl BufferedContainer {
    pub fn open(path: &Path) -> Result<Self> {
        let f = File::open(path)?;
        let file_len = f.metadata()?.len();
        let mut reader = BufReader::new(f);
        let layout = ContainerLayout::read_from(&mut reader, file_len)?;
        Ok(Self { reader, layout })
    }
}

impl ContainerSource for BufferedContainer {
    fn layout(&self) -> &ContainerLayout {
        &self.layout
    }

    fn payload(&mut self) -> Result<Box<dyn Read + Send + '_>> {
        self.reader.seek(SeekFrom::Start(self.layout.payload_off))?;
        Ok(Box::new((&mut self.reader).take(self.layout.payload_len)))
    }
}

pub struct MappedContainer {
    map: Mmap,
    layout: ContainerLayout,
}

impl MappedContainer {
    pub fn open(path: &Path) -> Result<Self> {
        let f = File::open(path)?;
        let file_len = f.metadata()?.len();
        if file_len < MAGIC.len() as u64 {
            return Err(NcmError::format(format!(
                "{file_len}-byte file is too small for a container header"
            )));
        }
        // Read-only map; the job never writes its own input.
        #[allow(unsafe_code)]
        let map = unsafe { Mmap::map(&f)? };
        let layout = ContainerLayout::read_from(&map[..], map.len() as u64)?;
        Ok(Self { map, layout })
    }
}

impl ContainerSource for MappedContainer {
    fn layout(&self) -> &ContainerLayout {
        &self.layout
    }

    fn payload(&mut self) -> Result<Box<dyn Read + Send + '_>> {
        let start = self.layout.payload_off as usize;
        Ok(Box::new(&self.map[start..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_container(payload: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(MAGIC).unwrap();
        f.write_all(&[0, 0]).unwrap();
        for field in [&b"kk"[..], &b"mm"[..]] {
            f.write_all(&(field.len() as u32).to_le_bytes()).unwrap();
            f.write_all(field).unwrap();
        }
        f.write_all(&[0; 9]).unwrap();
        f.write_all(&3u32.to_le_bytes()).unwrap();
        f.write_all(b"jpg").unwrap();
        f.write_all(payload).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn strategies_agree() {
        let payload: Vec<u8> = (0..5000u32).map(|i| (i * 7) as u8).collect();
        let f = write_container(&payload);

        let mut outs = Vec::new();
        for s in [ReadStrategy::Buffered, ReadStrategy::Mapped] {
            let mut src = open_container(f.path(), s).unwrap();
            let layout = src.layout().clone();
            let mut got = Vec::new();
            src.payload().unwrap().read_to_end(&mut got).unwrap();
            outs.push((layout, got));
        }
        assert_eq!(outs[0], outs[1]);
        assert_eq!(outs[0].1, payload);
    }

    #[test]
    fn tiny_file_is_a_format_error_for_both() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"CTEN").unwrap();
        f.flush().unwrap();
        for s in [ReadStrategy::Buffered, ReadStrategy::Mapped] {
            assert!(matches!(
                open_container(f.path(), s).err(),
                Some(NcmError::Format(_))
            ));
        }
    }
}
