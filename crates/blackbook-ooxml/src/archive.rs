//! DOCX package container
//!
//! Every entry of the zip is unpacked into memory. Entries keep their
//! position and their compression method; an entry that is never replaced
//! is written back with the same bytes it was read with.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use zip::read::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::error::{OoxmlError, Result};

#[derive(Debug, Clone)]
struct Part {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
}

/// An unpacked OOXML package
#[derive(Debug, Clone, Default)]
pub struct OoxmlArchive {
    parts: Vec<Part>,
    index: HashMap<String, usize>,
}

impl OoxmlArchive {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut zip = ZipArchive::new(reader)?;
        let mut archive = Self::default();

        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            let compression = match entry.compression() {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            archive.insert(entry.name().to_string(), data, compression);
        }

        Ok(archive)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.index.get(name).map(|&i| self.parts[i].data.as_slice())
    }

    /// Part contents as text, invalid UTF-8 replaced
    pub fn get_string(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// A part the package cannot do without
    pub fn require(&self, name: &str) -> Result<&[u8]> {
        self.get(name)
            .ok_or_else(|| OoxmlError::MissingFile(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Part names in package order
    pub fn file_list(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Replace a part in place, or append a new deflated one
    pub fn set(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.insert(name.into(), data, CompressionMethod::Deflated);
    }

    pub fn set_string(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.set(name, text.into().into_bytes());
    }

    /// Zip the package into `writer`
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        for part in &self.parts {
            let options = SimpleFileOptions::default().compression_method(part.compression);
            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(&part.data)?;
        }
        zip.finish()?;
        Ok(())
    }

    fn insert(&mut self, name: String, data: Vec<u8>, compression: CompressionMethod) {
        match self.index.get(&name) {
            Some(&i) => self.parts[i].data = data,
            None => {
                self.index.insert(name.clone(), self.parts.len());
                self.parts.push(Part {
                    name,
                    data,
                    compression,
                });
            }
        }
    }
}
