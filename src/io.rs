//! Reading and writing FoamFiles on disk, with transparent gzip.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tracing::debug;

use crate::constants::GZIP_MAGIC;
use crate::edit::Splice;
use crate::error::Error;
use crate::options::{Compression, EncodeOptions, ParseOptions};
use crate::path::KeyPath;
use crate::types::{Document, Value};
use crate::Result;

pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Compression implied by a file name: `.gz` means gzip.
pub fn compression_for_path(path: &Path) -> Compression {
    match path.extension() {
        Some(ext) if ext == "gz" => Compression::Gzip,
        _ => Compression::None,
    }
}

pub fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(
        Vec::with_capacity(bytes.len() / 2),
        flate2::Compression::default(),
    );
    encoder
        .write_all(bytes)
        .and_then(|()| encoder.finish())
        .map_err(|err| Error::encode(format!("gzip: {err}")))
}

pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(bytes.len() * 4);
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|_| Error::decode(0, "gzip stream"))?;
    Ok(out)
}

/// Reads `path`, decompressing when the content starts with the gzip magic.
pub fn read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    read_detect(path.as_ref()).map(|(bytes, _)| bytes)
}

fn read_detect(path: &Path) -> Result<(Vec<u8>, Compression)> {
    let raw = fs::read(path).map_err(|err| Error::io(path, err))?;
    let (bytes, compression) = if is_gzip(&raw) {
        (decompress(&raw)?, Compression::Gzip)
    } else {
        let compression = compression_for_path(path);
        (raw, compression)
    };
    debug!(
        path = %path.display(),
        ?compression,
        bytes = bytes.len(),
        "read foam file"
    );
    Ok((bytes, compression))
}

/// Writes `bytes` to `path` through a sibling temporary file and a rename.
pub fn write(path: impl AsRef<Path>, bytes: &[u8], compression: Compression) -> Result<()> {
    let path = path.as_ref();
    match compression {
        Compression::None => write_atomic(path, bytes),
        Compression::Gzip => write_atomic(path, &compress(bytes)?),
    }?;
    debug!(
        path = %path.display(),
        ?compression,
        bytes = bytes.len(),
        "wrote foam file"
    );
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{name}.{}.tmp", std::process::id()));
    fs::write(&temp, bytes).map_err(|err| Error::io(&temp, err))?;
    if let Err(err) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(Error::io(path, err));
    }
    Ok(())
}

/// A document bound to the file it came from.
///
/// `save` writes the edited bytes back with the compression the file was
/// opened with.
#[derive(Debug, Clone)]
pub struct FoamFile {
    path: PathBuf,
    compression: Compression,
    document: Document,
}

impl FoamFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, &ParseOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        let (bytes, compression) = read_detect(path)?;
        let document = crate::parse_with_options(&bytes, options)?;
        Ok(Self {
            path: path.to_path_buf(),
            compression,
            document,
        })
    }

    /// Binds an in-memory document to `path`; nothing is written until `save`.
    pub fn create(path: impl AsRef<Path>, document: Document) -> Self {
        let path = path.as_ref();
        Self {
            compression: compression_for_path(path),
            path: path.to_path_buf(),
            document,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn set_compression(&mut self, compression: Compression) {
        self.compression = compression;
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn get(&self, path: &KeyPath) -> Option<&Value> {
        self.document.get(path)
    }

    pub fn set(&mut self, path: &KeyPath, value: impl Into<Value>) -> Result<Splice> {
        self.document.set(path, value)
    }

    pub fn remove(&mut self, path: &KeyPath) -> Result<Splice> {
        self.document.remove(path)
    }

    pub fn save(&self) -> Result<()> {
        write(&self.path, self.document.as_bytes(), self.compression)
    }

    /// Re-encodes into `path`; compression comes from `options`.
    pub fn save_as(&self, path: impl AsRef<Path>, options: &EncodeOptions) -> Result<()> {
        let path = path.as_ref();
        let bytes = crate::to_vec_with_options(&self.document, options)?;
        write_atomic(path, &bytes)?;
        debug!(
            path = %path.display(),
            compression = ?options.compression,
            bytes = bytes.len(),
            "wrote foam file"
        );
        Ok(())
    }
}
