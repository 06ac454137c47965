//! Parser and serializer for OpenFOAM FoamFile dictionaries and fields.
//!
//! Parsing produces a [`Document`] that keeps the file's bytes next to a
//! located entry tree. Writing an unedited document returns the bytes
//! unchanged, and edits splice only the ranges they touch.
//!
//! ```
//! use foamfile::{KeyPath, Value};
//!
//! let mut doc = foamfile::parse(b"solver PCG; // linear solver\ntolerance 1e-06;\n")?;
//! assert_eq!(doc.get(&KeyPath::parse("solver")?), Some(&Value::word("PCG")));
//!
//! doc.set(&KeyPath::parse("tolerance")?, 1e-8)?;
//! assert_eq!(foamfile::to_string(&doc)?, "solver PCG; // linear solver\ntolerance 1e-8;\n");
//! # Ok::<(), foamfile::Error>(())
//! ```

pub mod constants;
pub mod decode;
pub mod edit;
pub mod encode;
pub mod error;
pub mod header;
pub mod io;
pub mod json;
pub mod num;
pub mod options;
pub mod parallel;
pub mod path;
pub mod types;

use std::path::Path;

pub use crate::edit::{apply_all, Splice};
pub use crate::error::{Error, ErrorKind, Location};
pub use crate::header::{Arch, Endian, Header};
pub use crate::io::FoamFile;
pub use crate::options::{
    Compression, EncodeOptions, Format, LabelWidth, ParseOptions, Precision, Shape,
};
pub use crate::parallel::parse_many;
pub use crate::path::KeyPath;
pub use crate::types::{
    DimensionSet, Dimensioned, Dictionary, Document, Encoding, Entry, EntryKey, FaceList,
    KeyedValue, NumericData, NumericList, Span, Tensor, Value,
};

pub type Result<T> = std::result::Result<T, Error>;

pub fn parse(input: &[u8]) -> Result<Document> {
    decode::parse(input)
}

pub fn parse_with_options(input: &[u8], options: &ParseOptions) -> Result<Document> {
    decode::parse_with_options(input, options)
}

pub fn parse_value(input: &[u8]) -> Result<Value> {
    decode::parse_value(input)
}

pub fn parse_value_with_options(input: &[u8], options: &ParseOptions) -> Result<Value> {
    decode::parse_value_with_options(input, options)
}

/// Checks that `input` parses, without keeping the document.
pub fn validate(input: &[u8]) -> Result<()> {
    decode::parse(input).map(|_| ())
}

pub fn to_vec(doc: &Document) -> Result<Vec<u8>> {
    encode::to_vec(doc)
}

pub fn to_vec_with_options(doc: &Document, options: &EncodeOptions) -> Result<Vec<u8>> {
    encode::to_vec_with_options(doc, options)
}

pub fn to_string(doc: &Document) -> Result<String> {
    encode::to_string(doc)
}

pub fn encode_dictionary(dict: &Dictionary, options: &EncodeOptions) -> Result<Vec<u8>> {
    encode::encode_dictionary(dict, options)
}

pub fn value_to_vec(value: &Value) -> Result<Vec<u8>> {
    encode::value_to_vec(value)
}

/// Reads and parses a file, decompressing gzip content.
pub fn from_path(path: impl AsRef<Path>) -> Result<Document> {
    FoamFile::open(path).map(FoamFile::into_document)
}

/// Writes the document's bytes to `path`, gzipped when the name ends in `.gz`.
pub fn to_path(path: impl AsRef<Path>, doc: &Document) -> Result<()> {
    let path = path.as_ref();
    io::write(path, doc.as_bytes(), io::compression_for_path(path))
}
