pub(crate) mod bulk;
pub mod detect;
pub mod number;
mod parser;
pub mod skip;

use crate::error::Error;
use crate::options::ParseOptions;
use crate::types::{Document, Value};
use crate::Result;

pub use number::{parse_number, Number, Target};
pub use skip::skip;

pub(crate) use parser::Parser;

/// Outcome of a failed attempt at one grammar construct.
#[derive(Debug)]
pub(crate) enum Failure {
    /// The construct does not start here; the caller may try another one.
    Backtrack(Error),
    /// Malformed input. The whole parse stops.
    Fatal(Error),
}

impl Failure {
    pub(crate) fn into_error(self) -> Error {
        match self {
            Failure::Backtrack(err) | Failure::Fatal(err) => err,
        }
    }

    /// Once a construct is committed, failures below it are fatal.
    pub(crate) fn commit(self) -> Self {
        Failure::Fatal(self.into_error())
    }
}

impl From<Error> for Failure {
    fn from(err: Error) -> Self {
        Failure::Fatal(err)
    }
}

/// Parsed value and the position just past it.
pub(crate) type Step<T> = std::result::Result<(T, usize), Failure>;

pub fn parse(input: &[u8]) -> Result<Document> {
    parse_with_options(input, &ParseOptions::default())
}

/// Parses a complete file.
///
/// The header's `format` and `arch` steer how later entries are read, unless
/// `options` overrides them.
pub fn parse_with_options(input: &[u8], options: &ParseOptions) -> Result<Document> {
    let mut parser = Parser::new(input, options);
    let root = parser.file()?;
    tracing::debug!(
        bytes = input.len(),
        entries = root.len(),
        format = parser.format().as_str(),
        "parsed foam file"
    );
    Ok(Document::from_parts(input.to_vec(), root, options.clone()))
}

/// Parses one value, such as the text after a keyword, up to the end of `input`.
pub fn parse_value(input: &[u8]) -> Result<Value> {
    parse_value_with_options(input, &ParseOptions::default())
}

pub fn parse_value_with_options(input: &[u8], options: &ParseOptions) -> Result<Value> {
    let mut parser = Parser::new(input, options);
    parser.value(None)
}
