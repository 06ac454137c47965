use std::borrow::Cow;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes do not follow the grammar.
    Decode,
    /// A well-formed value has the wrong arity or byte length for its context.
    Shape,
    /// A recognized construct this crate does not handle.
    Unsupported,
    Encode,
    /// An edit addressed an entry or parent dictionary that does not exist.
    NotFound,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Maps a byte offset to a 1-based line and column.
    pub fn from_offset(input: &[u8], offset: usize) -> Self {
        let offset = offset.min(input.len());
        let before = &input[..offset];
        let line = memchr::memchr_iter(b'\n', before).count() + 1;
        let column = match memchr::memrchr(b'\n', before) {
            Some(newline) => offset - newline,
            None => offset + 1,
        };
        Self {
            offset,
            line,
            column,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("decode error at byte {offset}: expected {expected}")]
    Decode {
        offset: usize,
        expected: Cow<'static, str>,
    },

    #[error("shape error at byte {offset}: expected {expected} ({detail})")]
    Shape {
        offset: usize,
        expected: Cow<'static, str>,
        detail: String,
    },

    #[error("unsupported construct at byte {offset}: {construct}")]
    Unsupported {
        offset: usize,
        construct: Cow<'static, str>,
    },

    #[error("encode error: {0}")]
    Encode(String),

    #[error("no entry at {path}")]
    NotFound { path: String },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn decode(offset: usize, expected: impl Into<Cow<'static, str>>) -> Self {
        Error::Decode {
            offset,
            expected: expected.into(),
        }
    }

    pub fn shape(
        offset: usize,
        expected: impl Into<Cow<'static, str>>,
        detail: impl Into<String>,
    ) -> Self {
        Error::Shape {
            offset,
            expected: expected.into(),
            detail: detail.into(),
        }
    }

    pub fn unsupported(offset: usize, construct: impl Into<Cow<'static, str>>) -> Self {
        Error::Unsupported {
            offset,
            construct: construct.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Error::Encode(message.into())
    }

    pub fn not_found(path: impl std::fmt::Display) -> Self {
        Error::NotFound {
            path: path.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Decode { .. } => ErrorKind::Decode,
            Error::Shape { .. } => ErrorKind::Shape,
            Error::Unsupported { .. } => ErrorKind::Unsupported,
            Error::Encode(_) => ErrorKind::Encode,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Io { .. } => ErrorKind::Io,
        }
    }

    /// True for malformed input, including shape mismatches.
    pub fn is_decode(&self) -> bool {
        matches!(self.kind(), ErrorKind::Decode | ErrorKind::Shape)
    }

    /// Raw byte offset into the parsed buffer, for input errors.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::Decode { offset, .. }
            | Error::Shape { offset, .. }
            | Error::Unsupported { offset, .. } => Some(*offset),
            Error::Encode(_) | Error::NotFound { .. } | Error::Io { .. } => None,
        }
    }

    pub fn expected(&self) -> Option<&str> {
        match self {
            Error::Decode { expected, .. } | Error::Shape { expected, .. } => Some(expected),
            Error::Unsupported { construct, .. } => Some(construct),
            Error::Encode(_) | Error::NotFound { .. } | Error::Io { .. } => None,
        }
    }

    pub fn location(&self, input: &[u8]) -> Option<Location> {
        self.offset()
            .map(|offset| Location::from_offset(input, offset))
    }

    /// Multi-line diagnostic with the offending line and a caret.
    pub fn render(&self, input: &[u8]) -> String {
        let Some(location) = self.location(input) else {
            return self.to_string();
        };
        let start = location.offset - (location.column - 1);
        let end = memchr::memchr(b'\n', &input[location.offset..])
            .map(|idx| location.offset + idx)
            .unwrap_or(input.len());
        let line = String::from_utf8_lossy(&input[start..end]);
        let expected = self.expected().unwrap_or_default();
        format!(
            "parsing failed on line {}, column {}:\n{}\n{}^\nExpected: {}",
            location.line,
            location.column,
            line,
            " ".repeat(location.column - 1),
            expected
        )
    }

    pub(crate) fn with_offset(self, offset: usize) -> Self {
        match self {
            Error::Decode { expected, .. } => Error::Decode { offset, expected },
            Error::Shape {
                expected, detail, ..
            } => Error::Shape {
                offset,
                expected,
                detail,
            },
            Error::Unsupported { construct, .. } => Error::Unsupported { offset, construct },
            other => other,
        }
    }
}
