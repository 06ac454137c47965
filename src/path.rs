use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;

use crate::error::Error;
use crate::types::{Dictionary, Entry, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub key: SmolStr,
    /// Which occurrence of a repeated key, counting from zero.
    pub index: Option<usize>,
}

/// Address of an entry through nested dictionaries, written `a/b[1]/c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    segments: Vec<Segment>,
}

impl KeyPath {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self {
            segments: keys
                .into_iter()
                .map(|key| Segment {
                    key: key.into(),
                    index: None,
                })
                .collect(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut segments = Vec::new();
        let mut offset = 0;
        for raw in text.split('/') {
            if raw.is_empty() {
                return Err(Error::decode(offset, "key path segment"));
            }
            segments.push(parse_segment(raw, offset)?);
            offset += raw.len() + 1;
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Path of the enclosing dictionary; empty for top-level keys.
    pub fn parent(&self) -> &[Segment] {
        match self.segments.split_last() {
            Some((_, parent)) => parent,
            None => &[],
        }
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn resolve<'a>(&self, root: &'a Dictionary) -> Option<&'a Entry> {
        let dict = walk(root, self.parent())?;
        nth(dict, self.last()?)
    }

    pub fn resolve_all<'a>(&self, root: &'a Dictionary) -> Vec<&'a Entry> {
        match (walk(root, self.parent()), self.last()) {
            (Some(dict), Some(last)) => dict.get_all(&last.key).collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn resolve_mut<'a>(&self, root: &'a mut Dictionary) -> Option<&'a mut Entry> {
        let last = self.last()?;
        let dict = walk_mut(root, self.parent())?;
        nth_mut(dict, last)
    }

    pub(crate) fn parent_mut<'a>(&self, root: &'a mut Dictionary) -> Option<&'a mut Dictionary> {
        walk_mut(root, self.parent())
    }

    /// Index of the addressed entry among its parent's entries.
    pub(crate) fn position_in(&self, parent: &Dictionary) -> Option<usize> {
        let last = self.last()?;
        parent
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.key.as_str() == Some(last.key.as_str()))
            .nth(last.index.unwrap_or(0))
            .map(|(position, _)| position)
    }

    pub(crate) fn parent_path(&self) -> KeyPath {
        KeyPath {
            segments: self.parent().to_vec(),
        }
    }

    pub(crate) fn parent_entry<'a>(&self, root: &'a Dictionary) -> Option<&'a Entry> {
        let (last, rest) = self.parent().split_last()?;
        nth(walk(root, rest)?, last)
    }
}

fn parse_segment(raw: &str, offset: usize) -> Result<Segment, Error> {
    if let Some(open) = raw.rfind('[').filter(|_| raw.ends_with(']')) {
        let digits = &raw[open + 1..raw.len() - 1];
        if !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit()) {
            if open == 0 {
                return Err(Error::decode(offset, "key before occurrence index"));
            }
            let index = digits
                .parse()
                .map_err(|_| Error::decode(offset + open + 1, "occurrence index"))?;
            return Ok(Segment {
                key: SmolStr::new(&raw[..open]),
                index: Some(index),
            });
        }
    }
    Ok(Segment {
        key: SmolStr::new(raw),
        index: None,
    })
}

fn nth<'a>(dict: &'a Dictionary, segment: &Segment) -> Option<&'a Entry> {
    dict.get_all(&segment.key).nth(segment.index.unwrap_or(0))
}

fn nth_mut<'a>(dict: &'a mut Dictionary, segment: &Segment) -> Option<&'a mut Entry> {
    dict.entries
        .iter_mut()
        .filter(|entry| entry.key.as_str() == Some(segment.key.as_str()))
        .nth(segment.index.unwrap_or(0))
}

fn walk<'a>(root: &'a Dictionary, segments: &[Segment]) -> Option<&'a Dictionary> {
    segments.iter().try_fold(root, |dict, segment| {
        match nth(dict, segment)?.value.as_ref()? {
            Value::Dict(child) => Some(child),
            _ => None,
        }
    })
}

fn walk_mut<'a>(root: &'a mut Dictionary, segments: &[Segment]) -> Option<&'a mut Dictionary> {
    let mut dict = root;
    for segment in segments {
        dict = match nth_mut(dict, segment)?.value.as_mut()? {
            Value::Dict(child) => child,
            _ => return None,
        };
    }
    Some(dict)
}

impl FromStr for KeyPath {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        KeyPath::parse(text)
    }
}

impl From<&str> for KeyPath {
    /// Single top-level key, taken verbatim.
    fn from(key: &str) -> Self {
        KeyPath::new([key])
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(&segment.key)?;
            if let Some(index) = segment.index {
                write!(f, "[{index}]")?;
            }
        }
        Ok(())
    }
}
