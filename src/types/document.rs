use smol_str::SmolStr;

use crate::constants::HEADER_KEY;
use crate::header::{Arch, Header};
use crate::options::{Format, ParseOptions};
use crate::path::KeyPath;
use crate::types::Value;

/// Half-open byte range `[start, end)` in the document's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Adjusts this span for `removed` bytes at `at` being replaced by `inserted` bytes.
    /// Spans ending at or before `at` are unchanged, spans after it move, and
    /// spans enclosing it stretch. Spans inside `at` must be dropped by the caller.
    pub(crate) fn splice(&mut self, at: Span, inserted: usize) {
        if self.end <= at.start {
            return;
        }
        let shift = |pos: usize| pos + inserted - at.len();
        if self.start >= at.end {
            self.start = shift(self.start);
        }
        self.end = shift(self.end);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKey {
    Keyword(SmolStr),
    /// `#include`, `#remove` and friends, including the leading `#`.
    Directive(SmolStr),
    /// Data without a keyword, as in mesh files.
    Standalone,
}

impl EntryKey {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EntryKey::Keyword(key) | EntryKey::Directive(key) => Some(key.as_str()),
            EntryKey::Standalone => None,
        }
    }
}

/// One entry of a file or dictionary with the bytes it was read from.
#[derive(Debug, Clone)]
pub struct Entry {
    pub key: EntryKey,
    /// `None` for `keyword;`.
    pub value: Option<Value>,
    pub span: Span,
    pub value_span: Span,
}

impl Entry {
    pub fn new(key: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        Self {
            key: EntryKey::Keyword(key.into()),
            value: Some(value.into()),
            span: Span::default(),
            value_span: Span::default(),
        }
    }

    pub fn keyword(&self) -> Option<&str> {
        match &self.key {
            EntryKey::Keyword(key) => Some(key.as_str()),
            _ => None,
        }
    }

    pub(crate) fn splice_spans(&mut self, at: Span, inserted: usize) {
        self.span.splice(at, inserted);
        self.value_span.splice(at, inserted);
        if let Some(value) = &mut self.value {
            for_each_dict_mut(value, &mut |dict| dict.splice_spans(at, inserted));
        }
    }

    pub(crate) fn offset_spans(&mut self, delta: usize) {
        self.span.start += delta;
        self.span.end += delta;
        self.value_span.start += delta;
        self.value_span.end += delta;
        if let Some(value) = &mut self.value {
            offset_value_spans(value, delta);
        }
    }
}

/// Moves the spans of every entry nested in `value` by `delta` bytes.
pub(crate) fn offset_value_spans(value: &mut Value, delta: usize) {
    for_each_dict_mut(value, &mut |dict| {
        for entry in &mut dict.entries {
            entry.offset_spans(delta);
        }
    });
}

/// Visits the outermost dictionaries reachable from `value` through lists and
/// keyword entries.
fn for_each_dict_mut(value: &mut Value, f: &mut dyn FnMut(&mut Dictionary)) {
    match value {
        Value::Dict(dict) => f(dict),
        Value::List(items) | Value::Tuple(items) => {
            for item in items {
                for_each_dict_mut(item, f);
            }
        }
        Value::Keyed(keyed) => {
            for_each_dict_mut(&mut keyed.keyword, f);
            for_each_dict_mut(&mut keyed.value, f);
        }
        _ => {}
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

/// Ordered entries; repeated keys are kept as separate entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary {
    pub entries: Vec<Entry>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<SmolStr>, value: impl Into<Value>) {
        self.entries.push(Entry::new(key, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// First entry with `key`. Directives match with their leading `#`.
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.key.as_str() == Some(key))
    }

    pub fn entry_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|entry| entry.key.as_str() == Some(key))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entry(key).and_then(|entry| entry.value.as_ref())
    }

    pub fn get_all(&self, key: &str) -> impl Iterator<Item = &Entry> + '_ {
        let key = SmolStr::new(key);
        self.entries
            .iter()
            .filter(move |entry| entry.key.as_str() == Some(key.as_str()))
    }

    /// Replaces the value of the first `key` entry, or appends a new entry.
    pub fn insert(&mut self, key: impl Into<SmolStr>, value: impl Into<Value>) {
        let key = key.into();
        match self.entry_mut(&key) {
            Some(entry) => entry.value = Some(value.into()),
            None => self.push(key, value),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| entry.key.as_str())
    }

    pub(crate) fn splice_spans(&mut self, at: Span, inserted: usize) {
        for entry in &mut self.entries {
            entry.splice_spans(at, inserted);
        }
    }
}

/// A parsed file: its bytes plus the located entry tree.
///
/// The bytes are the source of truth for serialization. Untouched regions are
/// written back exactly as read, and edits splice only the affected ranges.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) source: Vec<u8>,
    pub(crate) root: Dictionary,
    pub(crate) options: ParseOptions,
}

impl Document {
    pub(crate) fn from_parts(source: Vec<u8>, root: Dictionary, options: ParseOptions) -> Self {
        Self {
            source,
            root,
            options,
        }
    }

    /// The current bytes, including any applied edits.
    pub fn as_bytes(&self) -> &[u8] {
        &self.source
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.source
    }

    pub fn root(&self) -> &Dictionary {
        &self.root
    }

    pub fn entries(&self) -> &[Entry] {
        &self.root.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys()
    }

    pub fn parse_options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn header(&self) -> Option<Header> {
        self.root
            .get(HEADER_KEY)
            .and_then(Value::as_dict)
            .map(Header::from_dict)
    }

    /// Declared format, falling back to the parse options and then ASCII.
    pub fn format(&self) -> Format {
        self.options
            .format
            .or_else(|| self.header().and_then(|header| header.format))
            .unwrap_or_default()
    }

    /// Declared binary layout, if the options or header name one.
    pub fn arch(&self) -> Option<Arch> {
        self.options
            .arch
            .or_else(|| self.header().and_then(|header| header.arch))
    }

    /// The keyword-less data block, if any.
    pub fn standalone(&self) -> Option<&Value> {
        self.root
            .entries
            .iter()
            .find(|entry| entry.key == EntryKey::Standalone)
            .and_then(|entry| entry.value.as_ref())
    }

    pub fn entry(&self, path: &KeyPath) -> Option<&Entry> {
        path.resolve(&self.root)
    }

    pub fn get(&self, path: &KeyPath) -> Option<&Value> {
        self.entry(path).and_then(|entry| entry.value.as_ref())
    }

    /// Every entry matching the last segment of `path` under its parent.
    pub fn get_all(&self, path: &KeyPath) -> Vec<&Entry> {
        path.resolve_all(&self.root)
    }

    pub fn contains(&self, path: &KeyPath) -> bool {
        self.entry(path).is_some()
    }

    /// Structural equality of the entry trees, ignoring bytes and spans.
    pub fn same_structure(&self, other: &Document) -> bool {
        self.root == other.root
    }
}
