//! In-place edits that rewrite only the bytes of the touched entry.

use smol_str::SmolStr;

use crate::decode::Parser;
use crate::encode::{render_entry, render_value, Layout};
use crate::error::Error;
use crate::path::KeyPath;
use crate::types::{offset_value_spans, Document, Entry, EntryKey, Span, Value};
use crate::Result;

/// Replacement of one byte range of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub span: Span,
    pub replacement: Vec<u8>,
}

impl Splice {
    pub fn apply_to(&self, buffer: &mut Vec<u8>) {
        buffer.splice(self.span.start..self.span.end, self.replacement.iter().copied());
    }
}

/// Applies splices that were all planned against the same `buffer`.
///
/// Splices are applied from the back so earlier offsets stay valid; overlapping
/// or out-of-range splices are rejected before anything is written.
pub fn apply_all(buffer: &mut Vec<u8>, splices: &[Splice]) -> Result<()> {
    let mut ordered: Vec<&Splice> = splices.iter().collect();
    ordered.sort_by_key(|splice| std::cmp::Reverse(splice.span.start));
    if ordered
        .first()
        .is_some_and(|last| last.span.end > buffer.len())
    {
        return Err(Error::encode("splice past the end of the buffer"));
    }
    for pair in ordered.windows(2) {
        if pair[1].span.end > pair[0].span.start {
            return Err(Error::encode("overlapping splices"));
        }
    }
    for splice in ordered {
        splice.apply_to(buffer);
    }
    Ok(())
}

/// What the reparsed replacement stands for once the bytes are spliced.
#[derive(Debug, Clone, Copy)]
enum Target {
    /// The value of an existing entry; `leading` bytes precede it.
    Value { leading: usize },
    /// A whole existing entry.
    Entry,
    /// A new entry at the end of the parent dictionary.
    Append,
}

struct Planned {
    splice: Splice,
    target: Target,
}

impl Document {
    /// Replaces the value at `path`, or appends a new entry when there is none.
    ///
    /// Only the old value's bytes change when both the old and new values are
    /// not dictionaries; otherwise the whole entry is rewritten.
    ///
    /// # Examples
    /// ```
    /// use foamfile::KeyPath;
    ///
    /// let mut doc = foamfile::parse(b"// inlet speed\nfoo 1.5;\nbar 2;\n")?;
    /// doc.set(&KeyPath::parse("foo")?, 2.0)?;
    /// assert_eq!(doc.as_bytes(), b"// inlet speed\nfoo 2.0;\nbar 2;\n");
    /// # Ok::<(), foamfile::Error>(())
    /// ```
    pub fn set(&mut self, path: &KeyPath, value: impl Into<Value>) -> Result<Splice> {
        let value = value.into();
        let planned = self.plan(path, &value, false)?;
        self.commit(path, planned)
    }

    /// Appends a new entry even if the key already exists.
    pub fn add(&mut self, path: &KeyPath, value: impl Into<Value>) -> Result<Splice> {
        let value = value.into();
        let planned = self.plan(path, &value, true)?;
        self.commit(path, planned)
    }

    /// The splice [`Document::set`] would apply, leaving the document untouched.
    pub fn plan_set(&self, path: &KeyPath, value: &Value) -> Result<Splice> {
        Ok(self.plan(path, value, false)?.splice)
    }

    /// Deletes the entry at `path`, together with its line when nothing else
    /// shares it.
    pub fn remove(&mut self, path: &KeyPath) -> Result<Splice> {
        let entry = path
            .resolve(&self.root)
            .ok_or_else(|| Error::not_found(path))?;
        let span = line_span(&self.source, entry.span);
        let parent = path
            .parent_mut(&mut self.root)
            .ok_or_else(|| Error::not_found(path))?;
        let position = path
            .position_in(parent)
            .ok_or_else(|| Error::not_found(path))?;
        parent.entries.remove(position);

        let splice = Splice {
            span,
            replacement: Vec::new(),
        };
        splice.apply_to(&mut self.source);
        self.root.splice_spans(span, 0);
        tracing::debug!(path = %path, removed = span.len(), "removed entry");
        Ok(splice)
    }

    fn plan(&self, path: &KeyPath, value: &Value, append: bool) -> Result<Planned> {
        let layout = Layout::of_document(self);
        let last = path.last().ok_or_else(|| Error::not_found(path))?;
        let depth = path.depth() - 1;
        if !append {
            if let Some(entry) = path.resolve(&self.root) {
                return plan_replace(entry, value, depth, &layout);
            }
        }
        self.plan_append(path, &last.key, value, depth, &layout)
    }

    fn plan_append(
        &self,
        path: &KeyPath,
        key: &SmolStr,
        value: &Value,
        depth: usize,
        layout: &Layout,
    ) -> Result<Planned> {
        let (dict, open) = if path.parent().is_empty() {
            (&self.root, None)
        } else {
            let missing = || Error::not_found(path.parent_path());
            let parent = path.parent_entry(&self.root).ok_or_else(missing)?;
            match &parent.value {
                Some(Value::Dict(dict)) => (dict, Some(parent.value_span.start)),
                _ => return Err(missing()),
            }
        };

        let rendered = render_entry(&EntryKey::Keyword(key.clone()), Some(value), depth, layout)?;
        let mut replacement = Vec::with_capacity(rendered.len() + layout.indent * depth + 2);
        let at = match (dict.entries.last(), open) {
            (Some(last), _) => {
                replacement.push(b'\n');
                past_line_comment(&self.source, last.span.end)
            }
            (None, Some(open)) => {
                replacement.push(b'\n');
                open + 1
            }
            (None, None) => {
                if self.source.last().is_some_and(|byte| *byte != b'\n') {
                    replacement.push(b'\n');
                }
                self.source.len()
            }
        };
        replacement.extend(std::iter::repeat(b' ').take(layout.indent * depth));
        replacement.extend_from_slice(&rendered);
        if dict.is_empty() {
            replacement.push(b'\n');
            if open.is_some() {
                replacement.extend(std::iter::repeat(b' ').take(layout.indent * (depth - 1)));
            }
        }
        Ok(Planned {
            splice: Splice {
                span: Span::new(at, at),
                replacement,
            },
            target: Target::Append,
        })
    }

    /// Splices the planned bytes and swaps the reparsed replacement into the tree.
    ///
    /// The replacement is parsed before anything changes, so a failed edit
    /// leaves the document as it was.
    fn commit(&mut self, path: &KeyPath, planned: Planned) -> Result<Splice> {
        let Planned { splice, target } = planned;
        let start = splice.span.start;
        let inserted = splice.replacement.len();
        let (format, arch) = (self.format(), self.arch());
        let missing = || Error::not_found(path);

        match target {
            Target::Value { leading } => {
                let hint = path
                    .last()
                    .and_then(|last| self.options.hint_for(&last.key));
                let mut value = Parser::with_layout(
                    &splice.replacement[leading..],
                    &self.options,
                    format,
                    arch,
                )
                .value(hint)?;
                offset_value_spans(&mut value, start + leading);

                self.detach(path, start, false)?;
                splice.apply_to(&mut self.source);
                self.root.splice_spans(splice.span, inserted);
                let entry = path.resolve_mut(&mut self.root).ok_or_else(missing)?;
                entry.value = Some(value);
                entry.value_span = Span::new(start + leading, start + inserted);
            }
            Target::Entry => {
                let mut entry = self.reparse_entry(&splice.replacement)?;
                entry.offset_spans(start);

                self.detach(path, start, true)?;
                splice.apply_to(&mut self.source);
                self.root.splice_spans(splice.span, inserted);
                *path.resolve_mut(&mut self.root).ok_or_else(missing)? = entry;
            }
            Target::Append => {
                let mut entry = self.reparse_entry(&splice.replacement)?;
                entry.offset_spans(start);

                splice.apply_to(&mut self.source);
                self.root.splice_spans(splice.span, inserted);
                path.parent_mut(&mut self.root)
                    .ok_or_else(|| Error::not_found(path.parent_path()))?
                    .entries
                    .push(entry);
            }
        }
        tracing::debug!(
            path = %path,
            start,
            removed = splice.span.len(),
            inserted,
            "applied edit"
        );
        Ok(splice)
    }

    /// Clears the spans that lie inside the range about to be replaced.
    fn detach(&mut self, path: &KeyPath, start: usize, whole: bool) -> Result<()> {
        let entry = path
            .resolve_mut(&mut self.root)
            .ok_or_else(|| Error::not_found(path))?;
        entry.value = None;
        entry.value_span = Span::new(start, start);
        if whole {
            entry.span = Span::new(start, start);
        }
        Ok(())
    }

    fn reparse_entry(&self, bytes: &[u8]) -> Result<Entry> {
        Parser::with_layout(bytes, &self.options, self.format(), self.arch()).single_entry()
    }
}

fn plan_replace(entry: &Entry, value: &Value, depth: usize, layout: &Layout) -> Result<Planned> {
    let old_is_dict = matches!(entry.value, Some(Value::Dict(_)));
    if value.is_dict() || old_is_dict {
        let replacement = render_entry(&entry.key, Some(value), depth, layout)?;
        return Ok(Planned {
            splice: Splice {
                span: entry.span,
                replacement,
            },
            target: Target::Entry,
        });
    }

    let rendered = render_value(value, depth, layout)?;
    if entry.value.is_some() {
        return Ok(Planned {
            splice: Splice {
                span: entry.value_span,
                replacement: rendered,
            },
            target: Target::Value { leading: 0 },
        });
    }
    // `key;` gains its value in front of the `;`.
    let mut replacement = Vec::with_capacity(rendered.len() + 1);
    replacement.push(b' ');
    replacement.extend_from_slice(&rendered);
    Ok(Planned {
        splice: Splice {
            span: entry.value_span,
            replacement,
        },
        target: Target::Value { leading: 1 },
    })
}

/// End of a `// comment` that trails `pos` on the same line, or `pos` itself.
fn past_line_comment(source: &[u8], pos: usize) -> usize {
    let mut start = pos;
    while start < source.len() && matches!(source[start], b' ' | b'\t') {
        start += 1;
    }
    if !source[start..].starts_with(b"//") {
        return pos;
    }
    let mut end =
        memchr::memchr(b'\n', &source[start..]).map_or(source.len(), |offset| start + offset);
    if source[..end].ends_with(b"\r") {
        end -= 1;
    }
    // A continued comment swallows the next line too.
    if source[..end].ends_with(b"\\") {
        return pos;
    }
    end
}

/// Widens `span` to its whole line, newline included, when only blanks share it.
fn line_span(source: &[u8], span: Span) -> Span {
    let is_blank = |byte: &u8| matches!(byte, b' ' | b'\t' | b'\r');
    let mut start = span.start;
    while start > 0 && is_blank(&source[start - 1]) {
        start -= 1;
    }
    let mut end = span.end;
    while end < source.len() && is_blank(&source[end]) {
        end += 1;
    }
    let line_start = start == 0 || source[start - 1] == b'\n';
    let line_end = end == source.len() || source[end] == b'\n';
    if !(line_start && line_end) {
        return span;
    }
    if end < source.len() {
        end += 1;
    }
    Span::new(start, end)
}
