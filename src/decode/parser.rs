use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::constants::{
    is_digit, is_structural, is_token_continuation, is_token_start, switch_value, HEADER_KEY,
};
use crate::decode::bulk;
use crate::decode::detect::{self, BinaryLayout};
use crate::decode::number::{parse_number, Number, Target};
use crate::decode::skip::skip;
use crate::decode::{Failure, Step};
use crate::error::Error;
use crate::header::{Arch, Header};
use crate::options::{Format, ParseOptions, Shape};
use crate::types::{
    Dictionary, DimensionSet, Dimensioned, Entry, EntryKey, KeyedValue, NumericList, Span, Tensor,
    Value,
};
use crate::Result;

#[derive(Debug, Clone, Copy)]
enum Token<'a> {
    Word(&'a str),
    /// Raw text including the surrounding quotes.
    Quoted(&'a str),
}

/// Result of trying `keyword value;` at a list item.
enum Keyed {
    Entry(Value, usize),
    /// The value ran up to this position without a `;`.
    Unterminated(usize),
    NotKeyed,
}

fn backtrack(pos: usize, expected: &'static str) -> Failure {
    Failure::Backtrack(Error::decode(pos, expected))
}

fn word_value(word: &str) -> Value {
    if let Some(switch) = switch_value(word) {
        return Value::Bool(switch);
    }
    if word.starts_with('$') {
        Value::Substitution(SmolStr::new(word))
    } else if word.starts_with('#') {
        Value::Directive(SmolStr::new(word))
    } else {
        Value::Word(SmolStr::new(word))
    }
}

fn quoted_value(raw: &str) -> Value {
    Value::String(raw[1..raw.len() - 1].to_owned())
}

fn keyed_value(keyword: Value, value: Value) -> Value {
    Value::Keyed(Box::new(KeyedValue { keyword, value }))
}

fn is_special_float(word: &str) -> bool {
    ["nan", "inf", "infinity"]
        .iter()
        .any(|special| word.eq_ignore_ascii_case(special))
}

/// Recursive-descent reader over one immutable buffer.
///
/// Every grammar method takes a position and returns the value plus the
/// position after it, so alternatives can be retried from the same spot.
pub(crate) struct Parser<'a> {
    input: &'a [u8],
    options: &'a ParseOptions,
    format: Format,
    arch: Option<Arch>,
    layout: Option<BinaryLayout>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(input: &'a [u8], options: &'a ParseOptions) -> Self {
        Self::with_layout(
            input,
            options,
            options.format.unwrap_or_default(),
            options.arch,
        )
    }

    /// Reader for a fragment of a file whose header was already seen.
    pub(crate) fn with_layout(
        input: &'a [u8],
        options: &'a ParseOptions,
        format: Format,
        arch: Option<Arch>,
    ) -> Self {
        Self {
            input,
            options,
            format,
            arch,
            layout: BinaryLayout::for_format(format, arch),
            depth: 0,
        }
    }

    pub(crate) fn format(&self) -> Format {
        self.format
    }

    fn apply_header(&mut self, dict: &Dictionary) {
        let header = Header::from_dict(dict);
        if self.options.format.is_none() {
            if let Some(format) = header.format {
                self.format = format;
            }
        }
        if self.options.arch.is_none() && header.arch.is_some() {
            self.arch = header.arch;
        }
        self.layout = BinaryLayout::for_format(self.format, self.arch);
    }

    #[inline]
    fn skip(&self, pos: usize) -> std::result::Result<usize, Failure> {
        Ok(skip(self.input, pos, true)?)
    }

    fn enter(&mut self, pos: usize) -> std::result::Result<(), Failure> {
        if self.depth >= self.options.max_depth {
            return Err(Failure::Fatal(Error::decode(
                pos,
                format!("nesting depth of at most {}", self.options.max_depth),
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn text(&self, start: usize, end: usize) -> std::result::Result<&'a str, Failure> {
        std::str::from_utf8(&self.input[start..end])
            .map_err(|_| Failure::Fatal(Error::decode(start, "UTF-8 text")))
    }

    /// All entries of a file, with at most one keyword-less data block.
    pub(crate) fn file(&mut self) -> Result<Dictionary> {
        let mut root = Dictionary::new();
        let mut pos = 0;
        loop {
            pos = skip(self.input, pos, true)?;
            if pos >= self.input.len() {
                return Ok(root);
            }
            let keyed = match self.entry(pos) {
                Ok((entry, end)) => {
                    if entry.key.as_str() == Some(HEADER_KEY) {
                        if let Some(Value::Dict(header)) = &entry.value {
                            self.apply_header(header);
                        }
                    }
                    root.entries.push(entry);
                    pos = end;
                    continue;
                }
                Err(Failure::Fatal(err)) => return Err(err),
                Err(Failure::Backtrack(err)) => err,
            };
            let (entry, end) = match self.standalone(pos) {
                Ok(parsed) => parsed,
                Err(Failure::Fatal(err)) => return Err(err),
                Err(Failure::Backtrack(_)) if keyed.offset() > Some(pos) => return Err(keyed),
                Err(Failure::Backtrack(_)) => {
                    return Err(Error::decode(pos, "keyword or standalone data"));
                }
            };
            if root.entries.iter().any(|entry| entry.key == EntryKey::Standalone) {
                return Err(Error::decode(pos, "only one standalone data block"));
            }
            root.entries.push(entry);
            pos = end;
        }
    }

    /// One value spanning the whole buffer.
    pub(crate) fn value(&mut self, hint: Option<Shape>) -> Result<Value> {
        let start = skip(self.input, 0, true)?;
        let (value, end) = self.data(start, hint).map_err(Failure::into_error)?;
        self.expect_end(end)?;
        Ok(value)
    }

    /// One entry spanning the whole buffer.
    pub(crate) fn single_entry(&mut self) -> Result<Entry> {
        let start = skip(self.input, 0, true)?;
        let (entry, end) = self.entry(start).map_err(Failure::into_error)?;
        self.expect_end(end)?;
        Ok(entry)
    }

    fn expect_end(&self, pos: usize) -> Result<()> {
        let end = skip(self.input, pos, true)?;
        if end != self.input.len() {
            return Err(Error::decode(end, "end of input"));
        }
        Ok(())
    }

    fn entry(&mut self, start: usize) -> Step<Entry> {
        let (token, after_key) = self.token(start)?;
        let key = match token {
            Token::Word(word) if word.starts_with('#') => {
                return self.directive(start, word, after_key);
            }
            Token::Word(word) | Token::Quoted(word) => SmolStr::new(word),
        };
        let pos = self.skip(after_key)?;
        match self.input.get(pos) {
            Some(b'{') => {
                let (dict, end) = self.dict(pos)?;
                Ok((
                    Entry {
                        key: EntryKey::Keyword(key),
                        value: Some(Value::Dict(dict)),
                        span: Span::new(start, end),
                        value_span: Span::new(pos, end),
                    },
                    end,
                ))
            }
            Some(b';') => Ok((
                Entry {
                    key: EntryKey::Keyword(key),
                    value: None,
                    span: Span::new(start, pos + 1),
                    value_span: Span::new(pos, pos),
                },
                pos + 1,
            )),
            _ => {
                let hint = self.options.hint_for(&key);
                let (value, end) = self.data(pos, hint)?;
                let close = self.skip(end)?;
                if self.input.get(close) != Some(&b';') {
                    return Err(backtrack(close, ";"));
                }
                Ok((
                    Entry {
                        key: EntryKey::Keyword(key),
                        value: Some(value),
                        span: Span::new(start, close + 1),
                        value_span: Span::new(pos, end),
                    },
                    close + 1,
                ))
            }
        }
    }

    /// `#include "file"` and friends; the value ends with the line.
    fn directive(&mut self, start: usize, word: &'a str, after_key: usize) -> Step<Entry> {
        if word == "#codeStream" {
            return Err(Failure::Fatal(Error::unsupported(start, "#codeStream")));
        }
        let key = EntryKey::Directive(SmolStr::new(word));
        let pos = skip(self.input, after_key, false)?;
        if matches!(self.input.get(pos), None | Some(b'\n')) {
            let entry = Entry {
                key,
                value: None,
                span: Span::new(start, after_key),
                value_span: Span::new(after_key, after_key),
            };
            return Ok((entry, pos));
        }
        let (value, end) = self.data_entry(pos, None).map_err(Failure::commit)?;
        let line_end = skip(self.input, end, false)?;
        if !matches!(self.input.get(line_end), None | Some(b'\n')) {
            return Err(Failure::Fatal(Error::decode(line_end, "end of line")));
        }
        let entry = Entry {
            key,
            value: Some(value),
            span: Span::new(start, end),
            value_span: Span::new(pos, end),
        };
        Ok((entry, line_end))
    }

    fn dict(&mut self, open: usize) -> Step<Dictionary> {
        self.enter(open)?;
        let result = self.dict_entries(open + 1);
        self.depth -= 1;
        result
    }

    fn dict_entries(&mut self, mut pos: usize) -> Step<Dictionary> {
        let mut dict = Dictionary::new();
        loop {
            pos = self.skip(pos)?;
            match self.input.get(pos) {
                Some(b'}') => return Ok((dict, pos + 1)),
                None => return Err(Failure::Fatal(Error::decode(pos, "}"))),
                Some(_) => {}
            }
            let (entry, end) = self.entry(pos).map_err(|failure| match failure {
                Failure::Backtrack(err) if err.offset() == Some(pos) => {
                    Failure::Fatal(Error::decode(pos, "keyword or }"))
                }
                other => other.commit(),
            })?;
            dict.entries.push(entry);
            pos = end;
        }
    }

    /// One or more data entries; several become a tuple.
    fn data(&mut self, pos: usize, hint: Option<Shape>) -> Step<Value> {
        let (first, mut end) = self.data_entry(pos, hint)?;
        let mut items = vec![first];
        loop {
            let next = self.skip(end)?;
            match self.data_entry(next, hint) {
                Ok((value, after)) => {
                    items.push(value);
                    end = after;
                }
                Err(Failure::Backtrack(_)) => break,
                Err(fatal) => return Err(fatal),
            }
        }
        let value = if items.len() == 1 {
            items.remove(0)
        } else {
            Value::Tuple(items)
        };
        Ok((value, end))
    }

    fn data_entry(&mut self, pos: usize, hint: Option<Shape>) -> Step<Value> {
        match self.input.get(pos) {
            Some(b'(') => self.list(pos, None, hint),
            Some(b'[') => self.dimensioned(pos, None),
            Some(&byte) if byte == b'"' || is_token_start(byte) => self.word_entry(pos, hint),
            Some(&byte) if is_digit(byte) || matches!(byte, b'-' | b'+' | b'.') => {
                self.numeric_entry(pos, hint)
            }
            _ => Err(backtrack(pos, "value")),
        }
    }

    fn word_entry(&mut self, pos: usize, hint: Option<Shape>) -> Step<Value> {
        let (token, end) = self.token(pos)?;
        let word = match token {
            Token::Word(word) => word,
            Token::Quoted(raw) => return Ok((quoted_value(raw), end)),
        };
        match word {
            "uniform" => match self.uniform(end) {
                Err(Failure::Backtrack(_)) => {}
                other => return other,
            },
            "nonuniform" => return self.nonuniform(end),
            "#codeStream" => return Err(Failure::Fatal(Error::unsupported(pos, "#codeStream"))),
            _ => {}
        }
        if is_special_float(word) {
            let (number, end) = parse_number(self.input, pos, Target::Either).map_err(Failure::Backtrack)?;
            return Ok((number.into(), end));
        }
        if hint.is_none() && !word.starts_with(['#', '$']) {
            let next = self.skip(end)?;
            if self.input.get(next) == Some(&b'[') {
                match self.dimensioned(next, Some(SmolStr::new(word))) {
                    Ok((value @ Value::Dimensioned(_), after)) => return Ok((value, after)),
                    Ok(_) | Err(Failure::Backtrack(_)) => {}
                    Err(fatal) => return Err(fatal),
                }
            }
        }
        Ok((word_value(word), end))
    }

    fn numeric_entry(&mut self, pos: usize, hint: Option<Shape>) -> Step<Value> {
        if let Some((count, open)) = self.count_prefix(pos)? {
            match self.input.get(open) {
                Some(b'(') => match self.list(open, Some(count), hint) {
                    Err(Failure::Backtrack(_)) => {}
                    other => return other,
                },
                Some(b'{') => match self.repeated(open, count, hint) {
                    Err(Failure::Backtrack(_)) => {}
                    other => return other,
                },
                _ => {}
            }
        }
        let (number, end) =
            parse_number(self.input, pos, Target::Either).map_err(Failure::Backtrack)?;
        Ok((number.into(), end))
    }

    /// A non-negative integer followed by whitespace, returned with the
    /// position of the next significant byte.
    fn count_prefix(&self, pos: usize) -> std::result::Result<Option<(usize, usize)>, Failure> {
        match parse_number(self.input, pos, Target::Integer) {
            Ok((Number::Int(count), end)) if count >= 0 => {
                Ok(Some((count as usize, self.skip(end)?)))
            }
            _ => Ok(None),
        }
    }

    fn list(&mut self, open: usize, count: Option<usize>, hint: Option<Shape>) -> Step<Value> {
        match bulk::parse_ascii(self.input, open + 1, hint, Target::Either, count) {
            Ok((list, end)) => return Ok((Value::Numeric(list), end)),
            Err(Failure::Backtrack(_)) => {
                tracing::trace!(offset = open, "numeric fast path declined");
            }
            Err(fatal) => return Err(fatal),
        }
        self.enter(open)?;
        let result = self.list_items(open + 1, count);
        self.depth -= 1;
        result.map(|(items, end)| (Value::List(items), end))
    }

    fn list_items(&mut self, mut pos: usize, count: Option<usize>) -> Step<Vec<Value>> {
        let mut items = Vec::with_capacity(count.unwrap_or(0).min(1024));
        let mut no_keyed_before = 0;
        loop {
            pos = self.skip(pos)?;
            if count == Some(items.len()) {
                break;
            }
            match self.input.get(pos) {
                Some(b')') if count.is_none() => return Ok((items, pos + 1)),
                None => return Err(backtrack(pos, ")")),
                Some(b')') => return Err(backtrack(pos, "list item")),
                Some(_) => {}
            }
            let (item, end) = self.list_item(pos, &mut no_keyed_before)?;
            items.push(item);
            pos = end;
        }
        if self.input.get(pos) != Some(&b')') {
            return Err(backtrack(pos, ")"));
        }
        Ok((items, pos + 1))
    }

    fn list_item(&mut self, pos: usize, no_keyed_before: &mut usize) -> Step<Value> {
        if self.input.get(pos) == Some(&b'{') {
            let (dict, end) = self.dict(pos)?;
            return Ok((Value::Dict(dict), end));
        }
        if pos >= *no_keyed_before {
            match self.keyed(pos)? {
                Keyed::Entry(value, end) => return Ok((value, end)),
                Keyed::Unterminated(end) => *no_keyed_before = end,
                Keyed::NotKeyed => {}
            }
        }
        self.data_entry(pos, None)
    }

    /// `keyword { ... }` or `keyword value;` inside a list.
    ///
    /// When the value runs into something other than `;` or `{`, every later
    /// item that starts before that point would fail the same way, which the
    /// caller uses to skip those attempts.
    fn keyed(&mut self, pos: usize) -> std::result::Result<Keyed, Failure> {
        let (keyword, end) = match self.data_entry(pos, None) {
            Ok(parsed) => parsed,
            Err(Failure::Backtrack(_)) => return Ok(Keyed::NotKeyed),
            Err(fatal) => return Err(fatal),
        };
        let next = self.skip(end)?;
        if self.input.get(next) == Some(&b'{') {
            let (dict, after) = self.dict(next)?;
            return Ok(Keyed::Entry(keyed_value(keyword, Value::Dict(dict)), after));
        }
        let (value, data_end) = match self.data(next, None) {
            Ok(parsed) => parsed,
            Err(Failure::Backtrack(_)) => return Ok(Keyed::NotKeyed),
            Err(fatal) => return Err(fatal),
        };
        let close = self.skip(data_end)?;
        Ok(match self.input.get(close) {
            Some(b';') => Keyed::Entry(keyed_value(keyword, value), close + 1),
            Some(b'{') => Keyed::NotKeyed,
            _ => Keyed::Unterminated(close),
        })
    }

    /// `N{value}`, numeric or not.
    fn repeated(&mut self, open: usize, count: usize, hint: Option<Shape>) -> Step<Value> {
        match bulk::parse_repeated(self.input, open + 1, count, hint, Target::Either) {
            Ok((list, end)) => return Ok((Value::Numeric(list), end)),
            Err(Failure::Backtrack(_)) => {}
            Err(fatal) => return Err(fatal),
        }
        self.enter(open)?;
        let result = self.repeated_item(open + 1, count);
        self.depth -= 1;
        result
    }

    fn repeated_item(&mut self, pos: usize, count: usize) -> Step<Value> {
        let pos = self.skip(pos)?;
        let mut no_keyed_before = 0;
        let (item, end) = self.list_item(pos, &mut no_keyed_before)?;
        let close = self.skip(end)?;
        if self.input.get(close) != Some(&b'}') {
            return Err(backtrack(close, "}"));
        }
        let mut items = Vec::new();
        items
            .try_reserve_exact(count)
            .map_err(|_| Failure::Fatal(Error::shape(pos, "list count", "too large")))?;
        items.resize(count, item);
        Ok((Value::List(items), close + 1))
    }

    /// Up to seven exponents; missing trailing slots are zero.
    fn dimensions(&self, open: usize) -> Step<DimensionSet> {
        let mut exponents: SmallVec<[f64; 7]> = SmallVec::new();
        let mut pos = open + 1;
        loop {
            pos = self.skip(pos)?;
            match self.input.get(pos) {
                Some(b']') => break,
                Some(&byte) if is_token_start(byte) => {
                    return Err(Failure::Fatal(Error::unsupported(pos, "named dimension units")));
                }
                _ if exponents.len() == 7 => {
                    return Err(Failure::Fatal(Error::decode(pos, "]")));
                }
                _ => {}
            }
            let (exponent, end) = parse_number(self.input, pos, Target::Either)
                .map_err(|_| Failure::Fatal(Error::decode(pos, "]")))?;
            exponents.push(exponent.as_f64());
            pos = end;
        }
        let dimensions = DimensionSet::from_slice(&exponents)
            .ok_or_else(|| Failure::Fatal(Error::decode(pos, "at most 7 exponents")))?;
        Ok((dimensions, pos + 1))
    }

    /// `[dims] value`, or a bare dimension set when no value follows.
    fn dimensioned(&mut self, open: usize, name: Option<SmolStr>) -> Step<Value> {
        let (dimensions, end) = self.dimensions(open)?;
        let next = self.skip(end)?;
        match self.tensor(next) {
            Ok((value, after)) => Ok((
                Value::Dimensioned(Box::new(Dimensioned {
                    name,
                    dimensions,
                    value,
                })),
                after,
            )),
            Err(Failure::Backtrack(_)) => Ok((Value::Dimensions(dimensions), end)),
            Err(fatal) => Err(fatal),
        }
    }

    fn tensor(&self, pos: usize) -> Step<Tensor> {
        if self.input.get(pos) != Some(&b'(') {
            let (number, end) =
                parse_number(self.input, pos, Target::Float).map_err(Failure::Backtrack)?;
            return Ok((Tensor::Scalar(number.as_f64()), end));
        }
        let mut components: SmallVec<[f64; 9]> = SmallVec::new();
        let mut next = pos + 1;
        loop {
            next = self.skip(next)?;
            if self.input.get(next) == Some(&b')') {
                next += 1;
                break;
            }
            if components.len() == 9 {
                return Err(backtrack(next, ")"));
            }
            let (number, end) =
                parse_number(self.input, next, Target::Float).map_err(Failure::Backtrack)?;
            components.push(number.as_f64());
            next = end;
        }
        match Tensor::from_components(&components) {
            Some(tensor) if tensor.shape() != Shape::Scalar => Ok((tensor, next)),
            _ => Err(backtrack(pos, "3, 6 or 9 components")),
        }
    }

    fn uniform(&mut self, after_word: usize) -> Step<Value> {
        let pos = self.skip(after_word)?;
        let (tensor, end) = self.tensor(pos)?;
        Ok((Value::Uniform(tensor), end))
    }

    /// Everything after `nonuniform` is committed to being a field.
    fn nonuniform(&mut self, after_word: usize) -> Step<Value> {
        self.nonuniform_list(after_word)
            .map(|(list, end)| (Value::Nonuniform(list), end))
            .map_err(Failure::commit)
    }

    fn nonuniform_list(&mut self, after_word: usize) -> Step<NumericList> {
        let pos = self.skip(after_word)?;
        let (token, end) = self.token(pos)?;
        let (shape, labels) = match token {
            Token::Word("List<scalar>") => (Shape::Scalar, false),
            Token::Word("List<vector>") => (Shape::Vector, false),
            Token::Word("List<symmTensor>") => (Shape::SymmTensor, false),
            Token::Word("List<tensor>") => (Shape::Tensor, false),
            Token::Word("List<label>") => (Shape::Scalar, true),
            Token::Word(other) if other.starts_with("List<") => {
                return Err(Failure::Fatal(Error::unsupported(
                    pos,
                    format!("field of {other}"),
                )));
            }
            _ => {
                return Err(backtrack(
                    pos,
                    "List<scalar>, List<vector>, List<symmTensor>, List<tensor> or List<label>",
                ));
            }
        };
        let target = if labels { Target::Integer } else { Target::Float };
        let pos = self.skip(end)?;
        let Some((count, open)) = self.count_prefix(pos)? else {
            return Err(backtrack(pos, "non-negative list count"));
        };
        match self.input.get(open) {
            Some(b'{') => bulk::parse_repeated(self.input, open + 1, count, Some(shape), target),
            Some(b'(') => self.field_list(open, count, shape, labels, target),
            _ => Err(backtrack(open, "(")),
        }
    }

    /// Binary files try the raw run first and fall back to ASCII; if both
    /// fail the binary error is the one reported.
    fn field_list(
        &self,
        open: usize,
        count: usize,
        shape: Shape,
        labels: bool,
        target: Target,
    ) -> Step<NumericList> {
        let ascii = || bulk::parse_ascii(self.input, open + 1, Some(shape), target, Some(count));
        let Some(layout) = &self.layout else {
            return ascii();
        };
        match detect::decode_run(self.input, open, count, shape, labels, layout) {
            Ok(decoded) => Ok(decoded),
            Err(binary) => ascii().map_err(|_| Failure::Fatal(binary)),
        }
    }

    fn standalone(&mut self, start: usize) -> Step<Entry> {
        let (first, mut end) = self.standalone_entry(start)?;
        let mut items = vec![first];
        loop {
            let next = self.skip(end)?;
            match self.standalone_entry(next) {
                Ok((value, after)) => {
                    items.push(value);
                    end = after;
                }
                Err(Failure::Backtrack(_)) => break,
                Err(fatal) => return Err(fatal),
            }
        }
        let value = if items.len() == 1 {
            items.remove(0)
        } else {
            Value::Tuple(items)
        };
        let entry = Entry {
            key: EntryKey::Standalone,
            value: Some(value),
            span: Span::new(start, end),
            value_span: Span::new(start, end),
        };
        Ok((entry, end))
    }

    /// Keyword-less data as found in mesh files.
    ///
    /// Binary files try raw label, scalar and vector runs first. Then the
    /// ASCII numeric and faces fast paths run, and finally the general grammar.
    fn standalone_entry(&mut self, pos: usize) -> Step<Value> {
        match self.input.get(pos) {
            Some(&byte) if byte == b'"' || is_token_start(byte) => {
                return Err(backtrack(pos, "standalone data"));
            }
            _ => {}
        }
        let counted = match self.input.get(pos) {
            Some(&byte) if is_digit(byte) => self.count_prefix(pos)?,
            _ => None,
        };
        let open = match counted {
            Some((_, open)) => open,
            None => pos,
        };
        if self.input.get(open) != Some(&b'(') {
            return self.data_entry(pos, None);
        }
        let count = counted.map(|(count, _)| count);

        if let (Some(count), Some(layout)) = (count, &self.layout) {
            for (shape, labels) in [
                (Shape::Scalar, true),
                (Shape::Scalar, false),
                (Shape::Vector, false),
            ] {
                if let Ok((list, end)) =
                    detect::decode_run(self.input, open, count, shape, labels, layout)
                {
                    return Ok((Value::Numeric(list), end));
                }
            }
        }

        let binary = self.layout.is_some();
        match bulk::parse_ascii(self.input, open + 1, None, Target::Either, count) {
            Ok((list, end)) => return Ok((Value::Numeric(list), end)),
            Err(Failure::Fatal(err)) if !binary => return Err(Failure::Fatal(err)),
            Err(_) => {}
        }
        match bulk::parse_faces(self.input, open + 1, count) {
            Ok((faces, end)) => return Ok((Value::Faces(faces), end)),
            Err(Failure::Fatal(err)) if !binary => return Err(Failure::Fatal(err)),
            Err(_) => {}
        }
        self.data_entry(pos, None)
    }

    fn token(&self, pos: usize) -> Step<Token<'a>> {
        let input = self.input;
        match input.get(pos) {
            Some(b'"') => {
                let mut end = pos + 1;
                loop {
                    match memchr::memchr2(b'"', b'\\', &input[end..]) {
                        Some(offset) if input[end + offset] == b'\\' => {
                            end += offset + 2;
                            if end > input.len() {
                                break;
                            }
                        }
                        Some(offset) => {
                            let end = end + offset + 1;
                            return Ok((Token::Quoted(self.text(pos, end)?), end));
                        }
                        None => break,
                    }
                }
                Err(Failure::Fatal(Error::decode(pos, "end of quoted string")))
            }
            Some(b'#') if input.get(pos + 1) == Some(&b'{') => Err(Failure::Fatal(
                Error::unsupported(pos, "#{ ... #} verbatim code block"),
            )),
            Some(b'$') if input.get(pos + 1) == Some(&b'{') => Err(Failure::Fatal(
                Error::unsupported(pos, "${...} expression"),
            )),
            Some(&first) if is_token_start(first) => {
                let mut end = pos + 1;
                let mut depth = 0usize;
                while let Some(&byte) = input.get(end) {
                    if depth == 0 && is_token_continuation(byte) {
                        end += 1;
                    } else if byte == b'(' {
                        depth += 1;
                        end += 1;
                    } else if byte == b')' && depth > 0 {
                        depth -= 1;
                        end += 1;
                    } else if depth > 0 && !is_structural(byte) {
                        end += 1;
                    } else {
                        break;
                    }
                }
                if depth != 0 {
                    return Err(Failure::Fatal(Error::decode(pos, ")")));
                }
                Ok((Token::Word(self.text(pos, end)?), end))
            }
            _ => Err(backtrack(pos, "keyword")),
        }
    }
}
