mod writer;

use crate::constants::{DEFAULT_INDENT, HEADER_KEY};
use crate::error::Error;
use crate::header::{Arch, Endian};
use crate::options::{Compression, EncodeOptions, Format, LabelWidth, Precision, Shape};
use crate::types::{
    Dictionary, DimensionSet, Document, EntryKey, FaceList, NumericData, NumericList, Tensor,
    Value,
};
use crate::Result;

use writer::Writer;

/// Lists longer than this are written one element per line.
const INLINE_ELEMENTS: usize = 10;

/// Target encoding for rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) format: Format,
    pub(crate) label: LabelWidth,
    pub(crate) scalar: Precision,
    pub(crate) endian: Endian,
    pub(crate) indent: usize,
}

impl Layout {
    pub(crate) fn ascii() -> Self {
        Self {
            format: Format::Ascii,
            label: LabelWidth::default(),
            scalar: Precision::default(),
            endian: Endian::native(),
            indent: DEFAULT_INDENT,
        }
    }

    /// The layout a document was read with.
    pub(crate) fn of_document(doc: &Document) -> Self {
        let arch = doc.arch();
        Self {
            format: doc.format(),
            label: arch.map_or(LabelWidth::default(), |arch| arch.label),
            scalar: arch.map_or(Precision::default(), |arch| arch.scalar),
            endian: arch.map_or_else(Endian::native, |arch| arch.endian),
            indent: DEFAULT_INDENT,
        }
    }

    fn with_options(self, options: &EncodeOptions) -> Self {
        Self {
            format: options.format.unwrap_or(self.format),
            label: options.label_width.unwrap_or(self.label),
            scalar: options.precision.unwrap_or(self.scalar),
            endian: self.endian,
            indent: options.indent,
        }
    }

    /// Whether bytes laid out as `base` must be rewritten to match `self`.
    fn rewrites(&self, base: &Layout) -> bool {
        self.format != base.format
            || (self.format == Format::Binary
                && (self.label != base.label || self.scalar != base.scalar))
    }

    fn arch(&self) -> Arch {
        Arch {
            endian: self.endian,
            label: self.label,
            scalar: self.scalar,
        }
    }

    fn is_binary(&self) -> bool {
        self.format == Format::Binary
    }
}

/// The document's bytes: parsed text with every applied edit.
///
/// # Examples
/// ```
/// let doc = foamfile::parse(b"a  1; // kept\n")?;
/// assert_eq!(foamfile::to_vec(&doc)?, b"a  1; // kept\n");
/// # Ok::<(), foamfile::Error>(())
/// ```
pub fn to_vec(doc: &Document) -> Result<Vec<u8>> {
    Ok(doc.as_bytes().to_vec())
}

/// Serializes `doc`, re-rendering it when the options ask for a different
/// format, precision or label width.
///
/// A re-render rewrites the header's `format` (and `arch` for binary
/// output); comments and source spacing are not kept in that case.
pub fn to_vec_with_options(doc: &Document, options: &EncodeOptions) -> Result<Vec<u8>> {
    let base = Layout::of_document(doc);
    let layout = base.with_options(options);
    let bytes = if layout.rewrites(&base) {
        tracing::debug!(
            from = base.format.as_str(),
            to = layout.format.as_str(),
            precision = layout.scalar.bits(),
            "re-rendering document"
        );
        render_root(doc.root(), &layout, true, doc.as_bytes().len())?
    } else {
        doc.as_bytes().to_vec()
    };
    finish(bytes, options)
}

/// Text of an ASCII document.
pub fn to_string(doc: &Document) -> Result<String> {
    String::from_utf8(doc.as_bytes().to_vec())
        .map_err(|_| Error::encode("document holds binary data"))
}

/// Renders a dictionary built in code as file content.
///
/// # Examples
/// ```
/// use foamfile::{Dictionary, EncodeOptions, Value};
///
/// let dict = Dictionary::new()
///     .with("nu", 1.5e-7)
///     .with("solver", Dictionary::new().with("type", Value::word("PCG")));
/// let text = foamfile::encode_dictionary(&dict, &EncodeOptions::default())?;
/// assert_eq!(text, b"nu 1.5e-7;\nsolver\n{\n    type PCG;\n}\n");
/// # Ok::<(), foamfile::Error>(())
/// ```
pub fn encode_dictionary(dict: &Dictionary, options: &EncodeOptions) -> Result<Vec<u8>> {
    let layout = Layout::ascii().with_options(options);
    let bytes = render_root(dict, &layout, false, 0)?;
    finish(bytes, options)
}

/// Inline text of one value, as written after a keyword.
pub fn value_to_vec(value: &Value) -> Result<Vec<u8>> {
    render_value(value, 0, &Layout::ascii())
}

fn finish(bytes: Vec<u8>, options: &EncodeOptions) -> Result<Vec<u8>> {
    match options.compression {
        Compression::None => Ok(bytes),
        Compression::Gzip => crate::io::compress(&bytes),
    }
}

/// `capacity` is a size guess for the output, usually the source length.
fn render_root(
    root: &Dictionary,
    layout: &Layout,
    rewrite_header: bool,
    capacity: usize,
) -> Result<Vec<u8>> {
    let header = if rewrite_header {
        root.get(HEADER_KEY)
            .and_then(Value::as_dict)
            .map(|header| rewritten_header(header, layout))
    } else {
        None
    };
    let mut renderer = Renderer::with_capacity(*layout, capacity);
    for entry in &root.entries {
        let value = match (&entry.key, &header) {
            (EntryKey::Keyword(key), Some(header)) if key == HEADER_KEY => Some(header),
            _ => entry.value.as_ref(),
        };
        renderer.entry(&entry.key, value, 0, false)?;
        renderer.writer.write_newline();
    }
    Ok(renderer.writer.finish())
}

fn rewritten_header(header: &Dictionary, layout: &Layout) -> Value {
    let mut header = header.clone();
    header.insert("format", Value::word(layout.format.as_str()));
    if layout.is_binary() {
        header.insert("arch", Value::string(layout.arch().to_string()));
    }
    Value::Dict(header)
}

/// Value text for splicing into a document at nesting `depth`.
pub(crate) fn render_value(value: &Value, depth: usize, layout: &Layout) -> Result<Vec<u8>> {
    let mut renderer = Renderer::new(*layout);
    renderer.value(value, depth, false)?;
    Ok(renderer.writer.finish())
}

/// Entry text for splicing into a document; the first line carries no indent.
pub(crate) fn render_entry(
    key: &EntryKey,
    value: Option<&Value>,
    depth: usize,
    layout: &Layout,
) -> Result<Vec<u8>> {
    let mut renderer = Renderer::new(*layout);
    renderer.entry(key, value, depth, false)?;
    Ok(renderer.writer.finish())
}

struct Renderer {
    writer: Writer,
    layout: Layout,
}

impl Renderer {
    fn new(layout: Layout) -> Self {
        Self::with_capacity(layout, 0)
    }

    fn with_capacity(layout: Layout, capacity: usize) -> Self {
        Self {
            writer: Writer::with_capacity(layout.indent, capacity),
            layout,
        }
    }

    fn entry(
        &mut self,
        key: &EntryKey,
        value: Option<&Value>,
        depth: usize,
        inline: bool,
    ) -> Result<()> {
        match key {
            EntryKey::Keyword(keyword) => {
                self.writer.write_str(keyword);
                match value {
                    None => self.writer.write_byte(b';'),
                    Some(Value::Dict(dict)) if inline => {
                        self.writer.write_byte(b' ');
                        self.inline_dict(dict)?;
                    }
                    Some(Value::Dict(dict)) => {
                        self.writer.write_newline();
                        self.writer.write_indent(depth);
                        self.block(dict, depth)?;
                    }
                    Some(value) => {
                        self.writer.write_byte(b' ');
                        self.value(value, depth, inline)?;
                        self.writer.write_byte(b';');
                    }
                }
            }
            EntryKey::Directive(directive) => {
                self.writer.write_str(directive);
                if let Some(value) = value {
                    self.writer.write_byte(b' ');
                    self.value(value, depth, true)?;
                }
            }
            EntryKey::Standalone => {
                if let Some(value) = value {
                    self.standalone(value)?;
                }
            }
        }
        Ok(())
    }

    fn block(&mut self, dict: &Dictionary, depth: usize) -> Result<()> {
        self.writer.write_byte(b'{');
        self.writer.write_newline();
        for entry in &dict.entries {
            self.writer.write_indent(depth + 1);
            self.entry(&entry.key, entry.value.as_ref(), depth + 1, false)?;
            self.writer.write_newline();
        }
        self.writer.write_indent(depth);
        self.writer.write_byte(b'}');
        Ok(())
    }

    fn inline_dict(&mut self, dict: &Dictionary) -> Result<()> {
        self.writer.write_byte(b'{');
        for entry in &dict.entries {
            self.writer.write_byte(b' ');
            self.entry(&entry.key, entry.value.as_ref(), 0, true)?;
        }
        self.writer.write_str(" }");
        Ok(())
    }

    fn standalone(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Numeric(list) => self.numeric(list, true, self.layout.is_binary()),
            Value::Faces(faces) => self.faces(faces, true),
            Value::Tuple(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.writer.write_newline();
                    }
                    self.standalone(item)?;
                }
                Ok(())
            }
            other => self.value(other, 0, false),
        }
    }

    fn value(&mut self, value: &Value, depth: usize, inline: bool) -> Result<()> {
        match value {
            Value::Integer(value) => self.writer.write_i64(*value),
            Value::Float(value) => self.writer.write_f64(*value),
            Value::Bool(true) => self.writer.write_str("yes"),
            Value::Bool(false) => self.writer.write_str("no"),
            Value::Word(text) | Value::Substitution(text) | Value::Directive(text) => {
                self.writer.write_str(text)
            }
            Value::String(text) => self.writer.write_quoted(text),
            Value::List(items) => {
                self.writer.write_byte(b'(');
                self.sequence(items, depth)?;
                self.writer.write_byte(b')');
            }
            Value::Tuple(items) => self.sequence(items, depth)?,
            Value::Dict(dict) if inline => self.inline_dict(dict)?,
            Value::Dict(dict) => self.block(dict, depth)?,
            Value::Keyed(keyed) => {
                self.value(&keyed.keyword, depth, true)?;
                self.writer.write_byte(b' ');
                match &keyed.value {
                    Value::Dict(dict) => self.inline_dict(dict)?,
                    value => {
                        self.value(value, depth, true)?;
                        self.writer.write_byte(b';');
                    }
                }
            }
            Value::Dimensions(dimensions) => self.dimensions(dimensions),
            Value::Dimensioned(dimensioned) => {
                if let Some(name) = &dimensioned.name {
                    self.writer.write_str(name);
                    self.writer.write_byte(b' ');
                }
                self.dimensions(&dimensioned.dimensions);
                self.writer.write_byte(b' ');
                self.tensor(&dimensioned.value);
            }
            Value::Uniform(tensor) => {
                self.writer.write_str("uniform ");
                self.tensor(tensor);
            }
            Value::Nonuniform(list) => {
                self.writer.write_str("nonuniform List<");
                self.writer.write_str(field_type(list));
                self.writer.write_str("> ");
                self.numeric(list, true, self.layout.is_binary())?;
            }
            Value::Numeric(list) => self.numeric(list, false, false)?,
            Value::Faces(faces) => self.faces(faces, false)?,
        }
        Ok(())
    }

    fn sequence(&mut self, items: &[Value], depth: usize) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.writer.write_byte(b' ');
            }
            self.value(item, depth, true)?;
        }
        Ok(())
    }

    fn dimensions(&mut self, dimensions: &DimensionSet) {
        self.writer.write_byte(b'[');
        for (i, exponent) in dimensions.exponents().iter().enumerate() {
            if i > 0 {
                self.writer.write_byte(b' ');
            }
            self.writer.write_exponent(*exponent);
        }
        self.writer.write_byte(b']');
    }

    fn tensor(&mut self, tensor: &Tensor) {
        match tensor {
            Tensor::Scalar(value) => self.writer.write_f64(*value),
            other => self.components(other.components()),
        }
    }

    fn components(&mut self, components: &[f64]) {
        self.writer.write_byte(b'(');
        for (i, component) in components.iter().enumerate() {
            if i > 0 {
                self.writer.write_byte(b' ');
            }
            self.writer.write_f64(*component);
        }
        self.writer.write_byte(b')');
    }

    /// `counted` prefixes the element count; long counted lists go one
    /// element per line.
    fn numeric(&mut self, list: &NumericList, counted: bool, binary: bool) -> Result<()> {
        let arity = list.shape.arity();
        if list.data.len() % arity != 0 {
            return Err(Error::encode(format!(
                "{} values do not make whole {} elements",
                list.data.len(),
                list.shape.type_name()
            )));
        }
        if counted {
            self.writer.write_usize(list.len());
        }
        if binary {
            return self.binary(list);
        }
        let multiline = counted && list.len() > INLINE_ELEMENTS;
        let separator = if multiline { b'\n' } else { b' ' };
        if multiline {
            self.writer.write_newline();
        }
        self.writer.write_byte(b'(');
        if multiline {
            self.writer.write_newline();
        }
        for index in 0..list.len() {
            if index > 0 {
                self.writer.write_byte(separator);
            }
            let start = index * arity;
            if arity > 1 {
                self.writer.write_byte(b'(');
            }
            for offset in 0..arity {
                if offset > 0 {
                    self.writer.write_byte(b' ');
                }
                match &list.data {
                    NumericData::Int(values) => self.writer.write_i64(values[start + offset]),
                    NumericData::Float(values) => self.writer.write_f64(values[start + offset]),
                }
            }
            if arity > 1 {
                self.writer.write_byte(b')');
            }
        }
        if multiline {
            self.writer.write_newline();
        }
        self.writer.write_byte(b')');
        Ok(())
    }

    fn binary(&mut self, list: &NumericList) -> Result<()> {
        let endian = self.layout.endian;
        self.writer.write_byte(b'(');
        match &list.data {
            NumericData::Int(values) if is_label_list(list) => {
                let width = self.layout.label.width();
                for &value in values {
                    if width == 4 && i32::try_from(value).is_err() {
                        return Err(Error::encode(format!(
                            "label {value} does not fit in 32 bits"
                        )));
                    }
                    self.writer.write_raw_i64(value, width, endian);
                }
            }
            NumericData::Int(values) => {
                let width = self.layout.scalar.width();
                for &value in values {
                    self.writer.write_raw_f64(value as f64, width, endian);
                }
            }
            NumericData::Float(values) => {
                let width = self.layout.scalar.width();
                for &value in values {
                    self.writer.write_raw_f64(value, width, endian);
                }
            }
        }
        self.writer.write_byte(b')');
        Ok(())
    }

    fn faces(&mut self, faces: &FaceList, counted: bool) -> Result<()> {
        check_faces(faces)?;
        if counted {
            self.writer.write_usize(faces.len());
        }
        let multiline = counted && faces.len() > INLINE_ELEMENTS;
        if multiline {
            self.writer.write_newline();
        }
        self.writer.write_byte(b'(');
        if multiline {
            self.writer.write_newline();
        }
        for (i, face) in faces.iter().enumerate() {
            if i > 0 {
                self.writer.write_byte(if multiline { b'\n' } else { b' ' });
            }
            self.writer.write_usize(face.len());
            self.writer.write_byte(b'(');
            for (j, label) in face.iter().enumerate() {
                if j > 0 {
                    self.writer.write_byte(b' ');
                }
                self.writer.write_i64(*label);
            }
            self.writer.write_byte(b')');
        }
        if multiline {
            self.writer.write_newline();
        }
        self.writer.write_byte(b')');
        Ok(())
    }
}

/// The flat buffer must split into exactly `count` faces with nothing left.
fn check_faces(faces: &FaceList) -> Result<()> {
    let (whole, used) = faces
        .iter()
        .fold((0usize, 0usize), |(whole, used), face| (whole + 1, used + face.len() + 1));
    if whole != faces.count || used != faces.flat.len() {
        return Err(Error::encode(format!(
            "face list of {} labels holds {whole} whole faces, count is {}",
            faces.flat.len(),
            faces.count
        )));
    }
    Ok(())
}

fn is_label_list(list: &NumericList) -> bool {
    list.shape == Shape::Scalar && matches!(list.data, NumericData::Int(_))
}

fn field_type(list: &NumericList) -> &'static str {
    if is_label_list(list) {
        "label"
    } else {
        list.shape.type_name()
    }
}
