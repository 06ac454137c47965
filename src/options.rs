use smol_str::SmolStr;

use crate::constants::{DEFAULT_INDENT, MAX_DEPTH};
use crate::header::Arch;

/// Encoding of bulk numeric lists, as declared by the header's `format` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Ascii,
    Binary,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Ascii => "ascii",
            Format::Binary => "binary",
        }
    }

    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "ascii" => Some(Format::Ascii),
            "binary" => Some(Format::Binary),
            _ => None,
        }
    }
}

/// Width of binary scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    Single,
    #[default]
    Double,
}

impl Precision {
    pub fn width(self) -> usize {
        match self {
            Precision::Single => 4,
            Precision::Double => 8,
        }
    }

    pub fn bits(self) -> u32 {
        (self.width() * 8) as u32
    }
}

/// Width of binary integer labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelWidth {
    #[default]
    Bits32,
    Bits64,
}

impl LabelWidth {
    pub fn width(self) -> usize {
        match self {
            LabelWidth::Bits32 => 4,
            LabelWidth::Bits64 => 8,
        }
    }

    pub fn bits(self) -> u32 {
        (self.width() * 8) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

/// Element shape of a numeric list: scalars or fixed-size tuples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Vector,
    SymmTensor,
    Tensor,
}

impl Shape {
    /// Components per element; scalars report 1.
    pub fn arity(self) -> usize {
        match self {
            Shape::Scalar => 1,
            Shape::Vector => 3,
            Shape::SymmTensor => 6,
            Shape::Tensor => 9,
        }
    }

    pub fn from_arity(arity: usize) -> Option<Self> {
        match arity {
            1 => Some(Shape::Scalar),
            3 => Some(Shape::Vector),
            6 => Some(Shape::SymmTensor),
            9 => Some(Shape::Tensor),
            _ => None,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Shape::Scalar => "scalar",
            Shape::Vector => "vector",
            Shape::SymmTensor => "symmTensor",
            Shape::Tensor => "tensor",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub max_depth: usize,
    pub hints: Vec<(SmolStr, Shape)>,
    pub format: Option<Format>,
    pub arch: Option<Arch>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Lists under `keyword` are read as elements of `shape`.
    pub fn with_hint(mut self, keyword: impl Into<SmolStr>, shape: Shape) -> Self {
        self.hints.push((keyword.into(), shape));
        self
    }

    /// Overrides the header's `format`, for content without a header.
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_arch(mut self, arch: Arch) -> Self {
        self.arch = Some(arch);
        self
    }

    pub(crate) fn hint_for(&self, keyword: &str) -> Option<Shape> {
        self.hints
            .iter()
            .find(|(key, _)| key == keyword)
            .map(|(_, shape)| *shape)
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            hints: Vec::new(),
            format: None,
            arch: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EncodeOptions {
    pub format: Option<Format>,
    pub precision: Option<Precision>,
    pub label_width: Option<LabelWidth>,
    pub compression: Compression,
    pub indent: usize,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn with_label_width(mut self, label_width: LabelWidth) -> Self {
        self.label_width = Some(label_width);
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            format: None,
            precision: None,
            label_width: None,
            compression: Compression::None,
            indent: DEFAULT_INDENT,
        }
    }
}
