use std::fmt;

use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::options::Shape;
use crate::types::Dictionary;

/// A parsed or user-supplied value.
///
/// Every variant has a render rule in [`crate::encode`]; equality is structural
/// and ignores source positions and ASCII/binary encoding.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    /// `yes`/`no`, `on`/`off`, `true`/`false`.
    Bool(bool),
    Word(SmolStr),
    /// Text between the quotes, escapes kept verbatim.
    String(String),
    /// `$name`, kept unresolved.
    Substitution(SmolStr),
    /// `#word` in value position, e.g. `#calc`.
    Directive(SmolStr),
    List(Vec<Value>),
    /// Several tokens forming one entry value, e.g. `Gauss linear`.
    Tuple(Vec<Value>),
    Dict(Dictionary),
    /// `keyword value` pair inside a list, e.g. patches in a `boundary` file.
    Keyed(Box<KeyedValue>),
    Dimensions(DimensionSet),
    Dimensioned(Box<Dimensioned>),
    Uniform(Tensor),
    Nonuniform(NumericList),
    /// Homogeneous numeric list outside a field.
    Numeric(NumericList),
    /// Lists of count-prefixed integer lists, e.g. mesh faces.
    Faces(FaceList),
}

impl Value {
    pub fn word(word: impl Into<SmolStr>) -> Self {
        Value::Word(word.into())
    }

    pub fn string(text: impl Into<String>) -> Self {
        Value::String(text.into())
    }

    pub fn is_dict(&self) -> bool {
        matches!(self, Value::Dict(_))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric value of an integer or float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Text of a word, quoted string, substitution or directive token.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Word(word) | Value::Substitution(word) | Value::Directive(word) => {
                Some(word.as_str())
            }
            Value::String(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> Option<&NumericList> {
        match self {
            Value::Numeric(list) | Value::Nonuniform(list) => Some(list),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "switch",
            Value::Word(_) => "word",
            Value::String(_) => "string",
            Value::Substitution(_) => "substitution",
            Value::Directive(_) => "directive",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dictionary",
            Value::Keyed(_) => "keyword entry",
            Value::Dimensions(_) => "dimension set",
            Value::Dimensioned(_) => "dimensioned",
            Value::Uniform(_) => "uniform field",
            Value::Nonuniform(_) => "nonuniform field",
            Value::Numeric(_) => "numeric list",
            Value::Faces(_) => "faces list",
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Dictionary> for Value {
    fn from(dict: Dictionary) -> Self {
        Value::Dict(dict)
    }
}

impl From<DimensionSet> for Value {
    fn from(dimensions: DimensionSet) -> Self {
        Value::Dimensions(dimensions)
    }
}

impl From<Dimensioned> for Value {
    fn from(dimensioned: Dimensioned) -> Self {
        Value::Dimensioned(Box::new(dimensioned))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyedValue {
    pub keyword: Value,
    pub value: Value,
}

/// Physical dimension exponents in the order mass, length, time, temperature,
/// moles, current, luminous intensity.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct DimensionSet(pub [f64; 7]);

impl DimensionSet {
    pub const DIMENSIONLESS: DimensionSet = DimensionSet([0.0; 7]);

    /// Fills the leading slots from `exponents`; the rest stay zero.
    pub fn from_slice(exponents: &[f64]) -> Option<Self> {
        if exponents.len() > 7 {
            return None;
        }
        let mut out = [0.0; 7];
        out[..exponents.len()].copy_from_slice(exponents);
        Some(DimensionSet(out))
    }

    pub fn exponents(&self) -> &[f64; 7] {
        &self.0
    }

    pub fn mass(&self) -> f64 {
        self.0[0]
    }

    pub fn length(&self) -> f64 {
        self.0[1]
    }

    pub fn time(&self) -> f64 {
        self.0[2]
    }

    pub fn temperature(&self) -> f64 {
        self.0[3]
    }

    pub fn moles(&self) -> f64 {
        self.0[4]
    }

    pub fn current(&self) -> f64 {
        self.0[5]
    }

    pub fn luminous_intensity(&self) -> f64 {
        self.0[6]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dimensioned {
    pub name: Option<SmolStr>,
    pub dimensions: DimensionSet,
    pub value: Tensor,
}

/// A single scalar or fixed-size tuple, as used by `uniform` and dimensioned values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tensor {
    Scalar(f64),
    Vector([f64; 3]),
    SymmTensor([f64; 6]),
    Full([f64; 9]),
}

impl Tensor {
    pub fn from_components(components: &[f64]) -> Option<Self> {
        match components.len() {
            1 => Some(Tensor::Scalar(components[0])),
            3 => components.try_into().ok().map(Tensor::Vector),
            6 => components.try_into().ok().map(Tensor::SymmTensor),
            9 => components.try_into().ok().map(Tensor::Full),
            _ => None,
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Tensor::Scalar(_) => Shape::Scalar,
            Tensor::Vector(_) => Shape::Vector,
            Tensor::SymmTensor(_) => Shape::SymmTensor,
            Tensor::Full(_) => Shape::Tensor,
        }
    }

    pub fn components(&self) -> &[f64] {
        match self {
            Tensor::Scalar(value) => std::slice::from_ref(value),
            Tensor::Vector(values) => values,
            Tensor::SymmTensor(values) => values,
            Tensor::Full(values) => values,
        }
    }
}

/// Flat numeric storage backing a bulk list.
#[derive(Clone, Debug, PartialEq)]
pub enum NumericData {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl NumericData {
    /// Number of scalars, not elements.
    pub fn len(&self) -> usize {
        match self {
            NumericData::Int(values) => values.len(),
            NumericData::Float(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_float(&self) -> bool {
        matches!(self, NumericData::Float(_))
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            NumericData::Int(values) => values.iter().map(|value| *value as f64).collect(),
            NumericData::Float(values) => values.clone(),
        }
    }
}

/// How a numeric list appeared in (or should be written to) a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Ascii,
    /// Raw little/big-endian run; `width` is bytes per scalar.
    Binary { width: usize },
}

#[derive(Clone, Debug)]
pub struct NumericList {
    pub shape: Shape,
    pub data: NumericData,
    pub encoding: Encoding,
}

impl NumericList {
    pub fn scalars(values: Vec<f64>) -> Self {
        Self {
            shape: Shape::Scalar,
            data: NumericData::Float(values),
            encoding: Encoding::Ascii,
        }
    }

    pub fn labels(values: Vec<i64>) -> Self {
        Self {
            shape: Shape::Scalar,
            data: NumericData::Int(values),
            encoding: Encoding::Ascii,
        }
    }

    /// Builds a list of `shape` elements from flat components.
    pub fn from_flat(shape: Shape, values: Vec<f64>) -> Option<Self> {
        if values.len() % shape.arity() != 0 {
            return None;
        }
        Some(Self {
            shape,
            data: NumericData::Float(values),
            encoding: Encoding::Ascii,
        })
    }

    pub fn vectors(values: &[[f64; 3]]) -> Self {
        Self {
            shape: Shape::Vector,
            data: NumericData::Float(values.iter().flatten().copied().collect()),
            encoding: Encoding::Ascii,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len() / self.shape.arity()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match &self.data {
            NumericData::Float(values) => Some(values),
            NumericData::Int(_) => None,
        }
    }

    pub fn as_ints(&self) -> Option<&[i64]> {
        match &self.data {
            NumericData::Int(values) => Some(values),
            NumericData::Float(_) => None,
        }
    }

    /// Components of element `index`, as floats.
    pub fn element(&self, index: usize) -> Option<SmallVec<[f64; 9]>> {
        let arity = self.shape.arity();
        let start = index.checked_mul(arity)?;
        let end = start + arity;
        match &self.data {
            NumericData::Float(values) => values.get(start..end).map(SmallVec::from_slice),
            NumericData::Int(values) => values
                .get(start..end)
                .map(|slice| slice.iter().map(|value| *value as f64).collect()),
        }
    }
}

impl PartialEq for NumericList {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.data == other.data
    }
}

/// Count-prefixed integer lists stored flat: each face is its vertex count
/// followed by the vertex labels.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FaceList {
    pub flat: Vec<i64>,
    pub count: usize,
}

impl FaceList {
    pub fn from_faces<I, F>(faces: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: AsRef<[i64]>,
    {
        let mut list = FaceList::default();
        for face in faces {
            let face = face.as_ref();
            list.flat.push(face.len() as i64);
            list.flat.extend_from_slice(face);
            list.count += 1;
        }
        list
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> FaceIter<'_> {
        FaceIter {
            flat: &self.flat,
            pos: 0,
        }
    }
}

pub struct FaceIter<'a> {
    flat: &'a [i64],
    pos: usize,
}

impl<'a> Iterator for FaceIter<'a> {
    type Item = &'a [i64];

    fn next(&mut self) -> Option<Self::Item> {
        let n = usize::try_from(*self.flat.get(self.pos)?).ok()?;
        let start = self.pos + 1;
        let face = self.flat.get(start..start + n)?;
        self.pos = start + n;
        Some(face)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = crate::encode::value_to_vec(self).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&bytes))
    }
}
