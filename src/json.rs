//! `serde::Serialize` for the document model, for export to JSON and friends.
//!
//! Dictionaries become maps in file order, duplicate keys included. Numeric
//! buffers become flat arrays for scalars and nested arrays for tuples.
//! Words, substitutions and directives are strings carrying their sigil.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::error::Error;
use crate::options::Shape;
use crate::types::{
    DimensionSet, Dimensioned, Dictionary, Document, EntryKey, FaceList, NumericData, NumericList,
    Tensor, Value,
};
use crate::Result;

/// Key used for keyword-less data in exported maps.
pub const STANDALONE_KEY: &str = "";

pub fn to_json_value(doc: &Document) -> Result<serde_json::Value> {
    serde_json::to_value(doc).map_err(|err| Error::encode(err.to_string()))
}

pub fn to_json_string(doc: &Document, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(doc)
    } else {
        serde_json::to_string(doc)
    };
    text.map_err(|err| Error::encode(err.to_string()))
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.root().serialize(serializer)
    }
}

impl Serialize for Dictionary {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for entry in self.entries() {
            let key = match &entry.key {
                EntryKey::Keyword(key) | EntryKey::Directive(key) => key.as_str(),
                EntryKey::Standalone => STANDALONE_KEY,
            };
            map.serialize_entry(key, &entry.value)?;
        }
        map.end()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Float(value) => serialize_f64(*value, serializer),
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::Word(word) | Value::Substitution(word) | Value::Directive(word) => {
                serializer.serialize_str(word)
            }
            Value::String(text) => serializer.serialize_str(text),
            Value::List(items) | Value::Tuple(items) => serializer.collect_seq(items),
            Value::Dict(dict) => dict.serialize(serializer),
            Value::Keyed(keyed) => match keyed.keyword.as_str() {
                Some(keyword) => {
                    let mut map = serializer.serialize_map(Some(1))?;
                    map.serialize_entry(keyword, &keyed.value)?;
                    map.end()
                }
                None => {
                    let mut seq = serializer.serialize_seq(Some(2))?;
                    seq.serialize_element(&keyed.keyword)?;
                    seq.serialize_element(&keyed.value)?;
                    seq.end()
                }
            },
            Value::Dimensions(dimensions) => dimensions.serialize(serializer),
            Value::Dimensioned(dimensioned) => dimensioned.serialize(serializer),
            Value::Uniform(tensor) => tensor.serialize(serializer),
            Value::Nonuniform(list) | Value::Numeric(list) => list.serialize(serializer),
            Value::Faces(faces) => faces.serialize(serializer),
        }
    }
}

/// JSON has no non-finite numbers; they are written as their FoamFile words.
fn serialize_f64<S: Serializer>(value: f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(value)
    } else if value.is_nan() {
        serializer.serialize_str("nan")
    } else if value > 0.0 {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

struct Float(f64);

impl Serialize for Float {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_f64(self.0, serializer)
    }
}

struct Floats<'a>(&'a [f64]);

impl Serialize for Floats<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|value| Float(*value)))
    }
}

impl Serialize for DimensionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Floats(self.exponents()).serialize(serializer)
    }
}

impl Serialize for Tensor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Tensor::Scalar(value) => serialize_f64(*value, serializer),
            other => Floats(other.components()).serialize(serializer),
        }
    }
}

impl Serialize for Dimensioned {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = if self.name.is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(name) = &self.name {
            map.serialize_entry("name", name.as_str())?;
        }
        map.serialize_entry("dimensions", &self.dimensions)?;
        map.serialize_entry("value", &self.value)?;
        map.end()
    }
}

impl Serialize for NumericList {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match (&self.data, self.shape) {
            (NumericData::Int(values), Shape::Scalar) => serializer.collect_seq(values),
            (NumericData::Int(values), shape) => {
                serializer.collect_seq(values.chunks_exact(shape.arity()))
            }
            (NumericData::Float(values), Shape::Scalar) => Floats(values).serialize(serializer),
            (NumericData::Float(values), shape) => {
                serializer.collect_seq(values.chunks_exact(shape.arity()).map(Floats))
            }
        }
    }
}

impl Serialize for FaceList {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
