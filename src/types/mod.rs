mod document;
mod value;

pub(crate) use document::offset_value_spans;
pub use document::{Dictionary, Document, Entry, EntryKey, Span};
pub use value::{
    DimensionSet, Dimensioned, Encoding, FaceIter, FaceList, KeyedValue, NumericData,
    NumericList, Tensor, Value,
};
