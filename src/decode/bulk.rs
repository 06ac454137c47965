use crate::constants::is_structural;
use crate::decode::number::{parse_number, Number, Target};
use crate::decode::skip::skip;
use crate::decode::{Failure, Step};
use crate::error::Error;
use crate::header::Endian;
use crate::options::Shape;
use crate::types::{Encoding, FaceList, NumericData, NumericList};
use crate::Result;

/// Flat numeric buffer that starts as integers and widens to floats on the
/// first non-integer literal.
enum Accumulator {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl Accumulator {
    fn with_capacity(target: Target, capacity: usize) -> Self {
        match target {
            Target::Float => Accumulator::Float(Vec::with_capacity(capacity)),
            Target::Integer | Target::Either => Accumulator::Int(Vec::with_capacity(capacity)),
        }
    }

    #[inline]
    fn push(&mut self, number: Number) {
        match (&mut *self, number) {
            (Accumulator::Int(values), Number::Int(value)) => values.push(value),
            (Accumulator::Float(values), number) => values.push(number.as_f64()),
            (Accumulator::Int(values), Number::Float(value)) => {
                let mut widened = Vec::with_capacity(values.capacity().max(values.len() + 1));
                widened.extend(values.iter().map(|value| *value as f64));
                widened.push(value);
                *self = Accumulator::Float(widened);
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Accumulator::Int(values) => values.len(),
            Accumulator::Float(values) => values.len(),
        }
    }

    fn into_data(self) -> NumericData {
        match self {
            Accumulator::Int(values) => NumericData::Int(values),
            Accumulator::Float(values) => NumericData::Float(values),
        }
    }
}

fn backtrack(pos: usize, expected: &'static str) -> Failure {
    Failure::Backtrack(Error::decode(pos, expected))
}

/// Scans a homogeneous ASCII list whose `(` sits just before `pos`.
///
/// With a `declared` shape, arity violations are fatal shape errors. Without
/// one the arity is taken from the first nested group (3, 6 or 9) and any
/// irregularity backtracks, as does a structural byte or a non-numeric token.
pub(crate) fn parse_ascii(
    input: &[u8],
    pos: usize,
    declared: Option<Shape>,
    target: Target,
    count: Option<usize>,
) -> Step<NumericList> {
    let open = pos.saturating_sub(1);
    let capacity = count
        .and_then(|count| count.checked_mul(declared.map_or(1, Shape::arity)))
        .unwrap_or(0)
        .min(input.len().saturating_sub(pos));
    let mut values = Accumulator::with_capacity(target, capacity);
    let mut group: Option<usize> = None;
    let mut group_arity: Option<usize> = None;
    let mut groups = 0usize;
    let mut scalars_at_top = false;
    let mut pos = pos;

    loop {
        pos = skip(input, pos, true)?;
        match input.get(pos) {
            None => return Err(backtrack(pos, ")")),
            Some(b'(') => {
                if group.is_some() || scalars_at_top {
                    return Err(backtrack(pos, "number"));
                }
                group = Some(0);
                pos += 1;
            }
            Some(b')') => {
                pos += 1;
                let Some(len) = group.take() else {
                    break;
                };
                match group_arity {
                    None => group_arity = Some(len),
                    Some(arity) if arity == len => {}
                    Some(arity) => {
                        return Err(arity_mismatch(declared, pos - 1, arity, len));
                    }
                }
                groups += 1;
            }
            Some(&byte) if is_structural(byte) => return Err(backtrack(pos, "numeric list")),
            Some(_) => {
                match group.as_mut() {
                    Some(len) => *len += 1,
                    None if groups > 0 => return Err(backtrack(pos, "(")),
                    None => scalars_at_top = true,
                }
                let (number, end) = parse_number(input, pos, target).map_err(Failure::Backtrack)?;
                values.push(number);
                pos = end;
            }
        }
    }

    let shape = match (declared, group_arity) {
        (Some(Shape::Scalar), Some(len)) => {
            return Err(Failure::Fatal(Error::shape(
                open,
                "scalar list",
                format!("found nested groups of {len}"),
            )));
        }
        (Some(shape), Some(len)) if shape.arity() != len => {
            return Err(arity_mismatch(declared, open, shape.arity(), len));
        }
        (Some(shape), _) => shape,
        (None, Some(len)) => match Shape::from_arity(len) {
            Some(shape) => shape,
            None => return Err(backtrack(open, "numeric list")),
        },
        (None, None) => Shape::Scalar,
    };

    let total = values.len();
    if total % shape.arity() != 0 {
        return Err(Failure::Fatal(Error::shape(
            open,
            format!("multiple of {} values", shape.arity()),
            format!("found {total}"),
        )));
    }
    if total == 0 && count.is_none() && declared.is_none() {
        return Err(backtrack(open, "non-empty numeric list"));
    }
    let elements = total / shape.arity();
    if let Some(count) = count {
        if elements != count {
            return Err(Failure::Backtrack(Error::shape(
                open,
                format!("{count} elements"),
                format!("found {elements}"),
            )));
        }
    }

    tracing::trace!(offset = open, elements, shape = shape.type_name(), "ascii numeric list");
    Ok((
        NumericList {
            shape,
            data: values.into_data(),
            encoding: Encoding::Ascii,
        },
        pos,
    ))
}

fn arity_mismatch(declared: Option<Shape>, pos: usize, arity: usize, len: usize) -> Failure {
    if declared.is_some() {
        Failure::Fatal(Error::shape(
            pos,
            format!("groups of {arity} values"),
            format!("found a group of {len}"),
        ))
    } else {
        backtrack(pos, "uniform group size")
    }
}

/// `N{value}`: one element repeated `count` times; `pos` is just past `{`.
pub(crate) fn parse_repeated(
    input: &[u8],
    pos: usize,
    count: usize,
    declared: Option<Shape>,
    target: Target,
) -> Step<NumericList> {
    let mut element = Accumulator::with_capacity(target, 9);
    let mut pos = skip(input, pos, true)?;
    if input.get(pos) == Some(&b'(') {
        pos += 1;
        loop {
            pos = skip(input, pos, true)?;
            if input.get(pos) == Some(&b')') {
                pos += 1;
                break;
            }
            let (number, end) = parse_number(input, pos, target).map_err(Failure::Backtrack)?;
            element.push(number);
            pos = end;
        }
    } else {
        let (number, end) = parse_number(input, pos, target).map_err(Failure::Backtrack)?;
        element.push(number);
        pos = end;
    }
    pos = skip(input, pos, true)?;
    if input.get(pos) != Some(&b'}') {
        return Err(backtrack(pos, "}"));
    }

    let arity = element.len();
    let shape = match (declared, Shape::from_arity(arity)) {
        (Some(shape), _) if shape.arity() == arity => shape,
        (Some(shape), _) => {
            return Err(arity_mismatch(Some(shape), pos, shape.arity(), arity));
        }
        (None, Some(shape)) => shape,
        (None, None) => return Err(backtrack(pos, "3, 6 or 9 components")),
    };
    let data = match element.into_data() {
        NumericData::Int(one) => NumericData::Int(repeat(&one, count, pos)?),
        NumericData::Float(one) => NumericData::Float(repeat(&one, count, pos)?),
    };
    Ok((
        NumericList {
            shape,
            data,
            encoding: Encoding::Ascii,
        },
        pos + 1,
    ))
}

/// `one` repeated `count` times. A count the allocator cannot satisfy is a
/// shape error at `pos`.
fn repeat<T: Clone>(
    one: &[T],
    count: usize,
    pos: usize,
) -> std::result::Result<Vec<T>, Failure> {
    let too_large = || Failure::Fatal(Error::shape(pos, "list count", "too large"));
    let len = count.checked_mul(one.len()).ok_or_else(too_large)?;
    let mut values = Vec::new();
    values.try_reserve_exact(len).map_err(|_| too_large())?;
    for _ in 0..count {
        values.extend_from_slice(one);
    }
    Ok(values)
}

/// What one binary scalar encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Element {
    Label(usize),
    Scalar(usize),
}

impl Element {
    fn width(self) -> usize {
        match self {
            Element::Label(width) | Element::Scalar(width) => width,
        }
    }
}

/// Copies `count` elements of raw fixed-width bytes starting at `pos`.
///
/// Consumes exactly `count * arity * width` bytes, which must be followed
/// by `)`; the returned position is just past it.
pub(crate) fn decode_binary(
    input: &[u8],
    pos: usize,
    count: usize,
    shape: Shape,
    element: Element,
    endian: Endian,
) -> Result<(NumericList, usize)> {
    let width = element.width();
    let scalars = count.checked_mul(shape.arity());
    let end = scalars
        .and_then(|scalars| scalars.checked_mul(width))
        .and_then(|bytes| pos.checked_add(bytes));
    let (Some(scalars), Some(end)) = (scalars, end) else {
        return Err(Error::shape(pos, "list count", "too large"));
    };
    if input.get(end) != Some(&b')') {
        return Err(Error::shape(
            end.min(input.len()),
            ")",
            format!(
                "{count} {} elements of {width}-byte values",
                shape.type_name()
            ),
        ));
    }

    let raw = &input[pos..end];
    let data = match (element, width) {
        (Element::Label(_), 4) => {
            NumericData::Int(decode_chunks::<4, _>(raw, endian, |bytes, big| {
                i64::from(if big {
                    i32::from_be_bytes(bytes)
                } else {
                    i32::from_le_bytes(bytes)
                })
            }))
        }
        (Element::Label(_), 8) => NumericData::Int(decode_chunks::<8, _>(raw, endian, |bytes, big| {
            if big {
                i64::from_be_bytes(bytes)
            } else {
                i64::from_le_bytes(bytes)
            }
        })),
        (Element::Scalar(_), 4) => {
            NumericData::Float(decode_chunks::<4, _>(raw, endian, |bytes, big| {
                f64::from(if big {
                    f32::from_be_bytes(bytes)
                } else {
                    f32::from_le_bytes(bytes)
                })
            }))
        }
        (Element::Scalar(_), 8) => {
            NumericData::Float(decode_chunks::<8, _>(raw, endian, |bytes, big| {
                if big {
                    f64::from_be_bytes(bytes)
                } else {
                    f64::from_le_bytes(bytes)
                }
            }))
        }
        _ => return Err(Error::unsupported(pos, "binary width other than 4 or 8 bytes")),
    };
    debug_assert_eq!(data.len(), scalars);

    tracing::trace!(offset = pos, count, width, "binary numeric list");
    Ok((
        NumericList {
            shape,
            data,
            encoding: Encoding::Binary { width },
        },
        end + 1,
    ))
}

#[inline]
fn decode_chunks<const N: usize, T>(
    raw: &[u8],
    endian: Endian,
    convert: impl Fn([u8; N], bool) -> T,
) -> Vec<T> {
    let big = endian == Endian::Big;
    raw.chunks_exact(N)
        .map(|chunk| {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(chunk);
            convert(bytes, big)
        })
        .collect()
}

/// Mesh connectivity such as `(4(0 1 2 3) 3(4 5 6))`; `pos` is just past `(`.
pub(crate) fn parse_faces(input: &[u8], pos: usize, count: Option<usize>) -> Step<FaceList> {
    let open = pos.saturating_sub(1);
    let mut faces = FaceList {
        flat: Vec::with_capacity(
            count
                .map_or(0, |count| count.saturating_mul(5))
                .min(input.len().saturating_sub(pos)),
        ),
        count: 0,
    };
    let mut pos = pos;
    loop {
        pos = skip(input, pos, true)?;
        match input.get(pos) {
            None => return Err(backtrack(pos, ")")),
            Some(b')') => {
                pos += 1;
                break;
            }
            Some(_) => {}
        }
        let (Number::Int(n), end) = parse_number(input, pos, Target::Integer)
            .map_err(Failure::Backtrack)?
        else {
            return Err(backtrack(pos, "integer"));
        };
        let n = usize::try_from(n).map_err(|_| backtrack(pos, "non-negative face size"))?;
        pos = skip(input, end, true)?;
        if input.get(pos) != Some(&b'(') {
            return Err(backtrack(pos, "("));
        }
        pos += 1;
        faces.flat.push(n as i64);
        let mut labels = 0;
        loop {
            pos = skip(input, pos, true)?;
            if input.get(pos) == Some(&b')') {
                pos += 1;
                break;
            }
            let (Number::Int(label), end) = parse_number(input, pos, Target::Integer)
                .map_err(Failure::Backtrack)?
            else {
                return Err(backtrack(pos, "integer"));
            };
            faces.flat.push(label);
            labels += 1;
            pos = end;
        }
        if labels != n {
            return Err(backtrack(pos, "face with as many labels as its size"));
        }
        faces.count += 1;
    }
    if count.is_some_and(|count| count != faces.count) || faces.count == 0 {
        return Err(backtrack(open, "faces list"));
    }
    Ok((faces, pos))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::error::ErrorKind;

    fn ascii(input: &[u8], declared: Option<Shape>) -> Step<NumericList> {
        parse_ascii(input, 1, declared, Target::Either, None)
    }

    #[rstest]
    fn test_scalar_list_stays_integer() {
        let (list, end) = ascii(b"(1 2 3) tail", None).unwrap();
        assert_eq!(list.as_ints(), Some(&[1, 2, 3][..]));
        assert_eq!(list.shape, Shape::Scalar);
        assert_eq!(end, 7);
    }

    #[rstest]
    fn test_float_widens_whole_list() {
        let (list, _) = ascii(b"(1 2.5 3)", None).unwrap();
        assert_eq!(list.as_floats(), Some(&[1.0, 2.5, 3.0][..]));
    }

    #[rstest]
    fn test_declared_vector_groups_flat_values() {
        let (list, _) = ascii(b"(1 2 3)", Some(Shape::Vector)).unwrap();
        assert_eq!(list.shape, Shape::Vector);
        assert_eq!(list.len(), 1);
    }

    #[rstest]
    fn test_nested_groups_infer_arity() {
        let (list, end) = ascii(b"((0 0 0) (1 0 0)\n// c\n(0 1 0))", None).unwrap();
        assert_eq!(list.shape, Shape::Vector);
        assert_eq!(list.len(), 3);
        assert_eq!(list.element(1).unwrap().as_slice(), &[1.0, 0.0, 0.0]);
        assert_eq!(end, 30);
    }

    #[rstest]
    #[case(b"(1 2 3 4)")]
    #[case(b"((1 2 3) (4 5 6 7))")]
    #[case(b"((1 2 3) (4 5))")]
    fn test_declared_arity_violation_is_shape_error(#[case] input: &[u8]) {
        match ascii(input, Some(Shape::Vector)) {
            Err(Failure::Fatal(err)) => assert_eq!(err.kind(), ErrorKind::Shape),
            other => panic!("expected shape error, got {other:?}"),
        }
    }

    #[rstest]
    #[case(b"(a b)")]
    #[case(b"(1 {a 1;})")]
    #[case(b"((1 2) (3 4))")]
    #[case(b"((1 2 3) (4 5))")]
    #[case(b"(1 (2 3 4))")]
    #[case(b"()")]
    #[case(b"(1 2")]
    fn test_irregular_lists_backtrack(#[case] input: &[u8]) {
        assert!(matches!(ascii(input, None), Err(Failure::Backtrack(_))));
    }

    #[rstest]
    fn test_count_mismatch_backtracks_with_shape_detail() {
        match parse_ascii(b"(1 2)", 1, None, Target::Either, Some(3)) {
            Err(Failure::Backtrack(err)) => assert_eq!(err.kind(), ErrorKind::Shape),
            other => panic!("unexpected {other:?}"),
        }
        let (list, _) = parse_ascii(b"()", 1, None, Target::Either, Some(0)).unwrap();
        assert!(list.is_empty());
    }

    #[rstest]
    fn test_repeated_element() {
        let (list, end) = parse_repeated(b"{(1 0 0)}", 1, 2, None, Target::Float).unwrap();
        assert_eq!(list.shape, Shape::Vector);
        assert_eq!(list.as_floats(), Some(&[1.0, 0.0, 0.0, 1.0, 0.0, 0.0][..]));
        assert_eq!(end, 9);

        let (labels, _) = parse_repeated(b"{ 7 }", 1, 3, None, Target::Either).unwrap();
        assert_eq!(labels.as_ints(), Some(&[7, 7, 7][..]));
    }

    #[rstest]
    fn test_huge_counts_fail_without_allocating() {
        let count = 1usize << 61;
        assert!(parse_ascii(b"(1)", 1, None, Target::Either, Some(count)).is_err());
        let vectors = parse_ascii(b"(1 2 3)", 1, Some(Shape::Vector), Target::Float, Some(count));
        assert!(vectors.is_err());
        assert!(parse_faces(b"(3(0 1 2))", 1, Some(count)).is_err());
        match parse_repeated(b"{1}", 1, count, None, Target::Either) {
            Err(Failure::Fatal(err)) => assert_eq!(err.kind(), ErrorKind::Shape),
            other => panic!("expected shape error, got {other:?}"),
        }
    }

    fn f64_bytes(values: &[f64]) -> Vec<u8> {
        values.iter().flat_map(|value| value.to_le_bytes()).collect()
    }

    #[rstest]
    fn test_binary_consumes_exact_span() {
        let mut input = b"(".to_vec();
        input.extend(f64_bytes(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        input.extend(b");");
        let (list, end) =
            decode_binary(&input, 1, 5, Shape::Scalar, Element::Scalar(8), Endian::Little)
                .unwrap();
        assert_eq!(list.as_floats(), Some(&[1.0, 2.0, 3.0, 4.0, 5.0][..]));
        assert_eq!(list.encoding, Encoding::Binary { width: 8 });
        assert_eq!(end, 42);
    }

    #[rstest]
    fn test_binary_short_span_fails() {
        let mut input = b"(".to_vec();
        input.extend(&f64_bytes(&[1.0, 2.0, 3.0, 4.0, 5.0])[..39]);
        input.extend(b");");
        let err = decode_binary(&input, 1, 5, Shape::Scalar, Element::Scalar(8), Endian::Little)
            .unwrap_err();
        assert!(err.is_decode());
        assert_eq!(err.offset(), Some(41));
    }

    #[rstest]
    fn test_binary_labels_and_big_endian() {
        let mut input = b"(".to_vec();
        for label in [3i32, -1] {
            input.extend(label.to_be_bytes());
        }
        input.push(b')');
        let (list, _) =
            decode_binary(&input, 1, 2, Shape::Scalar, Element::Label(4), Endian::Big).unwrap();
        assert_eq!(list.as_ints(), Some(&[3, -1][..]));
    }

    #[rstest]
    fn test_faces_interleave_counts() {
        let (faces, end) = parse_faces(b"(4(0 1 2 3) 3(4 5 6))", 1, Some(2)).unwrap();
        assert_eq!(faces.flat, vec![4, 0, 1, 2, 3, 3, 4, 5, 6]);
        assert_eq!(faces.len(), 2);
        assert_eq!(end, 21);
    }

    #[rstest]
    #[case(b"(4(0 1 2) )")]
    #[case(b"(2(0 1.5))")]
    #[case(b"()")]
    fn test_faces_reject(#[case] input: &[u8]) {
        assert!(parse_faces(input, 1, None).is_err());
    }
}
