use smallvec::{smallvec, SmallVec};

use crate::decode::bulk::{decode_binary, Element};
use crate::error::Error;
use crate::header::{Arch, Endian};
use crate::options::{Format, Shape};
use crate::types::NumericList;
use crate::Result;

/// Byte widths worth trying for binary runs of one file.
///
/// A declared `arch` pins both widths. Without one, labels are 4 bytes and
/// scalars try 8 then 4; 64-bit labels always come with an `arch` entry.
#[derive(Debug, Clone)]
pub(crate) struct BinaryLayout {
    pub(crate) endian: Endian,
    labels: SmallVec<[usize; 2]>,
    scalars: SmallVec<[usize; 2]>,
}

impl BinaryLayout {
    /// `None` for ASCII files, which never carry binary runs.
    pub(crate) fn for_format(format: Format, arch: Option<Arch>) -> Option<Self> {
        if format != Format::Binary {
            return None;
        }
        Some(match arch {
            Some(arch) => Self {
                endian: arch.endian,
                labels: smallvec![arch.label.width()],
                scalars: smallvec![arch.scalar.width()],
            },
            None => Self {
                endian: Endian::native(),
                labels: smallvec![4],
                scalars: smallvec![8, 4],
            },
        })
    }

    fn candidates(&self, labels: bool) -> impl Iterator<Item = Element> + '_ {
        let widths = if labels {
            self.labels.as_slice()
        } else {
            self.scalars.as_slice()
        };
        widths.iter().map(move |&width| {
            if labels {
                Element::Label(width)
            } else {
                Element::Scalar(width)
            }
        })
    }
}

/// Number of raw bytes a binary run of `count` elements occupies.
pub fn binary_span(count: usize, shape: Shape, width: usize) -> Option<usize> {
    count.checked_mul(shape.arity())?.checked_mul(width)
}

/// Decodes the binary run after the `(` at `open`, trying each candidate
/// width until one lands exactly on the closing `)`.
///
/// On failure the error for the preferred width is returned.
pub(crate) fn decode_run(
    input: &[u8],
    open: usize,
    count: usize,
    shape: Shape,
    labels: bool,
    layout: &BinaryLayout,
) -> Result<(NumericList, usize)> {
    let mut first_error = None;
    for element in layout.candidates(labels) {
        match decode_binary(input, open + 1, count, shape, element, layout.endian) {
            Ok(decoded) => return Ok(decoded),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }
    Err(first_error.unwrap_or_else(|| Error::decode(open, "binary list")))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::options::{LabelWidth, Precision};
    use crate::types::Encoding;

    #[rstest]
    fn test_ascii_has_no_layout() {
        assert!(BinaryLayout::for_format(Format::Ascii, None).is_none());
    }

    #[rstest]
    #[case(5, Shape::Scalar, 8, Some(40))]
    #[case(2, Shape::Vector, 4, Some(24))]
    #[case(1, Shape::Tensor, 8, Some(72))]
    #[case(usize::MAX, Shape::Vector, 8, None)]
    fn test_binary_span(
        #[case] count: usize,
        #[case] shape: Shape,
        #[case] width: usize,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(binary_span(count, shape, width), expected);
    }

    #[rstest]
    fn test_undeclared_width_falls_back_to_single_precision() {
        let layout = BinaryLayout::for_format(Format::Binary, None).unwrap();
        let mut input = b"(".to_vec();
        for value in [1.5f32, 2.5] {
            input.extend(if layout.endian == Endian::Big {
                value.to_be_bytes()
            } else {
                value.to_le_bytes()
            });
        }
        input.push(b')');
        let (list, end) = decode_run(&input, 0, 2, Shape::Scalar, false, &layout).unwrap();
        assert_eq!(list.as_floats(), Some(&[1.5, 2.5][..]));
        assert_eq!(list.encoding, Encoding::Binary { width: 4 });
        assert_eq!(end, input.len());
    }

    #[rstest]
    fn test_declared_arch_pins_width() {
        let arch = Arch {
            endian: Endian::Little,
            label: LabelWidth::Bits32,
            scalar: Precision::Double,
        };
        let layout = BinaryLayout::for_format(Format::Binary, Some(arch)).unwrap();
        let mut input = b"(".to_vec();
        input.extend(1.5f32.to_le_bytes());
        input.extend(2.5f32.to_le_bytes());
        input.push(b')');
        let err = decode_run(&input, 0, 2, Shape::Scalar, false, &layout).unwrap_err();
        assert!(err.is_decode());
    }
}
