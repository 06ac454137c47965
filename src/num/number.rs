/// Appends the shortest text that reads back as `value`.
///
/// Non-finite values use the spellings the number scanner accepts.
pub fn write_f64(out: &mut Vec<u8>, value: f64) {
    if value.is_nan() {
        out.extend_from_slice(b"nan");
        return;
    }
    if value.is_infinite() {
        let text: &[u8] = if value > 0.0 { b"inf" } else { b"-inf" };
        out.extend_from_slice(text);
        return;
    }
    let mut buffer = ryu::Buffer::new();
    out.extend_from_slice(buffer.format_finite(value).as_bytes());
}

pub fn write_i64(out: &mut Vec<u8>, value: i64) {
    let mut buffer = itoa::Buffer::new();
    out.extend_from_slice(buffer.format(value).as_bytes());
}

pub fn write_usize(out: &mut Vec<u8>, value: usize) {
    let mut buffer = itoa::Buffer::new();
    out.extend_from_slice(buffer.format(value).as_bytes());
}

pub fn format_f64(value: f64) -> String {
    let mut out = Vec::with_capacity(24);
    write_f64(&mut out, value);
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::decode::{parse_number, Target};

    #[rstest]
    #[case(1.5, "1.5")]
    #[case(2.0, "2.0")]
    #[case(-0.25, "-0.25")]
    #[case(1e-5, "0.00001")]
    #[case(1e-7, "1e-7")]
    #[case(f64::INFINITY, "inf")]
    #[case(f64::NEG_INFINITY, "-inf")]
    fn test_format_f64(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_f64(value), expected);
    }

    #[rstest]
    #[case(0.1)]
    #[case(1.0 / 3.0)]
    #[case(6.02214076e23)]
    #[case(-1.7976931348623157e308)]
    fn test_float_text_reads_back(#[case] value: f64) {
        let text = format_f64(value);
        let (number, _) = parse_number(text.as_bytes(), 0, Target::Float).unwrap();
        assert_eq!(number.as_f64(), value);
    }

    #[rstest]
    fn test_write_integers() {
        let mut out = Vec::new();
        write_i64(&mut out, -42);
        out.push(b' ');
        write_usize(&mut out, 7);
        assert_eq!(out, b"-42 7");
    }
}
