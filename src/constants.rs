pub const SWITCH_TRUE: &[&str] = &["yes", "true", "on"];
pub const SWITCH_FALSE: &[&str] = &["no", "false", "off"];

pub const MAX_DEPTH: usize = 256;

pub const DEFAULT_INDENT: usize = 4;

pub const HEADER_KEY: &str = "FoamFile";

pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

const WHITESPACE: u8 = 1;
const NEWLINE: u8 = 1 << 1;
const DIGIT: u8 = 1 << 2;
const ALPHA: u8 = 1 << 3;
const TOKEN_PUNCT: u8 = 1 << 4;
const STRUCTURAL: u8 = 1 << 5;

static CLASS: [u8; 256] = build_class_table();

const fn build_class_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    table[b' ' as usize] = WHITESPACE;
    table[b'\t' as usize] = WHITESPACE;
    table[b'\r' as usize] = WHITESPACE;
    table[0x0c] = WHITESPACE;
    table[0x0b] = WHITESPACE;
    table[b'\n' as usize] = NEWLINE;

    let mut c = b'0';
    while c <= b'9' {
        table[c as usize] = DIGIT;
        c += 1;
    }
    let mut c = b'a';
    while c <= b'z' {
        table[c as usize] = ALPHA;
        table[(c - b'a' + b'A') as usize] = ALPHA;
        c += 1;
    }

    let punct = b"._<>#$:+-*/|^%&=!";
    let mut i = 0;
    while i < punct.len() {
        table[punct[i] as usize] = TOKEN_PUNCT;
        i += 1;
    }

    let structural = b";(){}[]";
    let mut i = 0;
    while i < structural.len() {
        table[structural[i] as usize] = STRUCTURAL;
        i += 1;
    }
    table
}

#[inline(always)]
pub fn is_whitespace(byte: u8, newline_ok: bool) -> bool {
    let class = CLASS[byte as usize];
    class & WHITESPACE != 0 || (newline_ok && class & NEWLINE != 0)
}

#[inline(always)]
pub fn is_digit(byte: u8) -> bool {
    CLASS[byte as usize] & DIGIT != 0
}

/// Bytes that may continue a bare word. A number immediately followed by one of
/// these is really the prefix of a word.
#[inline(always)]
pub fn is_token_continuation(byte: u8) -> bool {
    CLASS[byte as usize] & (DIGIT | ALPHA | TOKEN_PUNCT) != 0
}

#[inline(always)]
pub fn is_token_start(byte: u8) -> bool {
    CLASS[byte as usize] & ALPHA != 0 || matches!(byte, b'_' | b'#' | b'$')
}

/// Bytes that can never appear inside a numeric list.
#[inline(always)]
pub fn is_structural(byte: u8) -> bool {
    CLASS[byte as usize] & STRUCTURAL != 0
}

#[inline]
pub fn switch_value(word: &str) -> Option<bool> {
    if SWITCH_TRUE.contains(&word) {
        Some(true)
    } else if SWITCH_FALSE.contains(&word) {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_whitespace_respects_newline_flag() {
        assert!(is_whitespace(b' ', false));
        assert!(is_whitespace(0x0b, false));
        assert!(!is_whitespace(b'\n', false));
        assert!(is_whitespace(b'\n', true));
        assert!(!is_whitespace(b'a', true));
    }

    #[rstest::rstest]
    fn test_token_continuation() {
        for byte in b"aZ09._<>#$:+-*/|^%&=!" {
            assert!(is_token_continuation(*byte), "{}", *byte as char);
        }
        for byte in b" ;(){}[]\"'," {
            assert!(!is_token_continuation(*byte), "{}", *byte as char);
        }
    }

    #[rstest::rstest]
    fn test_token_start() {
        assert!(is_token_start(b'a'));
        assert!(is_token_start(b'$'));
        assert!(is_token_start(b'#'));
        assert!(is_token_start(b'_'));
        assert!(!is_token_start(b'1'));
        assert!(!is_token_start(b'-'));
    }

    #[rstest::rstest]
    fn test_switch_value() {
        assert_eq!(switch_value("on"), Some(true));
        assert_eq!(switch_value("false"), Some(false));
        assert_eq!(switch_value("On"), None);
        assert_eq!(switch_value("maybe"), None);
    }
}
