use crate::constants::is_whitespace;
use crate::error::Error;
use crate::Result;

/// Advances past whitespace and comments.
///
/// With `newline_ok` unset the scan stops in front of a line feed, including
/// the one ending a `//` comment. A `//` comment continues over a
/// backslash-newline pair. Running out of input is not an error, except inside
/// an unclosed `/*` comment.
pub fn skip(input: &[u8], mut pos: usize, newline_ok: bool) -> Result<usize> {
    let len = input.len();
    loop {
        while pos < len && is_whitespace(input[pos], newline_ok) {
            pos += 1;
        }
        if pos + 1 >= len || input[pos] != b'/' {
            return Ok(pos);
        }
        match input[pos + 1] {
            b'/' => pos = skip_line_comment(input, pos + 2, newline_ok),
            b'*' => pos = skip_block_comment(input, pos + 2)?,
            _ => return Ok(pos),
        }
    }
}

fn skip_line_comment(input: &[u8], mut pos: usize, newline_ok: bool) -> usize {
    let len = input.len();
    while let Some(offset) = memchr::memchr2(b'\n', b'\\', &input[pos..]) {
        pos += offset;
        if input[pos] == b'\\' {
            pos += if input.get(pos + 1) == Some(&b'\n') { 2 } else { 1 };
            continue;
        }
        return if newline_ok { pos + 1 } else { pos };
    }
    len
}

fn skip_block_comment(input: &[u8], pos: usize) -> Result<usize> {
    memchr::memmem::find(&input[pos..], b"*/")
        .map(|offset| pos + offset + 2)
        .ok_or_else(|| Error::decode(input.len(), "*/"))
}
