use std::borrow::Cow;

use memchr::{memchr, memchr2};

/// Lenient `application/x-www-form-urlencoded` decoding, the way query strings arrive from
/// browsers: `+` is a space, malformed escapes are kept literally and invalid UTF-8 is replaced.
pub fn form_decode(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    if memchr2(b'%', b'+', bytes).is_none() {
        return Cow::Borrowed(input);
    }

    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            b'%' => match bytes.get(i + 1..i + 3).and_then(parse_hex_byte) {
                Some(byte_val) => {
                    decoded.push(byte_val);
                    i += 3;
                }
                None => {
                    decoded.push(b'%');
                    i += 1;
                }
            },
            _ => {
                // Copy the run up to the next special byte in one go
                let run = memchr2(b'%', b'+', &bytes[i..]).unwrap_or(bytes.len() - i);
                decoded.extend_from_slice(&bytes[i..i + run]);
                i += run;
            }
        }
    }

    match String::from_utf8(decoded) {
        Ok(s) => Cow::Owned(s),
        Err(err) => Cow::Owned(String::from_utf8_lossy(err.as_bytes()).into_owned()),
    }
}

/// Whether `input` contains `needle`, used to reject separators inside URL components
pub(crate) fn contains_byte(needle: u8, input: &str) -> bool {
    memchr(needle, input.as_bytes()).is_some()
}

fn parse_hex_byte(hex_slice: &[u8]) -> Option<u8> {
    match hex_slice {
        [high, low] => Some((hex_to_digit(*high)? << 4) | hex_to_digit(*low)?),
        _ => None,
    }
}

fn hex_to_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
