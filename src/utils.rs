//! Small helpers shared by the reader and the writer: builder setters and
//! percent-escaping of column 9 text.

use std::fmt::Write;

#[macro_export]
macro_rules! with_field_fn {
    ($field_name: ident, $field_type: ty) => {
        paste::paste! {
            pub fn [<with_$field_name>](mut self, value: $field_type) -> Self {
                self.$field_name = value;
                self
            }
        }
    };
}

/// Characters that must be escaped inside attribute tags and values.
const RESERVED: &[char] = &[';', '=', '%', '&', ','];

fn needs_escape(c: char) -> bool { RESERVED.contains(&c) || c.is_control() }

/// Percent-escapes reserved and control characters.
pub fn escape(s: &str) -> String {
    if !s.chars().any(needs_escape) {
        return s.to_owned();
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        if needs_escape(c) {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                // writing into a String never fails
                let _ = write!(out, "%{:02X}", byte);
            }
        }
        else {
            out.push(c);
        }
    }
    out
}

/// Decodes `%XX` sequences. Returns the offending fragment on a malformed
/// escape or when the decoded bytes are not valid UTF-8.
pub fn unescape(s: &str) -> Result<String, String> {
    if !s.contains('%') {
        return Ok(s.to_owned());
    }
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .filter(|h| h.iter().all(u8::is_ascii_hexdigit))
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            match hex {
                Some(byte) => {
                    out.push(byte);
                    i += 3;
                },
                None => {
                    let end = (i + 3).min(bytes.len());
                    return Err(String::from_utf8_lossy(&bytes[i..end]).into_owned());
                },
            }
        }
        else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| s.to_owned())
}
