//! JSON field encoding shared by the JSON writer and `Attrib::append_json`
//!
//! Every field is appended as `"key":value,`; the trailing separator of the
//! last field is replaced by the closing brace when the record is finished.

use super::writer::ValueWriter;
use uuid::Uuid;

/// Text for floats JSON cannot represent natively.
pub(crate) fn non_finite_token(val: f64) -> Option<&'static str> {
    if val.is_nan() {
        Some("NaN")
    } else if val == f64::INFINITY {
        Some("+Inf")
    } else if val == f64::NEG_INFINITY {
        Some("-Inf")
    } else {
        None
    }
}

pub(crate) fn is_blank(raw: &[u8]) -> bool {
    raw.iter().all(u8::is_ascii_whitespace)
}

/// Validate `raw` as a single JSON value and append it without insignificant whitespace.
///
/// Nothing is appended when validation fails.
pub(crate) fn compact_json(raw: &[u8], out: &mut Vec<u8>) -> Result<(), serde_json::Error> {
    serde_json::from_slice::<serde::de::IgnoredAny>(raw)?;

    let mut in_string = false;
    let mut escaped = false;
    for &b in raw {
        if in_string {
            out.push(b);
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else if !b.is_ascii_whitespace() {
            if b == b'"' {
                in_string = true;
            }
            out.push(b);
        }
    }
    Ok(())
}

pub(crate) fn push_json_string(buf: &mut Vec<u8>, val: &str) {
    // Serializing a str into a Vec cannot fail
    let _ = serde_json::to_writer(&mut *buf, val);
}

#[derive(Debug, Default)]
pub(crate) struct JsonEncoder {
    buf: Vec<u8>,
    in_slice: bool,
    slice_len: usize,
}

impl JsonEncoder {
    pub(crate) fn with_buffer(buf: Vec<u8>) -> Self {
        Self {
            buf,
            in_slice: false,
            slice_len: 0,
        }
    }

    pub(crate) fn buffer(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }

    pub(crate) fn into_buffer(self) -> Vec<u8> {
        self.buf
    }

    pub(crate) fn clear(&mut self) {
        self.buf.clear();
        self.in_slice = false;
        self.slice_len = 0;
    }

    /// Replace the trailing field separator with `}`.
    pub(crate) fn close_object(&mut self) {
        if self.buf.last() == Some(&b',') {
            self.buf.pop();
        }
        self.buf.push(b'}');
    }

    fn value_written(&mut self) {
        if self.in_slice {
            self.slice_len += 1;
        }
        self.buf.push(b',');
    }

    /// Append an already encoded value.
    pub(crate) fn write_raw(&mut self, raw: &[u8]) {
        self.buf.extend_from_slice(raw);
        self.value_written();
    }
}

impl ValueWriter for JsonEncoder {
    fn write_key(&mut self, key: &str) {
        push_json_string(&mut self.buf, key);
        self.buf.push(b':');
    }

    fn write_slice_key(&mut self, key: &str) {
        push_json_string(&mut self.buf, key);
        self.buf.extend_from_slice(b":[");
        self.in_slice = true;
        self.slice_len = 0;
    }

    fn write_slice_end(&mut self) {
        if self.slice_len > 0 {
            self.buf.pop();
        }
        self.buf.extend_from_slice(b"],");
        self.in_slice = false;
        self.slice_len = 0;
    }

    fn write_nil(&mut self) {
        self.write_raw(b"null");
    }

    fn write_bool(&mut self, val: bool) {
        self.write_raw(if val { b"true" } else { b"false" });
    }

    fn write_int(&mut self, val: i64) {
        let _ = serde_json::to_writer(&mut self.buf, &val);
        self.value_written();
    }

    fn write_uint(&mut self, val: u64) {
        let _ = serde_json::to_writer(&mut self.buf, &val);
        self.value_written();
    }

    fn write_float(&mut self, val: f64) {
        match non_finite_token(val) {
            Some(token) => push_json_string(&mut self.buf, token),
            None => {
                let _ = serde_json::to_writer(&mut self.buf, &val);
            }
        }
        self.value_written();
    }

    fn write_string(&mut self, val: &str) {
        push_json_string(&mut self.buf, val);
        self.value_written();
    }

    fn write_error(&mut self, val: &str) {
        self.write_string(val);
    }

    fn write_uuid(&mut self, val: &[u8; 16]) {
        let mut encoded = Uuid::encode_buffer();
        let text = Uuid::from_bytes(*val).hyphenated().encode_lower(&mut encoded);
        self.buf.push(b'"');
        self.buf.extend_from_slice(text.as_bytes());
        self.buf.push(b'"');
        self.value_written();
    }

    fn write_json(&mut self, val: &[u8]) {
        if is_blank(val) {
            self.write_nil();
            return;
        }
        match compact_json(val, &mut self.buf) {
            Ok(()) => self.value_written(),
            Err(_) => self.write_error(&String::from_utf8_lossy(val)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(f: impl FnOnce(&mut JsonEncoder)) -> String {
        let mut enc = JsonEncoder::with_buffer(b"{".to_vec());
        f(&mut enc);
        enc.close_object();
        String::from_utf8(enc.into_buffer()).unwrap()
    }

    #[test]
    fn test_scalar_fields() {
        let out = encoded(|enc| {
            enc.write_key("a");
            enc.write_int(-7);
            enc.write_key("b");
            enc.write_string("x\"y\n");
            enc.write_key("c");
            enc.write_nil();
        });
        assert_eq!(out, r#"{"a":-7,"b":"x\"y\n","c":null}"#);
        assert!(serde_json::from_str::<serde_json::Value>(&out).is_ok());
    }

    #[test]
    fn test_slices() {
        let out = encoded(|enc| {
            enc.write_slice_key("empty");
            enc.write_slice_end();
            enc.write_slice_key("n");
            enc.write_uint(1);
            enc.write_uint(2);
            enc.write_slice_end();
        });
        assert_eq!(out, r#"{"empty":[],"n":[1,2]}"#);
    }

    #[test]
    fn test_non_finite_floats_are_quoted() {
        let out = encoded(|enc| {
            enc.write_slice_key("f");
            enc.write_float(f64::NAN);
            enc.write_float(f64::INFINITY);
            enc.write_float(f64::NEG_INFINITY);
            enc.write_float(1.5);
            enc.write_slice_end();
        });
        assert_eq!(out, r#"{"f":["NaN","+Inf","-Inf",1.5]}"#);
    }

    #[test]
    fn test_raw_json_is_compacted() {
        let out = encoded(|enc| {
            enc.write_key("j");
            enc.write_json(b" { \"a b\" : [1, 2] } ");
        });
        assert_eq!(out, r#"{"j":{"a b":[1,2]}}"#);
    }

    #[test]
    fn test_invalid_json_becomes_error_string() {
        let out = encoded(|enc| {
            enc.write_key("j");
            enc.write_json(b"{not json");
        });
        assert_eq!(out, r#"{"j":"{not json"}"#);
    }

    #[test]
    fn test_uuid_is_dashed_hex() {
        let out = encoded(|enc| {
            enc.write_key("id");
            enc.write_uuid(&[0xab; 16]);
        });
        assert_eq!(out, r#"{"id":"abababab-abab-abab-abab-abababababab"}"#);
    }
}
