//! Typed, self-describing log fields
//!
//! An [`Attrib`] is a key plus an [`AttribValue`]. Attribs are what a
//! sub-logger carries: they are recorded once and replayed into every
//! message through the same [`ValueWriter`] calls a fluent field call makes.

use super::any::{self, AttribRecorder};
use super::error::{LoggerError, Result};
use super::json::{self, JsonEncoder};
use super::writer::{write_uuid_or_nil, ValueWriter};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum AttribValue {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    /// Display text of an error
    Error(String),
    Uuid([u8; 16]),
    /// Compacted, validated JSON text
    Json(Vec<u8>),
    /// Values without a primitive form, such as heterogeneous arrays
    Any(serde_json::Value),
    Bools(Vec<bool>),
    Ints(Vec<i64>),
    Uints(Vec<u64>),
    Floats(Vec<f64>),
    Strings(Vec<String>),
    Errors(Vec<String>),
    Uuids(Vec<[u8; 16]>),
}

impl AttribValue {
    /// Write the value half of a field; the caller has already written the key
    /// unless the value is a slice, whose key this writes itself.
    fn log_with_key<W: ValueWriter + ?Sized>(&self, w: &mut W, key: &str) {
        match self {
            AttribValue::Any(value) => any::write_any(w, key, value),
            AttribValue::Bools(vals) => slice(w, key, vals, |w, v| w.write_bool(*v)),
            AttribValue::Ints(vals) => slice(w, key, vals, |w, v| w.write_int(*v)),
            AttribValue::Uints(vals) => slice(w, key, vals, |w, v| w.write_uint(*v)),
            AttribValue::Floats(vals) => slice(w, key, vals, |w, v| w.write_float(*v)),
            AttribValue::Strings(vals) => slice(w, key, vals, |w, v| w.write_string(v)),
            AttribValue::Errors(vals) => slice(w, key, vals, |w, v| w.write_error(v)),
            AttribValue::Uuids(vals) => slice(w, key, vals, |w, v| write_uuid_or_nil(w, v)),
            scalar => {
                w.write_key(key);
                scalar.log_scalar(w);
            }
        }
    }

    pub(crate) fn log_scalar<W: ValueWriter + ?Sized>(&self, w: &mut W) {
        match self {
            AttribValue::Nil => w.write_nil(),
            AttribValue::Bool(v) => w.write_bool(*v),
            AttribValue::Int(v) => w.write_int(*v),
            AttribValue::Uint(v) => w.write_uint(*v),
            AttribValue::Float(v) => w.write_float(*v),
            AttribValue::String(v) => w.write_string(v),
            AttribValue::Error(v) => w.write_error(v),
            AttribValue::Uuid(v) => write_uuid_or_nil(w, v),
            AttribValue::Json(v) => w.write_json(v),
            other => w.write_string(&other.to_string()),
        }
    }

    /// Plain JSON form, used when scalars of different kinds share one slice.
    pub(crate) fn to_json_value(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            AttribValue::Nil => Value::Null,
            AttribValue::Bool(v) => Value::Bool(*v),
            AttribValue::Int(v) => Value::from(*v),
            AttribValue::Uint(v) => Value::from(*v),
            AttribValue::Float(v) => match json::non_finite_token(*v) {
                Some(token) => Value::String(token.to_string()),
                None => Value::from(*v),
            },
            AttribValue::String(v) | AttribValue::Error(v) => Value::String(v.clone()),
            AttribValue::Uuid(v) if *v == [0u8; 16] => Value::Null,
            AttribValue::Uuid(v) => Value::String(Uuid::from_bytes(*v).hyphenated().to_string()),
            AttribValue::Json(v) => serde_json::from_slice(v)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(v).into_owned())),
            AttribValue::Any(v) => v.clone(),
            AttribValue::Bools(v) => Value::from(v.clone()),
            AttribValue::Ints(v) => Value::from(v.clone()),
            AttribValue::Uints(v) => Value::from(v.clone()),
            AttribValue::Floats(v) => {
                Value::Array(v.iter().map(|f| AttribValue::Float(*f).to_json_value()).collect())
            }
            AttribValue::Strings(v) | AttribValue::Errors(v) => Value::from(v.clone()),
            AttribValue::Uuids(v) => {
                Value::Array(v.iter().map(|u| AttribValue::Uuid(*u).to_json_value()).collect())
            }
        }
    }
}

fn slice<W, T>(w: &mut W, key: &str, vals: &[T], write: impl Fn(&mut W, &T))
where
    W: ValueWriter + ?Sized,
{
    w.write_slice_key(key);
    for val in vals {
        write(w, val);
    }
    w.write_slice_end();
}

fn fmt_list<T>(
    f: &mut fmt::Formatter<'_>,
    vals: &[T],
    each: impl Fn(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    f.write_str("[")?;
    for (i, val) in vals.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        each(f, val)?;
    }
    f.write_str("]")
}

fn fmt_float(f: &mut fmt::Formatter<'_>, val: f64) -> fmt::Result {
    match json::non_finite_token(val) {
        Some(token) => f.write_str(token),
        None => write!(f, "{}", val),
    }
}

fn fmt_uuid(f: &mut fmt::Formatter<'_>, val: &[u8; 16]) -> fmt::Result {
    if *val == [0u8; 16] {
        f.write_str("nil")
    } else {
        write!(f, "{}", Uuid::from_bytes(*val).hyphenated())
    }
}

impl fmt::Display for AttribValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttribValue::Nil => f.write_str("nil"),
            AttribValue::Bool(v) => write!(f, "{}", v),
            AttribValue::Int(v) => write!(f, "{}", v),
            AttribValue::Uint(v) => write!(f, "{}", v),
            AttribValue::Float(v) => fmt_float(f, *v),
            AttribValue::String(v) => write!(f, "{:?}", v),
            AttribValue::Error(v) => write!(f, "`{}`", v),
            AttribValue::Uuid(v) => fmt_uuid(f, v),
            AttribValue::Json(v) => f.write_str(&String::from_utf8_lossy(v)),
            AttribValue::Any(v) => write!(f, "{}", v),
            AttribValue::Bools(v) => fmt_list(f, v, |f, b| write!(f, "{}", b)),
            AttribValue::Ints(v) => fmt_list(f, v, |f, i| write!(f, "{}", i)),
            AttribValue::Uints(v) => fmt_list(f, v, |f, u| write!(f, "{}", u)),
            AttribValue::Floats(v) => fmt_list(f, v, |f, x| fmt_float(f, *x)),
            AttribValue::Strings(v) => fmt_list(f, v, |f, s| write!(f, "{:?}", s)),
            AttribValue::Errors(v) => fmt_list(f, v, |f, e| write!(f, "`{}`", e)),
            AttribValue::Uuids(v) => fmt_list(f, v, |f, u| fmt_uuid(f, u)),
        }
    }
}

/// A single named log field.
#[derive(Debug, Clone, PartialEq)]
pub struct Attrib {
    key: String,
    value: AttribValue,
}

impl Attrib {
    pub fn new(key: impl Into<String>, value: AttribValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn nil(key: impl Into<String>) -> Self {
        Self::new(key, AttribValue::Nil)
    }

    pub fn bool(key: impl Into<String>, val: bool) -> Self {
        Self::new(key, AttribValue::Bool(val))
    }

    pub fn int(key: impl Into<String>, val: impl Into<i64>) -> Self {
        Self::new(key, AttribValue::Int(val.into()))
    }

    pub fn uint(key: impl Into<String>, val: impl Into<u64>) -> Self {
        Self::new(key, AttribValue::Uint(val.into()))
    }

    pub fn float(key: impl Into<String>, val: impl Into<f64>) -> Self {
        Self::new(key, AttribValue::Float(val.into()))
    }

    pub fn string(key: impl Into<String>, val: impl Into<String>) -> Self {
        Self::new(key, AttribValue::String(val.into()))
    }

    pub fn error(key: impl Into<String>, err: &(impl fmt::Display + ?Sized)) -> Self {
        Self::new(key, AttribValue::Error(err.to_string()))
    }

    pub fn uuid(key: impl Into<String>, val: [u8; 16]) -> Self {
        Self::new(key, AttribValue::Uuid(val))
    }

    /// Raw JSON field. Invalid JSON is kept as an error attrib holding the raw text,
    /// blank input becomes nil.
    pub fn json(key: impl Into<String>, raw: impl AsRef<[u8]>) -> Self {
        let raw = raw.as_ref();
        if json::is_blank(raw) {
            return Self::nil(key);
        }
        let mut compacted = Vec::with_capacity(raw.len());
        match json::compact_json(raw, &mut compacted) {
            Ok(()) => Self::new(key, AttribValue::Json(compacted)),
            Err(_) => Self::new(key, AttribValue::Error(String::from_utf8_lossy(raw).into_owned())),
        }
    }

    /// Field for an arbitrary serializable value, classified the same way
    /// [`Message::any`](crate::core::Message::any) classifies it.
    pub fn any<T: Serialize + ?Sized>(key: &str, val: &T) -> Self {
        let mut recorder = AttribRecorder::default();
        any::write_any(&mut recorder, key, val);
        recorder
            .take()
            .into_vec()
            .pop()
            .unwrap_or_else(|| Self::nil(key))
    }

    pub fn bools(key: impl Into<String>, vals: impl Into<Vec<bool>>) -> Self {
        Self::new(key, AttribValue::Bools(vals.into()))
    }

    pub fn ints(key: impl Into<String>, vals: impl Into<Vec<i64>>) -> Self {
        Self::new(key, AttribValue::Ints(vals.into()))
    }

    pub fn uints(key: impl Into<String>, vals: impl Into<Vec<u64>>) -> Self {
        Self::new(key, AttribValue::Uints(vals.into()))
    }

    pub fn floats(key: impl Into<String>, vals: impl Into<Vec<f64>>) -> Self {
        Self::new(key, AttribValue::Floats(vals.into()))
    }

    pub fn strings<S: AsRef<str>>(key: impl Into<String>, vals: &[S]) -> Self {
        let vals = vals.iter().map(|s| s.as_ref().to_string()).collect();
        Self::new(key, AttribValue::Strings(vals))
    }

    pub fn errors<E: fmt::Display>(key: impl Into<String>, errs: &[E]) -> Self {
        let vals = errs.iter().map(ToString::to_string).collect();
        Self::new(key, AttribValue::Errors(vals))
    }

    pub fn uuids(key: impl Into<String>, vals: impl Into<Vec<[u8; 16]>>) -> Self {
        Self::new(key, AttribValue::Uuids(vals.into()))
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &AttribValue {
        &self.value
    }

    pub fn into_parts(self) -> (String, AttribValue) {
        (self.key, self.value)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            AttribValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            AttribValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self.value {
            AttribValue::Uint(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.value {
            AttribValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            AttribValue::String(v) | AttribValue::Error(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<&[u8; 16]> {
        match &self.value {
            AttribValue::Uuid(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self.value, AttribValue::Nil)
    }

    /// Write this field through `w` exactly like the equivalent message call.
    pub fn log<W: ValueWriter + ?Sized>(&self, w: &mut W) {
        self.value.log_with_key(w, &self.key);
    }

    /// Append `"key":value,` to `buf`.
    pub fn append_json(&self, buf: &mut Vec<u8>) {
        let mut enc = JsonEncoder::with_buffer(std::mem::take(buf));
        self.log(&mut enc);
        *buf = enc.into_buffer();
    }
}

impl fmt::Display for Attrib {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Parse a textual UUID in any of the forms `uuid` accepts.
pub fn parse_uuid(input: &str) -> Result<[u8; 16]> {
    Uuid::parse_str(input.trim())
        .map(|id| *id.as_bytes())
        .map_err(|e| LoggerError::invalid_uuid(input, e.to_string()))
}

/// Parse a UUID received from outside (a request header, say), substituting
/// a fresh random one when the input is malformed.
pub fn parse_uuid_or_new(input: &str) -> [u8; 16] {
    parse_uuid(input).unwrap_or_else(|_| *Uuid::new_v4().as_bytes())
}
