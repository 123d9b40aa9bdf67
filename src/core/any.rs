//! Generic value serialization
//!
//! [`write_any`] classifies an arbitrary `Serialize` value and turns it into
//! the matching [`ValueWriter`] calls:
//!
//! - `None`, `()` and unit structs become nil; `Some`, references and
//!   newtype structs are unwrapped
//! - 16-byte arrays and [`uuid::Uuid`] become UUIDs
//! - booleans, integers, floats, chars and strings map to primitive writes
//! - structs, maps and data-carrying enum variants are encoded with
//!   `serde_json` and embedded as raw JSON
//! - sequences become slices; their elements are classified once more, and a
//!   sequence nested inside a slice is written as its JSON text
//!
//! The serializer reports `is_human_readable() == false`, which is what makes
//! `Uuid` serialize as bytes instead of a string.

use super::attrib::{Attrib, AttribValue};
use super::attribs::Attribs;
use super::json;
use super::writer::{write_uuid_or_nil, ValueWriter};
use serde::ser::{self, Impossible, Serialize, Serializer};
use std::fmt;

/// Placeholder written instead of the value of a sensitive field.
pub const REDACTED: &str = "***REDACTED***";

/// `serialize_with` helper that hides a field's value but keeps the field.
///
/// ```
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Login {
///     user: String,
///     #[serde(serialize_with = "rust_structured_logger::core::any::redact")]
///     password: String,
/// }
/// ```
pub fn redact<T: ?Sized, S: Serializer>(_value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(REDACTED)
}

/// Values that know how to log themselves.
///
/// Use [`Message::loggable`](crate::core::Message::loggable) to log them.
pub trait Loggable {
    fn log_value(&self, key: &str, writer: &mut dyn ValueWriter);
}

impl<L: Loggable + ?Sized> Loggable for &L {
    fn log_value(&self, key: &str, writer: &mut dyn ValueWriter) {
        (**self).log_value(key, writer);
    }
}

impl<L: Loggable> Loggable for Option<L> {
    fn log_value(&self, key: &str, writer: &mut dyn ValueWriter) {
        match self {
            Some(value) => value.log_value(key, writer),
            None => {
                writer.write_key(key);
                writer.write_nil();
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum AnyError {
    #[error("composite value")]
    Composite,
    #[error("nested sequence")]
    Nested,
    #[error("not a 16-byte identifier")]
    NotUuid,
    #[error("not a struct")]
    NotStruct,
    #[error("{0}")]
    Custom(String),
}

impl ser::Error for AnyError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        AnyError::Custom(msg.to_string())
    }
}

/// Write `value` under `key`. Never fails: encoding problems become an error value.
pub(crate) fn write_any<W, T>(w: &mut W, key: &str, value: &T)
where
    W: ValueWriter + ?Sized,
    T: Serialize + ?Sized,
{
    let mut slice_open = false;
    let mut result = value.serialize(ValueSerializer::top(w, key, true, &mut slice_open));
    if matches!(result, Err(AnyError::NotUuid)) {
        result = value.serialize(ValueSerializer::top(w, key, false, &mut slice_open));
    }

    let err = match result {
        Ok(()) => return,
        Err(err) => err,
    };
    if slice_open {
        w.write_error(&err.to_string());
        w.write_slice_end();
        return;
    }
    match err {
        AnyError::Composite => match serde_json::to_vec(value) {
            Ok(encoded) => {
                w.write_key(key);
                w.write_json(&encoded);
            }
            Err(err) => {
                w.write_key(key);
                w.write_error(&err.to_string());
            }
        },
        other => {
            w.write_key(key);
            w.write_error(&other.to_string());
        }
    }
}

/// Write one slice element.
fn write_element<W, T>(w: &mut W, value: &T)
where
    W: ValueWriter + ?Sized,
    T: Serialize + ?Sized,
{
    let mut result = value.serialize(ValueSerializer::element(w, true));
    if matches!(result, Err(AnyError::NotUuid)) {
        result = value.serialize(ValueSerializer::element(w, false));
    }
    match result {
        Ok(()) => {}
        Err(AnyError::Composite) => match serde_json::to_vec(value) {
            Ok(encoded) => w.write_json(&encoded),
            Err(err) => w.write_error(&err.to_string()),
        },
        Err(AnyError::Custom(msg)) => w.write_error(&msg),
        Err(_) => match serde_json::to_string(value) {
            Ok(text) => w.write_string(&text),
            Err(err) => w.write_error(&err.to_string()),
        },
    }
}

struct ValueSerializer<'a, W: ?Sized> {
    w: &'a mut W,
    /// `None` for slice elements
    key: Option<&'a str>,
    detect_uuid: bool,
    slice_open: Option<&'a mut bool>,
}

impl<'a, W: ValueWriter + ?Sized> ValueSerializer<'a, W> {
    fn top(w: &'a mut W, key: &'a str, detect_uuid: bool, slice_open: &'a mut bool) -> Self {
        Self {
            w,
            key: Some(key),
            detect_uuid,
            slice_open: Some(slice_open),
        }
    }

    fn element(w: &'a mut W, detect_uuid: bool) -> Self {
        Self {
            w,
            key: None,
            detect_uuid,
            slice_open: None,
        }
    }

    fn emit(self, write: impl FnOnce(&mut W)) -> Result<(), AnyError> {
        if let Some(key) = self.key {
            self.w.write_key(key);
        }
        write(self.w);
        Ok(())
    }

    fn open_slice(self) -> Result<SliceSerializer<'a, W>, AnyError> {
        match (self.key, self.slice_open) {
            (Some(key), Some(open)) => {
                self.w.write_slice_key(key);
                *open = true;
                Ok(SliceSerializer {
                    w: self.w,
                    open,
                })
            }
            _ => Err(AnyError::Nested),
        }
    }
}

impl<'a, W: ValueWriter + ?Sized> Serializer for ValueSerializer<'a, W> {
    type Ok = ();
    type Error = AnyError;
    type SerializeSeq = SliceSerializer<'a, W>;
    type SerializeTuple = TupleSerializer<'a, W>;
    type SerializeTupleStruct = SliceSerializer<'a, W>;
    type SerializeTupleVariant = Impossible<(), AnyError>;
    type SerializeMap = Impossible<(), AnyError>;
    type SerializeStruct = Impossible<(), AnyError>;
    type SerializeStructVariant = Impossible<(), AnyError>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, v: bool) -> Result<(), AnyError> {
        self.emit(|w| w.write_bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<(), AnyError> {
        self.serialize_i64(v.into())
    }

    fn serialize_i16(self, v: i16) -> Result<(), AnyError> {
        self.serialize_i64(v.into())
    }

    fn serialize_i32(self, v: i32) -> Result<(), AnyError> {
        self.serialize_i64(v.into())
    }

    fn serialize_i64(self, v: i64) -> Result<(), AnyError> {
        self.emit(|w| w.write_int(v))
    }

    fn serialize_i128(self, v: i128) -> Result<(), AnyError> {
        match i64::try_from(v) {
            Ok(v) => self.serialize_i64(v),
            Err(_) => self.emit(|w| w.write_string(&v.to_string())),
        }
    }

    fn serialize_u8(self, v: u8) -> Result<(), AnyError> {
        self.serialize_u64(v.into())
    }

    fn serialize_u16(self, v: u16) -> Result<(), AnyError> {
        self.serialize_u64(v.into())
    }

    fn serialize_u32(self, v: u32) -> Result<(), AnyError> {
        self.serialize_u64(v.into())
    }

    fn serialize_u64(self, v: u64) -> Result<(), AnyError> {
        self.emit(|w| w.write_uint(v))
    }

    fn serialize_u128(self, v: u128) -> Result<(), AnyError> {
        match u64::try_from(v) {
            Ok(v) => self.serialize_u64(v),
            Err(_) => self.emit(|w| w.write_string(&v.to_string())),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<(), AnyError> {
        self.serialize_f64(v.into())
    }

    fn serialize_f64(self, v: f64) -> Result<(), AnyError> {
        self.emit(|w| w.write_float(v))
    }

    fn serialize_char(self, v: char) -> Result<(), AnyError> {
        let mut buf = [0u8; 4];
        let text = v.encode_utf8(&mut buf);
        self.emit(|w| w.write_string(text))
    }

    fn serialize_str(self, v: &str) -> Result<(), AnyError> {
        self.emit(|w| w.write_string(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<(), AnyError> {
        if self.detect_uuid {
            if let Ok(bytes) = <[u8; 16]>::try_from(v) {
                return self.emit(|w| write_uuid_or_nil(w, &bytes));
            }
        }
        let mut slice = self.open_slice()?;
        for b in v {
            slice.w.write_uint((*b).into());
        }
        ser::SerializeSeq::end(slice)
    }

    fn serialize_none(self) -> Result<(), AnyError> {
        self.emit(|w| w.write_nil())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), AnyError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), AnyError> {
        self.serialize_none()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), AnyError> {
        self.serialize_none()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<(), AnyError> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), AnyError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<(), AnyError> {
        Err(AnyError::Composite)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<SliceSerializer<'a, W>, AnyError> {
        self.open_slice()
    }

    fn serialize_tuple(self, len: usize) -> Result<TupleSerializer<'a, W>, AnyError> {
        if len == 16 && self.detect_uuid {
            return Ok(TupleSerializer::Uuid(UuidBytes {
                w: self.w,
                key: self.key,
                bytes: [0u8; 16],
                len: 0,
            }));
        }
        self.open_slice().map(TupleSerializer::Slice)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<SliceSerializer<'a, W>, AnyError> {
        self.open_slice()
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, AnyError> {
        Err(AnyError::Composite)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, AnyError> {
        Err(AnyError::Composite)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, AnyError> {
        Err(AnyError::Composite)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, AnyError> {
        Err(AnyError::Composite)
    }
}

struct SliceSerializer<'a, W: ?Sized> {
    w: &'a mut W,
    open: &'a mut bool,
}

impl<W: ValueWriter + ?Sized> ser::SerializeSeq for SliceSerializer<'_, W> {
    type Ok = ();
    type Error = AnyError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), AnyError> {
        write_element(self.w, value);
        Ok(())
    }

    fn end(self) -> Result<(), AnyError> {
        self.w.write_slice_end();
        *self.open = false;
        Ok(())
    }
}

impl<W: ValueWriter + ?Sized> ser::SerializeTupleStruct for SliceSerializer<'_, W> {
    type Ok = ();
    type Error = AnyError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), AnyError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<(), AnyError> {
        ser::SerializeSeq::end(self)
    }
}

/// Collects a 16-element tuple; succeeds only if every element is a `u8`.
struct UuidBytes<'a, W: ?Sized> {
    w: &'a mut W,
    key: Option<&'a str>,
    bytes: [u8; 16],
    len: usize,
}

enum TupleSerializer<'a, W: ?Sized> {
    Uuid(UuidBytes<'a, W>),
    Slice(SliceSerializer<'a, W>),
}

impl<W: ValueWriter + ?Sized> ser::SerializeTuple for TupleSerializer<'_, W> {
    type Ok = ();
    type Error = AnyError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), AnyError> {
        match self {
            TupleSerializer::Uuid(tuple) => {
                let byte = value.serialize(ByteSerializer)?;
                let slot = tuple.bytes.get_mut(tuple.len).ok_or(AnyError::NotUuid)?;
                *slot = byte;
                tuple.len += 1;
                Ok(())
            }
            TupleSerializer::Slice(slice) => ser::SerializeSeq::serialize_element(slice, value),
        }
    }

    fn end(self) -> Result<(), AnyError> {
        match self {
            TupleSerializer::Uuid(tuple) => {
                if tuple.len != tuple.bytes.len() {
                    return Err(AnyError::NotUuid);
                }
                if let Some(key) = tuple.key {
                    tuple.w.write_key(key);
                }
                write_uuid_or_nil(tuple.w, &tuple.bytes);
                Ok(())
            }
            TupleSerializer::Slice(slice) => ser::SerializeSeq::end(slice),
        }
    }
}

macro_rules! reject {
    ($err:expr => $($method:ident($($arg:ty),*) -> $ret:ty;)*) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<$ret, AnyError> {
                Err($err)
            }
        )*
    };
}

/// Accepts exactly one `u8`.
struct ByteSerializer;

impl Serializer for ByteSerializer {
    type Ok = u8;
    type Error = AnyError;
    type SerializeSeq = Impossible<u8, AnyError>;
    type SerializeTuple = Impossible<u8, AnyError>;
    type SerializeTupleStruct = Impossible<u8, AnyError>;
    type SerializeTupleVariant = Impossible<u8, AnyError>;
    type SerializeMap = Impossible<u8, AnyError>;
    type SerializeStruct = Impossible<u8, AnyError>;
    type SerializeStructVariant = Impossible<u8, AnyError>;

    fn serialize_u8(self, v: u8) -> Result<u8, AnyError> {
        Ok(v)
    }

    reject! { AnyError::NotUuid =>
        serialize_bool(bool) -> u8;
        serialize_i8(i8) -> u8;
        serialize_i16(i16) -> u8;
        serialize_i32(i32) -> u8;
        serialize_i64(i64) -> u8;
        serialize_u16(u16) -> u8;
        serialize_u32(u32) -> u8;
        serialize_u64(u64) -> u8;
        serialize_f32(f32) -> u8;
        serialize_f64(f64) -> u8;
        serialize_char(char) -> u8;
        serialize_str(&str) -> u8;
        serialize_bytes(&[u8]) -> u8;
        serialize_none() -> u8;
        serialize_unit() -> u8;
        serialize_unit_struct(&'static str) -> u8;
        serialize_unit_variant(&'static str, u32, &'static str) -> u8;
        serialize_seq(Option<usize>) -> Self::SerializeSeq;
        serialize_tuple(usize) -> Self::SerializeTuple;
        serialize_tuple_struct(&'static str, usize) -> Self::SerializeTupleStruct;
        serialize_tuple_variant(&'static str, u32, &'static str, usize) -> Self::SerializeTupleVariant;
        serialize_map(Option<usize>) -> Self::SerializeMap;
        serialize_struct(&'static str, usize) -> Self::SerializeStruct;
        serialize_struct_variant(&'static str, u32, &'static str, usize) -> Self::SerializeStructVariant;
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> Result<u8, AnyError> {
        Err(AnyError::NotUuid)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<u8, AnyError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<u8, AnyError> {
        Err(AnyError::NotUuid)
    }
}

/// Write every member of a struct (or map) as its own field.
///
/// Members named in `sensitive` are written with the [`REDACTED`] placeholder.
/// Values that are neither structs nor maps are written under the key `value`.
pub(crate) fn write_struct_fields<W, T>(w: &mut W, value: &T, sensitive: &[&str])
where
    W: ValueWriter + ?Sized,
    T: Serialize + ?Sized,
{
    match value.serialize(FieldsSerializer { w: &mut *w, sensitive }) {
        Ok(()) => {}
        Err(AnyError::NotStruct) => write_any(w, "value", value),
        Err(err) => {
            w.write_key("struct_fields");
            w.write_error(&err.to_string());
        }
    }
}

struct FieldsSerializer<'a, W: ?Sized> {
    w: &'a mut W,
    sensitive: &'a [&'a str],
}

struct FieldsCompound<'a, W: ?Sized> {
    w: &'a mut W,
    sensitive: &'a [&'a str],
    pending_key: Option<String>,
}

impl<W: ValueWriter + ?Sized> FieldsCompound<'_, W> {
    fn field<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        if self.sensitive.contains(&key) {
            self.w.write_key(key);
            self.w.write_string(REDACTED);
        } else {
            write_any(self.w, key, value);
        }
    }
}

impl<'a, W: ValueWriter + ?Sized> Serializer for FieldsSerializer<'a, W> {
    type Ok = ();
    type Error = AnyError;
    type SerializeSeq = Impossible<(), AnyError>;
    type SerializeTuple = Impossible<(), AnyError>;
    type SerializeTupleStruct = Impossible<(), AnyError>;
    type SerializeTupleVariant = Impossible<(), AnyError>;
    type SerializeMap = FieldsCompound<'a, W>;
    type SerializeStruct = FieldsCompound<'a, W>;
    type SerializeStructVariant = Impossible<(), AnyError>;

    reject! { AnyError::NotStruct =>
        serialize_bool(bool) -> ();
        serialize_i8(i8) -> ();
        serialize_i16(i16) -> ();
        serialize_i32(i32) -> ();
        serialize_i64(i64) -> ();
        serialize_u8(u8) -> ();
        serialize_u16(u16) -> ();
        serialize_u32(u32) -> ();
        serialize_u64(u64) -> ();
        serialize_f32(f32) -> ();
        serialize_f64(f64) -> ();
        serialize_char(char) -> ();
        serialize_str(&str) -> ();
        serialize_bytes(&[u8]) -> ();
        serialize_none() -> ();
        serialize_unit() -> ();
        serialize_unit_struct(&'static str) -> ();
        serialize_unit_variant(&'static str, u32, &'static str) -> ();
        serialize_seq(Option<usize>) -> Self::SerializeSeq;
        serialize_tuple(usize) -> Self::SerializeTuple;
        serialize_tuple_struct(&'static str, usize) -> Self::SerializeTupleStruct;
        serialize_tuple_variant(&'static str, u32, &'static str, usize) -> Self::SerializeTupleVariant;
        serialize_struct_variant(&'static str, u32, &'static str, usize) -> Self::SerializeStructVariant;
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), AnyError> {
        value.serialize(self)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), AnyError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<(), AnyError> {
        Err(AnyError::NotStruct)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<FieldsCompound<'a, W>, AnyError> {
        Ok(FieldsCompound {
            w: self.w,
            sensitive: self.sensitive,
            pending_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<FieldsCompound<'a, W>, AnyError> {
        self.serialize_map(None)
    }
}

impl<W: ValueWriter + ?Sized> ser::SerializeStruct for FieldsCompound<'_, W> {
    type Ok = ();
    type Error = AnyError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), AnyError> {
        self.field(key, value);
        Ok(())
    }

    fn end(self) -> Result<(), AnyError> {
        Ok(())
    }
}

impl<W: ValueWriter + ?Sized> ser::SerializeMap for FieldsCompound<'_, W> {
    type Ok = ();
    type Error = AnyError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), AnyError> {
        let key = match serde_json::to_value(key) {
            Ok(serde_json::Value::String(s)) => s,
            Ok(other) => other.to_string(),
            Err(err) => return Err(AnyError::Custom(err.to_string())),
        };
        self.pending_key = Some(key);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), AnyError> {
        let key = self.pending_key.take().unwrap_or_default();
        self.field(&key, value);
        Ok(())
    }

    fn end(self) -> Result<(), AnyError> {
        Ok(())
    }
}

/// Value writer that turns field calls into [`Attrib`]s.
///
/// Used by recording-mode messages and by [`Attrib::any`].
#[derive(Debug, Default)]
pub(crate) struct AttribRecorder {
    attribs: Attribs,
    key: String,
    slice: Option<Vec<AttribValue>>,
}

impl AttribRecorder {
    pub(crate) fn attribs(&self) -> &Attribs {
        &self.attribs
    }

    /// Move the recorded attribs out, leaving the recorder empty.
    pub(crate) fn take(&mut self) -> Attribs {
        self.key.clear();
        self.slice = None;
        std::mem::take(&mut self.attribs)
    }

    pub(crate) fn clear(&mut self) {
        self.attribs.clear();
        self.key.clear();
        self.slice = None;
    }

    fn value(&mut self, value: AttribValue) {
        match &mut self.slice {
            Some(items) => items.push(value),
            None => self.attribs.push(Attrib::new(self.key.as_str(), value)),
        }
    }
}

/// Collapse recorded slice elements into the typed slice variant when they
/// all share one kind.
fn collect_slice(items: Vec<AttribValue>) -> AttribValue {
    macro_rules! homogeneous {
        ($variant:ident => $slice:ident) => {
            if items.iter().all(|v| matches!(v, AttribValue::$variant(_))) {
                return AttribValue::$slice(
                    items
                        .into_iter()
                        .filter_map(|v| match v {
                            AttribValue::$variant(x) => Some(x),
                            _ => None,
                        })
                        .collect(),
                );
            }
        };
    }

    if !items.is_empty() {
        homogeneous!(Bool => Bools);
        homogeneous!(Int => Ints);
        homogeneous!(Uint => Uints);
        homogeneous!(Float => Floats);
        homogeneous!(String => Strings);
        homogeneous!(Error => Errors);
        homogeneous!(Uuid => Uuids);
    }
    AttribValue::Any(serde_json::Value::Array(
        items.iter().map(AttribValue::to_json_value).collect(),
    ))
}

impl ValueWriter for AttribRecorder {
    fn write_key(&mut self, key: &str) {
        self.key.clear();
        self.key.push_str(key);
    }

    fn write_slice_key(&mut self, key: &str) {
        self.write_key(key);
        self.slice = Some(Vec::new());
    }

    fn write_slice_end(&mut self) {
        if let Some(items) = self.slice.take() {
            let value = collect_slice(items);
            self.attribs.push(Attrib::new(self.key.as_str(), value));
        }
    }

    fn write_nil(&mut self) {
        self.value(AttribValue::Nil);
    }

    fn write_bool(&mut self, val: bool) {
        self.value(AttribValue::Bool(val));
    }

    fn write_int(&mut self, val: i64) {
        self.value(AttribValue::Int(val));
    }

    fn write_uint(&mut self, val: u64) {
        self.value(AttribValue::Uint(val));
    }

    fn write_float(&mut self, val: f64) {
        self.value(AttribValue::Float(val));
    }

    fn write_string(&mut self, val: &str) {
        self.value(AttribValue::String(val.to_string()));
    }

    fn write_error(&mut self, val: &str) {
        self.value(AttribValue::Error(val.to_string()));
    }

    fn write_uuid(&mut self, val: &[u8; 16]) {
        self.value(AttribValue::Uuid(*val));
    }

    fn write_json(&mut self, val: &[u8]) {
        if json::is_blank(val) {
            self.value(AttribValue::Nil);
            return;
        }
        let mut compacted = Vec::with_capacity(val.len());
        match json::compact_json(val, &mut compacted) {
            Ok(()) => self.value(AttribValue::Json(compacted)),
            Err(_) => self.value(AttribValue::Error(String::from_utf8_lossy(val).into_owned())),
        }
    }
}
