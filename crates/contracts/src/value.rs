//! Value - arbitrary structured payload
//!
//! Payloads, actors, contexts and other free-form properties are carried as
//! [`Value`]. Serialization is strict: bytes that are not valid UTF-8 and
//! non-finite floats are rejected, so the encoder can fall back to
//! [`Sanitize::sanitize`] and re-encode.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};

/// Arbitrary structured value
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// JSON null
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    /// Raw bytes, emitted as UTF-8 text
    Bytes(Vec<u8>),
    /// Emitted as an ISO-8601 string
    Timestamp(DateTime<Utc>),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Debug representation of a value that has no native encoding
    Opaque(String),
}

impl Value {
    /// Wrap raw bytes
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(data.into())
    }

    /// Capture the debug representation of any value
    pub fn debug(value: &impl fmt::Debug) -> Self {
        Self::Opaque(format!("{value:?}"))
    }

    /// Empty map
    pub fn empty_map() -> Self {
        Self::Map(BTreeMap::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Look up a key when this value is a map
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Opaque(s) => Some(s),
            _ => None,
        }
    }
}

/// Rewrite a value into a form that always encodes.
///
/// Implemented by every serializable record type.
pub trait Sanitize {
    /// Return a copy with every non-encodable leaf replaced by text.
    fn sanitize(&self) -> Self;
}

impl Sanitize for Value {
    fn sanitize(&self) -> Self {
        match self {
            Self::Bytes(data) => Self::String(decode_utf8_escaped(data)),
            Self::Float(f) if !f.is_finite() => Self::Opaque(format!("{f:?}")),
            Self::Array(items) => Self::Array(items.iter().map(Sanitize::sanitize).collect()),
            Self::Map(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.sanitize()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitize(&self) -> Self {
        self.as_ref().map(Sanitize::sanitize)
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize(&self) -> Self {
        self.iter().map(Sanitize::sanitize).collect()
    }
}

/// Decode bytes as UTF-8, replacing each invalid byte with its `\xNN` escape.
pub fn decode_utf8_escaped(mut input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len());
    loop {
        match std::str::from_utf8(input) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(err) => {
                let (valid, rest) = input.split_at(err.valid_up_to());
                out.push_str(&String::from_utf8_lossy(valid));
                let invalid_len = err.error_len().unwrap_or(rest.len());
                for byte in &rest[..invalid_len] {
                    out.push_str(&format!("\\x{byte:02x}"));
                }
                input = &rest[invalid_len..];
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::UInt(u) => serializer.serialize_u64(*u),
            Self::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Self::Float(f) => Err(S::Error::custom(format!("non-finite float {f}"))),
            Self::String(s) | Self::Opaque(s) => serializer.serialize_str(s),
            Self::Bytes(data) => match std::str::from_utf8(data) {
                Ok(text) => serializer.serialize_str(text),
                Err(e) => Err(S::Error::custom(format!("invalid utf-8 in bytes: {e}"))),
            },
            Self::Timestamp(ts) => {
                serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Self::Array(items) => items.serialize(serializer),
            Self::Map(map) => map.serialize(serializer),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => UInt,
    u64 => UInt,
    f32 => Float,
    f64 => Float,
    String => String,
    DateTime<Utc> => Timestamp,
    Vec<Value> => Array,
    BTreeMap<String, Value> => Map,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<bytes::Bytes> for Value {
    fn from(v: bytes::Bytes) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
