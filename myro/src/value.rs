//! Runtime parameter value.
use bytes::Bytes;
use std::{
    fmt::{self, Write},
    str::FromStr,
};

use crate::config::ParseError;

/// Parameter value.
///
/// [`Value::Null`] is the null marker, it is sent as a bit in the null bitmap and never as
/// value bytes.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    /// Exact numeric in its decimal text form, e.g. `"-12.50"`.
    Decimal(String),
    String(String),
    Bytes(Bytes),
    Guid(Guid),
    /// Json document text.
    Json(String),
    #[cfg(feature = "time")]
    Date(time::Date),
    #[cfg(feature = "time")]
    DateTime(time::PrimitiveDateTime),
    /// Signed time of day or interval, may exceed 24 hours.
    #[cfg(feature = "time")]
    Time(time::Duration),
}

impl Value {
    /// Returns `true` if this is the null marker.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Variant name, used in error messages.
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Decimal(_) => "decimal",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Guid(_) => "guid",
            Self::Json(_) => "json",
            #[cfg(feature = "time")]
            Self::Date(_) => "date",
            #[cfg(feature = "time")]
            Self::DateTime(_) => "datetime",
            #[cfg(feature = "time")]
            Self::Time(_) => "time",
        }
    }
}

macro_rules! from {
    ($ty:ty => $variant:ident) => {
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Self::$variant(value.into())
            }
        }
    };
}

from!(bool => Bool);
from!(i8 => I8);
from!(i16 => I16);
from!(i32 => I32);
from!(i64 => I64);
from!(u8 => U8);
from!(u16 => U16);
from!(u32 => U32);
from!(u64 => U64);
from!(f32 => F32);
from!(f64 => F64);
from!(String => String);
from!(&str => String);
from!(Bytes => Bytes);
from!(Vec<u8> => Bytes);
from!(Guid => Guid);

#[cfg(feature = "time")]
from!(time::Date => Date);
#[cfg(feature = "time")]
from!(time::PrimitiveDateTime => DateTime);
#[cfg(feature = "time")]
from!(time::Duration => Time);

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            value => Value::Json(value.to_string()),
        }
    }
}

#[cfg(feature = "json")]
impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            value => Value::Json(value.to_string()),
        }
    }
}

/// 128 bit identifier, stored in RFC 4122 byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid([u8; 16]);

impl Guid {
    pub const fn from_bytes(bytes: [u8; 16]) -> Guid {
        Guid(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Parse either the 36 character hyphenated or the 32 character simple form.
    pub fn parse(input: &str) -> Option<Guid> {
        let digits = match input.len() {
            36 => {
                let b = input.as_bytes();
                if [8, 13, 18, 23].iter().any(|&i| b[i] != b'-') {
                    return None;
                }
                input.replace('-', "")
            }
            32 => input.to_owned(),
            _ => return None,
        };
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(digits.get(i * 2..i * 2 + 2)?, 16).ok()?;
        }
        Some(Guid(bytes))
    }

    /// Lowercase `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` form.
    pub fn hyphenated(&self) -> String {
        self.to_string()
    }

    /// Lowercase 32 hex digits without hyphen.
    pub fn simple(&self) -> String {
        let mut out = String::with_capacity(32);
        for b in self.0 {
            let _ = write!(out, "{b:02x}");
        }
        out
    }

    /// The 16 bytes sent for binary [`GuidFormat`]s.
    pub fn to_format_bytes(&self, format: GuidFormat) -> [u8; 16] {
        let b = self.0;
        match format {
            GuidFormat::TimeSwapBinary16 => [
                b[6], b[7], b[4], b[5], b[0], b[1], b[2], b[3],
                b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15],
            ],
            GuidFormat::LittleEndianBinary16 => [
                b[3], b[2], b[1], b[0], b[5], b[4], b[7], b[6],
                b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15],
            ],
            _ => b,
        }
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Guid").field(&format_args!("{self}")).finish()
    }
}

/// How [`Guid`] values are sent to the server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GuidFormat {
    /// `CHAR(36)` hyphenated text.
    #[default]
    Char36,
    /// `CHAR(32)` hex text.
    Char32,
    /// `BINARY(16)` in RFC 4122 order.
    Binary16,
    /// `BINARY(16)` with time parts swapped, matching `UUID_TO_BIN(x, 1)`.
    TimeSwapBinary16,
    /// `BINARY(16)` in the little endian layout of .NET `Guid::ToByteArray`.
    LittleEndianBinary16,
}

impl GuidFormat {
    /// Returns `true` if the format is sent as text.
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Char36 | Self::Char32)
    }
}

impl FromStr for GuidFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = match s.to_ascii_lowercase().as_str() {
            "char36" | "default" => Self::Char36,
            "char32" => Self::Char32,
            "binary16" => Self::Binary16,
            "timeswapbinary16" => Self::TimeSwapBinary16,
            "littleendianbinary16" => Self::LittleEndianBinary16,
            _ => return Err(ParseError::new(format!("unknown guid format `{s}`"))),
        };
        Ok(format)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const GUID: &str = "00112233-4455-6677-8899-aabbccddeeff";

    #[test]
    fn guid_text_forms() {
        let guid = Guid::parse(GUID).unwrap();
        assert_eq!(guid.hyphenated(), GUID);
        assert_eq!(guid.simple(), "00112233445566778899aabbccddeeff");
        assert_eq!(Guid::parse(&guid.simple()), Some(guid));
        assert_eq!(Guid::parse("00112233_4455-6677-8899-aabbccddeeff"), None);
        assert_eq!(Guid::parse("not a guid"), None);
    }

    #[test]
    fn guid_binary_layouts() {
        let guid = Guid::parse(GUID).unwrap();
        assert_eq!(guid.to_format_bytes(GuidFormat::Binary16)[..4], [0x00, 0x11, 0x22, 0x33]);
        assert_eq!(
            guid.to_format_bytes(GuidFormat::TimeSwapBinary16)[..8],
            [0x66, 0x77, 0x44, 0x55, 0x00, 0x11, 0x22, 0x33],
        );
        assert_eq!(
            guid.to_format_bytes(GuidFormat::LittleEndianBinary16)[..8],
            [0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66],
        );
    }

    #[test]
    fn option_is_null() {
        assert!(Value::from(None::<i32>).is_null());
        assert_eq!(Value::from(Some(5i32)), Value::I32(5));
        assert_eq!(Value::from("a"), Value::String("a".into()));
    }

    #[test]
    fn guid_format_from_str() {
        assert_eq!("Char32".parse::<GuidFormat>().unwrap(), GuidFormat::Char32);
        assert_eq!("TIMESWAPBINARY16".parse::<GuidFormat>().unwrap(), GuidFormat::TimeSwapBinary16);
        assert!("uuid".parse::<GuidFormat>().is_err());
    }
}
