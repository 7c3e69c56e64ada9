//! Binary protocol value encoding.
//!
//! <https://dev.mysql.com/doc/dev/mysql-server/latest/page_protocol_binary_resultset.html#sect_protocol_binary_resultset_row_value>
use bytes::BufMut;
use std::{borrow::Cow, fmt};

use crate::{
    ext::{BufMutExt, LenEncExt},
    mysql::{ColumnType, UNSIGNED_FLAG},
    value::{GuidFormat, Value},
};

/// Largest magnitude of a `TIME` value, `838:59:59`.
#[cfg(feature = "time")]
pub const MAX_TIME: time::Duration = time::Duration::new(838 * 3_600 + 59 * 60 + 59, 0);

/// Narrow an integer value to the signed or unsigned variant of the wire width.
macro_rules! int {
    ($value:expr, $column_type:expr, $unsigned:expr, $u:ident($ut:ty), $i:ident($it:ty)) => {{
        let int = $value
            .as_integer()
            .ok_or_else(|| EncodeError::mismatch($value, $column_type))?;
        let narrowed = match $unsigned {
            true => <$ut>::try_from(int).map(Value::$u).ok(),
            false => <$it>::try_from(int).map(Value::$i).ok(),
        };
        narrowed.ok_or_else(|| EncodeError::out_of_range(int, $column_type))?
    }};
}

impl Value {
    /// Integer value of the integer and bool variants.
    fn as_integer(&self) -> Option<i128> {
        let int = match *self {
            Value::Bool(v) => i128::from(v),
            Value::I8(v) => i128::from(v),
            Value::I16(v) => i128::from(v),
            Value::I32(v) => i128::from(v),
            Value::I64(v) => i128::from(v),
            Value::U8(v) => i128::from(v),
            Value::U16(v) => i128::from(v),
            Value::U32(v) => i128::from(v),
            Value::U64(v) => i128::from(v),
            _ => return None,
        };
        Some(int)
    }

    /// Reject dates and times the server cannot store.
    ///
    /// Years must be within `0..=9999` and a time within [`MAX_TIME`] of zero.
    pub fn check_range(&self) -> Result<(), EncodeError> {
        match self {
            #[cfg(feature = "time")]
            Value::Date(date) => check_year(date.year()),
            #[cfg(feature = "time")]
            Value::DateTime(dt) => check_year(dt.year()),
            #[cfg(feature = "time")]
            Value::Time(d) if d.abs() > MAX_TIME => Err(EncodeError::new(format!("time `{d}` is out of range"))),
            _ => Ok(()),
        }
    }

    /// Convert the value to the variant the binary protocol sends for `column_type`.
    ///
    /// Integers are narrowed or widened to the column width, signedness follows the
    /// [`UNSIGNED_FLAG`] in `flags`. Values of the length encoded column types are sent as
    /// text when they are not text or bytes already. Anything else is an [`EncodeError`].
    pub fn to_wire(&self, column_type: ColumnType, flags: u8) -> Result<Cow<'_, Value>, EncodeError> {
        use ColumnType as C;

        self.check_range()?;
        let unsigned = flags & UNSIGNED_FLAG != 0;

        let value = match (column_type, self) {
            (_, Value::Null) | (C::Tiny, Value::Bool(_)) => return Ok(Cow::Borrowed(self)),
            (C::Tiny, _) => int!(self, column_type, unsigned, U8(u8), I8(i8)),
            (C::Short | C::Year, _) => int!(self, column_type, unsigned, U16(u16), I16(i16)),
            (C::Int24 | C::Long, _) => int!(self, column_type, unsigned, U32(u32), I32(i32)),
            (C::LongLong, _) => int!(self, column_type, unsigned, U64(u64), I64(i64)),

            (C::Float, Value::F32(_)) | (C::Double, Value::F64(_)) => return Ok(Cow::Borrowed(self)),
            (C::Float, Value::F64(v)) if f64::from(*v as f32) == *v => Value::F32(*v as f32),
            (C::Double, Value::F32(v)) => Value::F64(f64::from(*v)),

            #[cfg(feature = "time")]
            (C::Date | C::NewDate, Value::Date(_))
            | (C::DateTime | C::Timestamp, Value::DateTime(_))
            | (C::Time, Value::Time(_)) => return Ok(Cow::Borrowed(self)),
            #[cfg(feature = "time")]
            (C::DateTime | C::Timestamp, Value::Date(date)) => Value::DateTime(date.midnight()),

            (column_type, value) if is_length_encoded(column_type) => match value {
                Value::Decimal(_) | Value::String(_) | Value::Json(_) | Value::Bytes(_) | Value::Guid(_) => {
                    return Ok(Cow::Borrowed(self));
                }
                Value::F32(v) => float_text(f64::from(*v), v.to_string())?,
                Value::F64(v) => float_text(*v, v.to_string())?,
                _ => match value.as_integer() {
                    Some(int) => Value::String(itoa::Buffer::new().format(int).to_owned()),
                    None => return Err(EncodeError::mismatch(value, column_type)),
                },
            },

            (column_type, value) => return Err(EncodeError::mismatch(value, column_type)),
        };

        Ok(Cow::Owned(value))
    }

    /// Number of bytes [`Value::put_binary`] writes.
    pub(crate) fn binary_len(&self, guid_format: GuidFormat) -> usize {
        match self {
            Value::Null => 0,
            Value::Bool(_) | Value::I8(_) | Value::U8(_) => 1,
            Value::I16(_) | Value::U16(_) => 2,
            Value::I32(_) | Value::U32(_) | Value::F32(_) => 4,
            Value::I64(_) | Value::U64(_) | Value::F64(_) => 8,
            Value::Decimal(s) | Value::String(s) | Value::Json(s) => lenenc_bytes_len(s.len()),
            Value::Bytes(b) => lenenc_bytes_len(b.len()),
            Value::Guid(_) => match guid_format {
                GuidFormat::Char36 => lenenc_bytes_len(36),
                GuidFormat::Char32 => lenenc_bytes_len(32),
                _ => lenenc_bytes_len(16),
            },
            #[cfg(feature = "time")]
            Value::Date(_) => 1 + 4,
            #[cfg(feature = "time")]
            Value::DateTime(dt) => 1 + datetime_len(dt) as usize,
            #[cfg(feature = "time")]
            Value::Time(d) => 1 + time_len(d) as usize,
        }
    }

    /// Write the value in binary protocol form.
    ///
    /// [`Value::Null`] writes nothing, nullness is carried by the null bitmap. The value must
    /// come from [`Value::to_wire`].
    pub(crate) fn put_binary(&self, mut buf: impl BufMut, guid_format: GuidFormat) {
        match self {
            Value::Null => {}
            Value::Bool(v) => buf.put_u8(u8::from(*v)),
            Value::I8(v) => buf.put_i8(*v),
            Value::U8(v) => buf.put_u8(*v),
            Value::I16(v) => buf.put_i16_le(*v),
            Value::U16(v) => buf.put_u16_le(*v),
            Value::I32(v) => buf.put_i32_le(*v),
            Value::U32(v) => buf.put_u32_le(*v),
            Value::I64(v) => buf.put_i64_le(*v),
            Value::U64(v) => buf.put_u64_le(*v),
            Value::F32(v) => buf.put_f32_le(*v),
            Value::F64(v) => buf.put_f64_le(*v),
            Value::Decimal(s) | Value::String(s) | Value::Json(s) => buf.put_lenenc_bytes(s.as_bytes()),
            Value::Bytes(b) => buf.put_lenenc_bytes(b),
            Value::Guid(guid) => match guid_format {
                GuidFormat::Char36 => buf.put_lenenc_bytes(guid.hyphenated().as_bytes()),
                GuidFormat::Char32 => buf.put_lenenc_bytes(guid.simple().as_bytes()),
                format => buf.put_lenenc_bytes(&guid.to_format_bytes(format)),
            },
            #[cfg(feature = "time")]
            Value::Date(date) => {
                buf.put_u8(4);
                put_date(&mut buf, *date);
            }
            #[cfg(feature = "time")]
            Value::DateTime(dt) => {
                let len = datetime_len(dt);
                buf.put_u8(len);
                put_date(&mut buf, dt.date());
                if len >= 7 {
                    buf.put_u8(dt.hour());
                    buf.put_u8(dt.minute());
                    buf.put_u8(dt.second());
                }
                if len == 11 {
                    buf.put_u32_le(dt.microsecond());
                }
            }
            #[cfg(feature = "time")]
            Value::Time(d) => {
                let len = time_len(d);
                buf.put_u8(len);
                if len == 0 {
                    return;
                }
                let abs = d.abs();
                let secs = abs.whole_seconds();
                buf.put_u8(u8::from(d.is_negative()));
                buf.put_u32_le((secs / 86_400) as u32);
                buf.put_u8((secs % 86_400 / 3_600) as u8);
                buf.put_u8((secs % 3_600 / 60) as u8);
                buf.put_u8((secs % 60) as u8);
                if len == 12 {
                    buf.put_u32_le(abs.subsec_microseconds() as u32);
                }
            }
        }
    }
}

/// Column types whose binary value is a length encoded string.
fn is_length_encoded(column_type: ColumnType) -> bool {
    use ColumnType as C;
    matches!(
        column_type,
        C::Decimal | C::NewDecimal | C::VarChar | C::VarString | C::String | C::Json | C::Enum
            | C::Set | C::TinyBlob | C::MediumBlob | C::LongBlob | C::Blob | C::Bit | C::Geometry
    )
}

fn float_text(value: f64, text: String) -> Result<Value, EncodeError> {
    match value.is_finite() {
        true => Ok(Value::String(text)),
        false => Err(EncodeError::non_finite(value)),
    }
}

#[cfg(feature = "time")]
fn check_year(year: i32) -> Result<(), EncodeError> {
    match year {
        0..=9999 => Ok(()),
        _ => Err(EncodeError::new(format!("year {year} is out of range"))),
    }
}

fn lenenc_bytes_len(len: usize) -> usize {
    len.lenenc_len() + len
}

#[cfg(feature = "time")]
fn put_date(buf: &mut impl BufMut, date: time::Date) {
    buf.put_u16_le(date.year() as u16);
    buf.put_u8(u8::from(date.month()));
    buf.put_u8(date.day());
}

// zero time is omitted, then zero microsecond
#[cfg(feature = "time")]
fn datetime_len(dt: &time::PrimitiveDateTime) -> u8 {
    if dt.microsecond() != 0 {
        11
    } else if dt.hour() != 0 || dt.minute() != 0 || dt.second() != 0 {
        7
    } else {
        4
    }
}

#[cfg(feature = "time")]
fn time_len(d: &time::Duration) -> u8 {
    if d.is_zero() {
        0
    } else if d.subsec_microseconds() == 0 {
        8
    } else {
        12
    }
}

/// An error when a value cannot be encoded by the type mapper or statement preparer.
pub struct EncodeError {
    reason: Cow<'static, str>,
}

impl EncodeError {
    pub fn new(reason: impl Into<Cow<'static, str>>) -> EncodeError {
        Self { reason: reason.into() }
    }

    pub(crate) fn non_finite(value: f64) -> EncodeError {
        Self::new(format!("{value} cannot be represented as sql literal"))
    }

    pub(crate) fn invalid_decimal(value: &str) -> EncodeError {
        Self::new(format!("`{value}` is not a decimal number"))
    }

    pub(crate) fn mismatch(value: &Value, column_type: ColumnType) -> EncodeError {
        Self::new(format!("{} value cannot be sent as {column_type:?}", value.type_name()))
    }

    pub(crate) fn out_of_range(value: i128, column_type: ColumnType) -> EncodeError {
        Self::new(format!("{value} is out of range for {column_type:?}"))
    }
}

impl std::error::Error for EncodeError { }

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to encode value: {}", self.reason)
    }
}

impl fmt::Debug for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}
