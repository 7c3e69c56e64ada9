//! Text protocol statement preparation.
//!
//! [`LiteralPreparer`] inlines parameter values into the sql text as literals, the result is
//! the body of a `COM_QUERY` frame.
use bytes::{BufMut, BytesMut};

use crate::{
    Result,
    config::FormatOptions,
    encode::EncodeError,
    mysql::ProtocolError,
    parameter::ParameterCollection,
    value::{GuidFormat, Value},
};

/// Write the body of a text query frame.
pub trait StatementPreparer {
    /// Resolve placeholders of `sql` against `parameters` and write the result to `buf`.
    fn write(
        &self,
        sql: &str,
        parameters: &ParameterCollection,
        options: &FormatOptions,
        buf: &mut BytesMut,
    ) -> Result<()>;
}

impl<P: StatementPreparer + ?Sized> StatementPreparer for &P {
    fn write(
        &self,
        sql: &str,
        parameters: &ParameterCollection,
        options: &FormatOptions,
        buf: &mut BytesMut,
    ) -> Result<()> {
        P::write(self, sql, parameters, options, buf)
    }
}

/// Client side placeholder substitution.
///
/// - `?` binds the next positional parameter
/// - `@name` and `?name` bind the parameter with the same normalized name
/// - `@@name` is a system variable and left as is
///
/// Placeholders inside quoted strings, quoted identifiers and comments are ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct LiteralPreparer;

impl StatementPreparer for LiteralPreparer {
    fn write(
        &self,
        sql: &str,
        parameters: &ParameterCollection,
        options: &FormatOptions,
        buf: &mut BytesMut,
    ) -> Result<()> {
        let offset = buf.len();
        let result = substitute(sql, parameters, options, buf);
        if result.is_err() {
            buf.truncate(offset);
        }
        result
    }
}

fn substitute(
    sql: &str,
    parameters: &ParameterCollection,
    options: &FormatOptions,
    buf: &mut BytesMut,
) -> Result<()> {
    let bytes = sql.as_bytes();
    let mut positional = 0;
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        let placeholder = match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                i = skip_quoted(bytes, i, quote, options.no_backslash_escapes);
                continue;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-')
                && bytes.get(i + 2).is_none_or(u8::is_ascii_whitespace) =>
            {
                i = skip_line(bytes, i);
                continue;
            }
            b'#' => {
                i = skip_line(bytes, i);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_block_comment(bytes, i);
                continue;
            }
            b'@' if bytes.get(i + 1) == Some(&b'@') => {
                i = name_end(bytes, i + 2);
                continue;
            }
            b'@' | b'?' => placeholder_end(bytes, i),
            _ => None,
        };

        let Some(end) = placeholder else {
            i += 1;
            continue;
        };

        let token = &sql[i..end];
        let param = if token == "?" {
            let param = parameters
                .get(positional)
                .ok_or_else(|| ProtocolError::parameter_index(positional, parameters.len()))?;
            positional += 1;
            Some(param)
        } else {
            match parameters.index_of(token) {
                Some(index) => Some(&parameters[index]),
                None if options.allow_user_variables => None,
                None => return Err(ProtocolError::undefined_parameter(token).into()),
            }
        };

        if let Some(param) = param {
            buf.put_slice(&bytes[copied..i]);
            put_literal(buf, param.value(), options)?;
            copied = end;
        }
        i = end;
    }

    buf.put_slice(&bytes[copied..]);
    Ok(())
}

/// Index after the closing quote.
fn skip_quoted(bytes: &[u8], start: usize, quote: u8, no_backslash_escapes: bool) -> usize {
    let escapes = quote != b'`' && !no_backslash_escapes;
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if escapes => i += 2,
            b if b == quote => {
                if bytes.get(i + 1) == Some(&quote) {
                    i += 2;
                } else {
                    return i + 1;
                }
            }
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_line(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |e| start + e + 1)
}

fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start + 2..]
        .windows(2)
        .position(|e| e == b"*/")
        .map_or(bytes.len(), |e| start + 2 + e + 2)
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'.') || b >= 0x80
}

fn name_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| !is_name_byte(b))
        .map_or(bytes.len(), |e| start + e)
}

/// End of the placeholder starting with `@` or `?` at `start`.
fn placeholder_end(bytes: &[u8], start: usize) -> Option<usize> {
    match bytes.get(start + 1) {
        Some(&quote @ (b'`' | b'\'' | b'"')) => {
            let end = skip_quoted(bytes, start + 1, quote, true);
            (bytes.get(end - 1) == Some(&quote) && end > start + 2).then_some(end)
        }
        Some(&b) if is_name_byte(b) => Some(name_end(bytes, start + 1)),
        _ if bytes[start] == b'?' => Some(start + 1),
        _ => None,
    }
}

/// Write `value` as sql literal.
fn put_literal(buf: &mut BytesMut, value: &Value, options: &FormatOptions) -> Result<(), EncodeError> {
    value.check_range()?;

    let nbe = options.no_backslash_escapes;
    let mut int = itoa::Buffer::new();

    match value {
        Value::Null => buf.put_slice(b"NULL"),
        Value::Bool(v) => buf.put_slice(if *v { b"true" } else { b"false" }),
        Value::I8(v) => buf.put_slice(int.format(*v).as_bytes()),
        Value::I16(v) => buf.put_slice(int.format(*v).as_bytes()),
        Value::I32(v) => buf.put_slice(int.format(*v).as_bytes()),
        Value::I64(v) => buf.put_slice(int.format(*v).as_bytes()),
        Value::U8(v) => buf.put_slice(int.format(*v).as_bytes()),
        Value::U16(v) => buf.put_slice(int.format(*v).as_bytes()),
        Value::U32(v) => buf.put_slice(int.format(*v).as_bytes()),
        Value::U64(v) => buf.put_slice(int.format(*v).as_bytes()),
        Value::F32(v) => put_float(buf, f64::from(*v), v.to_string())?,
        Value::F64(v) => put_float(buf, *v, v.to_string())?,
        Value::Decimal(s) => {
            let valid = !s.is_empty()
                && s.bytes().any(|b| b.is_ascii_digit())
                && s.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'));
            if !valid {
                return Err(EncodeError::invalid_decimal(s));
            }
            buf.put_slice(s.as_bytes());
        }
        Value::String(s) | Value::Json(s) => put_quoted(buf, s.as_bytes(), nbe),
        Value::Bytes(b) => {
            buf.put_slice(b"_binary");
            put_quoted(buf, b, nbe);
        }
        Value::Guid(guid) => match options.guid_format {
            GuidFormat::Char36 => put_quoted(buf, guid.hyphenated().as_bytes(), nbe),
            GuidFormat::Char32 => put_quoted(buf, guid.simple().as_bytes(), nbe),
            format => {
                buf.put_slice(b"_binary");
                put_quoted(buf, &guid.to_format_bytes(format), nbe);
            }
        },
        #[cfg(feature = "time")]
        Value::Date(date) => {
            let text = format!("timestamp('{:04}-{:02}-{:02}')", date.year(), u8::from(date.month()), date.day());
            buf.put_slice(text.as_bytes());
        }
        #[cfg(feature = "time")]
        Value::DateTime(dt) => {
            let text = format!(
                "timestamp('{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}')",
                dt.year(),
                u8::from(dt.month()),
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second(),
                dt.microsecond(),
            );
            buf.put_slice(text.as_bytes());
        }
        #[cfg(feature = "time")]
        Value::Time(d) => {
            let abs = d.abs();
            let secs = abs.whole_seconds();
            let text = format!(
                "time '{}{}:{:02}:{:02}.{:06}'",
                if d.is_negative() { "-" } else { "" },
                secs / 3_600,
                secs % 3_600 / 60,
                secs % 60,
                abs.subsec_microseconds(),
            );
            buf.put_slice(text.as_bytes());
        }
    }

    Ok(())
}

// `e0` makes the literal a double instead of a decimal
fn put_float(buf: &mut BytesMut, value: f64, text: String) -> Result<(), EncodeError> {
    if !value.is_finite() {
        return Err(EncodeError::non_finite(value));
    }
    buf.put_slice(text.as_bytes());
    buf.put_slice(b"e0");
    Ok(())
}

fn put_quoted(buf: &mut BytesMut, bytes: &[u8], no_backslash_escapes: bool) {
    buf.put_u8(b'\'');
    for &b in bytes {
        match b {
            b'\'' => buf.put_slice(b"''"),
            b'\\' if !no_backslash_escapes => buf.put_slice(b"\\\\"),
            b'\0' if !no_backslash_escapes => buf.put_slice(b"\\0"),
            b => buf.put_u8(b),
        }
    }
    buf.put_u8(b'\'');
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{ErrorKind, parameter::Parameter, value::Guid};

    fn prepare_with(sql: &str, params: &[Parameter], options: FormatOptions) -> Result<String> {
        let params = params.iter().cloned().collect();
        let mut buf = BytesMut::new();
        LiteralPreparer.write(sql, &params, &options, &mut buf)?;
        Ok(String::from_utf8(buf.to_vec()).unwrap())
    }

    fn prepare(sql: &str, params: &[Parameter]) -> String {
        prepare_with(sql, params, FormatOptions::default()).unwrap()
    }

    #[test]
    fn positional_and_named() {
        let params = [
            Parameter::positional(1),
            Parameter::new("@name", "O'Brien"),
            Parameter::positional(Value::Null),
        ];
        assert_eq!(
            prepare("SELECT ?, @name, ?, ?name", &params),
            "SELECT 1, 'O''Brien', 'O''Brien', 'O''Brien'"
        );
    }

    #[test]
    fn ignores_quotes_and_comments() {
        let params = [Parameter::new("@a", 1)];
        assert_eq!(
            prepare("SELECT '@a ?', \"it\\\"s @a\", `@a` -- @a ?\n, @a # ?\n/* ? @a */ @a", &params),
            "SELECT '@a ?', \"it\\\"s @a\", `@a` -- @a ?\n, 1 # ?\n/* ? @a */ 1"
        );
    }

    #[test]
    fn double_dash_without_space_is_not_comment() {
        let params = [Parameter::new("@a", 1)];
        assert_eq!(prepare("SELECT 2--@a", &params), "SELECT 2--1");
    }

    #[test]
    fn system_and_user_variables() {
        let options = FormatOptions { allow_user_variables: true, ..Default::default() };
        let params = [Parameter::new("@inParam0", 5)];
        assert_eq!(
            prepare_with("SET @@session.x = 1; CALL p(@inParam0, @outParam1)", &params, options).unwrap(),
            "SET @@session.x = 1; CALL p(5, @outParam1)"
        );
    }

    #[test]
    fn undefined_named_parameter() {
        let err = prepare_with("SELECT @missing", &[], FormatOptions::default()).unwrap_err();
        let ErrorKind::Protocol(err) = err.kind() else { panic!("expected protocol error") };
        assert_eq!(err.to_string(), "Parameter '@missing' must be defined.");
    }

    #[test]
    fn too_few_positional() {
        let err = prepare_with("SELECT ?, ?", &[Parameter::positional(1)], FormatOptions::default()).unwrap_err();
        let ErrorKind::Protocol(err) = err.kind() else { panic!("expected protocol error") };
        assert_eq!(*err, ProtocolError::ParameterIndex { index: 1, len: 1 });
    }

    #[test]
    fn quoted_parameter_name() {
        let params = [Parameter::new("@`odd name`", 3)];
        assert_eq!(prepare("SELECT @`odd name`", &params), "SELECT 3");
    }

    #[test]
    fn literal_forms() {
        let guid = Guid::parse("00112233-4455-6677-8899-aabbccddeeff").unwrap();
        let params = [
            Parameter::positional(true),
            Parameter::positional(-5i64),
            Parameter::positional(u64::MAX),
            Parameter::positional(1.5f64),
            Parameter::positional(Value::Decimal("-0.25".into())),
            Parameter::positional("a\\b\0"),
            Parameter::positional(vec![b'x', b'\'']),
            Parameter::positional(guid),
        ];
        assert_eq!(
            prepare("?,?,?,?,?,?,?,?", &params),
            "true,-5,18446744073709551615,1.5e0,-0.25,'a\\\\b\\0',_binary'x''','00112233-4455-6677-8899-aabbccddeeff'"
        );
    }

    #[test]
    fn no_backslash_escapes() {
        let options = FormatOptions { no_backslash_escapes: true, ..Default::default() };
        let params = [Parameter::positional("a\\b")];
        assert_eq!(prepare_with("SELECT '\\', ?", &params, options).unwrap(), "SELECT '\\', 'a\\b'");
    }

    #[test]
    fn binary_guid() {
        let options = FormatOptions { guid_format: GuidFormat::Binary16, ..Default::default() };
        let guid = Guid::from_bytes(*b"0123456789abcdef");
        let params = [Parameter::positional(guid)];
        assert_eq!(prepare_with("?", &params, options).unwrap(), "_binary'0123456789abcdef'");
    }

    #[test]
    fn rejects_non_finite_and_bad_decimal() {
        let mut buf = BytesMut::from(&b"head"[..]);
        let params = [Parameter::positional(f64::NAN)].into_iter().collect();
        let err = LiteralPreparer.write("SELECT ?", &params, &FormatOptions::default(), &mut buf).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Encode(_)));
        assert_eq!(&buf[..], b"head");

        let params = [Parameter::positional(Value::Decimal("1; DROP".into()))];
        assert!(prepare_with("SELECT ?", &params, FormatOptions::default()).is_err());
    }

    #[cfg(feature = "time")]
    #[test]
    fn temporal_literals() {
        use time::{Date, Duration, Month, PrimitiveDateTime, Time};

        let date = Date::from_calendar_date(2024, Month::January, 2).unwrap();
        let dt = PrimitiveDateTime::new(date, Time::from_hms_micro(3, 4, 5, 6).unwrap());
        let params = [
            Parameter::positional(date),
            Parameter::positional(dt),
            Parameter::positional(-(Duration::hours(25) + Duration::seconds(1))),
        ];
        assert_eq!(
            prepare("?, ?, ?", &params),
            "timestamp('2024-01-02'), timestamp('2024-01-02 03:04:05.000006'), time '-25:00:01.000000'"
        );
    }

    #[cfg(feature = "time")]
    #[test]
    fn temporal_out_of_range() {
        use time::{Date, Duration, Month};

        let bc = Date::from_calendar_date(-1, Month::January, 1).unwrap();
        let mut buf = BytesMut::from(&b"head"[..]);
        let params = [Parameter::positional(bc)].into_iter().collect();
        let err = LiteralPreparer.write("SELECT ?", &params, &FormatOptions::default(), &mut buf).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Encode(_)));
        assert_eq!(&buf[..], b"head");

        let params = [Parameter::positional(Duration::hours(839))];
        assert!(prepare_with("SELECT ?", &params, FormatOptions::default()).is_err());
    }
}
