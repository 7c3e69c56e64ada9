use super::{ColumnType, MySqlDbType, UNSIGNED_FLAG};
use crate::{
    encode::EncodeError,
    value::{GuidFormat, Value},
};

/// Resolve parameter types.
///
/// The default mapping is [`DefaultTypeMapper`], implement this trait to support custom
/// type inference.
pub trait TypeMapper {
    /// Logical type inferred from the runtime value.
    fn infer(&self, value: &Value) -> Result<MySqlDbType, EncodeError>;

    /// Wire type and flag byte for a logical type.
    fn column_type(
        &self,
        db_type: MySqlDbType,
        guid_format: GuidFormat,
    ) -> Result<(ColumnType, u8), EncodeError>;
}

impl<M: TypeMapper + ?Sized> TypeMapper for &M {
    fn infer(&self, value: &Value) -> Result<MySqlDbType, EncodeError> {
        M::infer(self, value)
    }

    fn column_type(
        &self,
        db_type: MySqlDbType,
        guid_format: GuidFormat,
    ) -> Result<(ColumnType, u8), EncodeError> {
        M::column_type(self, db_type, guid_format)
    }
}

/// Builtin type mapping.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultTypeMapper;

impl TypeMapper for DefaultTypeMapper {
    fn infer(&self, value: &Value) -> Result<MySqlDbType, EncodeError> {
        let db_type = match value {
            Value::Null => MySqlDbType::Null,
            Value::Bool(_) => MySqlDbType::Bool,
            Value::I8(_) => MySqlDbType::Byte,
            Value::I16(_) => MySqlDbType::Int16,
            Value::I32(_) => MySqlDbType::Int32,
            Value::I64(_) => MySqlDbType::Int64,
            Value::U8(_) => MySqlDbType::UByte,
            Value::U16(_) => MySqlDbType::UInt16,
            Value::U32(_) => MySqlDbType::UInt32,
            Value::U64(_) => MySqlDbType::UInt64,
            Value::F32(_) => MySqlDbType::Float,
            Value::F64(_) => MySqlDbType::Double,
            Value::Decimal(_) => MySqlDbType::NewDecimal,
            Value::String(_) => MySqlDbType::VarChar,
            Value::Bytes(_) => MySqlDbType::Blob,
            Value::Guid(_) => MySqlDbType::Guid,
            Value::Json(_) => MySqlDbType::Json,
            #[cfg(feature = "time")]
            Value::Date(_) => MySqlDbType::Date,
            #[cfg(feature = "time")]
            Value::DateTime(_) => MySqlDbType::DateTime,
            #[cfg(feature = "time")]
            Value::Time(_) => MySqlDbType::Time,
        };
        Ok(db_type)
    }

    fn column_type(
        &self,
        db_type: MySqlDbType,
        guid_format: GuidFormat,
    ) -> Result<(ColumnType, u8), EncodeError> {
        use MySqlDbType as T;

        let column_type = match db_type {
            T::Bool | T::Byte | T::UByte => ColumnType::Tiny,
            T::Int16 | T::UInt16 => ColumnType::Short,
            T::Int24 | T::UInt24 => ColumnType::Int24,
            T::Int32 | T::UInt32 => ColumnType::Long,
            T::Int64 | T::UInt64 => ColumnType::LongLong,
            T::Bit => ColumnType::Bit,
            T::Guid if guid_format.is_text() => ColumnType::String,
            T::Guid => ColumnType::Blob,
            T::Enum | T::Set => ColumnType::String,
            T::Binary | T::String => ColumnType::String,
            T::VarBinary | T::VarChar | T::VarString => ColumnType::VarString,
            T::TinyBlob | T::TinyText => ColumnType::TinyBlob,
            T::Blob | T::Text => ColumnType::Blob,
            T::MediumBlob | T::MediumText => ColumnType::MediumBlob,
            T::LongBlob | T::LongText => ColumnType::LongBlob,
            T::Json => ColumnType::Json,
            T::Date | T::NewDate => ColumnType::Date,
            T::DateTime => ColumnType::DateTime,
            T::Timestamp => ColumnType::Timestamp,
            T::Time => ColumnType::Time,
            T::Year => ColumnType::Year,
            T::Float => ColumnType::Float,
            T::Double => ColumnType::Double,
            T::Decimal => ColumnType::Decimal,
            T::NewDecimal => ColumnType::NewDecimal,
            T::Geometry => ColumnType::Geometry,
            T::Null => ColumnType::Null,
        };

        let flags = if db_type.is_unsigned() { UNSIGNED_FLAG } else { 0 };
        Ok((column_type, flags))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn wire(value: impl Into<Value>, format: GuidFormat) -> (ColumnType, u8) {
        let db_type = DefaultTypeMapper.infer(&value.into()).unwrap();
        DefaultTypeMapper.column_type(db_type, format).unwrap()
    }

    #[test]
    fn unsigned_sets_flag() {
        assert_eq!(wire(1u32, GuidFormat::Char36), (ColumnType::Long, UNSIGNED_FLAG));
        assert_eq!(wire(1i32, GuidFormat::Char36), (ColumnType::Long, 0));
        assert_eq!(wire(1u8, GuidFormat::Char36), (ColumnType::Tiny, UNSIGNED_FLAG));
        assert_eq!(wire(true, GuidFormat::Char36), (ColumnType::Tiny, 0));
    }

    #[test]
    fn guid_depends_on_format() {
        let guid = crate::value::Guid::from_bytes([7; 16]);
        assert_eq!(wire(guid, GuidFormat::Char36), (ColumnType::String, 0));
        assert_eq!(wire(guid, GuidFormat::Char32), (ColumnType::String, 0));
        assert_eq!(wire(guid, GuidFormat::Binary16), (ColumnType::Blob, 0));
    }

    #[test]
    fn text_and_blob() {
        assert_eq!(wire("x", GuidFormat::Char36), (ColumnType::VarString, 0));
        assert_eq!(wire(vec![1u8], GuidFormat::Char36), (ColumnType::Blob, 0));
        assert_eq!(wire(Value::Json("{}".into()), GuidFormat::Char36), (ColumnType::Json, 0));
    }
}
