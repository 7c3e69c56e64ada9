/// Flag byte set on parameter whose type is unsigned.
pub const UNSIGNED_FLAG: u8 = 0x80;

/// Protocol level column type.
///
/// <https://dev.mysql.com/doc/dev/mysql-server/latest/field__types_8h.html>
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColumnType {
    Decimal = 0x00,
    Tiny = 0x01,
    Short = 0x02,
    Long = 0x03,
    Float = 0x04,
    Double = 0x05,
    Null = 0x06,
    Timestamp = 0x07,
    LongLong = 0x08,
    Int24 = 0x09,
    Date = 0x0a,
    Time = 0x0b,
    DateTime = 0x0c,
    Year = 0x0d,
    NewDate = 0x0e,
    VarChar = 0x0f,
    Bit = 0x10,
    Json = 0xf5,
    NewDecimal = 0xf6,
    Enum = 0xf7,
    Set = 0xf8,
    TinyBlob = 0xf9,
    MediumBlob = 0xfa,
    LongBlob = 0xfb,
    Blob = 0xfc,
    VarString = 0xfd,
    String = 0xfe,
    Geometry = 0xff,
}

impl ColumnType {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Logical parameter type, as declared by the caller or inferred from a value.
///
/// Several logical types share one [`ColumnType`], the distinction is kept
/// for the unsigned flag and text/binary variants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MySqlDbType {
    Bool,
    Byte,
    UByte,
    Int16,
    UInt16,
    Int24,
    UInt24,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Bit,
    Float,
    Double,
    Decimal,
    NewDecimal,
    String,
    #[default]
    VarChar,
    VarString,
    Binary,
    VarBinary,
    TinyBlob,
    Blob,
    MediumBlob,
    LongBlob,
    TinyText,
    Text,
    MediumText,
    LongText,
    Json,
    Enum,
    Set,
    Guid,
    Date,
    NewDate,
    DateTime,
    Timestamp,
    Time,
    Year,
    Geometry,
    Null,
}

impl MySqlDbType {
    /// Returns `true` if values of this type are sent with the [`UNSIGNED_FLAG`].
    pub const fn is_unsigned(self) -> bool {
        matches!(
            self,
            Self::UByte | Self::UInt16 | Self::UInt24 | Self::UInt32 | Self::UInt64
        )
    }
}
