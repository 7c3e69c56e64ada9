//! Prepared statement execution.
use bytes::BytesMut;

use crate::{
    Result,
    config::FormatOptions,
    mysql::{
        ProtocolError, TypeMapper,
        frontend::{self, BoundParameter, StmtExecute},
    },
    parameter::{Parameter, ParameterCollection},
    statement::PreparedStatement,
    value::Value,
};

/// Write a `COM_STMT_EXECUTE` frame for `statement` with values from `parameters`.
///
/// Every formal parameter of the statement must resolve to a parameter, by name when the formal
/// parameter is named, by its index otherwise. Parameters not referenced by the statement are
/// ignored.
///
/// Nothing is written on error.
pub fn write_execute<M: TypeMapper + ?Sized>(
    statement: &PreparedStatement,
    parameters: &ParameterCollection,
    options: &FormatOptions,
    mapper: &M,
    buf: &mut BytesMut,
) -> Result<()> {
    let resolved = resolve(statement, parameters)?;

    let params = resolved
        .into_iter()
        .map(|param| bind(param, options, mapper))
        .collect::<Result<Vec<_>>>()?;

    frontend::write(
        StmtExecute {
            statement_id: statement.id(),
            params: &params,
            guid_format: options.guid_format,
        },
        buf,
    );

    Ok(())
}

/// Positional parameter array of the statement.
fn resolve<'a>(
    statement: &PreparedStatement,
    parameters: &'a ParameterCollection,
) -> Result<Vec<&'a Parameter>, ProtocolError> {
    statement
        .parameters()
        .iter()
        .map(|formal| {
            let index = match formal.name() {
                Some(name) => parameters
                    .index_of(name)
                    .ok_or_else(|| ProtocolError::undefined_parameter(name))?,
                None => formal.index(),
            };
            parameters
                .get(index)
                .ok_or_else(|| ProtocolError::parameter_index(index, parameters.len()))
        })
        .collect()
}

/// Null keeps the declared type, any other value has its type inferred,
/// overriding the declared one. The value is then converted to the resolved wire type.
fn bind<'a, M: TypeMapper + ?Sized>(
    param: &'a Parameter,
    options: &FormatOptions,
    mapper: &M,
) -> Result<BoundParameter<'a>> {
    let db_type = match param.value() {
        Value::Null => param.db_type(),
        value => mapper.infer(value)?,
    };
    let (column_type, flags) = mapper.column_type(db_type, options.guid_format)?;
    let value = param.value().to_wire(column_type, flags)?;
    Ok(BoundParameter { column_type, flags, value })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ErrorKind,
        encode::EncodeError,
        mysql::{ColumnType, DefaultTypeMapper, MySqlDbType, UNSIGNED_FLAG},
        statement::FormalParameter,
        value::GuidFormat,
    };

    fn execute(statement: &PreparedStatement, params: &ParameterCollection) -> Result<BytesMut> {
        let mut buf = BytesMut::new();
        write_execute(statement, params, &FormatOptions::default(), &DefaultTypeMapper, &mut buf)?;
        Ok(buf)
    }

    fn positional(n: usize) -> PreparedStatement {
        PreparedStatement::new(9, (0..n).map(FormalParameter::positional))
    }

    fn protocol(err: crate::Error) -> ProtocolError {
        match err.kind() {
            ErrorKind::Protocol(e) => e.clone(),
            kind => panic!("expected protocol error, found {kind}"),
        }
    }

    /// parameters where every index in `nulls` is null, others are `u8`
    fn with_nulls(n: usize, nulls: &[usize]) -> ParameterCollection {
        (0..n)
            .map(|i| match nulls.contains(&i) {
                true => Parameter::positional(Value::Null),
                false => Parameter::positional(i as u8),
            })
            .collect()
    }

    fn bitmap(n: usize, nulls: &[usize]) -> Vec<u8> {
        let buf = execute(&positional(n), &with_nulls(n, nulls)).unwrap();
        // command, id, flags, iteration
        let start = 1 + 4 + 1 + 4;
        buf[start..start + frontend::null_bitmap_len(n)].to_vec()
    }

    #[test]
    fn null_bitmap_sizes() {
        for n in [0, 1, 7, 8, 9, 16] {
            let nulls = (0..n).filter(|i| i % 3 == 0).collect::<Vec<_>>();
            let bitmap = bitmap(n, &nulls);
            assert_eq!(bitmap.len(), n.div_ceil(8), "bitmap length for {n}");
            for i in 0..n {
                let set = bitmap[i / 8] & (1 << (i % 8)) != 0;
                assert_eq!(set, nulls.contains(&i), "bit {i} of {n}");
            }
        }
    }

    #[test]
    fn null_bitmap_exact_bytes() {
        assert_eq!(bitmap(7, &[0, 6]), [0b0100_0001]);
        assert_eq!(bitmap(8, &[7]), [0b1000_0000]);
        assert_eq!(bitmap(8, &[0, 1, 2, 3, 4, 5, 6, 7]), [0xff]);
        assert_eq!(bitmap(9, &[8]), [0x00, 0x01]);
        assert_eq!(bitmap(9, &[1, 8]), [0x02, 0x01]);
        assert_eq!(bitmap(9, &[]), [0x00, 0x00]);
    }

    #[test]
    fn no_formal_parameters_skips_parameter_block() {
        let params = with_nulls(3, &[]);
        let buf = execute(&positional(0), &params).unwrap();
        assert_eq!(&buf[..], [0x17, 9, 0, 0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn full_frame() {
        let statement = PreparedStatement::new(
            0x0403_0201,
            [FormalParameter::named("@name", 0), FormalParameter::positional(0), FormalParameter::named("?n", 1)],
        );
        let params: ParameterCollection = [
            Parameter::positional(7u16),
            Parameter::new("@N", Value::Null).with_db_type(MySqlDbType::Int64),
            Parameter::new("name", "ab"),
        ]
        .into_iter()
        .collect();

        let buf = execute(&statement, &params).unwrap();

        assert_eq!(
            &buf[..],
            [
                0x17,
                0x01, 0x02, 0x03, 0x04, // statement id
                0, // no cursor
                1, 0, 0, 0, // iteration count
                0b100, // third is null
                1, // new params bound
                0xfd, 0, // varchar
                0x02, UNSIGNED_FLAG, // u16
                0x08, 0, // declared int64
                2, b'a', b'b', // "ab"
                7, 0, // 7u16
            ]
        );
    }

    #[test]
    fn inferred_type_overrides_declared() {
        let statement = positional(1);
        let params: ParameterCollection = [Parameter::positional(1.5f64).with_db_type(MySqlDbType::VarChar)]
            .into_iter()
            .collect();

        let buf = execute(&statement, &params).unwrap();
        let types = 1 + 4 + 1 + 4 + 1 + 1;
        assert_eq!(buf[types], ColumnType::Double.code());
        assert_eq!(&buf[types + 2..], 1.5f64.to_le_bytes());
    }

    #[test]
    fn null_without_declared_type_is_varchar() {
        let buf = execute(&positional(1), &with_nulls(1, &[0])).unwrap();
        assert_eq!(&buf[10..], [0x01, 1, 0xfd, 0]);
    }

    #[test]
    fn undefined_named_parameter() {
        let statement = PreparedStatement::new(1, [FormalParameter::named("@missing", 0)]);
        let mut buf = BytesMut::from(&b"keep"[..]);
        let err = write_execute(
            &statement,
            &with_nulls(1, &[]),
            &FormatOptions::default(),
            &DefaultTypeMapper,
            &mut buf,
        )
        .unwrap_err();

        let err = protocol(err);
        assert_eq!(err, ProtocolError::UndefinedParameter { name: "@missing".into() });
        assert_eq!(err.to_string(), "Parameter '@missing' must be defined.");
        assert_eq!(&buf[..], b"keep");
    }

    #[test]
    fn index_out_of_range() {
        let err = protocol(execute(&positional(3), &with_nulls(2, &[])).unwrap_err());
        assert_eq!(err, ProtocolError::ParameterIndex { index: 2, len: 2 });
        assert_eq!(err.to_string(), "Parameter index 2 is invalid when only 2 parameters are defined.");

        let err = protocol(execute(&positional(2), &with_nulls(1, &[])).unwrap_err());
        assert_eq!(err.to_string(), "Parameter index 1 is invalid when only 1 parameter is defined.");
    }

    /// Sends every integer as `BIGINT`, or as `TINYINT` when `tiny` is set.
    struct FixedIntMapper {
        tiny: bool,
    }

    impl TypeMapper for FixedIntMapper {
        fn infer(&self, value: &Value) -> Result<MySqlDbType, EncodeError> {
            match value {
                Value::I32(_) if self.tiny => Ok(MySqlDbType::Byte),
                Value::I32(_) => Ok(MySqlDbType::Int64),
                value => DefaultTypeMapper.infer(value),
            }
        }

        fn column_type(&self, db_type: MySqlDbType, guid_format: GuidFormat) -> Result<(ColumnType, u8), EncodeError> {
            DefaultTypeMapper.column_type(db_type, guid_format)
        }
    }

    fn execute_with(mapper: &FixedIntMapper, value: impl Into<Value>) -> Result<BytesMut> {
        let params: ParameterCollection = [Parameter::positional(value)].into_iter().collect();
        let mut buf = BytesMut::new();
        write_execute(&positional(1), &params, &FormatOptions::default(), mapper, &mut buf)?;
        Ok(buf)
    }

    #[test]
    fn value_follows_mapped_width() {
        let buf = execute_with(&FixedIntMapper { tiny: false }, 7i32).unwrap();
        assert_eq!(
            &buf[..],
            [0x17, 9, 0, 0, 0, 0, 1, 0, 0, 0, 0x00, 1, 0x08, 0, 7, 0, 0, 0, 0, 0, 0, 0]
        );

        let buf = execute_with(&FixedIntMapper { tiny: true }, -2i32).unwrap();
        assert_eq!(&buf[10..], [0x00, 1, 0x01, 0, 0xfe]);
    }

    #[test]
    fn value_overflowing_mapped_width() {
        let mut buf = BytesMut::from(&b"keep"[..]);
        let params: ParameterCollection = [Parameter::positional(300)].into_iter().collect();
        let err = write_execute(
            &positional(1),
            &params,
            &FormatOptions::default(),
            &FixedIntMapper { tiny: true },
            &mut buf,
        )
        .unwrap_err();

        assert_eq!(err.as_encode().map(ToString::to_string).as_deref(), Some("failed to encode value: 300 is out of range for Tiny"));
        assert_eq!(&buf[..], b"keep");
    }

    #[cfg(feature = "time")]
    #[test]
    fn date_out_of_range() {
        let date = time::Date::from_calendar_date(-1, time::Month::January, 1).unwrap();
        let err = execute(&positional(1), &[Parameter::positional(date)].into_iter().collect()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Encode(_)));
    }
}
