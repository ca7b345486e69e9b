//! Column and parameter values
//!
//! [`SqlValue`] is the single value model shared by parameter binding and
//! column reads. [`IntoParam`] and [`FromValue`] convert between it and
//! plain Rust types.
//!
//! Temporal values use `chrono`. Drivers without native date types (SQLite)
//! store them as ISO-8601 text, so the temporal [`FromValue`] impls also
//! parse text, and timestamps accept integer unix seconds.

use crate::error::{FsqlError, FsqlResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// 쿼리 파라미터 / 컬럼 값
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Utf8(String),
    /// Binary and large-object payloads
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    /// 타임존 없는 시각 (UTC 로 취급)
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Name of the variant, used in type-mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "Null",
            SqlValue::Boolean(_) => "Boolean",
            SqlValue::Int32(_) => "Int32",
            SqlValue::Int64(_) => "Int64",
            SqlValue::Float64(_) => "Float64",
            SqlValue::Utf8(_) => "Utf8",
            SqlValue::Bytes(_) => "Bytes",
            SqlValue::Date(_) => "Date",
            SqlValue::Time(_) => "Time",
            SqlValue::Timestamp(_) => "Timestamp",
        }
    }

    /// SQL 리터럴 문자열로 변환 (로그/디버그용)
    pub fn to_sql_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Boolean(v) => {
                if *v {
                    "TRUE".to_string()
                } else {
                    "FALSE".to_string()
                }
            }
            SqlValue::Int32(v) => v.to_string(),
            SqlValue::Int64(v) => v.to_string(),
            SqlValue::Float64(v) => format!("{v}"),
            SqlValue::Utf8(v) => format!("'{}'", v.replace('\'', "''")),
            SqlValue::Bytes(v) => {
                let hex: String = v.iter().map(|b| format!("{b:02X}")).collect();
                format!("X'{hex}'")
            }
            SqlValue::Date(v) => format!("'{}'", v.format(DATE_FORMAT)),
            SqlValue::Time(v) => format!("'{}'", v.format(TIME_FORMAT)),
            SqlValue::Timestamp(v) => format!("'{}'", v.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_literal())
    }
}

/// 파라미터 변환 트레이트
pub trait IntoParam {
    fn into_param(self) -> SqlValue;
}

impl IntoParam for SqlValue {
    fn into_param(self) -> SqlValue {
        self
    }
}

impl IntoParam for bool {
    fn into_param(self) -> SqlValue {
        SqlValue::Boolean(self)
    }
}

impl IntoParam for i32 {
    fn into_param(self) -> SqlValue {
        SqlValue::Int32(self)
    }
}

impl IntoParam for i8 {
    fn into_param(self) -> SqlValue {
        SqlValue::Int32(i32::from(self))
    }
}

impl IntoParam for i16 {
    fn into_param(self) -> SqlValue {
        SqlValue::Int32(i32::from(self))
    }
}

impl IntoParam for u32 {
    fn into_param(self) -> SqlValue {
        SqlValue::Int64(i64::from(self))
    }
}

impl IntoParam for i64 {
    fn into_param(self) -> SqlValue {
        SqlValue::Int64(self)
    }
}

impl IntoParam for f64 {
    fn into_param(self) -> SqlValue {
        SqlValue::Float64(self)
    }
}

impl IntoParam for f32 {
    fn into_param(self) -> SqlValue {
        SqlValue::Float64(f64::from(self))
    }
}

impl IntoParam for &str {
    fn into_param(self) -> SqlValue {
        SqlValue::Utf8(self.to_string())
    }
}

impl IntoParam for String {
    fn into_param(self) -> SqlValue {
        SqlValue::Utf8(self)
    }
}

impl IntoParam for Vec<u8> {
    fn into_param(self) -> SqlValue {
        SqlValue::Bytes(self)
    }
}

impl IntoParam for &[u8] {
    fn into_param(self) -> SqlValue {
        SqlValue::Bytes(self.to_vec())
    }
}

impl IntoParam for NaiveDate {
    fn into_param(self) -> SqlValue {
        SqlValue::Date(self)
    }
}

impl IntoParam for NaiveTime {
    fn into_param(self) -> SqlValue {
        SqlValue::Time(self)
    }
}

impl IntoParam for NaiveDateTime {
    fn into_param(self) -> SqlValue {
        SqlValue::Timestamp(self)
    }
}

impl IntoParam for DateTime<Utc> {
    fn into_param(self) -> SqlValue {
        SqlValue::Timestamp(self.naive_utc())
    }
}

impl<T: IntoParam> IntoParam for Option<T> {
    fn into_param(self) -> SqlValue {
        match self {
            Some(v) => v.into_param(),
            None => SqlValue::Null,
        }
    }
}

/// 컬럼 값 추출 트레이트
pub trait FromValue: Sized {
    fn from_value(value: SqlValue) -> FsqlResult<Self>;
}

fn mismatch(expected: &str, actual: &SqlValue) -> FsqlError {
    FsqlError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

impl FromValue for SqlValue {
    fn from_value(value: SqlValue) -> FsqlResult<Self> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: SqlValue) -> FsqlResult<Self> {
        // SQLite stores booleans as integers
        match value {
            SqlValue::Boolean(v) => Ok(v),
            SqlValue::Int32(v) => Ok(v != 0),
            SqlValue::Int64(v) => Ok(v != 0),
            other => Err(mismatch("Boolean", &other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: SqlValue) -> FsqlResult<Self> {
        match value {
            SqlValue::Int32(v) => Ok(v),
            SqlValue::Int64(v) => i32::try_from(v).map_err(|_| FsqlError::TypeMismatch {
                expected: "Int32".to_string(),
                actual: format!("Int64({v})"),
            }),
            SqlValue::Boolean(v) => Ok(i32::from(v)),
            other => Err(mismatch("Int32", &other)),
        }
    }
}

// 좁은 정수형은 i64 를 거쳐 범위 검사
macro_rules! narrow_int_from_value {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl FromValue for $ty {
            fn from_value(value: SqlValue) -> FsqlResult<Self> {
                let wide = match value {
                    SqlValue::Int32(v) => i64::from(v),
                    SqlValue::Int64(v) => v,
                    SqlValue::Boolean(v) => i64::from(v),
                    other => return Err(mismatch($name, &other)),
                };
                <$ty>::try_from(wide).map_err(|_| FsqlError::TypeMismatch {
                    expected: $name.to_string(),
                    actual: format!("Int64({wide})"),
                })
            }
        }
    )*};
}

narrow_int_from_value!(i8 => "Int8", i16 => "Int16", u32 => "UInt32");

impl FromValue for i64 {
    fn from_value(value: SqlValue) -> FsqlResult<Self> {
        match value {
            SqlValue::Int64(v) => Ok(v),
            SqlValue::Int32(v) => Ok(i64::from(v)),
            SqlValue::Boolean(v) => Ok(i64::from(v)),
            other => Err(mismatch("Int64", &other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: SqlValue) -> FsqlResult<Self> {
        match value {
            SqlValue::Float64(v) => Ok(v),
            SqlValue::Int32(v) => Ok(f64::from(v)),
            SqlValue::Int64(v) => Ok(v as f64),
            other => Err(mismatch("Float64", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: SqlValue) -> FsqlResult<Self> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl FromValue for String {
    fn from_value(value: SqlValue) -> FsqlResult<Self> {
        match value {
            SqlValue::Utf8(v) => Ok(v),
            other => Err(mismatch("Utf8", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: SqlValue) -> FsqlResult<Self> {
        match value {
            SqlValue::Bytes(v) => Ok(v),
            SqlValue::Utf8(v) => Ok(v.into_bytes()),
            other => Err(mismatch("Bytes", &other)),
        }
    }
}

fn unparsable(expected: &str, text: &str) -> FsqlError {
    FsqlError::TypeMismatch {
        expected: expected.to_string(),
        actual: format!("Utf8({text})"),
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: SqlValue) -> FsqlResult<Self> {
        match value {
            SqlValue::Date(v) => Ok(v),
            SqlValue::Timestamp(v) => Ok(v.date()),
            SqlValue::Utf8(text) => NaiveDate::parse_from_str(&text, DATE_FORMAT)
                .map_err(|_| unparsable("Date", &text)),
            other => Err(mismatch("Date", &other)),
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: SqlValue) -> FsqlResult<Self> {
        match value {
            SqlValue::Time(v) => Ok(v),
            SqlValue::Timestamp(v) => Ok(v.time()),
            SqlValue::Utf8(text) => NaiveTime::parse_from_str(&text, TIME_FORMAT)
                .or_else(|_| NaiveTime::parse_from_str(&text, "%H:%M"))
                .map_err(|_| unparsable("Time", &text)),
            other => Err(mismatch("Time", &other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: SqlValue) -> FsqlResult<Self> {
        match value {
            SqlValue::Timestamp(v) => Ok(v),
            SqlValue::Date(v) => Ok(v.and_time(NaiveTime::MIN)),
            SqlValue::Int64(secs) => DateTime::from_timestamp(secs, 0)
                .map(|v| v.naive_utc())
                .ok_or_else(|| FsqlError::TypeMismatch {
                    expected: "Timestamp".to_string(),
                    actual: format!("Int64({secs})"),
                }),
            SqlValue::Utf8(text) => {
                parse_timestamp(&text).ok_or_else(|| unparsable("Timestamp", &text))
            }
            other => Err(mismatch("Timestamp", &other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: SqlValue) -> FsqlResult<Self> {
        if let SqlValue::Utf8(text) = &value {
            if let Ok(v) = DateTime::parse_from_rfc3339(text) {
                return Ok(v.with_timezone(&Utc));
            }
        }
        NaiveDateTime::from_value(value).map(|v| v.and_utc())
    }
}

/// `2024-03-01 12:30:00[.fff]`, the same with a `T` separator, or a bare date.
fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: SqlValue) -> FsqlResult<Self> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_literal() {
        assert_eq!(SqlValue::Null.to_sql_literal(), "NULL");
        assert_eq!(SqlValue::Int32(42).to_sql_literal(), "42");
        assert_eq!(SqlValue::Boolean(false).to_sql_literal(), "FALSE");
        assert_eq!(SqlValue::Bytes(vec![0xde, 0xad]).to_sql_literal(), "X'DEAD'");
        // single quote → 이스케이프
        assert_eq!(
            SqlValue::Utf8("O'Brien".into()).to_sql_literal(),
            "'O''Brien'"
        );
    }

    #[test]
    fn test_into_param_trait() {
        assert_eq!(42i32.into_param(), SqlValue::Int32(42));
        assert_eq!(100i64.into_param(), SqlValue::Int64(100));
        assert_eq!("hello".into_param(), SqlValue::Utf8("hello".into()));
        assert_eq!(true.into_param(), SqlValue::Boolean(true));
        assert_eq!(vec![1u8, 2].into_param(), SqlValue::Bytes(vec![1, 2]));
        assert_eq!(Option::<i32>::None.into_param(), SqlValue::Null);
        assert_eq!(Some(10i32).into_param(), SqlValue::Int32(10));
    }

    #[test]
    fn test_integer_widening_and_narrowing() {
        assert_eq!(i64::from_value(SqlValue::Int32(7)).unwrap(), 7);
        assert_eq!(i32::from_value(SqlValue::Int64(7)).unwrap(), 7);
        let err = i32::from_value(SqlValue::Int64(i64::MAX)).unwrap_err();
        assert!(matches!(err, FsqlError::TypeMismatch { .. }));
    }

    #[test]
    fn test_bool_from_integer() {
        assert!(bool::from_value(SqlValue::Int64(1)).unwrap());
        assert!(!bool::from_value(SqlValue::Int64(0)).unwrap());
    }

    #[test]
    fn test_narrow_integers_and_f32() {
        assert_eq!(i8::from_value(SqlValue::Int64(-5)).unwrap(), -5);
        assert_eq!(i16::from_value(SqlValue::Int32(300)).unwrap(), 300);
        assert_eq!(u32::from_value(SqlValue::Int64(4_000_000_000)).unwrap(), 4_000_000_000);
        assert!(i8::from_value(SqlValue::Int64(300)).is_err());
        assert!(u32::from_value(SqlValue::Int64(-1)).is_err());
        assert!(i16::from_value(SqlValue::Utf8("1".into())).is_err());

        assert_eq!(f32::from_value(SqlValue::Float64(1.5)).unwrap(), 1.5);
        assert_eq!(f32::from_value(SqlValue::Int32(2)).unwrap(), 2.0);

        assert_eq!(7i8.into_param(), SqlValue::Int32(7));
        assert_eq!(7i16.into_param(), SqlValue::Int32(7));
        assert_eq!(7u32.into_param(), SqlValue::Int64(7));
        assert_eq!(0.5f32.into_param(), SqlValue::Float64(0.5));
    }

    #[test]
    fn test_temporal_values_from_text() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let time = NaiveTime::from_hms_milli_opt(12, 30, 5, 250).unwrap();
        let stamp = date.and_time(time);

        assert_eq!(NaiveDate::from_value(SqlValue::Utf8("2024-03-01".into())).unwrap(), date);
        assert_eq!(NaiveTime::from_value(SqlValue::Utf8("12:30:05.250".into())).unwrap(), time);
        assert_eq!(
            NaiveDateTime::from_value(SqlValue::Utf8("2024-03-01 12:30:05.250".into())).unwrap(),
            stamp
        );
        assert_eq!(
            NaiveDateTime::from_value(SqlValue::Utf8("2024-03-01T12:30:05.250".into())).unwrap(),
            stamp
        );
        assert_eq!(
            NaiveDateTime::from_value(SqlValue::Utf8("2024-03-01".into())).unwrap(),
            date.and_time(NaiveTime::MIN)
        );

        let err = NaiveDate::from_value(SqlValue::Utf8("yesterday".into())).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected Date, got Utf8(yesterday)");
    }

    #[test]
    fn test_temporal_values_from_native_and_integers() {
        let stamp = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();

        assert_eq!(NaiveDate::from_value(SqlValue::Timestamp(stamp)).unwrap(), stamp.date());
        assert_eq!(NaiveTime::from_value(SqlValue::Timestamp(stamp)).unwrap(), stamp.time());
        assert_eq!(
            NaiveDateTime::from_value(SqlValue::Int64(stamp.and_utc().timestamp())).unwrap(),
            stamp
        );
        assert_eq!(
            DateTime::<Utc>::from_value(SqlValue::Utf8("2024-03-01T10:00:00+02:00".into()))
                .unwrap(),
            stamp.and_utc()
        );
        assert_eq!(stamp.and_utc().into_param(), SqlValue::Timestamp(stamp));
        assert!(NaiveDate::from_value(SqlValue::Float64(1.0)).is_err());
    }

    #[test]
    fn test_temporal_literals() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(SqlValue::Date(date).to_sql_literal(), "'2024-03-01'");
        assert_eq!(
            SqlValue::Timestamp(date.and_hms_opt(9, 5, 0).unwrap()).to_sql_literal(),
            "'2024-03-01 09:05:00'"
        );
        assert_eq!(
            SqlValue::Time(NaiveTime::from_hms_opt(9, 5, 0).unwrap()).to_sql_literal(),
            "'09:05:00'"
        );
    }

    #[test]
    fn test_null_handling() {
        assert_eq!(Option::<String>::from_value(SqlValue::Null).unwrap(), None);
        assert_eq!(
            Option::<i64>::from_value(SqlValue::Int64(3)).unwrap(),
            Some(3)
        );
        let err = String::from_value(SqlValue::Null).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected Utf8, got Null");
    }
}
