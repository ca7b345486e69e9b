//! API 트레이트 정의

use crate::driver::{RowCursor, RowExt};
use crate::error::FsqlResult;
use crate::value::{FromValue, SqlValue};

/// 현재 row에서 구조체로 변환하는 트레이트
///
/// `#[derive(FromRow)]` reads every field by column label.
pub trait FromRow: Sized {
    fn from_row<C: RowCursor + ?Sized>(row: &C) -> FsqlResult<Self>;
}

/// 모든 컬럼을 순서대로
impl FromRow for Vec<SqlValue> {
    fn from_row<C: RowCursor + ?Sized>(row: &C) -> FsqlResult<Self> {
        (0..row.column_count()).map(|idx| row.value(idx)).collect()
    }
}

// 튜플은 컬럼 위치로 읽음
macro_rules! tuple_from_row {
    ($($idx:tt => $ty:ident),+) => {
        impl<$($ty: FromValue),+> FromRow for ($($ty,)+) {
            fn from_row<C: RowCursor + ?Sized>(row: &C) -> FsqlResult<Self> {
                Ok(($(row.get::<$ty>($idx)?,)+))
            }
        }
    };
}

tuple_from_row!(0 => T0);
tuple_from_row!(0 => T0, 1 => T1);
tuple_from_row!(0 => T0, 1 => T1, 2 => T2);
tuple_from_row!(0 => T0, 1 => T1, 2 => T2, 3 => T3);
tuple_from_row!(0 => T0, 1 => T1, 2 => T2, 3 => T3, 4 => T4);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{MemoryDatabase, ResultTable};
    use crate::config::StatementOptions;
    use crate::driver::{Connection, ReadOnlyRow, Statement};

    #[test]
    fn test_tuple_and_vec_rows() {
        let db = MemoryDatabase::new();
        db.register_query(
            "SELECT id, name, score FROM t",
            ResultTable::new(["id", "name", "score"]).row([
                SqlValue::Int64(7),
                SqlValue::Utf8("x".into()),
                SqlValue::Null,
            ]),
        );
        let mut conn = db.connect().unwrap();
        let mut stmt = conn.create_statement(&StatementOptions::default()).unwrap();
        let mut cursor = stmt.query_sql("SELECT id, name, score FROM t").unwrap();
        cursor.advance().unwrap();
        let row = ReadOnlyRow::new(&cursor);

        let (id, name, score) = <(i64, String, Option<f64>)>::from_row(&row).unwrap();
        assert_eq!((id, name.as_str(), score), (7, "x", None));

        let values = Vec::<SqlValue>::from_row(&row).unwrap();
        assert_eq!(values.len(), 3);

        assert!(<(i64, i64)>::from_row(&row).is_err());
    }
}
