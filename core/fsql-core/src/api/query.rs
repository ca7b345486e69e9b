//! Query Builder: Fluent 스타일 API
//!
//! 파라미터 바인딩:
//! - Positional: `?` 순서대로 `bind`
//! - Named: `:name` 을 `param` 으로
//!
//! 둘을 섞으면 `InvalidOperation`.

use crate::api::functional::SqlSupplier;
use crate::api::traits::FromRow;
use crate::driver::{Connection, CursorOf, ReadOnlyRow, RowExt};
use crate::engine::functional_sql::FunctionalSql;
use crate::engine::iterator::RowIterator;
use crate::engine::resources::QueryCursor;
use crate::engine::stream::RowStream;
use crate::error::{FsqlError, FsqlResult};
use crate::value::{FromValue, IntoParam, SqlValue};

/// Named 파라미터 엔트리
#[derive(Debug, Clone)]
struct NamedParam {
    name: String,
    value: SqlValue,
}

/// 실행 방식
enum Binding {
    Plain,
    Positional(Vec<SqlValue>),
    Named(Vec<(String, SqlValue)>),
}

fn resolve(params: &[SqlValue], named: &[NamedParam], context: &str) -> FsqlResult<Binding> {
    match (params.is_empty(), named.is_empty()) {
        (true, true) => Ok(Binding::Plain),
        (false, true) => Ok(Binding::Positional(params.to_vec())),
        (true, false) => Ok(Binding::Named(
            named
                .iter()
                .map(|p| (p.name.clone(), p.value.clone()))
                .collect(),
        )),
        (false, false) => Err(FsqlError::InvalidOperation {
            message: "positional과 named 파라미터를 동시에 사용할 수 없습니다".to_string(),
            context: context.to_string(),
        }),
    }
}

/// Query Builder: SELECT
pub struct Query<'a, K, P> {
    fsql: &'a FunctionalSql<K, P>,
    sql: String,
    params: Vec<SqlValue>,
    named_params: Vec<NamedParam>,
}

impl<'a, K, P> Query<'a, K, P>
where
    K: Connection,
    P: SqlSupplier<K>,
{
    pub fn new(fsql: &'a FunctionalSql<K, P>, sql: impl Into<String>) -> Self {
        Self {
            fsql,
            sql: sql.into(),
            params: Vec::new(),
            named_params: Vec::new(),
        }
    }

    /// Positional 파라미터 바인딩 (?, ?, ...)
    pub fn bind<V: IntoParam>(mut self, value: V) -> Self {
        self.params.push(value.into_param());
        self
    }

    /// Named 파라미터 바인딩 (:name, :age, ...)
    pub fn param<V: IntoParam>(mut self, name: &str, value: V) -> Self {
        self.named_params.push(NamedParam {
            name: name.to_string(),
            value: value.into_param(),
        });
        self
    }

    /// 커서 획득 (실패 시 즉시 에러)
    pub fn open(&self) -> FsqlResult<QueryCursor<K>> {
        match resolve(&self.params, &self.named_params, "Query::open")? {
            Binding::Plain => self.fsql.query(self.sql.as_str()).get(),
            Binding::Positional(params) => {
                self.fsql.parameter_query(self.sql.as_str(), params).get()
            }
            Binding::Named(params) => self.fsql.named_parameter_query(&self.sql, params)?.get(),
        }
    }

    /// Lazy stream
    pub fn stream<T, F>(self, row_fn: F) -> FsqlResult<RowStream<K, F, T>>
    where
        F: FnMut(&ReadOnlyRow<'_, CursorOf<K>>) -> FsqlResult<T>,
    {
        let cursor = self.open()?;
        Ok(RowStream::new(RowIterator::from_cursor(cursor, row_fn)))
    }

    /// 모든 행 반환
    pub fn fetch_all<T: FromRow>(self) -> FsqlResult<Vec<T>> {
        self.stream(|row| T::from_row(row))?.collect_rows()
    }

    /// 정확히 1개 행 반환 (0개 또는 2개 이상이면 에러)
    pub fn fetch_one<T: FromRow>(self) -> FsqlResult<T> {
        let mut rows = self.stream(|row| T::from_row(row))?;
        let first = rows.next().ok_or(FsqlError::NoRows)??;
        if rows.has_more()? {
            return Err(FsqlError::InvalidOperation {
                message: "expected 1 row, got more".to_string(),
                context: "Query::fetch_one".to_string(),
            });
        }
        Ok(first)
    }

    /// 첫 번째 행만 반환 (없으면 None, 나머지 무시)
    pub fn fetch_optional<T: FromRow>(self) -> FsqlResult<Option<T>> {
        let mut rows = self.stream(|row| T::from_row(row))?;
        rows.next().transpose()
    }

    /// 첫 번째 행의 첫 컬럼
    pub fn fetch_scalar<T: FromValue>(self) -> FsqlResult<T> {
        let mut rows = self.stream(|row| row.get::<T>(0))?;
        rows.next().ok_or(FsqlError::NoRows)?
    }
}

/// Execute Builder: INSERT/UPDATE/DELETE
pub struct Execute<'a, K, P> {
    fsql: &'a FunctionalSql<K, P>,
    sql: String,
    params: Vec<SqlValue>,
    named_params: Vec<NamedParam>,
}

impl<'a, K, P> Execute<'a, K, P>
where
    K: Connection,
    P: SqlSupplier<K>,
{
    pub fn new(fsql: &'a FunctionalSql<K, P>, sql: impl Into<String>) -> Self {
        Self {
            fsql,
            sql: sql.into(),
            params: Vec::new(),
            named_params: Vec::new(),
        }
    }

    pub fn bind<V: IntoParam>(mut self, value: V) -> Self {
        self.params.push(value.into_param());
        self
    }

    pub fn param<V: IntoParam>(mut self, name: &str, value: V) -> Self {
        self.named_params.push(NamedParam {
            name: name.to_string(),
            value: value.into_param(),
        });
        self
    }

    /// INSERT/UPDATE/DELETE 실행 → 영향받은 행 수
    pub fn run(self) -> FsqlResult<u64> {
        match resolve(&self.params, &self.named_params, "Execute::run")? {
            Binding::Plain => self.fsql.parameter_update(&self.sql, &[]),
            Binding::Positional(params) => self.fsql.parameter_update(&self.sql, &params),
            Binding::Named(params) => self.fsql.named_parameter_update(&self.sql, params),
        }
    }
}

// FunctionalSql에 Query Builder 메서드 추가
impl<K, P> FunctionalSql<K, P>
where
    K: Connection,
    P: SqlSupplier<K>,
{
    /// SELECT 쿼리
    pub fn sql(&self, sql: impl Into<String>) -> Query<'_, K, P> {
        Query::new(self, sql)
    }

    /// INSERT/UPDATE/DELETE: 영향받은 행 수 반환
    pub fn update(&self, sql: impl Into<String>) -> Execute<'_, K, P> {
        Execute::new(self, sql)
    }
}
