//! Named parameter 예제
//!
//! 실행: cargo run --example named_parameters

use fsql_core::backend::sqlite::SqliteDatabase;
use fsql_core::{
    FsqlResult, FunctionalSql, NamedParameterStatement, NamedParams, NamedSql, RowCursor, RowExt,
    SqlValue, StatementOptions,
};

fn main() -> FsqlResult<()> {
    // placeholder 매핑 로그 (feature "logging")
    fsql_core::logging::init_with_level("debug");

    println!("=== fsql Named Parameter 예제 ===\n");

    // 1. 재작성 결과
    let parsed = NamedSql::parse(
        "SELECT * FROM accounts WHERE owner = :owner OR co_owner = :owner AND kind <> ':kind'",
    )?;
    println!("1. 재작성 SQL: {}", parsed.sql());
    println!("   owner → {:?}", parsed.positions("owner"));

    let db = SqliteDatabase::open_in_memory()?;
    let fsql = FunctionalSql::new(db);
    fsql.execute("CREATE TABLE accounts (id INTEGER, owner TEXT, co_owner TEXT, balance REAL)")?;
    fsql.named_parameter_update(
        "INSERT INTO accounts VALUES (:id, :owner, :co, :balance)",
        [
            ("id", SqlValue::Int64(1)),
            ("owner", SqlValue::Utf8("kim".into())),
            ("co", SqlValue::Utf8("lee".into())),
            ("balance", SqlValue::Float64(300.0)),
        ],
    )?;

    // 2. facade 로 조회 (모르는 이름은 무시)
    let mut params = NamedParams::new();
    params.insert("who".to_string(), SqlValue::Utf8("lee".into()));
    params.insert("unused".to_string(), SqlValue::Null);
    let supplier = fsql.named_parameter_query(
        "SELECT id, balance FROM accounts WHERE owner = :who OR co_owner = :who",
        params,
    )?;
    let balances = fsql
        .stream(supplier, |row| row.get_f64(1))?
        .collect_rows()?;
    println!("\n2. lee 의 계좌 잔액: {balances:?}");

    // 3. 직접 prepare 한 statement 재사용
    let mut conn = fsql.connection()?;
    let mut stmt = NamedParameterStatement::prepare(
        &mut conn,
        "SELECT COUNT(*) FROM accounts WHERE owner = :name OR co_owner = :name",
        &StatementOptions::default(),
    )?;
    for name in ["kim", "park"] {
        stmt.bind("name", name)?;
        let mut cursor = stmt.query()?;
        cursor.advance()?;
        println!("\n3. {name}: {} 건", cursor.get_i64(0)?);
    }

    println!("\n=== 예제 완료 ===");
    Ok(())
}
