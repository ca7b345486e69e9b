//! SQLite 스트리밍 예제
//!
//! 실행: cargo run --example sqlite_stream

use fsql_core::backend::sqlite::SqliteDatabase;
use fsql_core::{FromRow, FsqlResult, FunctionalSql, RowExt, SqlConsumer, SqlPredicate};

#[derive(FromRow, Debug)]
struct Employee {
    id: i64,
    name: String,
    salary: f64,
}

fn main() -> FsqlResult<()> {
    fsql_core::logging::init();
    println!("=== fsql SQLite 스트리밍 예제 ===\n");

    let fsql = FunctionalSql::new(SqliteDatabase::open_in_memory()?);

    // 데이터 준비
    fsql.execute("CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT, salary REAL)")?;
    let rows = [(1i64, "Ada", 5200.0), (2, "Linus", 4100.0), (3, "Grace", 6100.0)];
    for (id, name, salary) in rows {
        fsql.update("INSERT INTO employees VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(salary)
            .run()?;
    }

    // 1. 한 행씩 lazy 하게 읽기
    println!("1. 이름 스트리밍");
    for name in fsql.stream(fsql.query("SELECT name FROM employees ORDER BY id"), |row| {
        row.get_string(0)
    })? {
        println!("   - {}", name?);
    }

    // 2. FromRow + predicate / consumer
    println!("\n2. 급여 5000 이상");
    let well_paid = |e: &Employee| -> FsqlResult<bool> { Ok(e.salary >= 5000.0) };
    let print = |e: &Employee| -> FsqlResult<()> {
        println!("   - #{} {} ({:.0})", e.id, e.name, e.salary);
        Ok(())
    };
    for employee in fsql.stream_rows::<Employee, _>(fsql.query("SELECT * FROM employees"))? {
        let employee = employee?;
        if well_paid.test(&employee)? {
            print.accept(&employee)?;
        }
    }

    // 3. 일부만 읽고 중단 (리소스는 drop 시 해제)
    println!("\n3. 첫 행만");
    let first = fsql
        .sql("SELECT * FROM employees ORDER BY salary DESC")
        .fetch_optional::<Employee>()?;
    println!("   {first:?}");

    println!("\n=== 예제 완료 ===");
    Ok(())
}
