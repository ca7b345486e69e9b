//! Statement options
//!
//! 모든 Statement 생성 시 전달되는 옵션. 기본값은 forward-only / read-only
//! 커서이며, timeout 과 row 제한은 드라이버가 적용하는 pass-through 설정.
//!
//! 환경 변수 또는 JSON 파일에서 로드할 수 있다.

use crate::error::{FsqlError, FsqlResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const ENV_QUERY_TIMEOUT_SECS: &str = "FSQL_QUERY_TIMEOUT_SECS";
pub const ENV_FETCH_SIZE: &str = "FSQL_FETCH_SIZE";
pub const ENV_MAX_ROWS: &str = "FSQL_MAX_ROWS";

/// Cursor scrollability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSetType {
    #[default]
    ForwardOnly,
    ScrollInsensitive,
    ScrollSensitive,
}

/// Whether rows may be updated through the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concurrency {
    #[default]
    ReadOnly,
    Updatable,
}

/// Whether cursors survive a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Holdability {
    HoldCursorsOverCommit,
    #[default]
    CloseCursorsAtCommit,
}

/// Options applied to each statement the facade creates
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementOptions {
    pub result_set_type: ResultSetType,
    pub concurrency: Concurrency,
    pub holdability: Holdability,
    /// 쿼리 timeout (초). `None` 이면 드라이버 기본값
    pub query_timeout_secs: Option<u64>,
    /// 드라이버에 전달되는 fetch 힌트
    pub fetch_size: Option<u32>,
    /// 커서가 돌려줄 최대 row 수
    pub max_rows: Option<u64>,
}

impl StatementOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result_set_type(mut self, result_set_type: ResultSetType) -> Self {
        self.result_set_type = result_set_type;
        self
    }

    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_holdability(mut self, holdability: Holdability) -> Self {
        self.holdability = holdability;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn with_fetch_size(mut self, fetch_size: u32) -> Self {
        self.fetch_size = Some(fetch_size);
        self
    }

    pub fn with_max_rows(mut self, max_rows: u64) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_secs.map(Duration::from_secs)
    }

    /// forward-only + read-only 커서 여부
    pub fn is_forward_only_read(&self) -> bool {
        self.result_set_type == ResultSetType::ForwardOnly
            && self.concurrency == Concurrency::ReadOnly
    }

    /// 기본값에 환경 변수를 적용
    pub fn from_env() -> FsqlResult<Self> {
        let mut options = Self::default();
        options.apply_env()?;
        Ok(options)
    }

    /// 환경 변수에서 로드 (설정된 값만 덮어씀)
    pub fn apply_env(&mut self) -> FsqlResult<()> {
        if let Some(secs) = read_env::<u64>(ENV_QUERY_TIMEOUT_SECS)? {
            self.query_timeout_secs = Some(secs);
        }
        if let Some(size) = read_env::<u32>(ENV_FETCH_SIZE)? {
            self.fetch_size = Some(size);
        }
        if let Some(rows) = read_env::<u64>(ENV_MAX_ROWS)? {
            self.max_rows = Some(rows);
        }
        Ok(())
    }

    /// 파일에서 로드
    pub fn load_from_file(path: impl AsRef<Path>) -> FsqlResult<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// 파일에 저장
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> FsqlResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;

        // 디렉토리 생성
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, json)?;
        Ok(())
    }
}

fn read_env<T: std::str::FromStr>(name: &str) -> FsqlResult<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| FsqlError::InvalidOperation {
                message: format!("cannot parse '{raw}'"),
                context: name.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
