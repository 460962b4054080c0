use crate::domain::port::RepositoryError;

/// データベースエラー型
/// データベース操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseError {
    /// データベース接続エラー
    ConnectionError(String),
    /// SQLクエリエラー
    QueryError(String),
    /// 一意制約違反
    DuplicateEntry(String),
    /// 保存されている値をドメインモデルに変換できない
    DecodeError(String),
    /// マイグレーションエラー
    MigrationError(String),
}

impl DatabaseError {
    /// sqlxのエラーを分類する
    ///
    /// # Arguments
    /// * `context` - 失敗した操作の説明（ログとエラーメッセージに使う）
    /// * `err` - sqlxのエラー
    pub fn from_sqlx(context: &str, err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DatabaseError::DuplicateEntry(format!("{}: {}", context, db_err.message()))
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionError(format!("{}: {}", context, err))
            }
            _ => DatabaseError::QueryError(format!("{}: {}", context, err)),
        }
    }
}

/// 保存値の変換失敗を`RepositoryError`として返す
///
/// # Arguments
/// * `what` - 変換しようとした値の名前
/// * `err` - 変換エラー
pub(crate) fn fetch_failed(what: &str, err: impl std::fmt::Display) -> RepositoryError {
    DatabaseError::DecodeError(format!("{}の解析に失敗しました: {}", what, err)).into()
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseError::ConnectionError(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::QueryError(msg) => write!(f, "Database query error: {}", msg),
            DatabaseError::DuplicateEntry(msg) => write!(f, "Duplicate entry: {}", msg),
            DatabaseError::DecodeError(msg) => write!(f, "Stored value could not be decoded: {}", msg),
            DatabaseError::MigrationError(msg) => write!(f, "Migration error: {}", msg),
        }
    }
}

impl std::error::Error for DatabaseError {}

/// DatabaseErrorからRepositoryErrorへの変換
impl From<DatabaseError> for RepositoryError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionError(msg) => RepositoryError::ConnectionFailed(msg),
            DatabaseError::QueryError(msg) => RepositoryError::OperationFailed(msg),
            DatabaseError::DuplicateEntry(msg) => RepositoryError::Conflict(msg),
            DatabaseError::DecodeError(msg) => RepositoryError::FetchFailed(msg),
            DatabaseError::MigrationError(msg) => RepositoryError::OperationFailed(msg),
        }
    }
}
