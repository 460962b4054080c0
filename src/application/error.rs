use crate::domain::error::DomainError;
use crate::domain::port::{RepositoryError, StockUpdateError};

/// ユースケース実行時のエラー
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    /// ビジネスルール違反（在庫不足、不正な状態遷移など）
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
    /// 永続化の失敗
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
    /// 注文・カード・在庫などが存在しない
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ApplicationError {
    /// 見つからなかった対象と識別子からエラーを作る
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        ApplicationError::NotFound(format!("{}が見つかりません: {}", entity, id))
    }
}

/// 在庫更新の失敗を呼び出し側の言葉に変換する
/// 拒否された移動は在庫不足などのドメインエラーとして扱う
impl From<StockUpdateError> for ApplicationError {
    fn from(err: StockUpdateError) -> Self {
        match err {
            StockUpdateError::Rejected { source, .. } => ApplicationError::DomainError(source),
            StockUpdateError::MissingInventory(card_id) => {
                ApplicationError::not_found("在庫", card_id)
            }
            StockUpdateError::Repository(err) => ApplicationError::RepositoryError(err),
        }
    }
}
