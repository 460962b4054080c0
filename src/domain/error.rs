use crate::domain::model::{CardId, OrderStatus};

/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// 在庫不足（販売可能数を報告する）
    #[error("Insufficient stock: only {available} unit(s) available")]
    InsufficientStock { available: u32 },
    /// 許可されていない状態遷移（例: カート状態の注文を発送しようとした）
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    /// 明細を変更できない状態の注文
    #[error("Order in state {0} can no longer be modified")]
    OrderLocked(OrderStatus),
    /// 無効な数量（例: 0以下の数量）
    #[error("Invalid quantity")]
    InvalidQuantity,
    /// 入力値の検証失敗（配送先や支払い情報など）
    #[error("Validation failed: {0}")]
    Validation(String),
    /// 無効な値
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// 指定されたカードの明細が存在しない
    #[error("No line item for card {0}")]
    LineItemNotFound(CardId),
    /// 一意であるべき値の重複（例: 同じカードへの二度目のレビュー）
    #[error("Duplicate: {0}")]
    Duplicate(String),
}
