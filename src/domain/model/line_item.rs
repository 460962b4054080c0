use crate::domain::error::DomainError;
use crate::domain::model::{CardId, Money};
use serde::{Deserialize, Serialize};

/// 注文明細
/// 追加時点の単価を保持し、カタログ価格の変更に追従しない
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    card_id: CardId,
    quantity: u32,
    unit_price: Money,
    subtotal: Money,
}

impl LineItem {
    /// 新しい注文明細を作成
    /// 数量は1以上である必要がある
    pub fn new(card_id: CardId, quantity: u32, unit_price: Money) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            card_id,
            quantity,
            unit_price,
            subtotal: unit_price.multiply(quantity),
        })
    }

    pub fn card_id(&self) -> CardId {
        self.card_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// 小計（単価 × 数量）
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// 数量を増加させる（同じカードを追加する場合）
    pub fn increase_quantity(&mut self, additional_quantity: u32) -> Result<(), DomainError> {
        if additional_quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        let quantity = self
            .quantity
            .checked_add(additional_quantity)
            .ok_or(DomainError::InvalidQuantity)?;
        self.set_quantity(quantity)
    }

    /// 数量を設定して小計を再計算する
    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        self.quantity = quantity;
        self.subtotal = self.unit_price.multiply(quantity);
        Ok(())
    }
}
