use crate::domain::error::DomainError;
use crate::domain::model::{CardId, Money};

/// 在庫操作の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockOperation {
    /// 予約（支払い確定時）
    Reserve,
    /// 予約の解放（キャンセル・明細削除時）
    Release,
    /// 予約を消費して販売済みにする（配達完了時）
    Fulfil,
    /// 販売済みを予約に戻す（配達完了の取り消し）
    Unfulfil,
}

/// 注文の状態遷移が在庫台帳に要求する操作
/// 集約が返し、アプリケーションサービスが在庫リポジトリへ原子的に適用する
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockMovement {
    pub card_id: CardId,
    pub quantity: u32,
    pub operation: StockOperation,
}

impl StockMovement {
    pub fn reserve(card_id: CardId, quantity: u32) -> Self {
        Self {
            card_id,
            quantity,
            operation: StockOperation::Reserve,
        }
    }

    pub fn release(card_id: CardId, quantity: u32) -> Self {
        Self {
            card_id,
            quantity,
            operation: StockOperation::Release,
        }
    }

    pub fn fulfil(card_id: CardId, quantity: u32) -> Self {
        Self {
            card_id,
            quantity,
            operation: StockOperation::Fulfil,
        }
    }

    pub fn unfulfil(card_id: CardId, quantity: u32) -> Self {
        Self {
            card_id,
            quantity,
            operation: StockOperation::Unfulfil,
        }
    }

    /// 適用済みの操作を取り消す操作
    pub fn inverse(&self) -> Self {
        match self.operation {
            StockOperation::Reserve => Self::release(self.card_id, self.quantity),
            StockOperation::Release => Self::reserve(self.card_id, self.quantity),
            StockOperation::Fulfil => Self::unfulfil(self.card_id, self.quantity),
            StockOperation::Unfulfil => Self::fulfil(self.card_id, self.quantity),
        }
    }
}

/// 在庫台帳
/// カードと1対1で、在庫数・予約数・価格を管理する
/// 不変条件: reserved_quantity <= available_quantity
#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    card_id: CardId,
    available_quantity: u32,
    reserved_quantity: u32,
    list_price: Money,
    promotional_price: Option<Money>,
    promotion_active: bool,
    units_sold: u32,
    average_rating: f64,
}

/// 永続化層から在庫を再構築するための値
#[derive(Debug, Clone)]
pub struct InventoryParts {
    pub card_id: CardId,
    pub available_quantity: u32,
    pub reserved_quantity: u32,
    pub list_price: Money,
    pub promotional_price: Option<Money>,
    pub promotion_active: bool,
    pub units_sold: u32,
    pub average_rating: f64,
}

impl Inventory {
    /// 新しい在庫を作成
    ///
    /// # Arguments
    /// * `card_id` - カードID
    /// * `available_quantity` - 在庫数
    /// * `list_price` - 定価
    pub fn new(card_id: CardId, available_quantity: u32, list_price: Money) -> Self {
        Self {
            card_id,
            available_quantity,
            reserved_quantity: 0,
            list_price,
            promotional_price: None,
            promotion_active: false,
            units_sold: 0,
            average_rating: 0.0,
        }
    }

    /// データベースの値から在庫を再構築
    /// 不変条件を満たさない行は拒否する
    pub fn reconstruct(parts: InventoryParts) -> Result<Self, DomainError> {
        if parts.reserved_quantity > parts.available_quantity {
            return Err(DomainError::InvalidValue(format!(
                "予約数({})が在庫数({})を超えています",
                parts.reserved_quantity, parts.available_quantity
            )));
        }
        Ok(Self {
            card_id: parts.card_id,
            available_quantity: parts.available_quantity,
            reserved_quantity: parts.reserved_quantity,
            list_price: parts.list_price,
            promotional_price: parts.promotional_price,
            promotion_active: parts.promotion_active,
            units_sold: parts.units_sold,
            average_rating: parts.average_rating,
        })
    }

    pub fn card_id(&self) -> CardId {
        self.card_id
    }

    pub fn available_quantity(&self) -> u32 {
        self.available_quantity
    }

    pub fn reserved_quantity(&self) -> u32 {
        self.reserved_quantity
    }

    pub fn list_price(&self) -> Money {
        self.list_price
    }

    pub fn promotional_price(&self) -> Option<Money> {
        self.promotional_price
    }

    pub fn promotion_active(&self) -> bool {
        self.promotion_active
    }

    pub fn units_sold(&self) -> u32 {
        self.units_sold
    }

    pub fn average_rating(&self) -> f64 {
        self.average_rating
    }

    /// 販売可能数（在庫数 - 予約数）
    pub fn sellable_quantity(&self) -> u32 {
        self.available_quantity - self.reserved_quantity
    }

    /// 1つ以上販売可能か
    pub fn is_available(&self) -> bool {
        self.sellable_quantity() > 0
    }

    /// 現在の販売価格
    /// プロモーション中かつプロモーション価格が設定されていればそちらを返す
    pub fn current_price(&self) -> Money {
        match self.promotional_price {
            Some(promo) if self.promotion_active => promo,
            _ => self.list_price,
        }
    }

    /// 在庫を予約する
    ///
    /// # Returns
    /// * `Ok(())` - 予約成功
    /// * `Err(DomainError::InvalidQuantity)` - 数量が0
    /// * `Err(DomainError::InsufficientStock)` - 販売可能数を超えている
    pub fn reserve(&mut self, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        self.ensure_sellable(quantity)?;
        self.reserved_quantity += quantity;
        Ok(())
    }

    /// 予約を解放する
    /// 予約数を超える解放は予約数までに切り詰める（二重解放でもエラーにしない）
    pub fn release(&mut self, quantity: u32) {
        self.reserved_quantity -= quantity.min(self.reserved_quantity);
    }

    /// 販売を記録する
    pub fn sell(&mut self, quantity: u32) -> Result<(), DomainError> {
        self.ensure_sellable(quantity)?;
        self.available_quantity -= quantity;
        self.units_sold += quantity;
        Ok(())
    }

    /// 予約済みの数量を販売済みに変換する
    /// 途中で失敗した場合は何も変更しない
    pub fn fulfil(&mut self, quantity: u32) -> Result<(), DomainError> {
        let mut updated = self.clone();
        updated.release(quantity);
        updated.sell(quantity)?;
        *self = updated;
        Ok(())
    }

    /// 販売済みの数量を予約に戻す
    /// 在庫数と予約数を同じだけ増やすため、予約数 <= 在庫数 は保たれる
    pub fn unfulfil(&mut self, quantity: u32) -> Result<(), DomainError> {
        if quantity > self.units_sold {
            return Err(DomainError::InvalidValue(format!(
                "販売数({})を超えて取り消せません: {}",
                self.units_sold, quantity
            )));
        }
        let available = self
            .available_quantity
            .checked_add(quantity)
            .ok_or_else(|| DomainError::InvalidValue("在庫数が上限を超えます".to_string()))?;
        self.available_quantity = available;
        self.reserved_quantity += quantity;
        self.units_sold -= quantity;
        Ok(())
    }

    /// 入荷を記録する
    pub fn restock(&mut self, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        self.available_quantity = self
            .available_quantity
            .checked_add(quantity)
            .ok_or_else(|| DomainError::InvalidValue("在庫数が上限を超えます".to_string()))?;
        Ok(())
    }

    /// 価格とプロモーションを設定する
    pub fn set_pricing(
        &mut self,
        list_price: Money,
        promotional_price: Option<Money>,
        promotion_active: bool,
    ) -> Result<(), DomainError> {
        if promotion_active && promotional_price.is_none() {
            return Err(DomainError::Validation(
                "プロモーションを有効にするにはプロモーション価格が必要です".to_string(),
            ));
        }
        self.list_price = list_price;
        self.promotional_price = promotional_price;
        self.promotion_active = promotion_active;
        Ok(())
    }

    /// 平均評価を更新する（0〜5）
    pub fn update_average_rating(&mut self, rating: f64) -> Result<(), DomainError> {
        self.average_rating = Self::validate_average_rating(rating)?;
        Ok(())
    }

    /// 平均評価が0〜5の範囲にあるか検証する
    pub fn validate_average_rating(rating: f64) -> Result<f64, DomainError> {
        if !(0.0..=5.0).contains(&rating) {
            return Err(DomainError::InvalidValue(format!(
                "評価は0〜5の範囲である必要があります: {}",
                rating
            )));
        }
        Ok(rating)
    }

    /// 在庫操作を適用する
    pub fn apply(&mut self, movement: &StockMovement) -> Result<(), DomainError> {
        if movement.card_id != self.card_id {
            return Err(DomainError::InvalidValue(format!(
                "カード{}の操作をカード{}の在庫に適用できません",
                movement.card_id, self.card_id
            )));
        }
        match movement.operation {
            StockOperation::Reserve => self.reserve(movement.quantity),
            StockOperation::Release => {
                self.release(movement.quantity);
                Ok(())
            }
            StockOperation::Fulfil => self.fulfil(movement.quantity),
            StockOperation::Unfulfil => self.unfulfil(movement.quantity),
        }
    }

    fn ensure_sellable(&self, quantity: u32) -> Result<(), DomainError> {
        if quantity > self.sellable_quantity() {
            return Err(DomainError::InsufficientStock {
                available: self.sellable_quantity(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn inventory(available: u32) -> Inventory {
        Inventory::new(CardId::new(), available, Money::eur(dec!(12.00)))
    }

    #[test]
    fn test_inventory_creation() {
        let card_id = CardId::new();
        let inventory = Inventory::new(card_id, 10, Money::eur(dec!(3.50)));
        assert_eq!(inventory.card_id(), card_id);
        assert_eq!(inventory.available_quantity(), 10);
        assert_eq!(inventory.reserved_quantity(), 0);
        assert_eq!(inventory.sellable_quantity(), 10);
    }

    #[test]
    fn test_reserve_success() {
        let mut inventory = inventory(10);
        inventory.reserve(4).unwrap();
        assert_eq!(inventory.reserved_quantity(), 4);
        assert_eq!(inventory.available_quantity(), 10);
        assert_eq!(inventory.sellable_quantity(), 6);
    }

    #[test]
    fn test_reserve_insufficient_stock_leaves_reservation_untouched() {
        let mut inventory = inventory(3);
        let result = inventory.reserve(5);
        assert_eq!(result, Err(DomainError::InsufficientStock { available: 3 }));
        assert_eq!(inventory.reserved_quantity(), 0);
    }

    #[test]
    fn test_reserve_zero_is_invalid() {
        let mut inventory = inventory(3);
        assert_eq!(inventory.reserve(0), Err(DomainError::InvalidQuantity));
    }

    #[test]
    fn test_reserve_then_release_restores() {
        let mut inventory = inventory(10);
        inventory.reserve(2).unwrap();
        inventory.reserve(3).unwrap();
        inventory.release(3);
        assert_eq!(inventory.reserved_quantity(), 2);
    }

    #[test]
    fn test_release_is_clamped() {
        let mut inventory = inventory(10);
        inventory.reserve(2).unwrap();
        inventory.release(7);
        assert_eq!(inventory.reserved_quantity(), 0);
        inventory.release(1);
        assert_eq!(inventory.reserved_quantity(), 0);
    }

    #[test]
    fn test_sell_decrements_available_and_counts_units() {
        let mut inventory = inventory(5);
        inventory.sell(2).unwrap();
        assert_eq!(inventory.available_quantity(), 3);
        assert_eq!(inventory.units_sold(), 2);
    }

    #[test]
    fn test_sell_cannot_consume_reserved_stock() {
        let mut inventory = inventory(5);
        inventory.reserve(4).unwrap();
        let result = inventory.sell(2);
        assert_eq!(result, Err(DomainError::InsufficientStock { available: 1 }));
        assert_eq!(inventory.available_quantity(), 5);
        assert_eq!(inventory.units_sold(), 0);
    }

    #[test]
    fn test_fulfil_converts_reservation_into_sale() {
        let mut inventory = inventory(5);
        inventory.reserve(3).unwrap();
        inventory.fulfil(3).unwrap();
        assert_eq!(inventory.reserved_quantity(), 0);
        assert_eq!(inventory.available_quantity(), 2);
        assert_eq!(inventory.units_sold(), 3);
    }

    #[test]
    fn test_current_price_prefers_active_promotion() {
        let mut inventory = inventory(1);
        assert_eq!(inventory.current_price().amount(), dec!(12.00));

        inventory
            .set_pricing(Money::eur(dec!(12.00)), Some(Money::eur(dec!(9.99))), false)
            .unwrap();
        assert_eq!(inventory.current_price().amount(), dec!(12.00));

        inventory
            .set_pricing(Money::eur(dec!(12.00)), Some(Money::eur(dec!(9.99))), true)
            .unwrap();
        assert_eq!(inventory.current_price().amount(), dec!(9.99));
    }

    #[test]
    fn test_active_promotion_requires_price() {
        let mut inventory = inventory(1);
        assert!(inventory
            .set_pricing(Money::eur(dec!(1.00)), None, true)
            .is_err());
    }

    #[test]
    fn test_reconstruct_rejects_overreserved_row() {
        let result = Inventory::reconstruct(InventoryParts {
            card_id: CardId::new(),
            available_quantity: 1,
            reserved_quantity: 2,
            list_price: Money::zero(),
            promotional_price: None,
            promotion_active: false,
            units_sold: 0,
            average_rating: 0.0,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_rejects_other_card() {
        let mut inventory = inventory(5);
        let movement = StockMovement::reserve(CardId::new(), 1);
        assert!(inventory.apply(&movement).is_err());
        assert_eq!(inventory.reserved_quantity(), 0);
    }

    #[test]
    fn test_update_average_rating_bounds() {
        let mut inventory = inventory(1);
        assert!(inventory.update_average_rating(4.5).is_ok());
        assert!(inventory.update_average_rating(5.1).is_err());
        assert_eq!(inventory.average_rating(), 4.5);
    }

    #[test]
    fn test_unfulfil_restores_reservation() {
        let mut inventory = inventory(5);
        inventory.reserve(3).unwrap();
        inventory.fulfil(3).unwrap();

        inventory.unfulfil(3).unwrap();

        assert_eq!(inventory.available_quantity(), 5);
        assert_eq!(inventory.reserved_quantity(), 3);
        assert_eq!(inventory.units_sold(), 0);
    }

    #[test]
    fn test_unfulfil_more_than_sold_fails() {
        let mut inventory = inventory(5);
        assert!(inventory.unfulfil(1).is_err());
        assert_eq!(inventory.available_quantity(), 5);
    }

    #[test]
    fn test_inverse_movement_undoes_operation() {
        let card_id = CardId::new();
        let mut inventory = Inventory::new(card_id, 10, Money::zero());
        let original = inventory.clone();

        for movement in [
            StockMovement::reserve(card_id, 4),
            StockMovement::fulfil(card_id, 4),
        ] {
            inventory.apply(&movement).unwrap();
        }
        inventory.apply(&StockMovement::fulfil(card_id, 4).inverse()).unwrap();
        inventory.apply(&StockMovement::reserve(card_id, 4).inverse()).unwrap();

        assert_eq!(inventory, original);
    }
}
