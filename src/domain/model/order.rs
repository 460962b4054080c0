use crate::domain::error::DomainError;
use crate::domain::model::{
    CardId, CustomerId, Inventory, LineItem, Money, OrderId, OrderStatus, OrderTotals,
    PaymentMethod, ShippingDetails, StockMovement,
};
use chrono::{DateTime, Utc};

/// 注文集約
/// カート（チェックアウト前）と確定済み注文の両方を表し、明細・金額・ライフサイクルを管理する
#[derive(Debug, Clone)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    status: OrderStatus,
    line_items: Vec<LineItem>,
    shipping: Option<ShippingDetails>,
    payment_method: Option<PaymentMethod>,
    transaction_ref: Option<String>,
    totals: OrderTotals,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
}

/// データベースから注文を再構築するための値
/// 金額は保存値を使わず明細と値引きから再計算する
#[derive(Debug, Clone)]
pub struct OrderParts {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub line_items: Vec<LineItem>,
    pub shipping: Option<ShippingDetails>,
    pub payment_method: Option<PaymentMethod>,
    pub transaction_ref: Option<String>,
    pub discount: Money,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// 顧客の新しいカートを作成
    pub fn new_cart(id: OrderId, customer_id: CustomerId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            customer_id,
            status: OrderStatus::Cart,
            line_items: Vec::new(),
            shipping: None,
            payment_method: None,
            transaction_ref: None,
            totals: OrderTotals::default(),
            created_at,
            paid_at: None,
            shipped_at: None,
            delivered_at: None,
        }
    }

    /// データベースから取得したデータで注文を再構築
    pub fn reconstruct(parts: OrderParts) -> Result<Self, DomainError> {
        if parts.status != OrderStatus::Cart && parts.shipping.is_none() {
            return Err(DomainError::InvalidValue(format!(
                "{}状態の注文には配送先が必要です",
                parts.status
            )));
        }
        let totals = OrderTotals::calculate(&parts.line_items, parts.discount);
        Ok(Self {
            id: parts.id,
            customer_id: parts.customer_id,
            status: parts.status,
            line_items: parts.line_items,
            shipping: parts.shipping,
            payment_method: parts.payment_method,
            transaction_ref: parts.transaction_ref,
            totals,
            created_at: parts.created_at,
            paid_at: parts.paid_at,
            shipped_at: parts.shipped_at,
            delivered_at: parts.delivered_at,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// 指定カードの明細
    pub fn line_item(&self, card_id: CardId) -> Option<&LineItem> {
        self.line_items.iter().find(|line| line.card_id() == card_id)
    }

    pub fn shipping(&self) -> Option<&ShippingDetails> {
        self.shipping.as_ref()
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn transaction_ref(&self) -> Option<&str> {
        self.transaction_ref.as_deref()
    }

    pub fn totals(&self) -> &OrderTotals {
        &self.totals
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    /// 明細の数量合計
    pub fn item_count(&self) -> u64 {
        self.line_items
            .iter()
            .map(|line| u64::from(line.quantity()))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// 合計を明細と値引きから再計算する
    /// 明細を変更するすべての操作の後に呼ばれる
    /// 明細が減って値引き前の合計を下回った値引きは、その合計までに切り詰める
    pub fn recalculate_totals(&mut self) {
        let gross = OrderTotals::calculate(&self.line_items, Money::zero()).gross();
        let discount = self.totals.discount.min(gross);
        self.totals = OrderTotals::calculate(&self.line_items, discount);
    }

    /// カードをカートに追加する
    /// 同じカードの明細が既にあれば数量を増やし、なければ現在価格で明細を作成する
    ///
    /// # Arguments
    /// * `inventory` - 追加するカードの在庫
    /// * `quantity` - 追加数量（1以上）
    ///
    /// # Returns
    /// * `Err(DomainError::InsufficientStock)` - 既存の数量と合わせて販売可能数を超える
    pub fn add_or_increment(
        &mut self,
        inventory: &Inventory,
        quantity: u32,
    ) -> Result<(), DomainError> {
        self.ensure_editable_cart()?;
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }

        let card_id = inventory.card_id();
        let already_in_cart = self.line_item(card_id).map_or(0, LineItem::quantity);
        let requested = already_in_cart
            .checked_add(quantity)
            .ok_or(DomainError::InvalidQuantity)?;
        if requested > inventory.sellable_quantity() {
            return Err(DomainError::InsufficientStock {
                available: inventory.sellable_quantity(),
            });
        }

        match self
            .line_items
            .iter_mut()
            .find(|line| line.card_id() == card_id)
        {
            Some(existing) => existing.increase_quantity(quantity)?,
            None => {
                let line = LineItem::new(card_id, quantity, inventory.current_price())?;
                self.line_items.push(line);
            }
        }

        self.recalculate_totals();
        Ok(())
    }

    /// 明細の数量を変更する
    /// 0以下を指定した場合は明細を削除する
    pub fn set_quantity(
        &mut self,
        inventory: &Inventory,
        new_quantity: i64,
    ) -> Result<Option<StockMovement>, DomainError> {
        self.ensure_editable_cart()?;
        let card_id = inventory.card_id();

        if new_quantity <= 0 {
            return self.remove_line_item(card_id);
        }

        let quantity = u32::try_from(new_quantity).map_err(|_| DomainError::InvalidQuantity)?;
        if quantity > inventory.sellable_quantity() {
            return Err(DomainError::InsufficientStock {
                available: inventory.sellable_quantity(),
            });
        }

        let line = self
            .line_items
            .iter_mut()
            .find(|line| line.card_id() == card_id)
            .ok_or(DomainError::LineItemNotFound(card_id))?;
        line.set_quantity(quantity)?;

        self.recalculate_totals();
        Ok(None)
    }

    /// 明細を削除する
    /// 在庫予約を保持している注文では、その明細の予約解放を返す
    pub fn remove_line_item(
        &mut self,
        card_id: CardId,
    ) -> Result<Option<StockMovement>, DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::OrderLocked(self.status));
        }

        let position = self
            .line_items
            .iter()
            .position(|line| line.card_id() == card_id)
            .ok_or(DomainError::LineItemNotFound(card_id))?;
        let removed = self.line_items.remove(position);

        self.recalculate_totals();

        let release = self
            .status
            .holds_reservation()
            .then(|| StockMovement::release(removed.card_id(), removed.quantity()));
        Ok(release)
    }

    /// カートを空にする
    pub fn clear(&mut self) -> Result<(), DomainError> {
        self.ensure_editable_cart()?;
        self.line_items.clear();
        self.recalculate_totals();
        Ok(())
    }

    /// 値引きを設定する
    /// 値引きは値引き前の合計を超えられない
    pub fn apply_discount(&mut self, discount: Money) -> Result<(), DomainError> {
        if !matches!(self.status, OrderStatus::Cart | OrderStatus::Pending) {
            return Err(DomainError::OrderLocked(self.status));
        }
        if discount.amount().is_sign_negative() {
            return Err(DomainError::InvalidValue("値引きは負にできません".to_string()));
        }
        if discount > self.totals.gross() {
            return Err(DomainError::Validation(format!(
                "値引き({})が注文金額({})を超えています",
                discount,
                self.totals.gross()
            )));
        }
        self.totals = OrderTotals::calculate(&self.line_items, discount);
        Ok(())
    }

    /// チェックアウト（CART → PENDING）
    /// 配送先と支払い方法を記録し、金額を再計算する。以後明細の価格は固定される
    pub fn checkout(
        &mut self,
        shipping: ShippingDetails,
        payment_method: PaymentMethod,
    ) -> Result<(), DomainError> {
        self.ensure_transition(OrderStatus::Pending)?;
        if self.line_items.is_empty() {
            return Err(DomainError::Validation("カートが空です".to_string()));
        }

        self.shipping = Some(shipping);
        self.payment_method = Some(payment_method);
        self.recalculate_totals();
        self.status = OrderStatus::Pending;
        Ok(())
    }

    /// 支払いを確定する（PENDING → PAID）
    ///
    /// 返された予約をすべて適用できなかった場合、呼び出し側はこの集約を保存してはならない
    ///
    /// # Returns
    /// * 各明細の在庫予約
    pub fn confirm_payment(
        &mut self,
        paid_at: DateTime<Utc>,
        transaction_ref: String,
    ) -> Result<Vec<StockMovement>, DomainError> {
        self.ensure_transition(OrderStatus::Paid)?;

        self.status = OrderStatus::Paid;
        self.paid_at = Some(paid_at);
        self.transaction_ref = Some(transaction_ref);

        Ok(self
            .line_items
            .iter()
            .map(|line| StockMovement::reserve(line.card_id(), line.quantity()))
            .collect())
    }

    /// 発送済みにする（PAID → SHIPPED）
    pub fn mark_shipped(&mut self, shipped_at: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_transition(OrderStatus::Shipped)?;
        self.status = OrderStatus::Shipped;
        self.shipped_at = Some(shipped_at);
        Ok(())
    }

    /// 配達完了にする（SHIPPED → DELIVERED）
    ///
    /// # Returns
    /// * 各明細の予約を販売済みに変換する在庫操作
    pub fn mark_delivered(
        &mut self,
        delivered_at: DateTime<Utc>,
    ) -> Result<Vec<StockMovement>, DomainError> {
        self.ensure_transition(OrderStatus::Delivered)?;
        self.status = OrderStatus::Delivered;
        self.delivered_at = Some(delivered_at);

        Ok(self
            .line_items
            .iter()
            .map(|line| StockMovement::fulfil(line.card_id(), line.quantity()))
            .collect())
    }

    /// キャンセルする（CART / PENDING / PAID → CANCELLED）
    ///
    /// # Returns
    /// * 保持している予約の解放（PAIDのみ、CART/PENDINGは予約を持たないので空）
    pub fn cancel(&mut self) -> Result<Vec<StockMovement>, DomainError> {
        self.ensure_transition(OrderStatus::Cancelled)?;
        let releases = self.reserved_holdings();
        self.status = OrderStatus::Cancelled;
        Ok(releases)
    }

    /// この注文が保持している予約を解放する操作の一覧
    fn reserved_holdings(&self) -> Vec<StockMovement> {
        if !self.status.holds_reservation() {
            return Vec::new();
        }
        self.line_items
            .iter()
            .map(|line| StockMovement::release(line.card_id(), line.quantity()))
            .collect()
    }

    fn ensure_transition(&self, to: OrderStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        Ok(())
    }

    fn ensure_editable_cart(&self) -> Result<(), DomainError> {
        if self.status != OrderStatus::Cart {
            return Err(DomainError::OrderLocked(self.status));
        }
        Ok(())
    }
}
