use crate::application::ApplicationError;
use crate::domain::model::{
    CardId, CustomerId, Money, Order, OrderId, PaymentMethod, ShippingDetails,
    ShippingDetailsInput, StockMovement,
};
use crate::domain::port::{CatalogRepository, InventoryRepository, OrderRepository};
use crate::domain::service::{transaction_reference, verify_stock_for_checkout};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub mod admin_service;
pub mod catalog_service;
pub mod collection_service;
pub mod inventory_query_service;
pub mod order_query_service;
pub mod review_service;

/// 支払い確定時に明細ごとに加算する人気度
pub const POPULARITY_PER_PURCHASE: i64 = 10;

/// カートアプリケーションサービス
/// 顧客ごとのカートの取得・編集・チェックアウトを担当
pub struct CartApplicationService {
    order_repository: Arc<dyn OrderRepository>,
    inventory_repository: Arc<dyn InventoryRepository>,
}

impl CartApplicationService {
    /// 新しいカートアプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `order_repository` - 注文リポジトリ
    /// * `inventory_repository` - 在庫リポジトリ
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        inventory_repository: Arc<dyn InventoryRepository>,
    ) -> Self {
        Self {
            order_repository,
            inventory_repository,
        }
    }

    /// 顧客のカートを取得（なければ作成）
    pub async fn get_or_create_cart(
        &self,
        customer_id: CustomerId,
    ) -> Result<Order, ApplicationError> {
        self.order_repository
            .find_or_create_cart(customer_id)
            .await
            .map_err(ApplicationError::from)
    }

    /// カードをカートに追加
    ///
    /// # Arguments
    /// * `customer_id` - 顧客ID
    /// * `card_id` - カードID
    /// * `quantity` - 追加数量
    ///
    /// # Returns
    /// * `Ok(Order)` - 更新後のカート
    /// * `Err(ApplicationError)` - 在庫不足、カードが存在しないなど
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        customer_id: CustomerId,
        card_id: CardId,
        quantity: u32,
    ) -> Result<Order, ApplicationError> {
        let mut cart = self.get_or_create_cart(customer_id).await?;
        let inventory = self.load_inventory(card_id).await?;

        cart.add_or_increment(&inventory, quantity)?;
        self.order_repository.save(&cart).await?;

        tracing::info!(
            order_id = %cart.id(),
            items = cart.item_count(),
            "カートにカードを追加しました"
        );
        Ok(cart)
    }

    /// カート明細の数量を変更（0以下で削除）
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        customer_id: CustomerId,
        card_id: CardId,
        quantity: i64,
    ) -> Result<Order, ApplicationError> {
        let mut cart = self.get_or_create_cart(customer_id).await?;
        let inventory = self.load_inventory(card_id).await?;

        cart.set_quantity(&inventory, quantity)?;
        self.order_repository.save(&cart).await?;
        Ok(cart)
    }

    /// カート明細を削除
    pub async fn remove_from_cart(
        &self,
        customer_id: CustomerId,
        card_id: CardId,
    ) -> Result<Order, ApplicationError> {
        let mut cart = self.get_or_create_cart(customer_id).await?;
        cart.remove_line_item(card_id)?;
        self.order_repository.save(&cart).await?;
        Ok(cart)
    }

    /// カートを空にする
    pub async fn empty_cart(&self, customer_id: CustomerId) -> Result<Order, ApplicationError> {
        let mut cart = self.get_or_create_cart(customer_id).await?;
        cart.clear()?;
        self.order_repository.save(&cart).await?;
        Ok(cart)
    }

    /// チェックアウト（CART → PENDING）
    /// 明細がまだ販売可能か確認してから配送先と支払い方法を確定する
    ///
    /// # Arguments
    /// * `customer_id` - 顧客ID
    /// * `shipping` - 配送先・連絡先
    /// * `payment_method` - 支払い方法
    ///
    /// # Returns
    /// * `Ok(Order)` - PENDING状態になった注文
    /// * `Err(ApplicationError)` - カートが空、在庫不足、入力不正など
    #[tracing::instrument(skip(self, shipping))]
    pub async fn checkout(
        &self,
        customer_id: CustomerId,
        shipping: ShippingDetailsInput,
        payment_method: PaymentMethod,
    ) -> Result<Order, ApplicationError> {
        let mut cart = self.get_or_create_cart(customer_id).await?;
        let shipping = ShippingDetails::new(shipping)?;

        let mut inventories = Vec::with_capacity(cart.line_items().len());
        for line in cart.line_items() {
            if let Some(inventory) = self
                .inventory_repository
                .find_by_card_id(line.card_id())
                .await?
            {
                inventories.push(inventory);
            }
        }
        verify_stock_for_checkout(&cart, &inventories)?;

        cart.checkout(shipping, payment_method)?;
        self.order_repository.save(&cart).await?;

        tracing::info!(
            order_id = %cart.id(),
            total = %cart.totals().total,
            "チェックアウトが完了しました"
        );
        Ok(cart)
    }

    async fn load_inventory(
        &self,
        card_id: CardId,
    ) -> Result<crate::domain::model::Inventory, ApplicationError> {
        self.inventory_repository
            .find_by_card_id(card_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("カードが見つかりません: {}", card_id)))
    }
}

/// 注文アプリケーションサービス
/// チェックアウト後の注文のライフサイクルを担当し、遷移に伴う在庫操作を適用する
pub struct OrderApplicationService {
    order_repository: Arc<dyn OrderRepository>,
    inventory_repository: Arc<dyn InventoryRepository>,
    catalog_repository: Arc<dyn CatalogRepository>,
}

impl OrderApplicationService {
    /// 新しいアプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `order_repository` - 注文リポジトリ
    /// * `inventory_repository` - 在庫リポジトリ
    /// * `catalog_repository` - カタログリポジトリ（人気度の更新に使用）
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        inventory_repository: Arc<dyn InventoryRepository>,
        catalog_repository: Arc<dyn CatalogRepository>,
    ) -> Self {
        Self {
            order_repository,
            inventory_repository,
            catalog_repository,
        }
    }

    async fn load_order(&self, order_id: OrderId) -> Result<Order, ApplicationError> {
        self.order_repository
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("注文が見つかりません: {}", order_id)))
    }

    /// 支払いを確定（PENDING → PAID）
    /// 全明細の在庫をまとめて予約し、1つでも不足すれば何も変更しない
    ///
    /// # Arguments
    /// * `order_id` - 注文ID
    ///
    /// # Returns
    /// * `Ok(Order)` - PAID状態の注文（取引番号付き）
    /// * `Err(ApplicationError)` - 状態が不正、在庫不足など
    #[tracing::instrument(skip(self))]
    pub async fn confirm_payment(&self, order_id: OrderId) -> Result<Order, ApplicationError> {
        let mut order = self.load_order(order_id).await?;

        let reference = order
            .payment_method()
            .map(|method| transaction_reference(method, Uuid::new_v4()))
            .unwrap_or_default();
        let reservations = order.confirm_payment(Utc::now(), reference)?;
        self.apply_then_save(&order, &reservations).await?;

        for line in order.line_items() {
            if let Err(err) = self
                .catalog_repository
                .increase_popularity(line.card_id(), POPULARITY_PER_PURCHASE)
                .await
            {
                tracing::warn!(card_id = %line.card_id(), error = %err, "人気度の更新に失敗しました");
            }
        }

        tracing::info!(
            order_id = %order.id(),
            transaction_ref = order.transaction_ref().unwrap_or_default(),
            "支払いを確定しました"
        );
        Ok(order)
    }

    /// 状態遷移に伴う在庫操作を適用してから注文を保存する
    /// 在庫操作が失敗した場合は注文を保存せずにエラーを返す
    /// 注文の保存に失敗した場合は適用済みの在庫操作を取り消す
    async fn apply_then_save(
        &self,
        order: &Order,
        movements: &[StockMovement],
    ) -> Result<(), ApplicationError> {
        self.inventory_repository.apply_movements(movements).await?;

        if let Err(err) = self.order_repository.save(order).await {
            self.compensate(order.id(), movements).await;
            return Err(err.into());
        }
        Ok(())
    }

    async fn compensate(&self, order_id: OrderId, movements: &[StockMovement]) {
        if movements.is_empty() {
            return;
        }
        let inverses: Vec<StockMovement> =
            movements.iter().rev().map(StockMovement::inverse).collect();
        match self.inventory_repository.apply_movements(&inverses).await {
            Ok(_) => tracing::warn!(
                order_id = %order_id,
                "注文の保存に失敗したため在庫操作を取り消しました"
            ),
            Err(err) => tracing::error!(
                order_id = %order_id,
                error = %err,
                "在庫操作の取り消しに失敗しました"
            ),
        }
    }

    /// 発送済みにする（PAID → SHIPPED）
    pub async fn ship(&self, order_id: OrderId) -> Result<Order, ApplicationError> {
        let mut order = self.load_order(order_id).await?;
        order.mark_shipped(Utc::now())?;
        self.order_repository.save(&order).await?;
        tracing::info!(order_id = %order_id, "注文を発送しました");
        Ok(order)
    }

    /// 配達完了にする（SHIPPED → DELIVERED）
    /// 各明細の予約を販売済みに変換する
    pub async fn deliver(&self, order_id: OrderId) -> Result<Order, ApplicationError> {
        let mut order = self.load_order(order_id).await?;
        let fulfilments = order.mark_delivered(Utc::now())?;
        self.apply_then_save(&order, &fulfilments).await?;
        tracing::info!(order_id = %order_id, "注文の配達が完了しました");
        Ok(order)
    }

    /// 注文をキャンセル
    /// PAIDの注文は保持していた予約を解放する
    pub async fn cancel(&self, order_id: OrderId) -> Result<Order, ApplicationError> {
        let mut order = self.load_order(order_id).await?;
        let releases = order.cancel()?;
        self.apply_then_save(&order, &releases).await?;
        tracing::info!(
            order_id = %order_id,
            released_lines = releases.len(),
            "注文をキャンセルしました"
        );
        Ok(order)
    }

    /// 注文から明細を削除（スタッフ操作）
    pub async fn remove_line_item(
        &self,
        order_id: OrderId,
        card_id: CardId,
    ) -> Result<Order, ApplicationError> {
        let mut order = self.load_order(order_id).await?;
        let release = order.remove_line_item(card_id)?;
        let releases: Vec<StockMovement> = release.into_iter().collect();
        self.apply_then_save(&order, &releases).await?;
        Ok(order)
    }

    /// 値引きを設定
    pub async fn apply_discount(
        &self,
        order_id: OrderId,
        discount: Money,
    ) -> Result<Order, ApplicationError> {
        let mut order = self.load_order(order_id).await?;
        order.apply_discount(discount)?;
        self.order_repository.save(&order).await?;
        Ok(order)
    }
}
