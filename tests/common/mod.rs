// 統合テスト用のインメモリリポジトリとテストデータ
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Barrier, Mutex};

use tcg_storefront::adapter::driver::rest_api::{AppState, Repositories};
use tcg_storefront::adapter::ServerConfig;
use tcg_storefront::domain::model::{
    Card, CardDetails, CardId, Category, Collection, CollectionId, Condition, CustomerId,
    Expansion, ExpansionId, Inventory, Money, Order, OrderId, OrderStatus, Rarity, Review,
    ReviewId, ShippingDetailsInput, StockMovement,
};
use tcg_storefront::domain::port::{
    CardFilter, CatalogRepository, CollectionRepository, InventoryRepository, OrderRepository,
    RepositoryError, ReviewRepository, StockUpdateError,
};

#[derive(Default)]
pub struct MockOrderRepository {
    orders: Mutex<HashMap<OrderId, Order>>,
    cart_lookup_gate: Option<Arc<Barrier>>,
}

impl MockOrderRepository {
    /// カートが見つからなかった呼び出しを、指定数の呼び出しが揃うまで待たせる
    /// 同時に作成しようとする状況を再現するために使う
    pub fn with_cart_lookup_gate(callers: usize) -> Self {
        Self {
            orders: Mutex::default(),
            cart_lookup_gate: Some(Arc::new(Barrier::new(callers))),
        }
    }

    pub async fn cart_count(&self, customer_id: CustomerId) -> usize {
        self.orders
            .lock()
            .await
            .values()
            .filter(|o| o.customer_id() == customer_id && o.status() == OrderStatus::Cart)
            .count()
    }

    fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        orders
    }
}

#[async_trait]
impl OrderRepository for MockOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        self.orders.lock().await.insert(order.id(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.orders.lock().await.get(&order_id).cloned())
    }

    async fn find_cart(&self, customer_id: CustomerId) -> Result<Option<Order>, RepositoryError> {
        let cart = self
            .orders
            .lock()
            .await
            .values()
            .find(|o| o.customer_id() == customer_id && o.status() == OrderStatus::Cart)
            .cloned();
        if cart.is_none() {
            if let Some(gate) = &self.cart_lookup_gate {
                gate.wait().await;
            }
        }
        Ok(cart)
    }

    // 顧客ごとのカートの一意インデックスを再現する
    async fn insert_cart(&self, cart: &Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.lock().await;
        if orders
            .values()
            .any(|o| o.customer_id() == cart.customer_id() && o.status() == OrderStatus::Cart)
        {
            return Err(RepositoryError::Conflict(format!(
                "cart already exists for {}",
                cart.customer_id()
            )));
        }
        orders.insert(cart.id(), cart.clone());
        Ok(())
    }

    async fn find_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = self
            .orders
            .lock()
            .await
            .values()
            .filter(|o| o.customer_id() == customer_id && o.status() != OrderStatus::Cart)
            .cloned()
            .collect();
        Ok(Self::newest_first(orders))
    }

    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = self
            .orders
            .lock()
            .await
            .values()
            .filter(|o| o.status() != OrderStatus::Cart)
            .cloned()
            .collect();
        Ok(Self::newest_first(orders))
    }

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError> {
        let orders = self
            .orders
            .lock()
            .await
            .values()
            .filter(|o| o.status() == status)
            .cloned()
            .collect();
        Ok(Self::newest_first(orders))
    }

    fn next_identity(&self) -> OrderId {
        OrderId::new()
    }
}

#[derive(Default)]
pub struct MockInventoryRepository {
    inventories: Mutex<HashMap<CardId, Inventory>>,
}

impl MockInventoryRepository {
    pub async fn get(&self, card_id: CardId) -> Inventory {
        self.inventories
            .lock()
            .await
            .get(&card_id)
            .cloned()
            .expect("inventory seeded")
    }
}

#[async_trait]
impl InventoryRepository for MockInventoryRepository {
    // 既存の在庫は価格だけを更新し、在庫数は在庫操作でしか変えない
    async fn save(&self, inventory: &Inventory) -> Result<(), RepositoryError> {
        let mut inventories = self.inventories.lock().await;
        match inventories.get_mut(&inventory.card_id()) {
            Some(existing) => existing
                .set_pricing(
                    inventory.list_price(),
                    inventory.promotional_price(),
                    inventory.promotion_active(),
                )
                .map_err(|e| RepositoryError::OperationFailed(e.to_string()))?,
            None => {
                inventories.insert(inventory.card_id(), inventory.clone());
            }
        }
        Ok(())
    }

    async fn update_average_rating(
        &self,
        card_id: CardId,
        rating: f64,
    ) -> Result<bool, RepositoryError> {
        match self.inventories.lock().await.get_mut(&card_id) {
            Some(inventory) => {
                inventory
                    .update_average_rating(rating)
                    .map_err(|e| RepositoryError::OperationFailed(e.to_string()))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_by_card_id(
        &self,
        card_id: CardId,
    ) -> Result<Option<Inventory>, RepositoryError> {
        Ok(self.inventories.lock().await.get(&card_id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Inventory>, RepositoryError> {
        let mut all: Vec<Inventory> = self.inventories.lock().await.values().cloned().collect();
        all.sort_by_key(|i| i.card_id());
        Ok(all)
    }

    async fn find_by_max_sellable(
        &self,
        max_sellable: u32,
    ) -> Result<Vec<Inventory>, RepositoryError> {
        let mut low: Vec<Inventory> = self
            .inventories
            .lock()
            .await
            .values()
            .filter(|i| i.sellable_quantity() <= max_sellable)
            .cloned()
            .collect();
        low.sort_by_key(|i| i.card_id());
        Ok(low)
    }

    // 複製に適用し、すべて成功した場合のみ書き戻す
    async fn apply_movements(
        &self,
        movements: &[StockMovement],
    ) -> Result<Vec<Inventory>, StockUpdateError> {
        let mut inventories = self.inventories.lock().await;
        let mut working: HashMap<CardId, Inventory> = HashMap::new();
        for movement in movements {
            if !working.contains_key(&movement.card_id) {
                let inventory = inventories
                    .get(&movement.card_id)
                    .cloned()
                    .ok_or(StockUpdateError::MissingInventory(movement.card_id))?;
                working.insert(movement.card_id, inventory);
            }
            if let Some(inventory) = working.get_mut(&movement.card_id) {
                inventory
                    .apply(movement)
                    .map_err(|source| StockUpdateError::Rejected {
                        card_id: movement.card_id,
                        source,
                    })?;
            }
        }
        for (card_id, inventory) in &working {
            inventories.insert(*card_id, inventory.clone());
        }
        Ok(working.into_values().collect())
    }
}

/// 在庫操作の失敗を差し込めるラッパー
/// `save` による在庫行の書き戻しも検出する
pub struct FaultyInventoryRepository {
    inner: Arc<MockInventoryRepository>,
    movements_fail: AtomicBool,
    saves_rejected: AtomicBool,
}

impl FaultyInventoryRepository {
    pub fn new(inner: Arc<MockInventoryRepository>) -> Self {
        Self {
            inner,
            movements_fail: AtomicBool::new(false),
            saves_rejected: AtomicBool::new(false),
        }
    }

    pub fn fail_movements(&self, fail: bool) {
        self.movements_fail.store(fail, Ordering::SeqCst);
    }

    pub fn reject_saves(&self, reject: bool) {
        self.saves_rejected.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl InventoryRepository for FaultyInventoryRepository {
    async fn save(&self, inventory: &Inventory) -> Result<(), RepositoryError> {
        if self.saves_rejected.load(Ordering::SeqCst) {
            return Err(RepositoryError::OperationFailed(
                "inventory row written back".to_string(),
            ));
        }
        self.inner.save(inventory).await
    }

    async fn update_average_rating(
        &self,
        card_id: CardId,
        rating: f64,
    ) -> Result<bool, RepositoryError> {
        self.inner.update_average_rating(card_id, rating).await
    }

    async fn find_by_card_id(
        &self,
        card_id: CardId,
    ) -> Result<Option<Inventory>, RepositoryError> {
        self.inner.find_by_card_id(card_id).await
    }

    async fn find_all(&self) -> Result<Vec<Inventory>, RepositoryError> {
        self.inner.find_all().await
    }

    async fn find_by_max_sellable(
        &self,
        max_sellable: u32,
    ) -> Result<Vec<Inventory>, RepositoryError> {
        self.inner.find_by_max_sellable(max_sellable).await
    }

    async fn apply_movements(
        &self,
        movements: &[StockMovement],
    ) -> Result<Vec<Inventory>, StockUpdateError> {
        if self.movements_fail.load(Ordering::SeqCst) {
            return Err(StockUpdateError::Repository(
                RepositoryError::ConnectionFailed("inventory database unavailable".to_string()),
            ));
        }
        self.inner.apply_movements(movements).await
    }
}

/// 注文の保存失敗を差し込めるラッパー
pub struct FaultyOrderRepository {
    inner: Arc<MockOrderRepository>,
    saves_fail: AtomicBool,
}

impl FaultyOrderRepository {
    pub fn new(inner: Arc<MockOrderRepository>) -> Self {
        Self {
            inner,
            saves_fail: AtomicBool::new(false),
        }
    }

    pub fn fail_saves(&self, fail: bool) {
        self.saves_fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderRepository for FaultyOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        if self.saves_fail.load(Ordering::SeqCst) {
            return Err(RepositoryError::ConnectionFailed(
                "order database unavailable".to_string(),
            ));
        }
        self.inner.save(order).await
    }

    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.inner.find_by_id(order_id).await
    }

    async fn find_cart(&self, customer_id: CustomerId) -> Result<Option<Order>, RepositoryError> {
        self.inner.find_cart(customer_id).await
    }

    async fn insert_cart(&self, cart: &Order) -> Result<(), RepositoryError> {
        self.inner.insert_cart(cart).await
    }

    async fn find_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        self.inner.find_by_customer(customer_id).await
    }

    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
        self.inner.find_all().await
    }

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError> {
        self.inner.find_by_status(status).await
    }

    fn next_identity(&self) -> OrderId {
        self.inner.next_identity()
    }
}

#[derive(Default)]
pub struct MockCatalogRepository {
    cards: Mutex<HashMap<CardId, Card>>,
    categories: Mutex<Vec<Category>>,
    expansions: Mutex<Vec<Expansion>>,
}

impl MockCatalogRepository {
    pub async fn popularity(&self, card_id: CardId) -> i64 {
        self.cards
            .lock()
            .await
            .get(&card_id)
            .map_or(0, Card::popularity)
    }
}

#[async_trait]
impl CatalogRepository for MockCatalogRepository {
    async fn save_card(&self, card: &Card) -> Result<(), RepositoryError> {
        let mut cards = self.cards.lock().await;
        if cards
            .values()
            .any(|c| c.code() == card.code() && c.id() != card.id())
        {
            return Err(RepositoryError::Conflict(format!(
                "カードコードが重複しています: {}",
                card.code()
            )));
        }
        cards.insert(card.id(), card.clone());
        Ok(())
    }

    async fn find_card(&self, card_id: CardId) -> Result<Option<Card>, RepositoryError> {
        Ok(self.cards.lock().await.get(&card_id).cloned())
    }

    async fn find_cards(&self, filter: &CardFilter) -> Result<Vec<Card>, RepositoryError> {
        let query = filter.query.as_ref().map(|q| q.to_lowercase());
        let mut cards: Vec<Card> = self
            .cards
            .lock()
            .await
            .values()
            .filter(|c| filter.category_id.map_or(true, |id| c.category_id() == Some(id)))
            .filter(|c| filter.expansion_id.map_or(true, |id| c.expansion_id() == id))
            .filter(|c| filter.rarity.map_or(true, |r| c.rarity() == r))
            .filter(|c| {
                query.as_ref().map_or(true, |q| {
                    c.name().to_lowercase().contains(q) || c.code().to_lowercase().contains(q)
                })
            })
            .cloned()
            .collect();
        cards.sort_by(|a, b| b.popularity().cmp(&a.popularity()));
        Ok(cards)
    }

    async fn find_cards_by_ids(&self, card_ids: &[CardId]) -> Result<Vec<Card>, RepositoryError> {
        let cards = self.cards.lock().await;
        Ok(card_ids.iter().filter_map(|id| cards.get(id).cloned()).collect())
    }

    async fn increase_popularity(
        &self,
        card_id: CardId,
        amount: i64,
    ) -> Result<bool, RepositoryError> {
        match self.cards.lock().await.get_mut(&card_id) {
            Some(card) => {
                card.increase_popularity(amount, Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn save_category(&self, category: &Category) -> Result<(), RepositoryError> {
        let mut categories = self.categories.lock().await;
        if categories.iter().any(|c| c.name == category.name) {
            return Err(RepositoryError::Conflict(category.name.clone()));
        }
        categories.push(category.clone());
        Ok(())
    }

    async fn find_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.categories.lock().await.clone())
    }

    async fn save_expansion(&self, expansion: &Expansion) -> Result<(), RepositoryError> {
        let mut expansions = self.expansions.lock().await;
        if expansions.iter().any(|e| e.code == expansion.code) {
            return Err(RepositoryError::Conflict(expansion.code.clone()));
        }
        expansions.push(expansion.clone());
        Ok(())
    }

    async fn find_expansions(&self) -> Result<Vec<Expansion>, RepositoryError> {
        Ok(self.expansions.lock().await.clone())
    }
}

#[derive(Default)]
pub struct MockReviewRepository {
    reviews: Mutex<HashMap<ReviewId, Review>>,
}

#[async_trait]
impl ReviewRepository for MockReviewRepository {
    async fn save(&self, review: &Review) -> Result<(), RepositoryError> {
        self.reviews.lock().await.insert(review.id(), review.clone());
        Ok(())
    }

    async fn find_by_id(&self, review_id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        Ok(self.reviews.lock().await.get(&review_id).cloned())
    }

    async fn find_by_card(&self, card_id: CardId) -> Result<Vec<Review>, RepositoryError> {
        let mut reviews: Vec<Review> = self
            .reviews
            .lock()
            .await
            .values()
            .filter(|r| r.card_id() == card_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(reviews)
    }

    async fn find_by_card_and_author(
        &self,
        card_id: CardId,
        author_id: CustomerId,
    ) -> Result<Option<Review>, RepositoryError> {
        Ok(self
            .reviews
            .lock()
            .await
            .values()
            .find(|r| r.card_id() == card_id && r.author_id() == author_id)
            .cloned())
    }
}

#[derive(Default)]
pub struct MockCollectionRepository {
    collections: Mutex<HashMap<CollectionId, Collection>>,
}

#[async_trait]
impl CollectionRepository for MockCollectionRepository {
    async fn save(&self, collection: &Collection) -> Result<(), RepositoryError> {
        self.collections
            .lock()
            .await
            .insert(collection.id(), collection.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        collection_id: CollectionId,
    ) -> Result<Option<Collection>, RepositoryError> {
        Ok(self.collections.lock().await.get(&collection_id).cloned())
    }

    async fn find_by_owner(
        &self,
        owner_id: CustomerId,
    ) -> Result<Vec<Collection>, RepositoryError> {
        let mut collections: Vec<Collection> = self
            .collections
            .lock()
            .await
            .values()
            .filter(|c| c.owner_id() == owner_id)
            .cloned()
            .collect();
        collections.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(collections)
    }

    async fn find_by_owner_and_name(
        &self,
        owner_id: CustomerId,
        name: &str,
    ) -> Result<Option<Collection>, RepositoryError> {
        Ok(self
            .collections
            .lock()
            .await
            .values()
            .find(|c| c.owner_id() == owner_id && c.name() == name)
            .cloned())
    }
}

/// テストで直接参照できるよう具象型のまま保持する
pub struct TestRepositories {
    pub orders: Arc<MockOrderRepository>,
    pub inventories: Arc<MockInventoryRepository>,
    pub catalog: Arc<MockCatalogRepository>,
    pub reviews: Arc<MockReviewRepository>,
    pub collections: Arc<MockCollectionRepository>,
}

impl TestRepositories {
    pub fn new() -> Self {
        Self::with_orders(MockOrderRepository::default())
    }

    pub fn with_orders(orders: MockOrderRepository) -> Self {
        Self {
            orders: Arc::new(orders),
            inventories: Arc::new(MockInventoryRepository::default()),
            catalog: Arc::new(MockCatalogRepository::default()),
            reviews: Arc::new(MockReviewRepository::default()),
            collections: Arc::new(MockCollectionRepository::default()),
        }
    }

    pub fn as_ports(&self) -> Repositories {
        Repositories {
            orders: self.orders.clone(),
            inventories: self.inventories.clone(),
            catalog: self.catalog.clone(),
            reviews: self.reviews.clone(),
            collections: self.collections.clone(),
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(self.as_ports(), ServerConfig::default())
    }

    /// カタログにカードを登録し、在庫を作成する
    pub async fn seed_card(&self, code: &str, stock: u32, price: Decimal) -> CardId {
        let details = card_details(code);
        let card = Card::new(CardId::new(), details, Utc::now()).expect("valid card");
        self.catalog.save_card(&card).await.expect("card saved");
        self.inventories
            .save(&Inventory::new(card.id(), stock, Money::eur(price)))
            .await
            .expect("inventory saved");
        card.id()
    }
}

pub fn card_details(code: &str) -> CardDetails {
    CardDetails {
        code: code.to_string(),
        name: format!("Card {}", code),
        number_in_expansion: 1,
        description: String::new(),
        primary_type: Some("Fire".to_string()),
        secondary_type: None,
        hp: Some(120),
        expansion_id: ExpansionId::new(),
        category_id: None,
        rarity: Rarity::Rare,
        condition: Condition::NM,
        holo: false,
        first_edition: false,
        language: "en".to_string(),
    }
}

pub fn expansion() -> Expansion {
    Expansion::new(
        "BS".to_string(),
        "Base Set".to_string(),
        NaiveDate::from_ymd_opt(1999, 1, 9).expect("valid date"),
        102,
        None,
    )
    .expect("valid expansion")
}

pub fn shipping_input() -> ShippingDetailsInput {
    ShippingDetailsInput {
        full_name: "Ana García".to_string(),
        email: "ana@example.com".to_string(),
        phone: "600123123".to_string(),
        address: "Calle Mayor 1".to_string(),
        city: "Madrid".to_string(),
        province: "Madrid".to_string(),
        postal_code: "28013".to_string(),
        country: None,
        notes: None,
    }
}
