use crate::application::service::admin_service::{AdminListing, DashboardStats};
use crate::application::service::catalog_service::CatalogEntry;
use crate::application::service::collection_service::CollectionSummary;
use crate::domain::model::{
    Card, Category, CollectionEntry, Expansion, Inventory, LineItem, Money, Order, OrderTotals,
    Review, ShippingDetails,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

/// 注文一覧用のレスポンスDTO
#[derive(Serialize)]
pub struct OrderSummaryResponse {
    pub order_id: String,
    pub customer_id: String,
    pub status: String,
    pub item_count: u64,
    pub total_amount: Decimal,
    pub total_currency: String,
    pub created_at: String,
}

/// 注文詳細用のレスポンスDTO
#[derive(Serialize)]
pub struct OrderDetailResponse {
    pub order_id: String,
    pub customer_id: String,
    pub status: String,
    pub line_items: Vec<LineItemResponse>,
    pub shipping: Option<ShippingResponse>,
    pub payment_method: Option<String>,
    pub transaction_ref: Option<String>,
    pub totals: TotalsResponse,
    pub created_at: String,
    pub paid_at: Option<String>,
    pub shipped_at: Option<String>,
    pub delivered_at: Option<String>,
}

/// 注文明細用のレスポンスDTO
#[derive(Serialize)]
pub struct LineItemResponse {
    pub card_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// 合計金額用のレスポンスDTO
#[derive(Serialize)]
pub struct TotalsResponse {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub free_shipping: bool,
    pub currency: String,
}

/// 配送先用のレスポンスDTO
#[derive(Serialize)]
pub struct ShippingResponse {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
    pub notes: Option<String>,
}

/// 在庫用のレスポンスDTO
#[derive(Serialize)]
pub struct InventoryResponse {
    pub card_id: String,
    pub available_quantity: u32,
    pub reserved_quantity: u32,
    pub sellable_quantity: u32,
    pub price: Decimal,
    pub list_price: Decimal,
    pub promotional_price: Option<Decimal>,
    pub promotion_active: bool,
    pub units_sold: u32,
    pub average_rating: f64,
}

/// カード用のレスポンスDTO
#[derive(Serialize)]
pub struct CardResponse {
    pub card_id: String,
    pub code: String,
    pub name: String,
    pub number_in_expansion: u32,
    pub description: String,
    pub types: Vec<String>,
    pub hp: Option<u32>,
    pub expansion_id: String,
    pub category_id: Option<String>,
    pub rarity: String,
    pub condition: String,
    pub holo: bool,
    pub first_edition: bool,
    pub language: String,
    pub popularity: i64,
    pub estimated_price: Decimal,
}

/// カタログ一覧・詳細用のレスポンスDTO
#[derive(Serialize)]
pub struct CatalogEntryResponse {
    pub card: CardResponse,
    pub price: Decimal,
    pub currency: String,
    pub sellable_quantity: u32,
    pub in_stock: bool,
}

/// レビュー用のレスポンスDTO
#[derive(Serialize)]
pub struct ReviewResponse {
    pub review_id: String,
    pub card_id: String,
    pub author_id: String,
    pub rating: u8,
    pub title: String,
    pub comment: String,
    pub condition_received: Option<String>,
    pub recommended: bool,
    pub approved: bool,
    pub up_votes: u32,
    pub down_votes: u32,
    pub helpfulness: i64,
    pub created_at: String,
}

/// コレクション収録カード用のレスポンスDTO
#[derive(Serialize)]
pub struct CollectionEntryResponse {
    pub card_id: String,
    pub quantity: u32,
    pub condition: Option<String>,
    pub notes: Option<String>,
    pub added_at: String,
}

/// コレクション用のレスポンスDTO
#[derive(Serialize)]
pub struct CollectionResponse {
    pub collection_id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub public: bool,
    pub wishlist: bool,
    pub entries: Vec<CollectionEntryResponse>,
    pub total_cards: u32,
    pub estimated_value: Decimal,
}

/// ダッシュボード用のレスポンスDTO
#[derive(Serialize)]
pub struct DashboardResponse {
    pub site_header: String,
    pub total_sales: Decimal,
    pub currency: String,
    pub awaiting_shipment: usize,
    pub recent_orders: Vec<OrderSummaryResponse>,
    pub low_stock: Vec<InventoryResponse>,
}

/// 管理画面のエンティティ一覧用のレスポンスDTO
#[derive(Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "lowercase")]
pub enum AdminListingResponse {
    Orders(Vec<OrderSummaryResponse>),
    Cards(Vec<CardResponse>),
    Inventories(Vec<InventoryResponse>),
    Categories(Vec<Category>),
    Expansions(Vec<Expansion>),
}

impl OrderSummaryResponse {
    /// ドメインオブジェクトからOrderSummaryResponseを作成
    pub fn from_order(order: &Order) -> Self {
        let total = order.totals().total;
        Self {
            order_id: order.id().to_string(),
            customer_id: order.customer_id().to_string(),
            status: order.status().to_string(),
            item_count: order.item_count(),
            total_amount: total.amount(),
            total_currency: total.currency(),
            created_at: timestamp(order.created_at()),
        }
    }
}

impl OrderDetailResponse {
    /// ドメインオブジェクトからOrderDetailResponseを作成
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id().to_string(),
            customer_id: order.customer_id().to_string(),
            status: order.status().to_string(),
            line_items: order
                .line_items()
                .iter()
                .map(LineItemResponse::from_line_item)
                .collect(),
            shipping: order.shipping().map(ShippingResponse::from_shipping),
            payment_method: order.payment_method().map(|method| method.to_string()),
            transaction_ref: order.transaction_ref().map(str::to_string),
            totals: TotalsResponse::from_totals(order.totals()),
            created_at: timestamp(order.created_at()),
            paid_at: order.paid_at().map(timestamp),
            shipped_at: order.shipped_at().map(timestamp),
            delivered_at: order.delivered_at().map(timestamp),
        }
    }
}

impl LineItemResponse {
    pub fn from_line_item(line: &LineItem) -> Self {
        Self {
            card_id: line.card_id().to_string(),
            quantity: line.quantity(),
            unit_price: line.unit_price().amount(),
            subtotal: line.subtotal().amount(),
        }
    }
}

impl TotalsResponse {
    pub fn from_totals(totals: &OrderTotals) -> Self {
        Self {
            subtotal: totals.subtotal.amount(),
            shipping_cost: totals.shipping_cost.amount(),
            tax: totals.tax.amount(),
            discount: totals.discount.amount(),
            total: totals.total.amount(),
            free_shipping: totals.has_free_shipping(),
            currency: Money::CURRENCY.to_string(),
        }
    }
}

impl ShippingResponse {
    pub fn from_shipping(shipping: &ShippingDetails) -> Self {
        Self {
            full_name: shipping.full_name().to_string(),
            email: shipping.email().to_string(),
            phone: shipping.phone().to_string(),
            address: shipping.address().to_string(),
            city: shipping.city().to_string(),
            province: shipping.province().to_string(),
            postal_code: shipping.postal_code().to_string(),
            country: shipping.country().to_string(),
            notes: shipping.notes().map(str::to_string),
        }
    }
}

impl InventoryResponse {
    /// ドメインオブジェクトからInventoryResponseを作成
    pub fn from_inventory(inventory: &Inventory) -> Self {
        Self {
            card_id: inventory.card_id().to_string(),
            available_quantity: inventory.available_quantity(),
            reserved_quantity: inventory.reserved_quantity(),
            sellable_quantity: inventory.sellable_quantity(),
            price: inventory.current_price().amount(),
            list_price: inventory.list_price().amount(),
            promotional_price: inventory.promotional_price().map(|price| price.amount()),
            promotion_active: inventory.promotion_active(),
            units_sold: inventory.units_sold(),
            average_rating: inventory.average_rating(),
        }
    }
}

impl CardResponse {
    pub fn from_card(card: &Card) -> Self {
        let details = card.details();
        Self {
            card_id: card.id().to_string(),
            code: details.code.clone(),
            name: details.name.clone(),
            number_in_expansion: details.number_in_expansion,
            description: details.description.clone(),
            types: card.types().into_iter().map(str::to_string).collect(),
            hp: details.hp,
            expansion_id: details.expansion_id.to_string(),
            category_id: details.category_id.map(|id| id.to_string()),
            rarity: details.rarity.to_string(),
            condition: details.condition.to_string(),
            holo: details.holo,
            first_edition: details.first_edition,
            language: details.language.clone(),
            popularity: card.popularity(),
            estimated_price: card.estimated_price().amount(),
        }
    }
}

impl CatalogEntryResponse {
    pub fn from_entry(entry: &CatalogEntry) -> Self {
        Self {
            card: CardResponse::from_card(&entry.card),
            price: entry.price().amount(),
            currency: Money::CURRENCY.to_string(),
            sellable_quantity: entry.sellable_quantity(),
            in_stock: entry.sellable_quantity() > 0,
        }
    }
}

impl ReviewResponse {
    pub fn from_review(review: &Review) -> Self {
        Self {
            review_id: review.id().to_string(),
            card_id: review.card_id().to_string(),
            author_id: review.author_id().to_string(),
            rating: review.rating(),
            title: review.title().to_string(),
            comment: review.comment().to_string(),
            condition_received: review.condition_received().map(|c| c.to_string()),
            recommended: review.recommended(),
            approved: review.is_approved(),
            up_votes: review.up_votes(),
            down_votes: review.down_votes(),
            helpfulness: review.helpfulness(),
            created_at: timestamp(review.created_at()),
        }
    }
}

impl CollectionEntryResponse {
    fn from_entry(entry: &CollectionEntry) -> Self {
        Self {
            card_id: entry.card_id.to_string(),
            quantity: entry.quantity,
            condition: entry.condition.map(|c| c.to_string()),
            notes: entry.notes.clone(),
            added_at: timestamp(entry.added_at),
        }
    }
}

impl CollectionResponse {
    pub fn from_summary(summary: &CollectionSummary) -> Self {
        let collection = &summary.collection;
        Self {
            collection_id: collection.id().to_string(),
            owner_id: collection.owner_id().to_string(),
            name: collection.name().to_string(),
            description: collection.description().map(str::to_string),
            public: collection.is_public(),
            wishlist: collection.is_wishlist(),
            entries: collection
                .entries()
                .iter()
                .map(CollectionEntryResponse::from_entry)
                .collect(),
            total_cards: summary.total_cards,
            estimated_value: summary.estimated_value.amount(),
        }
    }
}

impl DashboardResponse {
    /// # Arguments
    /// * `site_header` - 管理画面の見出し（設定値）
    pub fn from_stats(stats: &DashboardStats, site_header: &str) -> Self {
        Self {
            site_header: site_header.to_string(),
            total_sales: stats.total_sales.amount(),
            currency: Money::CURRENCY.to_string(),
            awaiting_shipment: stats.awaiting_shipment,
            recent_orders: stats
                .recent_orders
                .iter()
                .map(OrderSummaryResponse::from_order)
                .collect(),
            low_stock: stats
                .low_stock
                .iter()
                .map(InventoryResponse::from_inventory)
                .collect(),
        }
    }
}

impl AdminListingResponse {
    pub fn from_listing(listing: AdminListing) -> Self {
        match listing {
            AdminListing::Orders(orders) => AdminListingResponse::Orders(
                orders.iter().map(OrderSummaryResponse::from_order).collect(),
            ),
            AdminListing::Cards(cards) => {
                AdminListingResponse::Cards(cards.iter().map(CardResponse::from_card).collect())
            }
            AdminListing::Inventories(inventories) => AdminListingResponse::Inventories(
                inventories
                    .iter()
                    .map(InventoryResponse::from_inventory)
                    .collect(),
            ),
            AdminListing::Categories(categories) => AdminListingResponse::Categories(categories),
            AdminListing::Expansions(expansions) => AdminListingResponse::Expansions(expansions),
        }
    }
}
