// ドメインモデル（エンティティと値オブジェクト）

mod catalog;
mod collection;
mod inventory;
mod line_item;
mod order;
mod review;
mod totals;
mod value_objects;

pub use value_objects::{
    round_half_up, CardId, CategoryId, CollectionId, CustomerId, ExpansionId, Money, OrderId,
    OrderStatus, PaymentMethod, ReviewId, ShippingDetails, ShippingDetailsInput, DEFAULT_COUNTRY,
};

pub use catalog::{Card, CardDetails, Category, Condition, Expansion, Rarity};
pub use collection::{Collection, CollectionEntry, WISHLIST_NAME};
pub use inventory::{Inventory, InventoryParts, StockMovement, StockOperation};
pub use line_item::LineItem;
pub use order::{Order, OrderParts};
pub use review::{average_approved_rating, Review, ReviewInput, Vote, MAX_RATING, MIN_RATING};
pub use totals::{OrderTotals, FLAT_SHIPPING_COST, FREE_SHIPPING_THRESHOLD, TAX_RATE};
