use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{Card, Category, Expansion, Inventory, Money, Order, OrderStatus};
use crate::domain::port::{CardFilter, CatalogRepository, InventoryRepository, OrderRepository};
use std::sync::Arc;

/// ダッシュボードに表示する直近の注文数
pub const RECENT_ORDER_COUNT: usize = 5;

/// スタッフダッシュボードの集計
#[derive(Debug, Clone)]
pub struct DashboardStats {
    /// 配達完了した注文の合計金額
    pub total_sales: Money,
    /// 発送待ち（PAID）の注文数
    pub awaiting_shipment: usize,
    /// 直近の注文（カートを除く）
    pub recent_orders: Vec<Order>,
    /// 販売可能数が閾値以下の在庫
    pub low_stock: Vec<Inventory>,
}

/// 管理画面で一覧表示できるエンティティの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminEntityKind {
    Orders,
    Cards,
    Inventories,
    Categories,
    Expansions,
}

impl AdminEntityKind {
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "orders" => Ok(AdminEntityKind::Orders),
            "cards" => Ok(AdminEntityKind::Cards),
            "inventories" => Ok(AdminEntityKind::Inventories),
            "categories" => Ok(AdminEntityKind::Categories),
            "expansions" => Ok(AdminEntityKind::Expansions),
            other => Err(DomainError::InvalidValue(format!(
                "不明なエンティティ種別: {}",
                other
            ))),
        }
    }
}

/// エンティティ種別ごとの一覧
#[derive(Debug, Clone)]
pub enum AdminListing {
    Orders(Vec<Order>),
    Cards(Vec<Card>),
    Inventories(Vec<Inventory>),
    Categories(Vec<Category>),
    Expansions(Vec<Expansion>),
}

/// 管理サービス
pub struct AdminService {
    order_repository: Arc<dyn OrderRepository>,
    inventory_repository: Arc<dyn InventoryRepository>,
    catalog_repository: Arc<dyn CatalogRepository>,
    low_stock_threshold: u32,
}

impl AdminService {
    /// # Arguments
    /// * `low_stock_threshold` - 在庫僅少とみなす販売可能数
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        inventory_repository: Arc<dyn InventoryRepository>,
        catalog_repository: Arc<dyn CatalogRepository>,
        low_stock_threshold: u32,
    ) -> Self {
        Self {
            order_repository,
            inventory_repository,
            catalog_repository,
            low_stock_threshold,
        }
    }

    pub async fn dashboard(&self) -> Result<DashboardStats, ApplicationError> {
        let delivered = self
            .order_repository
            .find_by_status(OrderStatus::Delivered)
            .await?;
        let total_sales = delivered
            .iter()
            .fold(Money::zero(), |acc, order| acc.add(&order.totals().total));

        let awaiting_shipment = self
            .order_repository
            .find_by_status(OrderStatus::Paid)
            .await?
            .len();

        let mut recent_orders = self.order_repository.find_all().await?;
        recent_orders.truncate(RECENT_ORDER_COUNT);

        let low_stock = self
            .inventory_repository
            .find_by_max_sellable(self.low_stock_threshold)
            .await?;

        Ok(DashboardStats {
            total_sales,
            awaiting_shipment,
            recent_orders,
            low_stock,
        })
    }

    /// 指定された種別のエンティティを一覧する
    pub async fn list_entities(
        &self,
        kind: AdminEntityKind,
    ) -> Result<AdminListing, ApplicationError> {
        let listing = match kind {
            AdminEntityKind::Orders => AdminListing::Orders(self.order_repository.find_all().await?),
            AdminEntityKind::Cards => AdminListing::Cards(
                self.catalog_repository
                    .find_cards(&CardFilter::default())
                    .await?,
            ),
            AdminEntityKind::Inventories => {
                AdminListing::Inventories(self.inventory_repository.find_all().await?)
            }
            AdminEntityKind::Categories => {
                AdminListing::Categories(self.catalog_repository.find_categories().await?)
            }
            AdminEntityKind::Expansions => {
                AdminListing::Expansions(self.catalog_repository.find_expansions().await?)
            }
        };
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_parsing() {
        assert_eq!(
            AdminEntityKind::from_string("inventories").unwrap(),
            AdminEntityKind::Inventories
        );
        assert!(AdminEntityKind::from_string("users").is_err());
    }
}
