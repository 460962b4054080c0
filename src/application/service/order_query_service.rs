use crate::application::ApplicationError;
use crate::domain::model::{CustomerId, Order, OrderId, OrderStatus};
use crate::domain::port::OrderRepository;
use std::sync::Arc;

/// 注文クエリサービス
/// 読み取り専用の注文操作を提供する
pub struct OrderQueryService {
    order_repository: Arc<dyn OrderRepository>,
}

impl OrderQueryService {
    /// 新しい注文クエリサービスを作成
    ///
    /// # Arguments
    /// * `order_repository` - 注文リポジトリ
    pub fn new(order_repository: Arc<dyn OrderRepository>) -> Self {
        Self { order_repository }
    }

    /// 注文IDで注文を取得
    ///
    /// # Returns
    /// * `Ok(Order)` - 注文が見つかった
    /// * `Err(ApplicationError::NotFound)` - 注文が見つからなかった
    pub async fn get_order(&self, id: OrderId) -> Result<Order, ApplicationError> {
        self.order_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("注文が見つかりません: {}", id)))
    }

    /// 顧客の注文履歴を取得（カートを除く、新しい順）
    pub async fn get_customer_orders(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, ApplicationError> {
        self.order_repository
            .find_by_customer(customer_id)
            .await
            .map_err(ApplicationError::from)
    }

    /// すべての注文を取得（カートを除く、新しい順）
    pub async fn get_all_orders(&self) -> Result<Vec<Order>, ApplicationError> {
        self.order_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }

    /// 指定されたステータス文字列の注文を取得
    ///
    /// # Arguments
    /// * `status_str` - `PAID` などのステータス文字列
    ///
    /// # Returns
    /// * `Err(ApplicationError::DomainError)` - ステータス文字列が無効
    pub async fn get_orders_by_status_string(
        &self,
        status_str: &str,
    ) -> Result<Vec<Order>, ApplicationError> {
        let status = OrderStatus::from_string(status_str)?;
        self.get_orders_by_status(status).await
    }

    /// 指定されたステータスの注文を取得（新しい順）
    pub async fn get_orders_by_status(
        &self,
        status: OrderStatus,
    ) -> Result<Vec<Order>, ApplicationError> {
        self.order_repository
            .find_by_status(status)
            .await
            .map_err(ApplicationError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::domain::port::RepositoryError;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // テスト用のモックリポジトリ
    struct MockOrderRepository {
        orders: Mutex<HashMap<OrderId, Order>>,
    }

    impl MockOrderRepository {
        fn new() -> Self {
            Self {
                orders: Mutex::new(HashMap::new()),
            }
        }

        fn add_order(&self, order: Order) {
            let mut orders = self.orders.lock().unwrap();
            orders.insert(order.id(), order);
        }
    }

    #[async_trait]
    impl OrderRepository for MockOrderRepository {
        async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
            self.add_order(order.clone());
            Ok(())
        }

        async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
            let orders = self.orders.lock().unwrap();
            Ok(orders.get(&order_id).cloned())
        }

        async fn find_cart(
            &self,
            customer_id: CustomerId,
        ) -> Result<Option<Order>, RepositoryError> {
            let orders = self.orders.lock().unwrap();
            Ok(orders
                .values()
                .find(|order| {
                    order.customer_id() == customer_id && order.status() == OrderStatus::Cart
                })
                .cloned())
        }

        async fn insert_cart(&self, cart: &Order) -> Result<(), RepositoryError> {
            self.add_order(cart.clone());
            Ok(())
        }

        async fn find_by_customer(
            &self,
            customer_id: CustomerId,
        ) -> Result<Vec<Order>, RepositoryError> {
            let orders = self.orders.lock().unwrap();
            Ok(orders
                .values()
                .filter(|order| {
                    order.customer_id() == customer_id && order.status() != OrderStatus::Cart
                })
                .cloned()
                .collect())
        }

        async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
            let orders = self.orders.lock().unwrap();
            Ok(orders.values().cloned().collect())
        }

        async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError> {
            let orders = self.orders.lock().unwrap();
            Ok(orders
                .values()
                .filter(|order| order.status() == status)
                .cloned()
                .collect())
        }

        fn next_identity(&self) -> OrderId {
            OrderId::new()
        }
    }

    #[tokio::test]
    async fn test_get_order_found() {
        let repository = Arc::new(MockOrderRepository::new());
        let service = OrderQueryService::new(repository.clone());

        let order = Order::new_cart(OrderId::new(), CustomerId::new(), Utc::now());
        repository.add_order(order.clone());

        let found = service.get_order(order.id()).await.unwrap();
        assert_eq!(found.id(), order.id());
    }

    #[tokio::test]
    async fn test_get_order_not_found() {
        let service = OrderQueryService::new(Arc::new(MockOrderRepository::new()));
        let result = service.get_order(OrderId::new()).await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_customer_history_excludes_cart() {
        let repository = Arc::new(MockOrderRepository::new());
        let service = OrderQueryService::new(repository.clone());
        let customer_id = CustomerId::new();
        repository.add_order(Order::new_cart(OrderId::new(), customer_id, Utc::now()));

        let orders = service.get_customer_orders(customer_id).await.unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_status_string() {
        let service = OrderQueryService::new(Arc::new(MockOrderRepository::new()));
        let result = service.get_orders_by_status_string("SHIPPING").await;
        assert!(matches!(
            result,
            Err(ApplicationError::DomainError(DomainError::InvalidValue(_)))
        ));
    }

    #[tokio::test]
    async fn test_orders_by_status() {
        let repository = Arc::new(MockOrderRepository::new());
        let service = OrderQueryService::new(repository.clone());
        repository.add_order(Order::new_cart(OrderId::new(), CustomerId::new(), Utc::now()));

        let carts = service.get_orders_by_status_string("CART").await.unwrap();
        assert_eq!(carts.len(), 1);
        let paid = service
            .get_orders_by_status(OrderStatus::Paid)
            .await
            .unwrap();
        assert!(paid.is_empty());
    }
}
