use crate::application::ApplicationError;
use crate::domain::model::{CardId, Inventory};
use crate::domain::port::InventoryRepository;
use std::sync::Arc;

/// 在庫クエリサービス
/// 読み取り専用の在庫操作を提供する
pub struct InventoryQueryService {
    inventory_repository: Arc<dyn InventoryRepository>,
}

impl InventoryQueryService {
    /// 新しい在庫クエリサービスを作成
    ///
    /// # Arguments
    /// * `inventory_repository` - 在庫リポジトリ
    pub fn new(inventory_repository: Arc<dyn InventoryRepository>) -> Self {
        Self {
            inventory_repository,
        }
    }

    /// カードIDで在庫を取得
    pub async fn get_inventory(&self, card_id: CardId) -> Result<Inventory, ApplicationError> {
        self.inventory_repository
            .find_by_card_id(card_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("在庫が見つかりません: {}", card_id)))
    }

    /// すべての在庫を取得
    /// カードIDの昇順で並べて返す
    pub async fn get_all_inventories(&self) -> Result<Vec<Inventory>, ApplicationError> {
        self.inventory_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }

    /// 販売可能数が閾値以下の在庫を取得
    ///
    /// # Arguments
    /// * `threshold` - 販売可能数の閾値（この数以下を在庫僅少とみなす）
    pub async fn get_low_stock_inventories(
        &self,
        threshold: u32,
    ) -> Result<Vec<Inventory>, ApplicationError> {
        self.inventory_repository
            .find_by_max_sellable(threshold)
            .await
            .map_err(ApplicationError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Money, StockMovement};
    use crate::domain::port::{RepositoryError, StockUpdateError};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    // テスト用のモックリポジトリ
    struct MockInventoryRepository {
        inventories: Mutex<Vec<Inventory>>,
    }

    #[async_trait]
    impl InventoryRepository for MockInventoryRepository {
        async fn save(&self, inventory: &Inventory) -> Result<(), RepositoryError> {
            self.inventories.lock().unwrap().push(inventory.clone());
            Ok(())
        }

        async fn update_average_rating(
            &self,
            _card_id: CardId,
            _rating: f64,
        ) -> Result<bool, RepositoryError> {
            Ok(false)
        }

        async fn find_by_card_id(
            &self,
            card_id: CardId,
        ) -> Result<Option<Inventory>, RepositoryError> {
            let inventories = self.inventories.lock().unwrap();
            Ok(inventories.iter().find(|i| i.card_id() == card_id).cloned())
        }

        async fn find_all(&self) -> Result<Vec<Inventory>, RepositoryError> {
            Ok(self.inventories.lock().unwrap().clone())
        }

        async fn find_by_max_sellable(
            &self,
            max_sellable: u32,
        ) -> Result<Vec<Inventory>, RepositoryError> {
            let inventories = self.inventories.lock().unwrap();
            Ok(inventories
                .iter()
                .filter(|i| i.sellable_quantity() <= max_sellable)
                .cloned()
                .collect())
        }

        async fn apply_movements(
            &self,
            _movements: &[StockMovement],
        ) -> Result<Vec<Inventory>, StockUpdateError> {
            Err(StockUpdateError::Repository(RepositoryError::OperationFailed(
                "読み取り専用".to_string(),
            )))
        }
    }

    fn service_with(inventories: Vec<Inventory>) -> InventoryQueryService {
        InventoryQueryService::new(Arc::new(MockInventoryRepository {
            inventories: Mutex::new(inventories),
        }))
    }

    #[tokio::test]
    async fn test_low_stock_uses_sellable_quantity() {
        let mut reserved = Inventory::new(CardId::new(), 10, Money::eur(dec!(1.00)));
        reserved.reserve(8).unwrap();
        let plenty = Inventory::new(CardId::new(), 10, Money::eur(dec!(1.00)));
        let service = service_with(vec![reserved.clone(), plenty]);

        let low = service.get_low_stock_inventories(5).await.unwrap();

        assert_eq!(low, vec![reserved]);
    }

    #[tokio::test]
    async fn test_get_inventory_not_found() {
        let service = service_with(Vec::new());
        let result = service.get_inventory(CardId::new()).await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }
}
