use crate::application::ApplicationError;
use crate::domain::model::{
    Card, CardDetails, CardId, Category, Expansion, Inventory, Money,
};
use crate::domain::port::{CardFilter, CardSort, CatalogRepository, InventoryRepository};
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// カードと在庫（販売価格・販売可能数）の組
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub card: Card,
    pub inventory: Option<Inventory>,
}

impl CatalogEntry {
    /// 販売価格。在庫がなければ推定価格
    pub fn price(&self) -> Money {
        self.inventory
            .as_ref()
            .map_or_else(|| self.card.estimated_price(), Inventory::current_price)
    }

    pub fn sellable_quantity(&self) -> u32 {
        self.inventory
            .as_ref()
            .map_or(0, Inventory::sellable_quantity)
    }
}

/// 新しいカードを在庫付きで登録するための入力
#[derive(Debug, Clone)]
pub struct NewCard {
    pub details: CardDetails,
    pub stock: u32,
    pub list_price: Money,
    pub promotional_price: Option<Money>,
    pub promotion_active: bool,
}

/// カタログサービス
/// カードの一覧・詳細表示と、カタログデータの登録を担当
pub struct CatalogService {
    catalog_repository: Arc<dyn CatalogRepository>,
    inventory_repository: Arc<dyn InventoryRepository>,
}

impl CatalogService {
    pub fn new(
        catalog_repository: Arc<dyn CatalogRepository>,
        inventory_repository: Arc<dyn InventoryRepository>,
    ) -> Self {
        Self {
            catalog_repository,
            inventory_repository,
        }
    }

    /// 条件に合うカードを価格・販売可能数付きで取得
    ///
    /// # Arguments
    /// * `filter` - 検索条件
    /// * `sort` - 並び順（人気度は降順、価格と名前は昇順）
    pub async fn list_cards(
        &self,
        filter: &CardFilter,
        sort: CardSort,
    ) -> Result<Vec<CatalogEntry>, ApplicationError> {
        let cards = self.catalog_repository.find_cards(filter).await?;
        let mut inventories: HashMap<CardId, Inventory> = self
            .inventory_repository
            .find_all()
            .await?
            .into_iter()
            .map(|inventory| (inventory.card_id(), inventory))
            .collect();

        let mut entries: Vec<CatalogEntry> = cards
            .into_iter()
            .map(|card| {
                let inventory = inventories.remove(&card.id());
                CatalogEntry { card, inventory }
            })
            .collect();

        match sort {
            CardSort::Popularity => {
                entries.sort_by(|a, b| b.card.popularity().cmp(&a.card.popularity()))
            }
            CardSort::Price => entries.sort_by_key(CatalogEntry::price),
            CardSort::Name => entries.sort_by(|a, b| a.card.name().cmp(b.card.name())),
        }
        Ok(entries)
    }

    /// カード詳細を取得し、人気度を1加算する
    pub async fn view_card(&self, card_id: CardId) -> Result<CatalogEntry, ApplicationError> {
        if !self
            .catalog_repository
            .increase_popularity(card_id, 1)
            .await?
        {
            return Err(ApplicationError::NotFound(format!(
                "カードが見つかりません: {}",
                card_id
            )));
        }
        let card = self
            .catalog_repository
            .find_card(card_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("カードが見つかりません: {}", card_id)))?;
        let inventory = self.inventory_repository.find_by_card_id(card_id).await?;
        Ok(CatalogEntry { card, inventory })
    }

    /// カードと在庫を登録
    #[tracing::instrument(skip(self, new_card), fields(code = %new_card.details.code))]
    pub async fn create_card(&self, new_card: NewCard) -> Result<CatalogEntry, ApplicationError> {
        let card = Card::new(CardId::new(), new_card.details, Utc::now())?;
        let mut inventory = Inventory::new(card.id(), new_card.stock, new_card.list_price);
        inventory.set_pricing(
            new_card.list_price,
            new_card.promotional_price,
            new_card.promotion_active,
        )?;

        self.catalog_repository.save_card(&card).await?;
        self.inventory_repository.save(&inventory).await?;

        tracing::info!(card_id = %card.id(), "カードを登録しました");
        Ok(CatalogEntry {
            card,
            inventory: Some(inventory),
        })
    }

    pub async fn create_category(
        &self,
        name: String,
        description: Option<String>,
        icon: Option<String>,
    ) -> Result<Category, ApplicationError> {
        let category = Category::new(name, description, icon, Utc::now())?;
        self.catalog_repository.save_category(&category).await?;
        Ok(category)
    }

    pub async fn create_expansion(
        &self,
        code: String,
        name: String,
        release_date: NaiveDate,
        total_cards: u32,
        description: Option<String>,
    ) -> Result<Expansion, ApplicationError> {
        let expansion = Expansion::new(code, name, release_date, total_cards, description)?;
        self.catalog_repository.save_expansion(&expansion).await?;
        Ok(expansion)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, ApplicationError> {
        self.catalog_repository
            .find_categories()
            .await
            .map_err(ApplicationError::from)
    }

    pub async fn list_expansions(&self) -> Result<Vec<Expansion>, ApplicationError> {
        self.catalog_repository
            .find_expansions()
            .await
            .map_err(ApplicationError::from)
    }
}
