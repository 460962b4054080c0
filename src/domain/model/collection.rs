use crate::domain::error::DomainError;
use crate::domain::model::{Card, CardId, CollectionId, Condition, CustomerId, Money};
use chrono::{DateTime, Utc};

/// ウィッシュリストとして扱うコレクション名
pub const WISHLIST_NAME: &str = "Wishlist";

/// コレクション内のカード
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionEntry {
    pub card_id: CardId,
    pub quantity: u32,
    pub condition: Option<Condition>,
    pub notes: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// ユーザーの個人コレクション
/// 名前はユーザーごとに一意、カードはコレクション内で一意
#[derive(Debug, Clone)]
pub struct Collection {
    id: CollectionId,
    owner_id: CustomerId,
    name: String,
    description: Option<String>,
    public: bool,
    entries: Vec<CollectionEntry>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Collection {
    pub fn new(
        owner_id: CustomerId,
        name: String,
        description: Option<String>,
        public: bool,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation(
                "コレクション名は必須です".to_string(),
            ));
        }
        Ok(Self {
            id: CollectionId::new(),
            owner_id,
            name,
            description,
            public,
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn wishlist(owner_id: CustomerId, now: DateTime<Utc>) -> Self {
        Self {
            id: CollectionId::new(),
            owner_id,
            name: WISHLIST_NAME.to_string(),
            description: None,
            public: false,
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// データベースから取得したデータでコレクションを再構築
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: CollectionId,
        owner_id: CustomerId,
        name: String,
        description: Option<String>,
        public: bool,
        entries: Vec<CollectionEntry>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            name,
            description,
            public,
            entries,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> CollectionId {
        self.id
    }

    pub fn owner_id(&self) -> CustomerId {
        self.owner_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn entries(&self) -> &[CollectionEntry] {
        &self.entries
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_wishlist(&self) -> bool {
        self.name == WISHLIST_NAME
    }

    /// カードを追加する。既に含まれていれば数量を増やす
    pub fn add_card(
        &mut self,
        card_id: CardId,
        quantity: u32,
        condition: Option<Condition>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }

        match self.entries.iter_mut().find(|entry| entry.card_id == card_id) {
            Some(entry) => {
                entry.quantity = entry
                    .quantity
                    .checked_add(quantity)
                    .ok_or(DomainError::InvalidQuantity)?;
                if condition.is_some() {
                    entry.condition = condition;
                }
                if notes.is_some() {
                    entry.notes = notes;
                }
            }
            None => self.entries.push(CollectionEntry {
                card_id,
                quantity,
                condition,
                notes,
                added_at: now,
            }),
        }

        self.updated_at = now;
        Ok(())
    }

    pub fn remove_card(&mut self, card_id: CardId, now: DateTime<Utc>) -> Result<(), DomainError> {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.card_id != card_id);
        if self.entries.len() == before {
            return Err(DomainError::InvalidValue(format!(
                "カード {} はコレクションに含まれていません",
                card_id
            )));
        }
        self.updated_at = now;
        Ok(())
    }

    /// カード枚数の合計
    pub fn total_cards(&self) -> u32 {
        self.entries.iter().map(|entry| entry.quantity).sum()
    }

    /// 推定価格 × 数量の合計
    /// カタログに見つからないカードは0として扱う
    pub fn estimated_value(&self, cards: &[Card]) -> Money {
        self.entries.iter().fold(Money::zero(), |acc, entry| {
            match cards.iter().find(|card| card.id() == entry.card_id) {
                Some(card) => acc.add(&card.estimated_price().multiply(entry.quantity)),
                None => acc,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::catalog::tests::details;
    use crate::domain::model::Rarity;
    use rust_decimal_macros::dec;

    fn collection() -> Collection {
        Collection::new(
            CustomerId::new(),
            "Base Set".to_string(),
            None,
            true,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_adding_existing_card_increments_quantity() {
        let mut collection = collection();
        let card_id = CardId::new();
        collection.add_card(card_id, 1, None, None, Utc::now()).unwrap();
        collection
            .add_card(card_id, 2, Some(Condition::LP), None, Utc::now())
            .unwrap();

        assert_eq!(collection.entries().len(), 1);
        assert_eq!(collection.entries()[0].condition, Some(Condition::LP));
        assert_eq!(collection.total_cards(), 3);
    }

    #[test]
    fn test_remove_missing_card_fails() {
        let mut collection = collection();
        assert!(collection.remove_card(CardId::new(), Utc::now()).is_err());
    }

    #[test]
    fn test_estimated_value() {
        let rare = Card::new(
            CardId::new(),
            details(Rarity::Rare, Condition::NM),
            Utc::now(),
        )
        .unwrap();
        let common = Card::new(
            CardId::new(),
            details(Rarity::Common, Condition::NM),
            Utc::now(),
        )
        .unwrap();

        let mut collection = collection();
        collection.add_card(rare.id(), 2, None, None, Utc::now()).unwrap();
        collection.add_card(common.id(), 3, None, None, Utc::now()).unwrap();

        assert_eq!(collection.estimated_value(&[rare, common]).amount(), dec!(4.90));
    }

    #[test]
    fn test_wishlist_name() {
        let wishlist = Collection::wishlist(CustomerId::new(), Utc::now());
        assert!(wishlist.is_wishlist());
        assert!(wishlist.entries().is_empty());
    }

    #[test]
    fn test_name_required() {
        let result = Collection::new(CustomerId::new(), "".to_string(), None, false, Utc::now());
        assert!(result.is_err());
    }
}
