use crate::application::service::catalog_service::NewCard;
use crate::domain::error::DomainError;
use crate::domain::model::{
    CardDetails, CategoryId, Condition, ExpansionId, Money, PaymentMethod, Rarity, ReviewInput,
    ShippingDetailsInput,
};
use crate::domain::port::{CardFilter, CardSort};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_quantity() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

fn parse_condition(value: Option<&str>) -> Result<Option<Condition>, DomainError> {
    value.map(Condition::from_string).transpose()
}

/// カート追加用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct AddCartItemRequest {
    pub card_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// カート数量変更用のリクエストDTO
/// 0以下は明細の削除として扱う
#[derive(Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i64,
}

/// チェックアウト用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: Option<String>,
    pub notes: Option<String>,
    pub payment_method: String,
}

impl CheckoutRequest {
    /// 配送先入力と支払い方法に分解する
    pub fn into_parts(self) -> Result<(ShippingDetailsInput, PaymentMethod), DomainError> {
        let payment_method = PaymentMethod::from_string(&self.payment_method)?;
        let shipping = ShippingDetailsInput {
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            city: self.city,
            province: self.province,
            postal_code: self.postal_code,
            country: self.country,
            notes: self.notes,
        };
        Ok((shipping, payment_method))
    }
}

/// 値引き設定用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct DiscountRequest {
    pub amount: Decimal,
}

/// カード登録用のリクエストDTO（在庫を同時に作成する）
#[derive(Serialize, Deserialize)]
pub struct CreateCardRequest {
    pub code: String,
    pub name: String,
    pub number_in_expansion: u32,
    #[serde(default)]
    pub description: String,
    pub primary_type: Option<String>,
    pub secondary_type: Option<String>,
    pub hp: Option<u32>,
    pub expansion_id: Uuid,
    pub category_id: Option<Uuid>,
    pub rarity: String,
    pub condition: Option<String>,
    #[serde(default)]
    pub holo: bool,
    #[serde(default)]
    pub first_edition: bool,
    #[serde(default = "default_language")]
    pub language: String,
    pub stock: u32,
    pub list_price: Decimal,
    pub promotional_price: Option<Decimal>,
    #[serde(default)]
    pub promotion_active: bool,
}

impl CreateCardRequest {
    pub fn into_new_card(self) -> Result<NewCard, DomainError> {
        let details = CardDetails {
            code: self.code,
            name: self.name,
            number_in_expansion: self.number_in_expansion,
            description: self.description,
            primary_type: self.primary_type,
            secondary_type: self.secondary_type,
            hp: self.hp,
            expansion_id: ExpansionId::from_uuid(self.expansion_id),
            category_id: self.category_id.map(CategoryId::from_uuid),
            rarity: Rarity::from_string(&self.rarity)?,
            condition: parse_condition(self.condition.as_deref())?.unwrap_or_default(),
            holo: self.holo,
            first_edition: self.first_edition,
            language: self.language,
        };

        Ok(NewCard {
            details,
            stock: self.stock,
            list_price: Money::non_negative(self.list_price)?,
            promotional_price: self.promotional_price.map(Money::non_negative).transpose()?,
            promotion_active: self.promotion_active,
        })
    }
}

/// カテゴリ登録用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// 拡張パック登録用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreateExpansionRequest {
    pub code: String,
    pub name: String,
    pub release_date: NaiveDate,
    pub total_cards: u32,
    pub description: Option<String>,
}

/// カード一覧取得用のクエリパラメータ
#[derive(Deserialize, Default)]
pub struct CardQueryParams {
    pub category: Option<Uuid>,
    pub expansion: Option<Uuid>,
    pub rarity: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
}

impl CardQueryParams {
    /// 検索条件と並び順に変換する
    pub fn into_filter(self) -> Result<(CardFilter, CardSort), DomainError> {
        let sort = self
            .sort
            .as_deref()
            .map(CardSort::from_string)
            .transpose()?
            .unwrap_or_default();
        let filter = CardFilter {
            category_id: self.category.map(CategoryId::from_uuid),
            expansion_id: self.expansion.map(ExpansionId::from_uuid),
            rarity: self.rarity.as_deref().map(Rarity::from_string).transpose()?,
            query: self.q,
        };
        Ok((filter, sort))
    }
}

/// レビュー投稿用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct SubmitReviewRequest {
    pub author_id: Uuid,
    pub rating: u8,
    pub title: String,
    pub comment: String,
    pub condition_received: Option<String>,
    #[serde(default = "default_true")]
    pub recommended: bool,
}

impl SubmitReviewRequest {
    pub fn into_input(self) -> Result<ReviewInput, DomainError> {
        Ok(ReviewInput {
            rating: self.rating,
            title: self.title,
            comment: self.comment,
            condition_received: parse_condition(self.condition_received.as_deref())?,
            recommended: self.recommended,
        })
    }
}

/// レビュー一覧取得用のクエリパラメータ
#[derive(Deserialize)]
pub struct ReviewQueryParams {
    /// 承認待ちのレビューも含める（スタッフ用）
    #[serde(default)]
    pub include_pending: bool,
}

/// レビュー投票用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct VoteRequest {
    pub vote: String,
}

/// コレクション作成用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub public: bool,
}

/// コレクションへのカード追加用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct AddCollectionCardRequest {
    pub card_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub condition: Option<String>,
    pub notes: Option<String>,
}

impl AddCollectionCardRequest {
    pub fn condition(&self) -> Result<Option<Condition>, DomainError> {
        parse_condition(self.condition.as_deref())
    }
}

/// ウィッシュリスト追加用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct WishlistRequest {
    pub card_id: Uuid,
}

/// 注文一覧取得用のクエリパラメータ
#[derive(Deserialize)]
pub struct OrdersQueryParams {
    pub status: Option<String>,
}

/// 在庫一覧取得用のクエリパラメータ
#[derive(Deserialize)]
pub struct InventoryQueryParams {
    pub max_sellable: Option<u32>,
}
