use crate::domain::error::DomainError;
use crate::domain::model::{round_half_up, CardId, CategoryId, ExpansionId, Money};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// カードのレアリティ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    RareHolo,
    RareShining,
    Ultra,
    Secret,
    Ex,
    Gx,
    V,
    Vmax,
    Promo,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "COMMON",
            Rarity::Uncommon => "UNCOMMON",
            Rarity::Rare => "RARE",
            Rarity::RareHolo => "RARE_HOLO",
            Rarity::RareShining => "RARE_SHINING",
            Rarity::Ultra => "ULTRA",
            Rarity::Secret => "SECRET",
            Rarity::Ex => "EX",
            Rarity::Gx => "GX",
            Rarity::V => "V",
            Rarity::Vmax => "VMAX",
            Rarity::Promo => "PROMO",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "COMMON" => Ok(Rarity::Common),
            "UNCOMMON" => Ok(Rarity::Uncommon),
            "RARE" => Ok(Rarity::Rare),
            "RARE_HOLO" => Ok(Rarity::RareHolo),
            "RARE_SHINING" => Ok(Rarity::RareShining),
            "ULTRA" => Ok(Rarity::Ultra),
            "SECRET" => Ok(Rarity::Secret),
            "EX" => Ok(Rarity::Ex),
            "GX" => Ok(Rarity::Gx),
            "V" => Ok(Rarity::V),
            "VMAX" => Ok(Rarity::Vmax),
            "PROMO" => Ok(Rarity::Promo),
            other => Err(DomainError::InvalidValue(format!(
                "不明なレアリティ: {}",
                other
            ))),
        }
    }

    /// 推定価格の基準額
    pub fn base_price(&self) -> Decimal {
        match self {
            Rarity::Common => dec!(0.30),
            Rarity::Uncommon => dec!(0.80),
            Rarity::Rare => dec!(2.00),
            Rarity::RareHolo => dec!(10.00),
            Rarity::RareShining => dec!(15.00),
            Rarity::Ultra => dec!(30.00),
            Rarity::Secret => dec!(40.00),
            Rarity::Ex => dec!(20.00),
            Rarity::Gx => dec!(25.00),
            Rarity::V => dec!(20.00),
            Rarity::Vmax => dec!(35.00),
            Rarity::Promo => dec!(5.00),
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// カードの状態（グレーディング）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Condition {
    /// Near Mint
    #[default]
    NM,
    /// Lightly Played
    LP,
    /// Moderately Played
    MP,
    /// Heavily Played
    HP,
    /// Damaged
    D,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::NM => "NM",
            Condition::LP => "LP",
            Condition::MP => "MP",
            Condition::HP => "HP",
            Condition::D => "D",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "NM" => Ok(Condition::NM),
            "LP" => Ok(Condition::LP),
            "MP" => Ok(Condition::MP),
            "HP" => Ok(Condition::HP),
            "D" => Ok(Condition::D),
            other => Err(DomainError::InvalidValue(format!(
                "不明なコンディション: {}",
                other
            ))),
        }
    }

    /// 推定価格に掛ける係数
    pub fn multiplier(&self) -> Decimal {
        match self {
            Condition::NM => dec!(1.0),
            Condition::LP => dec!(0.75),
            Condition::MP => dec!(0.5),
            Condition::HP => dec!(0.3),
            Condition::D => dec!(0.1),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const HOLO_MULTIPLIER: Decimal = dec!(1.3);
const FIRST_EDITION_MULTIPLIER: Decimal = dec!(2.0);

/// カード作成時の入力
#[derive(Debug, Clone)]
pub struct CardDetails {
    pub code: String,
    pub name: String,
    pub number_in_expansion: u32,
    pub description: String,
    pub primary_type: Option<String>,
    pub secondary_type: Option<String>,
    pub hp: Option<u32>,
    pub expansion_id: ExpansionId,
    pub category_id: Option<CategoryId>,
    pub rarity: Rarity,
    pub condition: Condition,
    pub holo: bool,
    pub first_edition: bool,
    pub language: String,
}

/// カード（カタログの商品）
/// 作成後に変わるのは人気度と更新日時のみ
#[derive(Debug, Clone)]
pub struct Card {
    id: CardId,
    details: CardDetails,
    popularity: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Card {
    /// 新しいカードを作成
    pub fn new(id: CardId, details: CardDetails, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if details.code.trim().is_empty() {
            return Err(DomainError::Validation("カードコードは必須です".to_string()));
        }
        if details.name.trim().is_empty() {
            return Err(DomainError::Validation("カード名は必須です".to_string()));
        }
        Ok(Self {
            id,
            details,
            popularity: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// データベースから取得したデータでカードを再構築
    pub fn reconstruct(
        id: CardId,
        details: CardDetails,
        popularity: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            details,
            popularity,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    pub fn details(&self) -> &CardDetails {
        &self.details
    }

    pub fn code(&self) -> &str {
        &self.details.code
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn rarity(&self) -> Rarity {
        self.details.rarity
    }

    pub fn condition(&self) -> Condition {
        self.details.condition
    }

    pub fn expansion_id(&self) -> ExpansionId {
        self.details.expansion_id
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.details.category_id
    }

    /// 主タイプと副タイプ
    pub fn types(&self) -> Vec<&str> {
        self.details
            .primary_type
            .iter()
            .chain(self.details.secondary_type.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn popularity(&self) -> i64 {
        self.popularity
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// レアリティ・状態・ホロ・初版から推定価格を計算する
    pub fn estimated_price(&self) -> Money {
        let mut multiplier = self.details.condition.multiplier();
        if self.details.holo {
            multiplier *= HOLO_MULTIPLIER;
        }
        if self.details.first_edition {
            multiplier *= FIRST_EDITION_MULTIPLIER;
        }
        Money::eur(round_half_up(self.details.rarity.base_price() * multiplier))
    }

    pub fn increase_popularity(&mut self, amount: i64, now: DateTime<Utc>) {
        self.popularity += amount;
        self.updated_at = now;
    }
}

/// カードのカテゴリ（名前は一意）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(
        name: String,
        description: Option<String>,
        icon: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation("カテゴリ名は必須です".to_string()));
        }
        Ok(Self {
            id: CategoryId::new(),
            name,
            description,
            icon,
            created_at: now,
        })
    }
}

/// 拡張パック（コードは一意）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expansion {
    pub id: ExpansionId,
    pub code: String,
    pub name: String,
    pub release_date: NaiveDate,
    pub total_cards: u32,
    pub active: bool,
    pub description: Option<String>,
}

impl Expansion {
    pub fn new(
        code: String,
        name: String,
        release_date: NaiveDate,
        total_cards: u32,
        description: Option<String>,
    ) -> Result<Self, DomainError> {
        if code.trim().is_empty() || code.len() > 10 {
            return Err(DomainError::Validation(
                "拡張パックのコードは1〜10文字です".to_string(),
            ));
        }
        if name.trim().is_empty() {
            return Err(DomainError::Validation("拡張パック名は必須です".to_string()));
        }
        Ok(Self {
            id: ExpansionId::new(),
            code,
            name,
            release_date,
            total_cards,
            active: true,
            description,
        })
    }
}
