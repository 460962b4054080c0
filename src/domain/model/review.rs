use crate::domain::error::DomainError;
use crate::domain::model::{CardId, Condition, CustomerId, ReviewId};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// 評価の最小値・最大値
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// レビュー投稿時の入力
#[derive(Debug, Clone)]
pub struct ReviewInput {
    pub rating: u8,
    pub title: String,
    pub comment: String,
    pub condition_received: Option<Condition>,
    pub recommended: bool,
}

/// カードのレビュー
/// 1ユーザーにつき1カード1件。承認されたものだけが平均評価に反映される
#[derive(Debug, Clone)]
pub struct Review {
    id: ReviewId,
    card_id: CardId,
    author_id: CustomerId,
    rating: u8,
    title: String,
    comment: String,
    condition_received: Option<Condition>,
    recommended: bool,
    approved: bool,
    up_votes: u32,
    down_votes: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// レビューの投票
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "up" | "UP" => Ok(Vote::Up),
            "down" | "DOWN" => Ok(Vote::Down),
            other => Err(DomainError::InvalidValue(format!("不明な投票: {}", other))),
        }
    }
}

impl Review {
    pub fn new(
        card_id: CardId,
        author_id: CustomerId,
        input: ReviewInput,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !(MIN_RATING..=MAX_RATING).contains(&input.rating) {
            return Err(DomainError::Validation(format!(
                "評価は{}〜{}の範囲で指定してください",
                MIN_RATING, MAX_RATING
            )));
        }
        if input.title.trim().is_empty() || input.comment.trim().is_empty() {
            return Err(DomainError::Validation(
                "タイトルとコメントは必須です".to_string(),
            ));
        }

        Ok(Self {
            id: ReviewId::new(),
            card_id,
            author_id,
            rating: input.rating,
            title: input.title,
            comment: input.comment,
            condition_received: input.condition_received,
            recommended: input.recommended,
            approved: false,
            up_votes: 0,
            down_votes: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// データベースから取得したデータでレビューを再構築
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: ReviewId,
        card_id: CardId,
        author_id: CustomerId,
        input: ReviewInput,
        approved: bool,
        up_votes: u32,
        down_votes: u32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            card_id,
            author_id,
            rating: input.rating,
            title: input.title,
            comment: input.comment,
            condition_received: input.condition_received,
            recommended: input.recommended,
            approved,
            up_votes,
            down_votes,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> ReviewId {
        self.id
    }

    pub fn card_id(&self) -> CardId {
        self.card_id
    }

    pub fn author_id(&self) -> CustomerId {
        self.author_id
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn condition_received(&self) -> Option<Condition> {
        self.condition_received
    }

    pub fn recommended(&self) -> bool {
        self.recommended
    }

    pub fn is_approved(&self) -> bool {
        self.approved
    }

    pub fn up_votes(&self) -> u32 {
        self.up_votes
    }

    pub fn down_votes(&self) -> u32 {
        self.down_votes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 有用度（高評価 - 低評価）
    pub fn helpfulness(&self) -> i64 {
        i64::from(self.up_votes) - i64::from(self.down_votes)
    }

    /// スタッフによる承認
    pub fn approve(&mut self, now: DateTime<Utc>) {
        self.approved = true;
        self.updated_at = now;
    }

    pub fn vote(&mut self, vote: Vote) {
        match vote {
            Vote::Up => self.up_votes = self.up_votes.saturating_add(1),
            Vote::Down => self.down_votes = self.down_votes.saturating_add(1),
        }
    }
}

/// 承認済みレビューの平均評価（小数点以下2桁、四捨五入）
/// 承認済みレビューがない場合は0
pub fn average_approved_rating(reviews: &[Review]) -> f64 {
    let approved: Vec<u8> = reviews
        .iter()
        .filter(|review| review.is_approved())
        .map(Review::rating)
        .collect();
    if approved.is_empty() {
        return 0.0;
    }

    let sum: Decimal = approved.iter().map(|rating| Decimal::from(*rating)).sum();
    let average = crate::domain::model::round_half_up(sum / Decimal::from(approved.len()));
    average.to_f64().unwrap_or(0.0)
}
