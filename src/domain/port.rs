// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::error::DomainError;
use crate::domain::model::{
    Card, CardId, Category, CategoryId, Collection, CollectionId, CustomerId, Expansion,
    ExpansionId, Inventory, Order, OrderId, OrderStatus, Rarity, Review, ReviewId, StockMovement,
};
use async_trait::async_trait;
use chrono::Utc;

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    ConnectionFailed(String),
    /// 操作に失敗
    OperationFailed(String),
    /// データの取得に失敗
    FetchFailed(String),
    /// 一意制約違反
    Conflict(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            RepositoryError::OperationFailed(msg) => write!(f, "Operation failed: {}", msg),
            RepositoryError::FetchFailed(msg) => write!(f, "Fetch failed: {}", msg),
            RepositoryError::Conflict(msg) => write!(f, "Conflict: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

/// 在庫操作の適用エラー
/// ドメインルールによる拒否（全体がロールバックされる）と永続化の失敗を区別する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StockUpdateError {
    #[error("Stock movement for card {card_id} rejected: {source}")]
    Rejected {
        card_id: CardId,
        #[source]
        source: DomainError,
    },
    #[error("No inventory record for card {0}")]
    MissingInventory(CardId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 注文リポジトリトレイト
/// 注文集約（カートを含む）の永続化を抽象化する
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 注文を保存する（明細を含めて置き換える）
    ///
    /// # Arguments
    /// * `order` - 保存する注文
    ///
    /// # Returns
    /// * `Ok(())` - 保存成功
    /// * `Err(RepositoryError)` - 保存失敗
    async fn save(&self, order: &Order) -> Result<(), RepositoryError>;

    /// 注文IDで注文を検索する
    ///
    /// # Returns
    /// * `Ok(Some(Order))` - 注文が見つかった
    /// * `Ok(None)` - 注文が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// 顧客のカート（CART状態の注文）を検索する
    async fn find_cart(&self, customer_id: CustomerId) -> Result<Option<Order>, RepositoryError>;

    /// 新しいカートを挿入する
    ///
    /// # Returns
    /// * `Ok(())` - 挿入成功
    /// * `Err(RepositoryError::Conflict)` - 同じ顧客のカートが既に存在する
    /// * `Err(RepositoryError)` - 挿入失敗
    async fn insert_cart(&self, cart: &Order) -> Result<(), RepositoryError>;

    /// 顧客のカートを取得し、なければ作成する
    /// 同時に呼ばれても顧客ごとのカートは1つだけになる
    ///
    /// # Arguments
    /// * `customer_id` - 顧客ID
    ///
    /// # Returns
    /// * `Ok(Order)` - 既存または新規のカート
    /// * `Err(RepositoryError)` - 取得・作成失敗
    async fn find_or_create_cart(&self, customer_id: CustomerId) -> Result<Order, RepositoryError> {
        if let Some(cart) = self.find_cart(customer_id).await? {
            return Ok(cart);
        }

        let cart = Order::new_cart(self.next_identity(), customer_id, Utc::now());
        match self.insert_cart(&cart).await {
            Ok(()) => Ok(cart),
            // 同時に作成された場合は一意制約で弾かれるので、先に作成されたカートを返す
            Err(RepositoryError::Conflict(_)) => {
                self.find_cart(customer_id).await?.ok_or_else(|| {
                    RepositoryError::OperationFailed(format!(
                        "カートの作成が競合しましたが既存のカートが見つかりません: {}",
                        customer_id
                    ))
                })
            }
            Err(err) => Err(err),
        }
    }

    /// 顧客の注文履歴を取得する（カートを除く）
    /// 作成日時の降順で並べて返す
    async fn find_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, RepositoryError>;

    /// すべての注文を取得する（カートを除く）
    /// 作成日時の降順で並べて返す
    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError>;

    /// 指定されたステータスの注文を取得する
    /// 作成日時の降順で並べて返す
    ///
    /// # Arguments
    /// * `status` - フィルタリングする注文ステータス
    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError>;

    /// 新しい一意の注文IDを生成する
    fn next_identity(&self) -> OrderId;
}

/// 在庫リポジトリトレイト
/// 在庫台帳の永続化を抽象化する
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// 在庫を保存する
    /// 新しい在庫はそのまま作成し、既存の在庫は価格とプロモーションだけを更新する
    /// 在庫数・予約数・販売数は `apply_movements` でしか変更されない
    async fn save(&self, inventory: &Inventory) -> Result<(), RepositoryError>;

    /// 平均評価だけを更新する
    ///
    /// # Returns
    /// * `Ok(true)` - 更新した
    /// * `Ok(false)` - 在庫が存在しない
    /// * `Err(RepositoryError)` - 更新失敗
    async fn update_average_rating(
        &self,
        card_id: CardId,
        rating: f64,
    ) -> Result<bool, RepositoryError>;

    /// カードIDで在庫を検索する
    ///
    /// # Returns
    /// * `Ok(Some(Inventory))` - 在庫が見つかった
    /// * `Ok(None)` - 在庫が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_card_id(&self, card_id: CardId)
        -> Result<Option<Inventory>, RepositoryError>;

    /// すべての在庫を取得する
    /// カードIDの昇順で並べて返す
    async fn find_all(&self) -> Result<Vec<Inventory>, RepositoryError>;

    /// 販売可能数が指定値以下の在庫を取得する
    /// カードIDの昇順で並べて返す
    ///
    /// # Arguments
    /// * `max_sellable` - 販売可能数の上限
    async fn find_by_max_sellable(
        &self,
        max_sellable: u32,
    ) -> Result<Vec<Inventory>, RepositoryError>;

    /// 在庫操作をまとめて適用する
    /// いずれかが拒否された場合はどの在庫も変更されない
    ///
    /// # Arguments
    /// * `movements` - 適用する在庫操作
    ///
    /// # Returns
    /// * `Ok(Vec<Inventory>)` - 更新後の在庫
    /// * `Err(StockUpdateError)` - 拒否または永続化失敗
    async fn apply_movements(
        &self,
        movements: &[StockMovement],
    ) -> Result<Vec<Inventory>, StockUpdateError>;
}

/// カードの並び順
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardSort {
    #[default]
    Popularity,
    Price,
    Name,
}

impl CardSort {
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "popularity" => Ok(CardSort::Popularity),
            "price" => Ok(CardSort::Price),
            "name" => Ok(CardSort::Name),
            other => Err(DomainError::InvalidValue(format!(
                "不明な並び順: {}",
                other
            ))),
        }
    }
}

/// カード検索条件
#[derive(Debug, Clone, Default)]
pub struct CardFilter {
    pub category_id: Option<CategoryId>,
    pub expansion_id: Option<ExpansionId>,
    pub rarity: Option<Rarity>,
    /// 名前またはコードの部分一致
    pub query: Option<String>,
}

/// カタログリポジトリトレイト
/// カード・カテゴリ・拡張パックの永続化を抽象化する
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// カードを保存する（コードが重複する場合は `Conflict`）
    async fn save_card(&self, card: &Card) -> Result<(), RepositoryError>;

    async fn find_card(&self, card_id: CardId) -> Result<Option<Card>, RepositoryError>;

    /// 条件に合うカードを人気度の降順で取得する
    async fn find_cards(&self, filter: &CardFilter) -> Result<Vec<Card>, RepositoryError>;

    async fn find_cards_by_ids(&self, card_ids: &[CardId]) -> Result<Vec<Card>, RepositoryError>;

    /// 人気度を加算する
    ///
    /// # Returns
    /// * `Ok(false)` - カードが存在しない
    async fn increase_popularity(
        &self,
        card_id: CardId,
        amount: i64,
    ) -> Result<bool, RepositoryError>;

    async fn save_category(&self, category: &Category) -> Result<(), RepositoryError>;

    async fn find_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    async fn save_expansion(&self, expansion: &Expansion) -> Result<(), RepositoryError>;

    async fn find_expansions(&self) -> Result<Vec<Expansion>, RepositoryError>;
}

/// レビューリポジトリトレイト
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// レビューを保存する（同じカード・ユーザーの組が既にある場合は `Conflict`）
    async fn save(&self, review: &Review) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, review_id: ReviewId) -> Result<Option<Review>, RepositoryError>;

    /// カードのレビューを作成日時の降順で取得する
    async fn find_by_card(&self, card_id: CardId) -> Result<Vec<Review>, RepositoryError>;

    async fn find_by_card_and_author(
        &self,
        card_id: CardId,
        author_id: CustomerId,
    ) -> Result<Option<Review>, RepositoryError>;
}

/// コレクションリポジトリトレイト
#[async_trait]
pub trait CollectionRepository: Send + Sync {
    /// コレクションを保存する（エントリを含めて置き換える）
    async fn save(&self, collection: &Collection) -> Result<(), RepositoryError>;

    async fn find_by_id(
        &self,
        collection_id: CollectionId,
    ) -> Result<Option<Collection>, RepositoryError>;

    /// ユーザーのコレクションを作成日時の降順で取得する
    async fn find_by_owner(&self, owner_id: CustomerId)
        -> Result<Vec<Collection>, RepositoryError>;

    async fn find_by_owner_and_name(
        &self,
        owner_id: CustomerId,
        name: &str,
    ) -> Result<Option<Collection>, RepositoryError>;
}
