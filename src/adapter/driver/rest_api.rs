use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::adapter::driver::request_dto::{
    AddCartItemRequest, CheckoutRequest, DiscountRequest, InventoryQueryParams,
    UpdateCartItemRequest,
};
use crate::adapter::driver::response_dto::{
    InventoryResponse, OrderDetailResponse, OrderSummaryResponse,
};
use crate::adapter::driver::{admin_api, catalog_api};
use crate::adapter::ServerConfig;
use crate::application::service::admin_service::AdminService;
use crate::application::service::catalog_service::CatalogService;
use crate::application::service::collection_service::CollectionService;
use crate::application::service::inventory_query_service::InventoryQueryService;
use crate::application::service::order_query_service::OrderQueryService;
use crate::application::service::review_service::ReviewService;
use crate::application::service::{CartApplicationService, OrderApplicationService};
use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{CardId, CustomerId, Money, OrderId};
use crate::domain::port::{
    CatalogRepository, CollectionRepository, InventoryRepository, OrderRepository,
    RepositoryError, ReviewRepository,
};

#[derive(Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub(crate) fn api_error(status: StatusCode, code: &str, error: String) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error,
            code: code.to_string(),
        }),
    )
}

/// アプリケーションサービスが使うリポジトリ一式
#[derive(Clone)]
pub struct Repositories {
    pub orders: Arc<dyn OrderRepository>,
    pub inventories: Arc<dyn InventoryRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub collections: Arc<dyn CollectionRepository>,
}

// アプリケーションサービスと設定を含む状態
#[derive(Clone)]
pub struct AppState {
    pub cart_service: Arc<CartApplicationService>,
    pub order_service: Arc<OrderApplicationService>,
    pub order_query_service: Arc<OrderQueryService>,
    pub inventory_query_service: Arc<InventoryQueryService>,
    pub catalog_service: Arc<CatalogService>,
    pub review_service: Arc<ReviewService>,
    pub collection_service: Arc<CollectionService>,
    pub admin_service: Arc<AdminService>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// リポジトリからサービスを組み立てる
    ///
    /// # Arguments
    /// * `repositories` - リポジトリ一式
    /// * `config` - サーバー設定（起動時に読み込んだもの）
    pub fn new(repositories: Repositories, config: ServerConfig) -> Self {
        let Repositories {
            orders,
            inventories,
            catalog,
            reviews,
            collections,
        } = repositories;

        Self {
            cart_service: Arc::new(CartApplicationService::new(
                orders.clone(),
                inventories.clone(),
            )),
            order_service: Arc::new(OrderApplicationService::new(
                orders.clone(),
                inventories.clone(),
                catalog.clone(),
            )),
            order_query_service: Arc::new(OrderQueryService::new(orders.clone())),
            inventory_query_service: Arc::new(InventoryQueryService::new(inventories.clone())),
            catalog_service: Arc::new(CatalogService::new(catalog.clone(), inventories.clone())),
            review_service: Arc::new(ReviewService::new(
                reviews,
                catalog.clone(),
                inventories.clone(),
            )),
            collection_service: Arc::new(CollectionService::new(collections, catalog.clone())),
            admin_service: Arc::new(AdminService::new(
                orders,
                inventories,
                catalog,
                config.low_stock_threshold,
            )),
            config: Arc::new(config),
        }
    }
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/customers/:customer_id/cart", get(get_cart).delete(empty_cart))
        .route("/customers/:customer_id/cart/items", post(add_cart_item))
        .route(
            "/customers/:customer_id/cart/items/:card_id",
            put(update_cart_item).delete(remove_cart_item),
        )
        .route("/customers/:customer_id/cart/checkout", post(checkout))
        .route("/customers/:customer_id/orders", get(get_customer_orders))
        .route("/orders/:order_id", get(get_order_by_id))
        .route("/orders/:order_id/pay", post(pay_order))
        .route("/orders/:order_id/ship", post(ship_order))
        .route("/orders/:order_id/deliver", post(deliver_order))
        .route("/orders/:order_id/cancel", post(cancel_order))
        .route("/orders/:order_id/discount", put(apply_discount))
        .route("/orders/:order_id/items/:card_id", delete(remove_order_item))
        .route("/inventory", get(get_inventories))
        .route("/inventory/:card_id", get(get_inventory_by_card_id))
        .merge(catalog_api::routes())
        .merge(admin_api::routes())
}

// ヘルスチェックエンドポイント
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.site_title,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// カート取得エンドポイント（なければ作成）
async fn get_cart(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> ApiResult<Json<OrderDetailResponse>> {
    let cart = state
        .cart_service
        .get_or_create_cart(CustomerId::from_uuid(customer_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(OrderDetailResponse::from_order(&cart)))
}

// カートにカードを追加するエンドポイント
async fn add_cart_item(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(request): Json<AddCartItemRequest>,
) -> ApiResult<Json<OrderDetailResponse>> {
    let cart = state
        .cart_service
        .add_to_cart(
            CustomerId::from_uuid(customer_id),
            CardId::from_uuid(request.card_id),
            request.quantity,
        )
        .await
        .map_err(map_application_error)?;
    Ok(Json(OrderDetailResponse::from_order(&cart)))
}

// カート明細の数量変更エンドポイント
async fn update_cart_item(
    State(state): State<AppState>,
    Path((customer_id, card_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateCartItemRequest>,
) -> ApiResult<Json<OrderDetailResponse>> {
    let cart = state
        .cart_service
        .update_quantity(
            CustomerId::from_uuid(customer_id),
            CardId::from_uuid(card_id),
            request.quantity,
        )
        .await
        .map_err(map_application_error)?;
    Ok(Json(OrderDetailResponse::from_order(&cart)))
}

// カート明細の削除エンドポイント
async fn remove_cart_item(
    State(state): State<AppState>,
    Path((customer_id, card_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<OrderDetailResponse>> {
    let cart = state
        .cart_service
        .remove_from_cart(CustomerId::from_uuid(customer_id), CardId::from_uuid(card_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(OrderDetailResponse::from_order(&cart)))
}

// カートを空にするエンドポイント
async fn empty_cart(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> ApiResult<Json<OrderDetailResponse>> {
    let cart = state
        .cart_service
        .empty_cart(CustomerId::from_uuid(customer_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(OrderDetailResponse::from_order(&cart)))
}

// チェックアウトエンドポイント
async fn checkout(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<OrderDetailResponse>)> {
    let (shipping, payment_method) = request.into_parts().map_err(map_domain_error)?;
    let order = state
        .cart_service
        .checkout(CustomerId::from_uuid(customer_id), shipping, payment_method)
        .await
        .map_err(map_application_error)?;
    Ok((StatusCode::CREATED, Json(OrderDetailResponse::from_order(&order))))
}

// 顧客の注文履歴エンドポイント
async fn get_customer_orders(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> ApiResult<Json<Vec<OrderSummaryResponse>>> {
    let orders = state
        .order_query_service
        .get_customer_orders(CustomerId::from_uuid(customer_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(orders.iter().map(OrderSummaryResponse::from_order).collect()))
}

// 注文詳細取得エンドポイント
async fn get_order_by_id(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderDetailResponse>> {
    let order = state
        .order_query_service
        .get_order(OrderId::from_uuid(order_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(OrderDetailResponse::from_order(&order)))
}

// 支払い確定エンドポイント（決済は模擬）
async fn pay_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderDetailResponse>> {
    let order = state
        .order_service
        .confirm_payment(OrderId::from_uuid(order_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(OrderDetailResponse::from_order(&order)))
}

// 注文発送エンドポイント
async fn ship_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderDetailResponse>> {
    let order = state
        .order_service
        .ship(OrderId::from_uuid(order_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(OrderDetailResponse::from_order(&order)))
}

// 注文配達完了エンドポイント
async fn deliver_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderDetailResponse>> {
    let order = state
        .order_service
        .deliver(OrderId::from_uuid(order_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(OrderDetailResponse::from_order(&order)))
}

// 注文キャンセルエンドポイント
async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderDetailResponse>> {
    let order = state
        .order_service
        .cancel(OrderId::from_uuid(order_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(OrderDetailResponse::from_order(&order)))
}

// 値引き設定エンドポイント
async fn apply_discount(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<DiscountRequest>,
) -> ApiResult<Json<OrderDetailResponse>> {
    if request.amount < Decimal::ZERO {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_VALUE",
            "値引き額は負にできません".to_string(),
        ));
    }
    let order = state
        .order_service
        .apply_discount(OrderId::from_uuid(order_id), Money::eur(request.amount))
        .await
        .map_err(map_application_error)?;
    Ok(Json(OrderDetailResponse::from_order(&order)))
}

// 注文明細の削除エンドポイント（スタッフ用）
async fn remove_order_item(
    State(state): State<AppState>,
    Path((order_id, card_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<OrderDetailResponse>> {
    let order = state
        .order_service
        .remove_line_item(OrderId::from_uuid(order_id), CardId::from_uuid(card_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(OrderDetailResponse::from_order(&order)))
}

// 在庫一覧取得エンドポイント
async fn get_inventories(
    State(state): State<AppState>,
    query: Result<Query<InventoryQueryParams>, axum::extract::rejection::QueryRejection>,
) -> ApiResult<Json<Vec<InventoryResponse>>> {
    let Query(params) = query.map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_PARAMETER",
            "無効なクエリパラメータです".to_string(),
        )
    })?;
    let inventories = match params.max_sellable {
        Some(max_sellable) => {
            state
                .inventory_query_service
                .get_low_stock_inventories(max_sellable)
                .await
        }
        None => state.inventory_query_service.get_all_inventories().await,
    }
    .map_err(map_application_error)?;

    Ok(Json(
        inventories
            .iter()
            .map(InventoryResponse::from_inventory)
            .collect(),
    ))
}

// 在庫詳細取得エンドポイント
async fn get_inventory_by_card_id(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
) -> ApiResult<Json<InventoryResponse>> {
    let inventory = state
        .inventory_query_service
        .get_inventory(CardId::from_uuid(card_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(InventoryResponse::from_inventory(&inventory)))
}

// アプリケーションエラーをHTTPエラーにマッピング
pub(crate) fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    match err {
        ApplicationError::DomainError(domain_err) => map_domain_error(domain_err),
        ApplicationError::RepositoryError(RepositoryError::Conflict(msg)) => {
            api_error(StatusCode::CONFLICT, "CONFLICT", msg)
        }
        ApplicationError::RepositoryError(repo_err) => {
            tracing::error!(error = %repo_err, "リポジトリ操作に失敗しました");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "REPOSITORY_ERROR",
                repo_err.to_string(),
            )
        }
        ApplicationError::NotFound(msg) => api_error(StatusCode::NOT_FOUND, "NOT_FOUND", msg),
    }
}

// ドメインエラーを適切なHTTPステータスコードとエラーコードにマッピング
pub(crate) fn map_domain_error(domain_err: DomainError) -> (StatusCode, Json<ApiError>) {
    let message = domain_err.to_string();
    match domain_err {
        DomainError::InsufficientStock { .. } => {
            api_error(StatusCode::CONFLICT, "INSUFFICIENT_STOCK", message)
        }
        DomainError::InvalidTransition { from, to } => {
            tracing::warn!(%from, %to, "許可されていない状態遷移が要求されました");
            api_error(StatusCode::CONFLICT, "INVALID_TRANSITION", message)
        }
        DomainError::OrderLocked(_) => api_error(StatusCode::CONFLICT, "ORDER_LOCKED", message),
        DomainError::Duplicate(_) => api_error(StatusCode::CONFLICT, "DUPLICATE", message),
        DomainError::InvalidQuantity => {
            api_error(StatusCode::BAD_REQUEST, "INVALID_QUANTITY", message)
        }
        DomainError::Validation(_) => api_error(StatusCode::BAD_REQUEST, "VALIDATION", message),
        DomainError::InvalidValue(_) => {
            api_error(StatusCode::BAD_REQUEST, "INVALID_VALUE", message)
        }
        DomainError::LineItemNotFound(_) => {
            api_error(StatusCode::NOT_FOUND, "LINE_ITEM_NOT_FOUND", message)
        }
    }
}
