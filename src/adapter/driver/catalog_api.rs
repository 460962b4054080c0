// カタログ・レビュー・コレクションのエンドポイント

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use uuid::Uuid;

use crate::adapter::driver::request_dto::{
    AddCollectionCardRequest, CardQueryParams, CreateCardRequest, CreateCategoryRequest,
    CreateCollectionRequest, CreateExpansionRequest, ReviewQueryParams, SubmitReviewRequest,
    VoteRequest, WishlistRequest,
};
use crate::adapter::driver::response_dto::{
    CatalogEntryResponse, CollectionResponse, ReviewResponse,
};
use crate::adapter::driver::rest_api::{
    api_error, map_application_error, map_domain_error, ApiResult, AppState,
};
use crate::domain::model::{CardId, Category, CollectionId, CustomerId, Expansion, ReviewId, Vote};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/catalog/cards", get(list_cards).post(create_card))
        .route("/catalog/cards/:card_id", get(view_card))
        .route("/catalog/categories", get(list_categories).post(create_category))
        .route("/catalog/expansions", get(list_expansions).post(create_expansion))
        .route("/cards/:card_id/reviews", get(list_reviews).post(submit_review))
        .route("/reviews/:review_id/approve", post(approve_review))
        .route("/reviews/:review_id/vote", post(vote_review))
        .route(
            "/customers/:customer_id/collections",
            get(list_collections).post(create_collection),
        )
        .route("/collections/:collection_id", get(get_collection))
        .route("/collections/:collection_id/cards", post(add_collection_card))
        .route(
            "/collections/:collection_id/cards/:card_id",
            delete(remove_collection_card),
        )
        .route(
            "/customers/:customer_id/wishlist",
            get(get_wishlist).post(add_to_wishlist),
        )
        .route(
            "/customers/:customer_id/wishlist/:card_id",
            delete(remove_from_wishlist),
        )
}

async fn list_cards(
    State(state): State<AppState>,
    query: Result<Query<CardQueryParams>, axum::extract::rejection::QueryRejection>,
) -> ApiResult<Json<Vec<CatalogEntryResponse>>> {
    let Query(params) = query.map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_PARAMETER",
            "無効なクエリパラメータです".to_string(),
        )
    })?;
    let (filter, sort) = params.into_filter().map_err(map_domain_error)?;

    let entries = state
        .catalog_service
        .list_cards(&filter, sort)
        .await
        .map_err(map_application_error)?;
    Ok(Json(entries.iter().map(CatalogEntryResponse::from_entry).collect()))
}

// カード詳細（表示のたびに人気度が上がる）
async fn view_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
) -> ApiResult<Json<CatalogEntryResponse>> {
    let entry = state
        .catalog_service
        .view_card(CardId::from_uuid(card_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(CatalogEntryResponse::from_entry(&entry)))
}

async fn create_card(
    State(state): State<AppState>,
    Json(request): Json<CreateCardRequest>,
) -> ApiResult<(StatusCode, Json<CatalogEntryResponse>)> {
    let new_card = request.into_new_card().map_err(map_domain_error)?;
    let entry = state
        .catalog_service
        .create_card(new_card)
        .await
        .map_err(map_application_error)?;
    Ok((StatusCode::CREATED, Json(CatalogEntryResponse::from_entry(&entry))))
}

async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    state
        .catalog_service
        .list_categories()
        .await
        .map(Json)
        .map_err(map_application_error)
}

async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = state
        .catalog_service
        .create_category(request.name, request.description, request.icon)
        .await
        .map_err(map_application_error)?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn list_expansions(State(state): State<AppState>) -> ApiResult<Json<Vec<Expansion>>> {
    state
        .catalog_service
        .list_expansions()
        .await
        .map(Json)
        .map_err(map_application_error)
}

async fn create_expansion(
    State(state): State<AppState>,
    Json(request): Json<CreateExpansionRequest>,
) -> ApiResult<(StatusCode, Json<Expansion>)> {
    let expansion = state
        .catalog_service
        .create_expansion(
            request.code,
            request.name,
            request.release_date,
            request.total_cards,
            request.description,
        )
        .await
        .map_err(map_application_error)?;
    Ok((StatusCode::CREATED, Json(expansion)))
}

async fn list_reviews(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
    Query(params): Query<ReviewQueryParams>,
) -> ApiResult<Json<Vec<ReviewResponse>>> {
    let reviews = state
        .review_service
        .list_reviews(CardId::from_uuid(card_id), params.include_pending)
        .await
        .map_err(map_application_error)?;
    Ok(Json(reviews.iter().map(ReviewResponse::from_review).collect()))
}

async fn submit_review(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
    Json(request): Json<SubmitReviewRequest>,
) -> ApiResult<(StatusCode, Json<ReviewResponse>)> {
    let author_id = CustomerId::from_uuid(request.author_id);
    let input = request.into_input().map_err(map_domain_error)?;
    let review = state
        .review_service
        .submit_review(CardId::from_uuid(card_id), author_id, input)
        .await
        .map_err(map_application_error)?;
    Ok((StatusCode::CREATED, Json(ReviewResponse::from_review(&review))))
}

async fn approve_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
) -> ApiResult<Json<ReviewResponse>> {
    let review = state
        .review_service
        .approve_review(ReviewId::from_uuid(review_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(ReviewResponse::from_review(&review)))
}

async fn vote_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    Json(request): Json<VoteRequest>,
) -> ApiResult<Json<ReviewResponse>> {
    let vote = Vote::from_string(&request.vote).map_err(map_domain_error)?;
    let review = state
        .review_service
        .vote(ReviewId::from_uuid(review_id), vote)
        .await
        .map_err(map_application_error)?;
    Ok(Json(ReviewResponse::from_review(&review)))
}

async fn list_collections(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CollectionResponse>>> {
    let summaries = state
        .collection_service
        .list_collections(CustomerId::from_uuid(customer_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(summaries.iter().map(CollectionResponse::from_summary).collect()))
}

async fn create_collection(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(request): Json<CreateCollectionRequest>,
) -> ApiResult<(StatusCode, Json<CollectionResponse>)> {
    let summary = state
        .collection_service
        .create_collection(
            CustomerId::from_uuid(customer_id),
            request.name,
            request.description,
            request.public,
        )
        .await
        .map_err(map_application_error)?;
    Ok((StatusCode::CREATED, Json(CollectionResponse::from_summary(&summary))))
}

async fn get_collection(
    State(state): State<AppState>,
    Path(collection_id): Path<Uuid>,
) -> ApiResult<Json<CollectionResponse>> {
    let summary = state
        .collection_service
        .get_collection(CollectionId::from_uuid(collection_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(CollectionResponse::from_summary(&summary)))
}

async fn add_collection_card(
    State(state): State<AppState>,
    Path(collection_id): Path<Uuid>,
    Json(request): Json<AddCollectionCardRequest>,
) -> ApiResult<Json<CollectionResponse>> {
    let condition = request.condition().map_err(map_domain_error)?;
    let summary = state
        .collection_service
        .add_card(
            CollectionId::from_uuid(collection_id),
            CardId::from_uuid(request.card_id),
            request.quantity,
            condition,
            request.notes,
        )
        .await
        .map_err(map_application_error)?;
    Ok(Json(CollectionResponse::from_summary(&summary)))
}

async fn remove_collection_card(
    State(state): State<AppState>,
    Path((collection_id, card_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<CollectionResponse>> {
    let summary = state
        .collection_service
        .remove_card(
            CollectionId::from_uuid(collection_id),
            CardId::from_uuid(card_id),
        )
        .await
        .map_err(map_application_error)?;
    Ok(Json(CollectionResponse::from_summary(&summary)))
}

// ウィッシュリスト（なければ作成）
async fn get_wishlist(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> ApiResult<Json<CollectionResponse>> {
    let wishlist = state
        .collection_service
        .wishlist(CustomerId::from_uuid(customer_id))
        .await
        .map_err(map_application_error)?;
    let summary = state
        .collection_service
        .get_collection(wishlist.id())
        .await
        .map_err(map_application_error)?;
    Ok(Json(CollectionResponse::from_summary(&summary)))
}

async fn add_to_wishlist(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(request): Json<WishlistRequest>,
) -> ApiResult<Json<CollectionResponse>> {
    let summary = state
        .collection_service
        .add_to_wishlist(
            CustomerId::from_uuid(customer_id),
            CardId::from_uuid(request.card_id),
        )
        .await
        .map_err(map_application_error)?;
    Ok(Json(CollectionResponse::from_summary(&summary)))
}

async fn remove_from_wishlist(
    State(state): State<AppState>,
    Path((customer_id, card_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<CollectionResponse>> {
    let summary = state
        .collection_service
        .remove_from_wishlist(
            CustomerId::from_uuid(customer_id),
            CardId::from_uuid(card_id),
        )
        .await
        .map_err(map_application_error)?;
    Ok(Json(CollectionResponse::from_summary(&summary)))
}
