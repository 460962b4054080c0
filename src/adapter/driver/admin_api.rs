// スタッフ用の管理エンドポイント

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

use crate::adapter::driver::request_dto::OrdersQueryParams;
use crate::adapter::driver::response_dto::{
    AdminListingResponse, DashboardResponse, OrderSummaryResponse,
};
use crate::adapter::driver::rest_api::{
    api_error, map_application_error, map_domain_error, ApiResult, AppState,
};
use crate::application::service::admin_service::AdminEntityKind;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/orders", get(list_orders))
        .route("/admin/entities/:kind", get(list_entities))
}

async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<DashboardResponse>> {
    let stats = state
        .admin_service
        .dashboard()
        .await
        .map_err(map_application_error)?;
    Ok(Json(DashboardResponse::from_stats(
        &stats,
        &state.config.site_header,
    )))
}

// 注文一覧（statusを指定するとその状態のみ）
async fn list_orders(
    State(state): State<AppState>,
    query: Result<Query<OrdersQueryParams>, axum::extract::rejection::QueryRejection>,
) -> ApiResult<Json<Vec<OrderSummaryResponse>>> {
    let Query(params) = query.map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_PARAMETER",
            "無効なクエリパラメータです".to_string(),
        )
    })?;

    let orders = match params.status {
        Some(status) => {
            state
                .order_query_service
                .get_orders_by_status_string(&status)
                .await
        }
        None => state.order_query_service.get_all_orders().await,
    }
    .map_err(map_application_error)?;

    Ok(Json(orders.iter().map(OrderSummaryResponse::from_order).collect()))
}

async fn list_entities(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<Json<AdminListingResponse>> {
    let kind = AdminEntityKind::from_string(&kind).map_err(|err| {
        let (_, body) = map_domain_error(err);
        (StatusCode::NOT_FOUND, body)
    })?;
    let listing = state
        .admin_service
        .list_entities(kind)
        .await
        .map_err(map_application_error)?;
    Ok(Json(AdminListingResponse::from_listing(listing)))
}
