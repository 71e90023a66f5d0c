//! # REST Routes
//!
//! All resources nest under `/api/v1` and, except for shops themselves, under
//! a shop:
//!
//! ```text
//! GET  /health
//! GET/POST   /api/v1/shops                GET/PATCH/DELETE /api/v1/shops/{id}
//! GET        /api/v1/shops/{id}/report
//! GET/POST   /api/v1/shops/{shop_id}/products      + /{id}
//! GET        /api/v1/shops/{shop_id}/inventory     + GET/POST /{product_id}
//! GET/POST   /api/v1/shops/{shop_id}/customers     + /{id}, /{id}/settle
//! GET/POST   /api/v1/shops/{shop_id}/sales         + /{id}, /{id}/payments
//! GET/POST   /api/v1/shops/{shop_id}/expenses      + /{id}
//! GET/POST   /api/v1/shops/{shop_id}/budgets       + /{id}
//! GET/POST/DELETE /api/v1/shops/{shop_id}/chat/{user_id}
//! ```
//!
//! Handlers validate input with `khata_core::validation`, call one repository
//! method, and let [`crate::error::ApiError`] do the status mapping.

pub mod budgets;
pub mod chat;
pub mod customers;
pub mod expenses;
pub mod inventory;
pub mod products;
pub mod report;
pub mod sales;
pub mod shops;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{extract::State, Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/shops", get(shops::list).post(shops::create))
        .route(
            "/shops/{id}",
            get(shops::get).patch(shops::update).delete(shops::delete),
        )
        .route("/shops/{id}/report", get(report::monthly))
        .route(
            "/shops/{shop_id}/products",
            get(products::list).post(products::create),
        )
        .route(
            "/shops/{shop_id}/products/{id}",
            get(products::get)
                .patch(products::update)
                .delete(products::delete),
        )
        .route("/shops/{shop_id}/inventory", get(inventory::list))
        .route(
            "/shops/{shop_id}/inventory/{product_id}",
            get(inventory::get).post(inventory::adjust),
        )
        .route(
            "/shops/{shop_id}/customers",
            get(customers::list).post(customers::create),
        )
        .route(
            "/shops/{shop_id}/customers/{id}",
            get(customers::get)
                .patch(customers::update)
                .delete(customers::delete),
        )
        .route(
            "/shops/{shop_id}/customers/{id}/settle",
            post(customers::settle),
        )
        .route("/shops/{shop_id}/sales", get(sales::list).post(sales::create))
        .route(
            "/shops/{shop_id}/sales/{id}",
            get(sales::get).patch(sales::update).delete(sales::delete),
        )
        .route("/shops/{shop_id}/sales/{id}/payments", post(sales::record_payment))
        .route(
            "/shops/{shop_id}/expenses",
            get(expenses::list).post(expenses::create),
        )
        .route(
            "/shops/{shop_id}/expenses/{id}",
            get(expenses::get)
                .patch(expenses::update)
                .delete(expenses::delete),
        )
        .route(
            "/shops/{shop_id}/budgets",
            get(budgets::list).post(budgets::create),
        )
        .route(
            "/shops/{shop_id}/budgets/{id}",
            get(budgets::get)
                .patch(budgets::update)
                .delete(budgets::delete),
        )
        .route(
            "/shops/{shop_id}/chat/{user_id}",
            get(chat::history).post(chat::append).delete(chat::clear),
        );

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Liveness probe: verifies the database answers queries.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    if state.db.health_check().await {
        (StatusCode::OK, Json(HealthResponse { status: "ok" }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse { status: "degraded" }),
        )
    }
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use khata_db::{Database, DbConfig};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        router(AppState::new(db))
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(body) => Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_router().await;
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_shop_lifecycle() {
        let app = test_router().await;

        let (status, shop) = send(
            &app,
            "POST",
            "/api/v1/shops",
            Some(json!({ "name": "Karachi General Store", "ownerName": "Ahmed" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let shop_id = shop["id"].as_str().unwrap().to_string();

        let (status, fetched) = send(&app, "GET", &format!("/api/v1/shops/{shop_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Karachi General Store");

        let (status, _) = send(&app, "DELETE", &format!("/api/v1/shops/{shop_id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, "GET", &format!("/api/v1/shops/{shop_id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
    }

    #[tokio::test]
    async fn test_deleted_shop_listings_are_404() {
        let app = test_router().await;
        let (_, shop) = send(&app, "POST", "/api/v1/shops", Some(json!({ "name": "Shop" }))).await;
        let shop_id = shop["id"].as_str().unwrap().to_string();

        let (_, product) = send(
            &app,
            "POST",
            &format!("/api/v1/shops/{shop_id}/products"),
            Some(json!({ "name": "Rice", "sku": "RICE", "priceCents": 10000 })),
        )
        .await;
        let product_id = product["id"].as_str().unwrap().to_string();

        let (status, _) = send(&app, "DELETE", &format!("/api/v1/shops/{shop_id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        // Every shop-scoped resource goes dark with the shop, including
        // rows that still exist underneath it.
        let uris = [
            format!("/api/v1/shops/{shop_id}/products"),
            format!("/api/v1/shops/{shop_id}/products/{product_id}"),
            format!("/api/v1/shops/{shop_id}/inventory"),
            format!("/api/v1/shops/{shop_id}/inventory/{product_id}"),
            format!("/api/v1/shops/{shop_id}/customers"),
            format!("/api/v1/shops/{shop_id}/sales"),
            format!("/api/v1/shops/{shop_id}/expenses"),
            format!("/api/v1/shops/{shop_id}/budgets"),
            format!("/api/v1/shops/{shop_id}/chat/u1"),
        ];
        for uri in &uris {
            let (status, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["code"], "not_found", "{uri}");
        }

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/shops/{shop_id}/inventory/{product_id}"),
            Some(json!({ "delta": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_blank_shop_name_is_400() {
        let app = test_router().await;
        let (status, body) =
            send(&app, "POST", "/api/v1/shops", Some(json!({ "name": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation");
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_409() {
        let app = test_router().await;
        let (_, shop) = send(&app, "POST", "/api/v1/shops", Some(json!({ "name": "Shop" }))).await;
        let shop_id = shop["id"].as_str().unwrap();

        let product = json!({ "name": "Rice", "sku": "RICE", "priceCents": 10000 });
        let uri = format!("/api/v1/shops/{shop_id}/products");
        let (status, _) = send(&app, "POST", &uri, Some(product.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, "POST", &uri, Some(product)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "duplicate");
    }

    #[tokio::test]
    async fn test_oversell_is_422_and_stock_untouched() {
        let app = test_router().await;
        let (_, shop) = send(&app, "POST", "/api/v1/shops", Some(json!({ "name": "Shop" }))).await;
        let shop_id = shop["id"].as_str().unwrap().to_string();

        let (_, product) = send(
            &app,
            "POST",
            &format!("/api/v1/shops/{shop_id}/products"),
            Some(json!({ "name": "Rice", "sku": "RICE", "priceCents": 10000 })),
        )
        .await;
        let product_id = product["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/shops/{shop_id}/inventory/{product_id}"),
            Some(json!({ "delta": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/shops/{shop_id}/sales"),
            Some(json!({
                "items": [{ "productId": product_id, "quantity": 5 }],
                "paidCents": 0,
                "paymentMethod": "cash"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "business_rule");

        let (_, level) = send(
            &app,
            "GET",
            &format!("/api/v1/shops/{shop_id}/inventory/{product_id}"),
            None,
        )
        .await;
        assert_eq!(level["stock"], 3);
    }

    #[tokio::test]
    async fn test_sale_create_and_invoice_number() {
        let app = test_router().await;
        let (_, shop) = send(&app, "POST", "/api/v1/shops", Some(json!({ "name": "Shop" }))).await;
        let shop_id = shop["id"].as_str().unwrap().to_string();

        let (_, product) = send(
            &app,
            "POST",
            &format!("/api/v1/shops/{shop_id}/products"),
            Some(json!({ "name": "Rice", "sku": "RICE", "priceCents": 10000 })),
        )
        .await;
        let product_id = product["id"].as_str().unwrap().to_string();

        send(
            &app,
            "POST",
            &format!("/api/v1/shops/{shop_id}/inventory/{product_id}"),
            Some(json!({ "delta": 10 })),
        )
        .await;

        let (status, sale) = send(
            &app,
            "POST",
            &format!("/api/v1/shops/{shop_id}/sales"),
            Some(json!({
                "items": [{ "productId": product_id, "quantity": 2 }],
                "paidCents": 20000,
                "paymentMethod": "cash"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sale["sale"]["invoiceNumber"], "INV-000001");
        assert_eq!(sale["sale"]["status"], "completed");
        assert_eq!(sale["items"][0]["lineTotalCents"], 20000);
    }

    #[tokio::test]
    async fn test_report_endpoint() {
        let app = test_router().await;
        let (_, shop) = send(&app, "POST", "/api/v1/shops", Some(json!({ "name": "Shop" }))).await;
        let shop_id = shop["id"].as_str().unwrap().to_string();

        let (status, report) = send(
            &app,
            "GET",
            &format!("/api/v1/shops/{shop_id}/report?period=2026-08"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["period"], "2026-08");
        assert_eq!(report["sales"]["salesCount"], 0);

        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/v1/shops/{shop_id}/report?period=2026-13"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation");
    }
}
