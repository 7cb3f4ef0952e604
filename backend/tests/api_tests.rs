use axum::body::Body;
use axum::Router;
use backend::api::{router, AppState};
use backend::media::FsMediaStorage;
use backend::store::SqliteStore;
use http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use storefront::model::{Order, Product};
use tower::ServiceExt;

async fn test_app() -> Router {
    let store = Arc::new(
        SqliteStore::in_memory()
            .await
            .expect("Failed to create in-memory store"),
    );
    store
        .initialize_schema()
        .await
        .expect("Failed to initialize schema");

    let media_root = std::env::temp_dir()
        .join("api-tests")
        .join(common::generate_unique_id());
    let media = Arc::new(FsMediaStorage::new(
        &media_root,
        "http://localhost:8081/media/products",
    ));

    router(AppState {
        products: store.clone(),
        orders: store,
        media,
    })
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

async fn response_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Failed to decode response body")
}

fn sample_product(slug: &str) -> Value {
    json!({
        "name": "Seiko 5 Sports",
        "slug": slug,
        "brand": "Seiko",
        "price": 100.0,
        "sale_price": 80.0,
        "description": "Automatic, day-date display",
        "specs": { "movement": "Automatic", "caseDiameter": "40mm" },
        "images": ["https://cdn.example/front.jpg"],
        "stock_status": true
    })
}

fn sample_order(product_id: &str) -> Value {
    json!({
        "customer_info": {
            "name": "Test Customer",
            "phone": "0912345678",
            "email": "test@example.com",
            "address": {
                "street": "123 Test Street",
                "ward": "Ward 1",
                "district": "District 1",
                "city": "Test City"
            }
        },
        "payment_method": "cod",
        "items": [
            { "product_id": product_id, "quantity": 2, "price_at_purchase": 80.0 }
        ]
    })
}

async fn create_product(app: &Router, slug: &str) -> Product {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/products",
            sample_product(slug),
        ))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app().await;
    let response = app
        .oneshot(get_request("/health"))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_product_crud_flow() {
    let app = test_app().await;
    let slug = common::generate_unique_slug("seiko-5-sports");
    let created = create_product(&app, &slug).await;
    assert_eq!(created.brand, "Seiko");
    assert_eq!(created.effective_price(), 80.0);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/products/{}", created.id)))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: Product = response_json(response).await;
    assert_eq!(fetched, created);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/products/slug/{slug}")))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/products/{}", created.id),
            json!({ "price": 150.0, "sale_price": null }),
        ))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Product = response_json(response).await;
    assert_eq!(updated.price, 150.0);
    assert_eq!(updated.sale_price, None);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/products/{}", created.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/products/{}", created.id)))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_product_rejects_invalid_payload() {
    let app = test_app().await;
    let mut payload = sample_product(&common::generate_unique_slug("bad-product"));
    payload["price"] = json!(-5.0);

    let response = app
        .oneshot(json_request(Method::POST, "/api/products", payload))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_update_cannot_raise_sale_price_above_list_price() {
    let app = test_app().await;
    let product = create_product(&app, &common::generate_unique_slug("seiko-5-sports")).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/products/{}", product.id),
            json!({ "sale_price": 150.0 }),
        ))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/products/{}", product.id)))
        .await
        .expect("Request failed");
    let stored: Product = response_json(response).await;
    assert_eq!(stored.sale_price, Some(80.0));
    assert_eq!(stored.effective_price(), 80.0);
}

#[tokio::test]
async fn test_list_products_applies_query_filters() {
    let app = test_app().await;
    create_product(&app, &common::generate_unique_slug("seiko-5-sports")).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/products",
            json!({
                "name": "Orient Bambino",
                "slug": common::generate_unique_slug("orient-bambino"),
                "brand": "Orient",
                "price": 40.0,
                "stock_status": true
            }),
        ))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get_request("/api/products?brands=Seiko,Grand%20Seiko"))
        .await
        .expect("Request failed");
    let products: Vec<Product> = response_json(response).await;
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].brand, "Seiko");

    let response = app
        .clone()
        .oneshot(get_request("/api/products?price_min=50"))
        .await
        .expect("Request failed");
    let products: Vec<Product> = response_json(response).await;
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].brand, "Seiko");

    let response = app
        .clone()
        .oneshot(get_request("/api/products/brands"))
        .await
        .expect("Request failed");
    let brands: Vec<String> = response_json(response).await;
    assert_eq!(brands, vec!["Orient".to_string(), "Seiko".to_string()]);
}

#[tokio::test]
async fn test_checkout_and_order_management_flow() {
    let app = test_app().await;
    let product = create_product(&app, &common::generate_unique_slug("seiko-5-sports")).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/orders",
            sample_order(&product.id),
        ))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::CREATED);
    let order: Order = response_json(response).await;
    assert_eq!(order.total_amount, 160.0);
    assert_eq!(order.items.len(), 1);

    let response = app
        .clone()
        .oneshot(get_request("/api/orders?status=pending"))
        .await
        .expect("Request failed");
    let pending: Vec<Order> = response_json(response).await;
    assert_eq!(pending.len(), 1);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            &format!("/api/orders/{}/status", order.id),
            json!({ "status": "delivered" }),
        ))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request("/api/orders?status=pending"))
        .await
        .expect("Request failed");
    let pending: Vec<Order> = response_json(response).await;
    assert!(pending.is_empty());

    let response = app
        .clone()
        .oneshot(get_request("/api/stats"))
        .await
        .expect("Request failed");
    let stats: Value = response_json(response).await;
    assert_eq!(stats["total_orders"], json!(1));
    assert_eq!(stats["total_revenue"], json!(160.0));

    let response = app
        .clone()
        .oneshot(get_request("/api/stats/daily-revenue?days=3"))
        .await
        .expect("Request failed");
    let revenue: Vec<Value> = response_json(response).await;
    assert_eq!(revenue.len(), 3);
    assert_eq!(revenue[2]["revenue"], json!(160.0));
}

#[tokio::test]
async fn test_checkout_rejects_invalid_phone() {
    let app = test_app().await;
    let product = create_product(&app, &common::generate_unique_slug("seiko-5-sports")).await;
    let mut payload = sample_order(&product.id);
    payload["customer_info"]["phone"] = json!("not-a-phone");

    let response = app
        .oneshot(json_request(Method::POST, "/api/orders", payload))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_status_values_are_rejected() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(get_request("/api/orders?status=shipped-maybe"))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .oneshot(json_request(
            Method::PATCH,
            "/api/orders/missing-id/status",
            json!({ "status": "teleported" }),
        ))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_missing_entities_return_not_found() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(get_request("/api/products/missing-id"))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(get_request("/api/orders/missing-id"))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(json_request(
            Method::PATCH,
            "/api/orders/missing-id/status",
            json!({ "status": "confirmed" }),
        ))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_media_upload_and_delete() {
    let app = test_app().await;
    let boundary = "watch-store-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"watch.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n\
         fake jpeg bytes\r\n\
         --{boundary}--\r\n"
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/media")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
    let uploaded: Value = response_json(response).await;
    let urls = uploaded["urls"].as_array().expect("urls missing");
    assert_eq!(urls.len(), 1);
    let url = urls[0].as_str().expect("url is not a string");
    assert!(url.starts_with("http://localhost:8081/media/products/"));

    let response = app
        .oneshot(json_request(
            Method::DELETE,
            "/api/media",
            json!({ "url": url }),
        ))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_storage_failures_map_to_internal_errors() {
    let mut products = storefront::storage::MockProductStorage::new();
    products
        .expect_brands()
        .returning(|| Err("database is on fire".into()));
    let mut orders = storefront::storage::MockOrderStorage::new();
    orders
        .expect_stats()
        .returning(|| Err("database is on fire".into()));

    let app = router(AppState {
        products: Arc::new(products),
        orders: Arc::new(orders),
        media: Arc::new(storefront::storage::MockMediaStorage::new()),
    });

    let response = app
        .clone()
        .oneshot(get_request("/api/products/brands"))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app
        .oneshot(get_request("/api/stats"))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response_json(response).await;
    assert_eq!(body["error"], json!("database is on fire"));
}
