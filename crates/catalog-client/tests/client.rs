//! Integration tests for `CatalogClient`, `ClientStore` and `HomeView` using
//! wiremock HTTP mocks.

use std::time::{Duration, Instant};

use catalog_client::{
    CatalogClient, ClientError, ClientStore, FailureKind, FetchRequest, HomeView,
};
use catalog_core::{PriceInput, ProductInput, ProductPatch, SortOrder};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PEN_ID: &str = "6f1c2d4e-8a9b-4c3d-9e8f-0a1b2c3d4e5f";
const PENCIL_ID: &str = "0c5a7e1f-2b3c-4d5e-8f90-a1b2c3d4e5f6";

fn test_client(base_url: &str) -> CatalogClient {
    CatalogClient::new(base_url, 30).expect("client construction should not fail")
}

fn product_json(id: &str, name: &str, price: f64) -> Value {
    json!({
        "id": id,
        "name": name,
        "price": price,
        "image": format!("http://img.example.com/{}.png", name.to_lowercase()),
        "createdAt": "2026-01-01T00:00:00Z",
        "updatedAt": "2026-01-01T00:00:00Z"
    })
}

async fn mount_page(server: &MockServer, page: &str, products: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "products": products,
            "hasMore": false
        })))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// CatalogClient
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_products_sends_paging_search_and_sort() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("page", "2"))
        .and(query_param("search", "Pen"))
        .and(query_param("sortBy", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "products": [product_json(PEN_ID, "Pen", 1.5)],
            "hasMore": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let products = test_client(&server.uri())
        .list_products(&FetchRequest {
            page: 2,
            search: "Pen".to_string(),
            sort_by: Some(SortOrder::Desc),
        })
        .await
        .expect("should parse products");

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Pen");
    assert_eq!(products[0].id.to_string(), PEN_ID);
}

#[tokio::test]
async fn list_products_falls_back_to_data_and_accepts_legacy_id_key() {
    let server = MockServer::start().await;
    let mut legacy = product_json(PEN_ID, "Pen", 1.5);
    let id = legacy
        .as_object_mut()
        .and_then(|o| o.remove("id"))
        .expect("id");
    legacy["_id"] = id;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": [legacy]})),
        )
        .mount(&server)
        .await;

    let products = test_client(&server.uri())
        .list_products(&FetchRequest::default())
        .await
        .expect("should parse products");
    assert_eq!(products[0].id.to_string(), PEN_ID);
}

#[tokio::test]
async fn list_products_without_list_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let products = test_client(&server.uri())
        .list_products(&FetchRequest::default())
        .await
        .expect("empty list");
    assert!(products.is_empty());
}

#[tokio::test]
async fn error_status_surfaces_api_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"success": false, "message": "Server Error"})),
        )
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .list_products(&FetchRequest::default())
        .await
        .unwrap_err();
    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Server Error");
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn update_of_unknown_product_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("/api/products/{PEN_ID}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": null})),
        )
        .mount(&server)
        .await;

    let patch = ProductPatch {
        name: Some("Ghost".to_string()),
        ..ProductPatch::default()
    };
    let updated = test_client(&server.uri())
        .update_product(PEN_ID, &patch)
        .await
        .expect("update");
    assert!(updated.is_none());
}

// ---------------------------------------------------------------------------
// ClientStore
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_page_one_replaces_and_later_pages_append() {
    let server = MockServer::start().await;
    mount_page(&server, "1", vec![product_json(PEN_ID, "Pen", 1.5)]).await;
    mount_page(&server, "2", vec![product_json(PENCIL_ID, "Pencil", 0.5)]).await;
    mount_page(&server, "3", vec![]).await;

    let store = ClientStore::new(test_client(&server.uri()));
    store.fetch_products(FetchRequest::page(1)).await;
    store.fetch_products(FetchRequest::page(2)).await;

    let state = store.snapshot().await;
    let names: Vec<_> = state.products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Pen", "Pencil"]);
    assert_eq!(state.page, 2);
    assert!(state.has_more);
    assert!(!state.loading);

    store.fetch_products(FetchRequest::page(3)).await;
    let state = store.snapshot().await;
    assert_eq!(state.products.len(), 2);
    assert!(!state.has_more);

    store.fetch_products(FetchRequest::page(1)).await;
    assert_eq!(store.snapshot().await.products.len(), 1);
}

#[tokio::test]
async fn failed_fetch_stops_paging_and_clears_loading() {
    let server = MockServer::start().await;
    mount_page(&server, "1", vec![product_json(PEN_ID, "Pen", 1.5)]).await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = ClientStore::new(test_client(&server.uri()));
    store.fetch_products(FetchRequest::page(1)).await;
    store.fetch_products(FetchRequest::page(2)).await;

    let state = store.snapshot().await;
    assert_eq!(state.products.len(), 1);
    assert!(!state.has_more);
    assert!(!state.loading);
}

#[tokio::test]
async fn reset_clears_products_and_rearms_paging() {
    let server = MockServer::start().await;
    mount_page(&server, "1", vec![]).await;

    let store = ClientStore::new(test_client(&server.uri()));
    store.fetch_products(FetchRequest::page(1)).await;
    assert!(!store.snapshot().await.has_more);

    store.reset_products().await;
    let state = store.snapshot().await;
    assert!(state.products.is_empty());
    assert!(state.has_more);
    assert_eq!(state.page, 1);
}

#[tokio::test]
async fn set_products_replaces_the_cached_list() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "1",
        vec![
            product_json(PEN_ID, "Pen", 1.5),
            product_json(PENCIL_ID, "Pencil", 0.5),
        ],
    )
    .await;

    let store = ClientStore::new(test_client(&server.uri()));
    store.fetch_products(FetchRequest::page(1)).await;

    let mut products = store.snapshot().await.products;
    products.reverse();
    products.truncate(1);
    store.set_products(products).await;

    let state = store.snapshot().await;
    let names: Vec<_> = state.products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Pencil"]);
    assert_eq!(state.page, 1);
}

#[tokio::test]
async fn create_with_missing_fields_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let store = ClientStore::new(test_client(&server.uri()));
    let outcome = store
        .create_product(ProductInput {
            name: Some("Pen".to_string()),
            price: None,
            image: Some("http://img.example.com/pen.png".to_string()),
            description: None,
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "Please fill in all fields.");
    assert_eq!(outcome.kind, Some(FailureKind::Validation));
}

#[tokio::test]
async fn create_appends_the_stored_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/products"))
        .and(body_partial_json(json!({"name": "Pen", "price": 1.5})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": product_json(PEN_ID, "Pen", 1.5)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = ClientStore::new(test_client(&server.uri()));
    let outcome = store
        .create_product(ProductInput {
            name: Some("Pen".to_string()),
            price: Some(PriceInput::Number(1.5)),
            image: Some("http://img.example.com/pen.png".to_string()),
            description: None,
        })
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.message, "Product created successfully");
    let state = store.snapshot().await;
    assert_eq!(state.products.len(), 1);
    assert_eq!(state.products[0].id.to_string(), PEN_ID);
}

#[tokio::test]
async fn create_rejected_by_api_leaves_list_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/products"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"success": false, "message": "Please provide all fields"})),
        )
        .mount(&server)
        .await;

    let store = ClientStore::new(test_client(&server.uri()));
    let outcome = store
        .create_product(ProductInput {
            name: Some("Pen".to_string()),
            price: Some(PriceInput::Number(1.5)),
            image: Some("http://img.example.com/pen.png".to_string()),
            description: None,
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "Error creating product.");
    assert_eq!(outcome.kind, Some(FailureKind::Rejected));
    assert!(store.snapshot().await.products.is_empty());
}

#[tokio::test]
async fn create_against_unreachable_api_reports_transport_failure() {
    // Nothing listens on the discard port.
    let store = ClientStore::new(test_client("http://127.0.0.1:9"));
    let outcome = store
        .create_product(ProductInput {
            name: Some("Pen".to_string()),
            price: Some(PriceInput::Text("1.50".to_string())),
            image: Some("http://img.example.com/pen.png".to_string()),
            description: None,
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.kind, Some(FailureKind::Transport));
}

#[tokio::test]
async fn update_replaces_matching_product() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "1",
        vec![
            product_json(PEN_ID, "Pen", 1.5),
            product_json(PENCIL_ID, "Pencil", 0.5),
        ],
    )
    .await;
    Mock::given(method("PUT"))
        .and(path(format!("/api/products/{PEN_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": product_json(PEN_ID, "Gel Pen", 2.0)
        })))
        .mount(&server)
        .await;

    let store = ClientStore::new(test_client(&server.uri()));
    store.fetch_products(FetchRequest::page(1)).await;
    let outcome = store
        .update_product(
            PEN_ID,
            &ProductPatch {
                name: Some("Gel Pen".to_string()),
                price: Some(PriceInput::Number(2.0)),
                ..ProductPatch::default()
            },
        )
        .await;

    assert!(outcome.success);
    let state = store.snapshot().await;
    let names: Vec<_> = state.products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Gel Pen", "Pencil"]);
}

#[tokio::test]
async fn update_with_invalid_id_reports_failure_and_keeps_list() {
    let server = MockServer::start().await;
    mount_page(&server, "1", vec![product_json(PEN_ID, "Pen", 1.5)]).await;
    Mock::given(method("PUT"))
        .and(path("/api/products/bogus"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"success": false, "message": "Invalid Product Id"})),
        )
        .mount(&server)
        .await;

    let store = ClientStore::new(test_client(&server.uri()));
    store.fetch_products(FetchRequest::page(1)).await;
    let outcome = store
        .update_product("bogus", &ProductPatch::default())
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "Error updating product.");
    assert_eq!(store.snapshot().await.products[0].name, "Pen");
}

#[tokio::test]
async fn delete_removes_product_and_reports_api_message() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "1",
        vec![
            product_json(PEN_ID, "Pen", 1.5),
            product_json(PENCIL_ID, "Pencil", 0.5),
        ],
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/api/products/{PEN_ID}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "message": "Product deleted"})),
        )
        .mount(&server)
        .await;

    let store = ClientStore::new(test_client(&server.uri()));
    store.fetch_products(FetchRequest::page(1)).await;
    let outcome = store.delete_product(PEN_ID).await;

    assert!(outcome.success);
    assert_eq!(outcome.message, "Product deleted");
    let state = store.snapshot().await;
    assert_eq!(state.products.len(), 1);
    assert_eq!(state.products[0].name, "Pencil");
}

#[tokio::test]
async fn delete_rejected_in_envelope_uses_api_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/api/products/{PEN_ID}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "message": "Not allowed"})),
        )
        .mount(&server)
        .await;

    let store = ClientStore::new(test_client(&server.uri()));
    let outcome = store.delete_product(PEN_ID).await;
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Not allowed");
    assert_eq!(outcome.kind, Some(FailureKind::Rejected));
}

// ---------------------------------------------------------------------------
// HomeView
// ---------------------------------------------------------------------------

#[tokio::test]
async fn view_mount_then_scroll_accumulates_pages() {
    let server = MockServer::start().await;
    mount_page(&server, "1", vec![product_json(PEN_ID, "Pen", 1.5)]).await;
    mount_page(&server, "2", vec![product_json(PENCIL_ID, "Pencil", 0.5)]).await;
    mount_page(&server, "3", vec![]).await;

    let store = ClientStore::new(test_client(&server.uri()));
    let mut view = HomeView::new(store.clone());
    view.mount().await;
    view.on_sentinel_visible().await;

    let screen = view.render().await;
    assert!(screen.contains("1. Pen"));
    assert!(screen.contains("2. Pencil"));
    assert_eq!(view.page(), 2);

    view.on_sentinel_visible().await;
    assert!(!store.snapshot().await.has_more);

    // No more pages: the sentinel does nothing.
    view.on_sentinel_visible().await;
    assert_eq!(view.page(), 3);
}

#[tokio::test]
async fn view_search_is_staged_until_submitted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("search", "Pen"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "products": [product_json(PEN_ID, "Pen", 1.5)]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("search", ""))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "products": []})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = ClientStore::new(test_client(&server.uri()));
    let mut view = HomeView::new(store.clone());
    view.mount().await;
    assert!(view.render().await.contains("No products found"));

    view.set_search_input("Pen");
    assert_eq!(view.search_term(), "");

    view.submit_search().await;
    assert_eq!(view.search_term(), "Pen");
    let state = store.snapshot().await;
    assert_eq!(state.products.len(), 1);
    assert_eq!(state.page, 1);

    // Resubmitting the same term does not refetch.
    view.submit_search().await;
}

#[tokio::test]
async fn sentinel_is_ignored_while_a_fetch_is_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "success": true,
                    "products": [product_json(PEN_ID, "Pen", 1.5)]
                }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "products": []})),
        )
        .expect(0)
        .mount(&server)
        .await;

    let store = ClientStore::new(test_client(&server.uri()));
    let mut loader = HomeView::new(store.clone());
    let first_load = tokio::spawn(async move {
        loader.mount().await;
        loader
    });

    let deadline = Instant::now() + Duration::from_secs(5);
    while !store.snapshot().await.loading {
        assert!(Instant::now() < deadline, "page 1 never started loading");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let mut scroller = HomeView::new(store.clone());
    scroller.on_sentinel_visible().await;
    assert_eq!(scroller.page(), 1);

    let loader = first_load.await.expect("mount task");
    assert_eq!(loader.page(), 1);
    let state = store.snapshot().await;
    assert!(!state.loading);
    assert_eq!(state.products.len(), 1);
}
