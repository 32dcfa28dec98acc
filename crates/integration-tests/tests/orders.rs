//! Checkout and order endpoint tests.

use axum::http::StatusCode;
use bookstore_integration_tests::TestApp;
use serde_json::json;

struct Fixture {
    app: TestApp,
    admin: String,
    customer: String,
    dune: i64,
    emma: i64,
}

async fn fixture() -> Fixture {
    let app = TestApp::new();
    let admin = app.admin("admin@example.com").await;
    let category = app.create_category(&admin, "Fiction").await;
    let dune = app.create_book(&admin, "Dune", "111", 10.0, category).await;
    let emma = app.create_book(&admin, "Emma", "222", 15.0, category).await;
    let customer = app.customer("reader@example.com").await;
    Fixture {
        app,
        admin,
        customer,
        dune,
        emma,
    }
}

async fn checkout(fx: &Fixture) -> serde_json::Value {
    for (book, quantity) in [(fx.dune, 3), (fx.emma, 1)] {
        let response = fx
            .app
            .post(
                "/cart",
                json!({ "bookId": book, "quantity": quantity }),
                Some(&fx.customer),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let response = fx
        .app
        .post(
            "/orders",
            json!({ "shippingAddress": "1 Main St" }),
            Some(&fx.customer),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body
}

#[tokio::test]
async fn test_checkout_with_empty_cart() {
    let fx = fixture().await;

    let response = fx
        .app
        .post(
            "/orders",
            json!({ "shippingAddress": "1 Main St" }),
            Some(&fx.customer),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(
        response.message(),
        "Can't create order. Shopping cart is empty."
    );
}

#[tokio::test]
async fn test_checkout_creates_pending_order_and_empties_cart() {
    let fx = fixture().await;
    let order = checkout(&fx).await;

    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["shippingAddress"], "1 Main St");
    // Sum of unit prices; quantities do not scale the total.
    assert_eq!(order["total"].as_f64(), Some(25.0));

    let items = order["orderItems"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let dune = items.iter().find(|i| i["bookId"] == fx.dune).unwrap();
    assert_eq!(dune["quantity"], 3);
    assert_eq!(dune["price"].as_f64(), Some(10.0));

    let response = fx.app.get("/cart", Some(&fx.customer)).await;
    assert_eq!(response.body["cartItems"], json!([]));
}

#[tokio::test]
async fn test_order_items_keep_price_snapshot() {
    let fx = fixture().await;
    let order = checkout(&fx).await;
    let order_id = order["id"].as_i64().unwrap();

    let response = fx
        .app
        .put(
            &format!("/books/{}", fx.dune),
            json!({ "title": "Dune", "author": "Frank Herbert", "isbn": "111", "price": 99, "categoriesIds": [1] }),
            Some(&fx.admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = fx
        .app
        .get(&format!("/orders/{order_id}/items"), Some(&fx.customer))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let dune = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["bookId"] == fx.dune)
        .unwrap()
        .clone();
    assert_eq!(dune["price"].as_f64(), Some(10.0));

    let item_id = dune["id"].as_i64().unwrap();
    let response = fx
        .app
        .get(
            &format!("/orders/{order_id}/items/{item_id}"),
            Some(&fx.customer),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["quantity"], 3);
}

#[tokio::test]
async fn test_missing_order_item() {
    let fx = fixture().await;
    let order = checkout(&fx).await;
    let order_id = order["id"].as_i64().unwrap();

    let response = fx
        .app
        .get(&format!("/orders/{order_id}/items/999"), Some(&fx.customer))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.message(),
        format!("Can't find item 999 in order {order_id}")
    );
}

#[tokio::test]
async fn test_orders_are_private() {
    let fx = fixture().await;
    let order = checkout(&fx).await;
    let order_id = order["id"].as_i64().unwrap();

    let other = fx.app.customer("other@example.com").await;
    let response = fx
        .app
        .get(&format!("/orders/{order_id}/items"), Some(&other))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = fx.app.get("/orders", Some(&other)).await;
    assert_eq!(response.body["totalElements"], 0);

    let response = fx.app.get("/orders", Some(&fx.customer)).await;
    assert_eq!(response.body["totalElements"], 1);
    assert_eq!(response.body["content"][0]["id"], order_id);
}

#[tokio::test]
async fn test_status_update_is_admin_only() {
    let fx = fixture().await;
    let order = checkout(&fx).await;
    let order_id = order["id"].as_i64().unwrap();
    let uri = format!("/orders/{order_id}");

    let response = fx
        .app
        .patch(&uri, json!({ "status": "SHIPPED" }), Some(&fx.customer))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = fx
        .app
        .patch(&uri, json!({ "status": "SHIPPED" }), Some(&fx.admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "SHIPPED");

    // Any status may follow any other.
    let response = fx
        .app
        .patch(&uri, json!({ "status": "PENDING" }), Some(&fx.admin))
        .await;
    assert_eq!(response.body["status"], "PENDING");

    let response = fx
        .app
        .patch(&uri, json!({ "status": "LOST" }), Some(&fx.admin))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = fx
        .app
        .patch("/orders/999", json!({ "status": "SHIPPED" }), Some(&fx.admin))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.message(), "Order not found for id 999");
}
