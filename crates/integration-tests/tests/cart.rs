//! Shopping cart endpoint tests.

use axum::http::StatusCode;
use bookstore_integration_tests::TestApp;
use serde_json::json;

struct Fixture {
    app: TestApp,
    customer: String,
    book: i64,
}

async fn fixture() -> Fixture {
    let app = TestApp::new();
    let admin = app.admin("admin@example.com").await;
    let category = app.create_category(&admin, "Fiction").await;
    let book = app.create_book(&admin, "Dune", "111", 10.0, category).await;
    let customer = app.customer("reader@example.com").await;
    Fixture {
        app,
        customer,
        book,
    }
}

#[tokio::test]
async fn test_new_account_has_empty_cart() {
    let Fixture { app, customer, .. } = fixture().await;

    let response = app.get("/cart", Some(&customer)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["cartItems"], json!([]));
}

#[tokio::test]
async fn test_add_same_book_merges_quantity() {
    let Fixture {
        app,
        customer,
        book,
    } = fixture().await;

    let response = app
        .post("/cart", json!({ "bookId": book, "quantity": 2 }), Some(&customer))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["cartItems"][0]["quantity"], 2);
    assert_eq!(response.body["cartItems"][0]["bookTitle"], "Dune");

    let response = app
        .post("/cart", json!({ "bookId": book, "quantity": 3 }), Some(&customer))
        .await;
    let items = response.body["cartItems"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
}

#[tokio::test]
async fn test_add_unknown_book() {
    let Fixture { app, customer, .. } = fixture().await;

    let response = app
        .post("/cart", json!({ "bookId": 404, "quantity": 1 }), Some(&customer))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.message(), "Can't find book by id 404");
}

#[tokio::test]
async fn test_quantity_must_be_positive() {
    let Fixture {
        app,
        customer,
        book,
    } = fixture().await;

    let response = app
        .post("/cart", json!({ "bookId": book, "quantity": 0 }), Some(&customer))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.message().contains("quantity"));
}

#[tokio::test]
async fn test_update_quantity() {
    let Fixture {
        app,
        customer,
        book,
    } = fixture().await;

    let response = app
        .post("/cart", json!({ "bookId": book, "quantity": 1 }), Some(&customer))
        .await;
    let item = response.body["cartItems"][0]["id"].as_i64().unwrap();

    let response = app
        .put(
            &format!("/cart/cart-items/{item}"),
            json!({ "quantity": 7 }),
            Some(&customer),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["cartItems"][0]["quantity"], 7);

    let response = app
        .put(
            "/cart/cart-items/999",
            json!({ "quantity": 1 }),
            Some(&customer),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.message(), "Can't find cart item by id 999");
}

#[tokio::test]
async fn test_remove_item() {
    let Fixture {
        app,
        customer,
        book,
    } = fixture().await;

    let response = app
        .post("/cart", json!({ "bookId": book, "quantity": 1 }), Some(&customer))
        .await;
    let item = response.body["cartItems"][0]["id"].as_i64().unwrap();

    let response = app
        .delete(&format!("/cart/cart-items/{item}"), Some(&customer))
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app.get("/cart", Some(&customer)).await;
    assert_eq!(response.body["cartItems"], json!([]));
}

#[tokio::test]
async fn test_cannot_remove_item_from_another_cart() {
    let Fixture {
        app,
        customer,
        book,
    } = fixture().await;

    let response = app
        .post("/cart", json!({ "bookId": book, "quantity": 1 }), Some(&customer))
        .await;
    let item = response.body["cartItems"][0]["id"].as_i64().unwrap();

    let intruder = app.customer("intruder@example.com").await;
    let response = app
        .delete(&format!("/cart/cart-items/{item}"), Some(&intruder))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(
        response.message(),
        format!("Can't find cart item with id {item} in your cart")
    );

    let response = app.get("/cart", Some(&customer)).await;
    assert_eq!(response.body["cartItems"][0]["id"], item);
}
