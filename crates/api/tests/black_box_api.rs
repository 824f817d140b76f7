use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use repairdesk_api::app;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(demo_data: bool) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let services = app::services::build_services(demo_data).expect("failed to build services");
        let app = app::build_app(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, client: &reqwest::Client, username: &str) -> String {
        let res = client
            .post(self.url("/session"))
            .json(&json!({ "username": username }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn item_quantity(client: &reqwest::Client, srv: &TestServer, token: &str, id: &str) -> i64 {
    let res = client
        .get(srv.url(&format!("/inventory/{id}")))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    body["quantity"].as_i64().unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn(false).await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn session_required_for_protected_endpoints() {
    let srv = TestServer::spawn(true).await;
    let client = reqwest::Client::new();

    for path in ["/whoami", "/orders", "/inventory", "/preferences"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
    }

    let res = client
        .get(srv.url("/orders"))
        .bearer_auth(uuid::Uuid::now_v7().to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_whoami_logout() {
    let srv = TestServer::spawn(false).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/session"))
        .json(&json!({ "username": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let token = srv.login(&client, "tecnico").await;
    let res = client.get(srv.url("/whoami")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["username"], "tecnico");

    let res = client.delete(srv.url("/session")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client.get(srv.url("/whoami")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn theme_preference_toggles() {
    let srv = TestServer::spawn(false).await;
    let client = reqwest::Client::new();
    let token = srv.login(&client, "tecnico").await;

    let body: Value = client
        .get(srv.url("/preferences"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["theme"], "light");

    let body: Value = client
        .post(srv.url("/preferences/theme/toggle"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["theme"], "dark");

    let res = client
        .put(srv.url("/preferences/theme"))
        .bearer_auth(&token)
        .json(&json!({ "theme": "light" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["theme"], "light");
}

#[tokio::test]
async fn order_lifecycle_moves_stock() {
    let srv = TestServer::spawn(false).await;
    let client = reqwest::Client::new();
    let token = srv.login(&client, "tecnico").await;

    // Stock a part.
    let res = client
        .post(srv.url("/inventory"))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Bateria Samsung A51",
            "description": "Bateria original",
            "quantity": 5,
            "unit_price": 12050,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let item: Value = res.json().await.unwrap();
    let item_id = item["id"].as_str().unwrap().to_string();

    // Open an order holding 2.
    let res = client
        .post(srv.url("/orders"))
        .bearer_auth(&token)
        .json(&json!({
            "client_name": "Maria Oliveira",
            "equipment": "Samsung A51",
            "defect": "Não liga",
            "parts": [{ "inventory_item_id": item_id, "quantity": 2 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: Value = res.json().await.unwrap();
    let order_id = order["id"].as_str().unwrap().to_string();
    assert_eq!(order["technician"], "tecnico");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["parts_total"], 24100);
    assert_eq!(item_quantity(&client, &srv, &token, &item_id).await, 3);

    // 2 held + 3 on the shelf: 6 is too many, 5 is fine.
    let edit = |quantity: i64| {
        json!({
            "client_name": "Maria Oliveira",
            "equipment": "Samsung A51",
            "defect": "Não liga",
            "parts": [{ "inventory_item_id": item_id, "quantity": quantity }],
        })
    };
    let res = client
        .put(srv.url(&format!("/orders/{order_id}")))
        .bearer_auth(&token)
        .json(&edit(6))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(body["available"], 5);

    let res = client
        .put(srv.url(&format!("/orders/{order_id}")))
        .bearer_auth(&token)
        .json(&edit(5))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(item_quantity(&client, &srv, &token, &item_id).await, 0);

    // The item cannot go while the order uses it.
    let res = client
        .delete(srv.url(&format!("/inventory/{item_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "item_in_use");

    // Status and payment.
    let res = client
        .put(srv.url(&format!("/orders/{order_id}/status")))
        .bearer_auth(&token)
        .json(&json!({ "status": "in_progress" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status_label"], "In repair");

    let res = client
        .put(srv.url(&format!("/orders/{order_id}/payment")))
        .bearer_auth(&token)
        .json(&json!({ "payment_status": "paid" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Deleting the order gives all 5 back.
    let res = client
        .delete(srv.url(&format!("/orders/{order_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(item_quantity(&client, &srv, &token, &item_id).await, 5);

    let res = client
        .get(srv.url(&format!("/orders/{order_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(srv.url(&format!("/inventory/{item_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn validation_errors_are_400() {
    let srv = TestServer::spawn(false).await;
    let client = reqwest::Client::new();
    let token = srv.login(&client, "tecnico").await;

    let res = client
        .post(srv.url("/orders"))
        .bearer_auth(&token)
        .json(&json!({ "client_name": "", "equipment": "iPhone", "defect": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = client
        .post(srv.url("/inventory"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Tela", "quantity": -1, "unit_price": 100 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(srv.url("/orders/not-a-number"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn stock_limits_are_enforced_without_overflow() {
    let srv = TestServer::spawn(false).await;
    let client = reqwest::Client::new();
    let token = srv.login(&client, "tecnico").await;

    let res = client
        .post(srv.url("/inventory"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Parafuso", "quantity": i64::MAX, "unit_price": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let limit: i64 = 1_000_000;
    let res = client
        .post(srv.url("/inventory"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Parafuso", "quantity": limit, "unit_price": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let item: Value = res.json().await.unwrap();
    let item_id = item["id"].as_str().unwrap().to_string();

    let res = client
        .post(srv.url("/orders"))
        .bearer_auth(&token)
        .json(&json!({
            "client_name": "Oficina Central",
            "equipment": "Notebook Dell",
            "defect": "Carcaça solta",
            "parts": [{ "inventory_item_id": item_id, "quantity": 1 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: Value = res.json().await.unwrap();
    let order_id = order["id"].as_str().unwrap().to_string();

    // Back to the limit while the order still holds one.
    let res = client
        .put(srv.url(&format!("/inventory/{item_id}")))
        .bearer_auth(&token)
        .json(&json!({ "name": "Parafuso", "quantity": limit, "unit_price": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .put(srv.url(&format!("/orders/{order_id}")))
        .bearer_auth(&token)
        .json(&json!({
            "client_name": "Oficina Central",
            "equipment": "Notebook Dell",
            "defect": "Carcaça solta",
            "parts": [{ "inventory_item_id": item_id, "quantity": limit + 2 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["available"], limit + 1);

    let res = client
        .delete(srv.url(&format!("/orders/{order_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(item_quantity(&client, &srv, &token, &item_id).await, limit + 1);
}

#[tokio::test]
async fn demo_data_and_search() {
    let srv = TestServer::spawn(true).await;
    let client = reqwest::Client::new();
    let token = srv.login(&client, "tecnico").await;

    let orders: Vec<Value> = client
        .get(srv.url("/orders"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(orders.len(), 4);

    let found: Vec<Value> = client
        .get(srv.url("/orders?q=MACBOOK"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["client_name"], "Carlos Pereira");

    let items: Vec<Value> = client
        .get(srv.url("/inventory?q=tela"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["reserved"], 1);

    let journal: Value = client
        .get(srv.url("/journal"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(journal["count"], 8);
}
