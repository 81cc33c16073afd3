#![allow(clippy::unwrap_used)]
#![allow(clippy::float_cmp)]

use super::*;
use crate::{errors::Result, test_utils::*};
use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn test_app() -> Result<Router> {
    init_test_tracing();
    let db = setup_test_db().await?;
    Ok(router(AppState::new(db, Arc::new(AppConfig::default()))))
}

/// Request builder for one call against the router.
struct Call {
    method: Method,
    uri: String,
    api_key: Option<String>,
    user_id: Option<i64>,
    body: Option<Value>,
}

impl Call {
    fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            api_key: None,
            user_id: None,
            body: None,
        }
    }

    fn key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    fn as_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    async fn send(self, app: &Router) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(key) = self.api_key {
            builder = builder.header("x-api-key", key);
        }
        if let Some(user_id) = self.user_id {
            builder = builder.header("x-user-id", user_id.to_string());
        }
        let request = match self.body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }
}

/// Signs up through the API and returns `(user id, api key, wallet id)`.
async fn sign_up(app: &Router, email: &str, role: Option<&str>) -> (i64, String, Option<i64>) {
    let mut body = json!({ "email": email, "password": TEST_PASSWORD, "firstName": "Test" });
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    let (status, body) = Call::new(Method::POST, "/api/v1/users")
        .json(body)
        .send(app)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let data = &body["data"];
    (
        data["id"].as_i64().unwrap(),
        data["apiKey"].as_str().unwrap().to_string(),
        data["wallet"]["id"].as_i64(),
    )
}

#[tokio::test]
async fn test_health_needs_no_key() -> Result<()> {
    let app = test_app().await?;

    let (status, body) = Call::new(Method::GET, "/health").send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");

    Ok(())
}

#[tokio::test]
async fn test_api_key_gate() -> Result<()> {
    let app = test_app().await?;

    let (status, body) = Call::new(Method::GET, "/api/v1/wallets").send(&app).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({ "success": false, "data": null, "error": "API-Key Is Required" })
    );

    let (status, body) = Call::new(Method::GET, "/api/v1/wallets")
        .key("sk_live_not_issued")
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid API-Key");

    let (_, key, _) = sign_up(&app, "gate@example.com", None).await;
    let (status, body) = Call::new(Method::GET, "/api/v1/wallets")
        .key(&key)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["pagination"]["total"], 1);

    Ok(())
}

#[tokio::test]
async fn test_signup_is_public_and_rejects_duplicates() -> Result<()> {
    let app = test_app().await?;

    let (status, body) = Call::new(Method::POST, "/api/v1/users")
        .json(json!({ "email": "new.parent@example.com", "password": TEST_PASSWORD }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let data = &body["data"];
    assert_eq!(data["role"], "PARENT");
    assert!(data["apiKey"].as_str().unwrap().starts_with("sk_live_"));
    assert_eq!(data["wallet"]["balance"], 0.0);
    assert!(data.get("passwordHash").is_none());

    let (status, body) = Call::new(Method::POST, "/api/v1/users")
        .json(json!({ "email": "NEW.parent@example.com", "password": TEST_PASSWORD }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());

    let (status, body) = Call::new(Method::POST, "/api/v1/users")
        .json(json!({ "email": "weak@example.com", "password": "123" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    Ok(())
}

#[tokio::test]
async fn test_malformed_input_gets_envelope() -> Result<()> {
    let app = test_app().await?;
    let (_, key, _) = sign_up(&app, "malformed@example.com", None).await;

    let (status, body) = Call::new(Method::POST, "/api/v1/children")
        .key(&key)
        .json(json!({ "name": "No parent" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let (status, body) = Call::new(Method::GET, "/api/v1/children/not-a-number")
        .key(&key)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = Call::new(Method::GET, "/api/v1/transactions")
        .key(&key)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "walletId is required");

    Ok(())
}

#[tokio::test]
async fn test_missing_ids_are_404() -> Result<()> {
    let app = test_app().await?;
    let (_, key, _) = sign_up(&app, "missing@example.com", None).await;

    for (uri, message) in [
        ("/api/v1/users/999", "User not found"),
        ("/api/v1/wallets/999", "Wallet not found"),
        ("/api/v1/wallets/user/999", "Wallet not found"),
        ("/api/v1/children/999", "Child not found"),
        ("/api/v1/transactions?walletId=999", "Wallet not found"),
    ] {
        let (status, body) = Call::new(Method::GET, uri).key(&key).send(&app).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"], message, "{uri}");
    }

    let (status, _) = Call::new(Method::DELETE, "/api/v1/children/999")
        .key(&key)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_parent_funds_wallet_and_transfers_to_child() -> Result<()> {
    let app = test_app().await?;
    let (parent_id, key, wallet_id) = sign_up(&app, "flow@example.com", None).await;
    let wallet_id = wallet_id.unwrap();

    let (status, body) = Call::new(Method::POST, "/api/v1/children")
        .key(&key)
        .json(json!({ "name": "Emma Johnson", "class": "Primary 3", "parentId": parent_id }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let child_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["class"], "Primary 3");

    let (status, body) = Call::new(Method::POST, &format!("/api/v1/wallets/{wallet_id}/fund"))
        .key(&key)
        .json(json!({ "amount": 200.0, "reference": "mm-001" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["wallet"]["balance"], 200.0);
    assert_eq!(body["data"]["transaction"]["type"], "DEPOSIT");

    let (status, body) = Call::new(Method::POST, &format!("/api/v1/wallets/{wallet_id}/transfer"))
        .key(&key)
        .json(json!({ "childId": child_id, "amount": 75.5 }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["wallet"]["balance"], 124.5);
    assert_eq!(body["data"]["child"]["cardBalance"], 75.5);
    assert_eq!(body["data"]["transaction"]["type"], "TRANSFER");
    assert_eq!(body["data"]["transaction"]["status"], "COMPLETED");

    let (status, body) = Call::new(Method::POST, &format!("/api/v1/wallets/{wallet_id}/transfer"))
        .key(&key)
        .json(json!({ "childId": child_id, "amount": 500.0 }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().starts_with("Insufficient funds"));

    let (status, body) = Call::new(Method::POST, &format!("/api/v1/wallets/{wallet_id}/transfer"))
        .key(&key)
        .json(json!({ "childId": child_id, "amount": -5.0 }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = Call::new(Method::GET, &format!("/api/v1/wallets/user/{parent_id}"))
        .key(&key)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["balance"], 124.5);
    assert_eq!(body["data"]["user"]["childProfiles"][0]["id"], child_id);
    assert_eq!(body["data"]["transactions"].as_array().unwrap().len(), 2);

    let (status, body) = Call::new(
        Method::GET,
        &format!("/api/v1/transactions?walletId={wallet_id}&search=transfer&limit=1"),
    )
    .key(&key)
    .send(&app)
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["pagination"],
        json!({ "total": 1, "page": 1, "limit": 1, "totalPages": 1 })
    );

    let (status, body) = Call::new(Method::GET, &format!("/api/v1/children/parent/{parent_id}"))
        .key(&key)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["transactions"].as_array().unwrap().len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_state_clones_share_one_connection() -> Result<()> {
    let db = setup_test_db().await?;
    let state = AppState::new(db, Arc::new(AppConfig::default()));
    let copy = state.clone();

    assert!(Arc::ptr_eq(&state.db, &copy.db));
    copy.db.ping().await?;

    Ok(())
}

#[tokio::test]
async fn test_huge_page_number_returns_empty_page() -> Result<()> {
    let app = test_app().await?;
    let (_, key, _) = sign_up(&app, "pages@example.com", None).await;

    let (status, body) = Call::new(
        Method::GET,
        "/api/v1/wallets?page=9223372036854775807&limit=10",
    )
    .key(&key)
    .send(&app)
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["pagination"]["total"], 1);

    Ok(())
}

#[tokio::test]
async fn test_direct_purchase_with_unknown_canteen_is_404() -> Result<()> {
    let app = test_app().await?;
    let (parent_id, key, wallet_id) = sign_up(&app, "direct@example.com", None).await;
    let wallet_id = wallet_id.unwrap();

    let (_, body) = Call::new(Method::POST, "/api/v1/children")
        .key(&key)
        .json(json!({ "name": "Noah", "class": "Primary 1", "parentId": parent_id }))
        .send(&app)
        .await;
    let child_id = body["data"]["id"].as_i64().unwrap();
    Call::new(Method::POST, &format!("/api/v1/wallets/{wallet_id}/fund"))
        .key(&key)
        .json(json!({ "amount": 20.0 }))
        .send(&app)
        .await;
    Call::new(Method::POST, &format!("/api/v1/wallets/{wallet_id}/transfer"))
        .key(&key)
        .json(json!({ "childId": child_id, "amount": 20.0 }))
        .send(&app)
        .await;

    let (status, body) = Call::new(Method::POST, "/api/v1/transactions")
        .key(&key)
        .json(json!({
            "amount": 5.0,
            "type": "PURCHASE",
            "childProfileId": child_id,
            "canteenId": 999
        }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Canteen not found");

    let (_, body) = Call::new(Method::GET, &format!("/api/v1/children/{child_id}"))
        .key(&key)
        .send(&app)
        .await;
    assert_eq!(body["data"]["cardBalance"], 20.0);

    Ok(())
}

#[tokio::test]
async fn test_only_owner_deletes_wallet() -> Result<()> {
    let app = test_app().await?;
    let (owner_id, key, wallet_id) = sign_up(&app, "owner@example.com", None).await;
    let (intruder_id, _, _) = sign_up(&app, "intruder@example.com", None).await;
    let uri = format!("/api/v1/wallets/{}", wallet_id.unwrap());

    let (status, _) = Call::new(Method::DELETE, &uri)
        .key(&key)
        .as_user(intruder_id)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = Call::new(Method::DELETE, &uri)
        .key(&key)
        .as_user(owner_id)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["userId"], owner_id);

    let (status, _) = Call::new(Method::GET, &uri).key(&key).send(&app).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_canteen_routes_require_manager() -> Result<()> {
    let app = test_app().await?;
    let (parent_id, parent_key, _) = sign_up(&app, "parent@example.com", None).await;
    let (manager_id, manager_key, manager_wallet) =
        sign_up(&app, "cook@school.edu", Some("CANTEEN_MANAGER")).await;
    assert!(manager_wallet.is_none());

    let (status, body) = Call::new(Method::GET, "/api/v1/canteen/products")
        .key(&parent_key)
        .as_user(parent_id)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only canteen managers can access this data");

    let (status, body) = Call::new(Method::GET, "/api/v1/canteen/products")
        .key(&manager_key)
        .as_user(manager_id)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Canteen not found");

    let (status, _) = Call::new(Method::GET, "/api/v1/canteen/children")
        .key(&manager_key)
        .as_user(0)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Without x-user-id the key owner acts
    let (status, body) = Call::new(Method::POST, "/api/v1/canteen")
        .key(&manager_key)
        .json(json!({ "name": "Main Hall", "location": "Block B" }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["managerId"], manager_id);

    Ok(())
}

#[tokio::test]
async fn test_canteen_checkout() -> Result<()> {
    let app = test_app().await?;
    let (parent_id, parent_key, wallet_id) = sign_up(&app, "lunch@example.com", None).await;
    let wallet_id = wallet_id.unwrap();
    let (manager_id, manager_key, _) =
        sign_up(&app, "kitchen@school.edu", Some("CANTEEN_OPERATOR")).await;

    Call::new(Method::POST, "/api/v1/canteen")
        .key(&manager_key)
        .as_user(manager_id)
        .json(json!({ "name": "Main Canteen" }))
        .send(&app)
        .await;

    let (status, body) = Call::new(Method::POST, "/api/v1/canteen/products")
        .key(&manager_key)
        .as_user(manager_id)
        .json(json!({ "name": "Rice and beans", "price": 3.0 }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let rice_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = Call::new(Method::POST, "/api/v1/canteen/products")
        .key(&manager_key)
        .as_user(manager_id)
        .json(json!({ "name": "X", "price": 1.0 }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = Call::new(Method::POST, "/api/v1/children")
        .key(&parent_key)
        .json(json!({ "name": "Ethan", "class": "Primary 5", "parentId": parent_id }))
        .send(&app)
        .await;
    let child_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = Call::new(Method::POST, "/api/v1/transactions")
        .key(&parent_key)
        .json(json!({ "amount": 10.0, "type": "DEPOSIT", "walletId": wallet_id }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    Call::new(Method::POST, &format!("/api/v1/wallets/{wallet_id}/transfer"))
        .key(&parent_key)
        .json(json!({ "childId": child_id, "amount": 7.0 }))
        .send(&app)
        .await;

    let (status, body) = Call::new(Method::GET, "/api/v1/canteen/children")
        .key(&manager_key)
        .as_user(manager_id)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["cardBalance"], 7.0);

    let (status, body) = Call::new(Method::POST, "/api/v1/canteen/transaction")
        .key(&manager_key)
        .as_user(manager_id)
        .json(json!({ "childId": child_id, "productIds": [rice_id, rice_id] }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["total"], 6.0);
    assert_eq!(body["data"]["child"]["cardBalance"], 1.0);
    assert_eq!(body["data"]["transactions"].as_array().unwrap().len(), 2);

    let (status, body) = Call::new(Method::POST, "/api/v1/canteen/transaction")
        .key(&manager_key)
        .as_user(manager_id)
        .json(json!({ "childId": child_id, "productIds": [rice_id] }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);

    let (status, body) = Call::new(Method::PATCH, &format!("/api/v1/canteen/products/{rice_id}"))
        .key(&manager_key)
        .as_user(manager_id)
        .json(json!({ "isAvailable": false }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isAvailable"], false);

    let (status, body) = Call::new(Method::GET, "/api/v1/canteen/products")
        .key(&manager_key)
        .as_user(manager_id)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    Ok(())
}
