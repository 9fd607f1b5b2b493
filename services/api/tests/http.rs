use std::sync::Arc;
use std::time::Duration;

use agro_shop_core::domain::NewUser;
use agro_shop_core::notify::{Notification, NotificationKind};
use agro_shop_core::ports::{
    DatabaseService, NotificationService, PaymentReferenceService, PortResult,
};
use agro_shop_core::InMemoryDatabase;
use api_lib::adapters::QrPaymentAdapter;
use api_lib::config::Config;
use api_lib::web::auth::hash_password;
use api_lib::web::build_router;
use api_lib::web::state::AppState;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

struct ChannelMailer(mpsc::UnboundedSender<Notification>);

#[async_trait]
impl NotificationService for ChannelMailer {
    async fn send(&self, notification: &Notification) -> PortResult<()> {
        let _ = self.0.send(notification.clone());
        Ok(())
    }
}

struct FakeQr;

impl PaymentReferenceService for FakeQr {
    fn payment_reference(&self, order_id: Uuid, amount: Decimal, payer_email: &str) -> PortResult<String> {
        Ok(format!("qr:{order_id}:{}:{payer_email}", amount.normalize()))
    }
}

struct TestApp {
    router: Router,
    db: Arc<InMemoryDatabase>,
    mail: Mutex<mpsc::UnboundedReceiver<Notification>>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_payments(Arc::new(FakeQr))
    }

    fn with_payments(payments: Arc<dyn PaymentReferenceService>) -> Self {
        let db = Arc::new(InMemoryDatabase::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let state = AppState::new(
            db.clone(),
            Arc::new(Config::default()),
            Arc::new(ChannelMailer(tx)),
            payments,
        );
        Self {
            router: build_router(Arc::new(state)).unwrap(),
            db,
            mail: Mutex::new(rx),
        }
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, value)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, token, None, &[]).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, token, Some(body), &[]).await
    }

    async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, token, Some(body), &[]).await
    }

    async fn register(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "firstName": "Asha",
                    "lastName": "Patil",
                    "email": email,
                    "password": "kisan123",
                    "cityOrVillage": "Baramati"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["_id"].as_str().unwrap().to_string(),
        )
    }

    async fn admin_token(&self) -> String {
        self.db
            .create_user(NewUser {
                first_name: "Store".into(),
                last_name: "Admin".into(),
                email: "admin@agro.test".into(),
                hashed_password: hash_password("admin123").unwrap(),
                is_admin: true,
                city_or_village: None,
                contact_number: None,
            })
            .await
            .unwrap();
        let (status, body) = self
            .post(
                "/api/auth/login",
                None,
                json!({ "email": "admin@agro.test", "password": "admin123" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn next_mail(&self) -> Notification {
        let mut rx = self.mail.lock().await;
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("mail not dispatched")
            .expect("mail channel closed")
    }
}

fn order_body(payment_method: &str) -> Value {
    json!({
        "orderItems": [
            { "product": Uuid::new_v4(), "name": "Bio Fertilizer", "qty": 2, "price": 100, "image": "/img/bio.png" }
        ],
        "shippingAddress": { "address": "Ward 4, Baramati", "city": "Pune", "postalCode": "413102", "country": "India" },
        "paymentMethod": payment_method,
        "itemsPrice": 200,
        "taxPrice": 0,
        "shippingPrice": 50,
        "totalPrice": 250
    })
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn register_login_and_profile() {
    let app = TestApp::new();
    let (token, _) = app.register("asha@example.com").await;

    let welcome = app.next_mail().await;
    assert_eq!(welcome.kind, NotificationKind::Welcome);
    assert_eq!(welcome.to, "asha@example.com");

    let (status, body) = app.get("/api/users/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "asha@example.com");
    assert!(body.get("hashedPassword").is_none());

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "firstName": "A", "lastName": "P", "email": "ASHA@example.com", "password": "kisan123" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "asha@example.com", "password": "wrong-pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, _) = app.post("/api/auth/logout", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.get("/api/users/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, token failed");
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = TestApp::new();
    let (status, body) = app.post("/api/orders", None, order_body("COD")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, no token");
}

#[tokio::test]
async fn online_checkout_returns_order_and_qr_and_clears_server_cart() {
    let app = TestApp::new();
    let (token, user_id) = app.register("ravi@example.com").await;

    let setup = app.admin_token().await;
    let (_, categories) = app
        .post("/api/categories/setup-agriculture", Some(&setup), json!({}))
        .await;
    let category = categories["created"][0]["_id"].as_str().unwrap().to_string();
    let (_, product) = app
        .post(
            "/api/products",
            Some(&setup),
            json!({ "name": "Bio Fertilizer", "price": 100, "category": category, "stock": 10 }),
        )
        .await;
    let product_id = product["_id"].as_str().unwrap();
    let (status, cart) = app
        .post("/api/users/cart", Some(&token), json!({ "productId": product_id, "quantity": 2 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart[0]["quantity"], 2);

    let (status, body) = app.post("/api/orders", Some(&token), order_body("Online")).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order_id = body["order"]["_id"].as_str().unwrap().to_string();
    assert_eq!(body["order"]["user"], user_id.as_str());
    assert_eq!(body["order"]["status"], "Pending");
    assert_eq!(body["order"]["isDelivered"], false);
    assert_eq!(body["order"]["totalPrice"], 250.0);
    let qr = body["qr"].as_str().unwrap();
    assert!(qr.contains(&order_id));
    assert!(qr.contains("250"));

    let (_, profile) = app.get("/api/users/profile", Some(&token)).await;
    assert_eq!(profile["cart"], json!([]));
    assert_eq!(profile["orders"], json!([order_id]));

    let (_, mine) = app.get("/api/orders/my", Some(&token)).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn online_checkout_with_any_total_gets_a_qr_link() {
    let qr = QrPaymentAdapter::new("https://api.qrserver.com/v1/create-qr-code/").unwrap();
    let app = TestApp::with_payments(Arc::new(qr));
    let (token, _) = app.register("negative@example.com").await;
    let mut body = order_body("Online");
    body["totalPrice"] = json!(-5);

    let (status, response) = app.post("/api/orders", Some(&token), body).await;
    assert_eq!(status, StatusCode::CREATED, "{response}");
    assert_eq!(response["order"]["totalPrice"], -5.0);
    let qr = response["qr"].as_str().unwrap();
    assert!(qr.starts_with("https://api.qrserver.com/v1/create-qr-code/?data="));
    assert!(qr.contains("amount%3D-5"));

    let (_, mine) = app.get("/api/orders/my", Some(&token)).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn cart_quantity_is_bounded() {
    let app = TestApp::new();
    let (token, _) = app.register("bulk@example.com").await;
    let setup = app.admin_token().await;
    let (_, categories) = app
        .post("/api/categories/setup-agriculture", Some(&setup), json!({}))
        .await;
    let category = categories["created"][0]["_id"].as_str().unwrap().to_string();
    let (_, product) = app
        .post(
            "/api/products",
            Some(&setup),
            json!({ "name": "Urea", "price": 266, "category": category }),
        )
        .await;
    let product_id = product["_id"].as_str().unwrap();

    let (status, _) = app
        .post("/api/users/cart", Some(&token), json!({ "productId": product_id, "quantity": 4294967295u32 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let max = json!({ "productId": product_id, "quantity": 10000 });
    let (status, _) = app.post("/api/users/cart", Some(&token), max.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.post("/api/users/cart", Some(&token), max).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cart quantity is too large");
}

#[tokio::test]
async fn cash_on_delivery_has_no_qr() {
    let app = TestApp::new();
    let (token, _) = app.register("cod@example.com").await;
    let (status, body) = app.post("/api/orders", Some(&token), order_body("COD")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["qr"].is_null());
}

#[tokio::test]
async fn empty_order_is_rejected_and_nothing_is_stored() {
    let app = TestApp::new();
    let (token, _) = app.register("empty@example.com").await;
    let mut body = order_body("Online");
    body["orderItems"] = json!([]);

    let (status, response) = app.post("/api/orders", Some(&token), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response, json!({ "message": "No order items" }));

    let (_, mine) = app.get("/api/orders/my", Some(&token)).await;
    assert_eq!(mine, json!([]));
}

#[tokio::test]
async fn replayed_checkout_returns_the_original_order() {
    let app = TestApp::new();
    let (token, _) = app.register("retry@example.com").await;
    let key = [("Idempotency-Key", "checkout-7f3a")];

    let (first_status, first) = app
        .call(Method::POST, "/api/orders", Some(&token), Some(order_body("Online")), &key)
        .await;
    let (second_status, second) = app
        .call(Method::POST, "/api/orders", Some(&token), Some(order_body("Online")), &key)
        .await;
    assert_eq!(first_status, StatusCode::CREATED);
    assert_eq!(second_status, StatusCode::CREATED);
    assert_eq!(first["order"]["_id"], second["order"]["_id"]);
    assert_eq!(first["qr"], second["qr"]);

    let (_, mine) = app.get("/api/orders/my", Some(&token)).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn order_visibility_and_admin_status_updates() {
    let app = TestApp::new();
    let (owner, _) = app.register("owner@example.com").await;
    let (stranger, _) = app.register("stranger@example.com").await;
    let admin = app.admin_token().await;

    let (_, placed) = app.post("/api/orders", Some(&owner), order_body("COD")).await;
    let order_id = placed["order"]["_id"].as_str().unwrap().to_string();
    let order_uri = format!("/api/orders/{order_id}");

    let (status, body) = app.get(&order_uri, Some(&owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner"]["name"], "Asha Patil");
    assert_eq!(body["owner"]["email"], "owner@example.com");

    let (status, _) = app.get(&order_uri, Some(&stranger)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get(&order_uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/api/orders", Some(&owner)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized as an admin");

    let status_uri = format!("/api/orders/{order_id}/status");
    let (status, body) = app
        .put(&status_uri, Some(&owner), json!({ "status": "Delivered" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (status, body) = app
        .put(&status_uri, Some(&admin), json!({ "status": "Delivered" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Delivered");
    assert_eq!(body["isDelivered"], true);

    let (status, body) = app
        .put(&status_uri, Some(&admin), json!({ "status": "Returned" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isDelivered"], true);

    let missing = format!("/api/orders/{}/status", Uuid::new_v4());
    let (status, body) = app.put(&missing, Some(&admin), json!({ "status": "Shipped" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order not found");

    let (_, all) = app.get("/api/orders", Some(&admin)).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn suspended_accounts_are_locked_out() {
    let app = TestApp::new();
    let (token, user_id) = app.register("suspend@example.com").await;
    let admin = app.admin_token().await;
    let suspend_uri = format!("/api/admin/users/{user_id}/suspend");

    let (status, body) = app.put(&suspend_uri, Some(&admin), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User suspended");

    let (status, body) = app.get("/api/users/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Your account has been suspended");

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "suspend@example.com", "password": "kisan123" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.put(&suspend_uri, Some(&admin), json!({})).await;
    assert_eq!(body["message"], "User unsuspended");
    let (status, _) = app.get("/api/users/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_cannot_delete_self_or_other_admins() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let (_, me) = app.get("/api/users/profile", Some(&admin)).await;
    let my_id = me["_id"].as_str().unwrap();

    let (status, body) = app
        .call(Method::DELETE, &format!("/api/admin/users/{my_id}"), Some(&admin), None, &[])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You cannot delete your own admin account.");

    let (_, user_id) = app.register("promote@example.com").await;
    let (status, _) = app
        .put(&format!("/api/admin/users/{user_id}"), Some(&admin), json!({ "isAdmin": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app
        .call(Method::DELETE, &format!("/api/admin/users/{user_id}"), Some(&admin), None, &[])
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You cannot delete another admin.");

    let (_, plain_id) = app.register("plain@example.com").await;
    let (status, body) = app
        .call(Method::DELETE, &format!("/api/admin/users/{plain_id}"), Some(&admin), None, &[])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User removed");

    let (_, stats) = app.get("/api/admin/dashboard", Some(&admin)).await;
    assert_eq!(stats["totalUsers"], 2);
    assert_eq!(stats["totalOrders"], 0);
}

#[tokio::test]
async fn categories_products_and_reviews() {
    let app = TestApp::new();
    let admin = app.admin_token().await;

    let (status, body) = app
        .post("/api/categories/setup-agriculture", Some(&admin), json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Agriculture categories processed");
    assert_eq!(body["created"].as_array().unwrap().len(), 4);
    let seeds = body["created"][0]["_id"].as_str().unwrap().to_string();

    let (_, body) = app
        .post("/api/categories/setup-agriculture", Some(&admin), json!({}))
        .await;
    assert_eq!(body["created"], json!([]));
    assert_eq!(body["existing"], json!(["Seeds", "Fertilizers", "Sprayers", "Pesticides"]));

    let (status, body) = app
        .post("/api/categories", Some(&admin), json!({ "name": "Seeds" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Category already exists");

    let (status, product) = app
        .post(
            "/api/products",
            Some(&admin),
            json!({ "name": "Hybrid Tomato Seeds", "description": "50 g", "price": 120, "category": seeds }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{product}");
    let product_uri = format!("/api/products/{}", product["_id"].as_str().unwrap());

    let (_, found) = app.get("/api/products?search=TOMATO", None).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    let (_, found) = app.get("/api/products?search=wheat", None).await;
    assert_eq!(found, json!([]));

    let (token, _) = app.register("reviewer@example.com").await;
    let review_uri = format!("{product_uri}/review");
    let (status, body) = app
        .post(&review_uri, Some(&token), json!({ "rating": 4, "comment": "Good germination" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "message": "Review added" }));

    let (status, body) = app
        .post(&review_uri, Some(&token), json!({ "rating": 5, "comment": "again" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Product already reviewed");

    let (status, _) = app.post(&review_uri, Some(&admin), json!({ "rating": 9 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, product) = app.get(&product_uri, None).await;
    assert_eq!(product["numReviews"], 1);
    assert_eq!(product["rating"], 4.0);
    assert_eq!(product["reviews"][0]["name"], "Asha Patil");

    let (status, body) = app
        .call(Method::DELETE, &product_uri, Some(&admin), None, &[])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product removed");
    let (status, body) = app.get(&product_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
async fn success_stories_need_approval() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let story = json!({
        "name": "Ramesh",
        "location": "Nashik",
        "crop": "Grapes",
        "yieldIncrease": 20,
        "profitIncrease": 15,
        "timeSaved": 5,
        "testimonial": "The sprayer halved my spraying time.",
        "productsUsed": ["Sprayers"]
    });

    let (status, body) = app.post("/api/success-stories", None, story.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["isApproved"], false);
    let story_id = body["data"]["_id"].as_str().unwrap().to_string();

    let mut bad = story.clone();
    bad["productsUsed"] = json!(["Tractors"]);
    let (status, _) = app.post("/api/success-stories", None, bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, public) = app.get("/api/success-stories", None).await;
    assert_eq!(public["count"], 0);

    let (status, _) = app.get("/api/success-stories/admin", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .put(&format!("/api/success-stories/{story_id}/approve"), Some(&admin), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Success story approved successfully");
    assert_eq!(body["data"]["isApproved"], true);

    let (_, public) = app.get("/api/success-stories", None).await;
    assert_eq!(public["count"], 1);

    let (_, body) = app
        .put(&format!("/api/success-stories/{story_id}/reject"), Some(&admin), json!({}))
        .await;
    assert!(body["data"]["approvedAt"].is_null());
    let (_, all) = app.get("/api/success-stories/admin", Some(&admin)).await;
    assert_eq!(all["count"], 1);

    let (status, body) = app
        .put(&format!("/api/success-stories/{}/approve", Uuid::new_v4()), Some(&admin), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Success story not found");
}

#[tokio::test]
async fn password_reset_round_trip() {
    let app = TestApp::new();
    app.register("forgot@example.com").await;
    let _welcome = app.next_mail().await;

    let (status, body) = app
        .post("/api/auth/forgot-password", None, json!({ "email": "nobody@example.com" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No user with that email");

    let (status, _) = app
        .post("/api/auth/forgot-password", None, json!({ "email": "forgot@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let mail = app.next_mail().await;
    assert_eq!(mail.kind, NotificationKind::PasswordReset);
    let marker = "http://localhost:3000/reset-password/";
    let start = mail.html_body.find(marker).unwrap() + marker.len();
    let token: String = mail.html_body[start..].chars().take(64).collect();

    let (status, body) = app
        .post(&format!("/api/auth/reset-password/{token}"), None, json!({ "password": "newpass1" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = app
        .post(&format!("/api/auth/reset-password/{token}"), None, json!({ "password": "newpass2" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid or expired token");

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "forgot@example.com", "password": "newpass1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}
