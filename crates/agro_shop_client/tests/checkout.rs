use std::sync::{Arc, Mutex};

use agro_shop_client::{FileCartStorage, HttpOrderGateway, IDEMPOTENCY_HEADER};
use agro_shop_core::domain::STATUS_PENDING;
use agro_shop_core::{
    CartLine, CartStore, CheckoutDetails, Order, OrderGateway, PaymentMethod, PlaceOrderRequest, PlacedOrder,
    PortError, ShippingAddress,
};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use url::Url;
use uuid::Uuid;

#[derive(Clone, Default)]
struct Seen {
    requests: Arc<Mutex<Vec<(Option<String>, Option<String>, PlaceOrderRequest)>>>,
}

async fn place_order(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Json(request): Json<PlaceOrderRequest>,
) -> (StatusCode, Json<Value>) {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    seen.requests.lock().unwrap().push((
        header("authorization"),
        header(IDEMPOTENCY_HEADER),
        request.clone(),
    ));

    if request.order_items.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "No order items" })));
    }
    if request.shipping_address.address == "down" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "An internal server error occurred" })),
        );
    }

    let now = Utc::now();
    let order = Order {
        id: Uuid::new_v4(),
        user: Uuid::new_v4(),
        order_items: request.order_items,
        shipping_address: request.shipping_address,
        payment_method: request.payment_method,
        items_price: request.prices.items_price,
        tax_price: request.prices.tax_price,
        shipping_price: request.prices.shipping_price,
        total_price: request.prices.total_price,
        status: STATUS_PENDING.into(),
        is_delivered: false,
        idempotency_key: None,
        created_at: now,
        updated_at: now,
    };
    let qr = format!("https://qr.test/?order={}&amount={}", order.id, order.total_price.normalize());
    let placed = PlacedOrder { order, qr: Some(qr) };
    (StatusCode::CREATED, Json(serde_json::to_value(placed).unwrap()))
}

async fn spawn_api() -> (Url, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/api/orders", post(place_order))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (Url::parse(&format!("http://{addr}/api/")).unwrap(), seen)
}

fn seeds() -> CartLine {
    CartLine {
        product: Uuid::new_v4(),
        name: "Hybrid Tomato Seeds".into(),
        image: None,
        price: Decimal::new(100, 0),
        quantity: 2,
    }
}

#[tokio::test]
async fn checkout_over_http_clears_the_persisted_cart() {
    let (base, seen) = spawn_api().await;
    let dir = tempfile::tempdir().unwrap();
    let cart_file = dir.path().join("cart.json");

    let mut cart = CartStore::open(Arc::new(FileCartStorage::new(&cart_file))).unwrap();
    cart.add(seeds()).unwrap();
    assert_eq!(cart.total(), Decimal::new(200, 0));

    let gateway = HttpOrderGateway::new(&base, "token-123").unwrap();
    let details = CheckoutDetails::new(
        ShippingAddress { address: "Survey No. 12, Sangli".into(), ..Default::default() },
        PaymentMethod::Online,
    );
    let placed = cart.checkout(&gateway, &details).await.unwrap().clone();

    assert_eq!(placed.order.total_price, Decimal::new(250, 0));
    let qr = placed.qr.unwrap();
    assert!(qr.contains(&placed.order.id.to_string()));
    assert!(qr.contains("250"));

    let reopened = CartStore::open(Arc::new(FileCartStorage::new(&cart_file))).unwrap();
    assert!(reopened.items().is_empty());

    let requests = seen.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0.as_deref(), Some("Bearer token-123"));
    assert!(requests[0].1.as_deref().is_some_and(|k| Uuid::parse_str(k).is_ok()));
}

#[tokio::test]
async fn server_failure_keeps_the_cart_and_surfaces_the_message() {
    let (base, _seen) = spawn_api().await;
    let dir = tempfile::tempdir().unwrap();
    let cart_file = dir.path().join("cart.json");

    let mut cart = CartStore::open(Arc::new(FileCartStorage::new(&cart_file))).unwrap();
    cart.add(seeds()).unwrap();

    let gateway = HttpOrderGateway::new(&base, "token-123").unwrap();
    let details = CheckoutDetails::new(
        ShippingAddress { address: "down".into(), ..Default::default() },
        PaymentMethod::Cod,
    );
    let err = cart.checkout(&gateway, &details).await.unwrap_err();
    assert_eq!(err, PortError::Unexpected("An internal server error occurred".into()));
    assert_eq!(cart.last_error(), Some("An unexpected error occurred: An internal server error occurred"));

    let reopened = CartStore::open(Arc::new(FileCartStorage::new(&cart_file))).unwrap();
    assert_eq!(reopened.items().len(), 1);
    assert_eq!(reopened.total(), Decimal::new(200, 0));
}

#[tokio::test]
async fn bad_request_maps_to_validation() {
    let (base, _seen) = spawn_api().await;
    let gateway = HttpOrderGateway::new(&base, "token-123").unwrap();
    let request = PlaceOrderRequest {
        order_items: vec![],
        shipping_address: ShippingAddress::default(),
        payment_method: PaymentMethod::Cod,
        prices: Default::default(),
    };
    let err = gateway.place_order(&request, "k").await.unwrap_err();
    assert_eq!(err, PortError::Validation("No order items".into()));
}
