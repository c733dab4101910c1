//! Mock BBHCBazaar backend for end-to-end storefront tests.
//!
//! [`MockBackend::start`] serves the REST API under `/api` and the realtime
//! socket at `/ws` on an ephemeral local port. Tests seed and inspect its
//! state directly, inject failures per route, and push realtime frames.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `api_client` - Envelopes, error messages and token refresh
//! - `auth` - Login, restore and logout
//! - `catalog` - Cached catalog reads and filtering
//! - `wishlist` / `bag` - Optimistic mutations and their rollback
//! - `checkout` - Orders from the bag
//! - `realtime` - Socket pushes merged into the store

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, Request, State};
use axum::http::{Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use bazaar_storefront::config::StorefrontConfig;
use bazaar_storefront::storage::{MemoryTokenStorage, TokenStorage};
use bazaar_storefront::{AppState, StorefrontError};
use serde_json::{Map, Value, json};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Password the mock accepts for every account.
pub const PASSWORD: &str = "secret";

// =============================================================================
// Backend state
// =============================================================================

/// Everything the mock backend knows. Fields are public so tests can seed
/// and inspect them through [`MockBackend::with`].
#[derive(Debug)]
pub struct Backend {
    /// Product payloads in wire shape.
    pub products: Vec<Value>,
    pub categories: Vec<Value>,
    /// Wishlisted product IDs.
    pub wishlist: Vec<String>,
    /// Bag line payloads, without product snapshots.
    pub bag: Vec<Value>,
    pub orders: Vec<Value>,
    /// Other customers' star values per product.
    pub ratings: HashMap<String, Vec<u8>>,
    /// The signed-in customer's `(stars, review)` per product.
    pub my_ratings: HashMap<String, (u8, Option<String>)>,
    pub user: Value,
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_calls: usize,
    /// `"METHOD /path"` of every request received, in order.
    pub requests: Vec<String>,
    /// Routes (`"METHOD /path"`) that answer 500 until cleared.
    pub failures: HashSet<String>,
    /// Delay applied to bag quantity updates.
    pub bag_update_delay: Option<Duration>,
    /// Open socket connections.
    pub ws_clients: usize,
    /// Socket connections accepted so far.
    pub ws_connects: usize,
    next_id: u64,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            categories: vec![
                json!({"id": "1", "name": "Fashion", "commission_rate": 10}),
                json!({"id": "2", "name": "Home & Decor", "commission_rate": 5}),
            ],
            wishlist: Vec::new(),
            bag: Vec::new(),
            orders: Vec::new(),
            ratings: HashMap::new(),
            my_ratings: HashMap::new(),
            user: json!({
                "id": 7,
                "email": "asha@example.com",
                "first_name": "Asha",
                "last_name": "Rao",
                "user_type": "user",
            }),
            access_token: "access-0".to_string(),
            refresh_token: "refresh-0".to_string(),
            refresh_calls: 0,
            requests: Vec::new(),
            failures: HashSet::new(),
            bag_update_delay: None,
            ws_clients: 0,
            ws_connects: 0,
            next_id: 100,
        }
    }
}

impl Backend {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn product_index(&self, id: &str) -> Option<usize> {
        self.products.iter().position(|p| id_of(&p["id"]) == id)
    }

    fn product(&self, id: &str) -> Option<&Value> {
        self.product_index(id).and_then(|i| self.products.get(i))
    }

    /// Bag line with the current product attached, as the backend sends it.
    fn bag_line(&self, line: &Value) -> Value {
        let mut line = line.clone();
        if let Some(product) = self.product(&id_of(&line["product_id"])) {
            line["product"] = product.clone();
        }
        line
    }

    fn rating_stats(&self, product_id: &str) -> Value {
        let mut stars: Vec<u8> = self.ratings.get(product_id).cloned().unwrap_or_default();
        if let Some((mine, _)) = self.my_ratings.get(product_id) {
            stars.push(*mine);
        }
        let total = stars.len();
        let average = if total == 0 {
            0.0
        } else {
            stars.iter().map(|s| f64::from(*s)).sum::<f64>() / total as f64
        };
        let mut distribution = Map::new();
        for star in 1..=5u8 {
            let count = stars.iter().filter(|s| **s == star).count();
            distribution.insert(star.to_string(), json!(count));
        }
        json!({
            "total_ratings": total,
            "average_rating": average,
            "star_distribution": distribution,
        })
    }
}

/// Wire IDs arrive as strings or numbers.
#[must_use]
pub fn id_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// An approved product payload in the backend's wire shape.
#[must_use]
pub fn product_json(id: &str, name: &str, selling: u32, max: u32) -> Value {
    json!({
        "id": id,
        "product_name": name,
        "specification": format!("{name} specification"),
        "points": [],
        "selling_price": selling,
        "max_price": max,
        "stock_quantity": 10,
        "categories": [],
        "approval_status": "approved",
    })
}

// =============================================================================
// Server
// =============================================================================

#[derive(Debug, Clone)]
enum SocketCommand {
    Send(String),
    Close,
}

#[derive(Clone)]
struct Shared {
    backend: Arc<Mutex<Backend>>,
    sockets: broadcast::Sender<SocketCommand>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A running mock backend. The server stops when the test runtime ends.
pub struct MockBackend {
    addr: SocketAddr,
    shared: Shared,
}

impl MockBackend {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let (sockets, _) = broadcast::channel(64);
        let shared = Shared {
            backend: Arc::new(Mutex::new(Backend::default())),
            sockets,
        };

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/auth/refresh", post(refresh))
            .route("/api/auth/me", get(me))
            .route("/api/products", get(list_products).post(create_product))
            .route("/api/products/pending", get(pending_products))
            .route(
                "/api/products/{id}",
                get(get_product).put(update_product).delete(delete_product),
            )
            .route("/api/products/{id}/approve", post(approve_product))
            .route("/api/products/{id}/reject", post(reject_product))
            .route("/api/products/{id}/ratings", post(submit_rating))
            .route("/api/products/{id}/ratings/me", get(my_rating))
            .route("/api/products/{id}/ratings/stats", get(rating_stats))
            .route("/api/categories", get(list_categories))
            .route("/api/categories/commissions", get(commissions))
            .route("/api/bag", get(get_bag).post(add_to_bag))
            .route("/api/bag/clear", delete(clear_bag))
            .route("/api/bag/{id}", put(update_bag_line).delete(remove_bag_line))
            .route("/api/wishlist", get(get_wishlist).post(add_to_wishlist))
            .route("/api/wishlist/{id}", delete(remove_from_wishlist))
            .route("/api/orders", get(list_orders).post(create_order))
            .route("/ws", get(socket_upgrade))
            .layer(middleware::from_fn_with_state(shared.clone(), gatekeeper))
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, shared })
    }

    /// Backend origin, e.g. `http://127.0.0.1:41234`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Storefront state pointed at this backend with in-memory token
    /// storage and quick reconnects.
    ///
    /// # Errors
    ///
    /// Returns an error if the storefront cannot be built.
    pub fn storefront(&self) -> Result<AppState, StorefrontError> {
        self.storefront_with(Arc::new(MemoryTokenStorage::new()))
    }

    /// Like [`storefront`](Self::storefront) over the given storage, so a
    /// test can simulate a restart.
    ///
    /// # Errors
    ///
    /// Returns an error if the storefront cannot be built.
    pub fn storefront_with(&self, storage: Arc<dyn TokenStorage>) -> Result<AppState, StorefrontError> {
        let mut config = StorefrontConfig::for_backend(&self.url())?;
        config.request_timeout = Duration::from_secs(5);
        config.realtime.reconnect_delay = Duration::from_millis(50);
        config.realtime.connect_timeout = Duration::from_secs(5);
        AppState::with_storage(config, storage)
    }

    /// Read or mutate backend state.
    pub fn with<R>(&self, f: impl FnOnce(&mut Backend) -> R) -> R {
        f(&mut self.shared.lock())
    }

    pub fn add_product(&self, product: Value) {
        self.with(|b| b.products.push(product));
    }

    /// Number of requests received for `"METHOD /path"`.
    #[must_use]
    pub fn count(&self, route: &str) -> usize {
        self.with(|b| b.requests.iter().filter(|r| *r == route).count())
    }

    /// Make `"METHOD /path"` answer 500 until [`recover`](Self::recover).
    pub fn fail(&self, route: &str) {
        self.with(|b| b.failures.insert(route.to_string()));
    }

    pub fn recover(&self, route: &str) {
        self.with(|b| b.failures.remove(route));
    }

    /// Invalidate the current access token; the refresh token still works.
    pub fn expire_access_token(&self) {
        self.with(|b| b.access_token = format!("expired-{}", b.next_id()));
    }

    /// Invalidate both tokens.
    pub fn revoke_session(&self) {
        self.with(|b| {
            b.access_token = format!("revoked-{}", b.next_id());
            b.refresh_token = format!("revoked-{}", b.next_id());
        });
    }

    /// Push a realtime frame to every connected socket. Returns how many
    /// sockets were listening.
    pub fn push(&self, event: &str, data: Value) -> usize {
        let frame = json!({ "event": event, "data": data }).to_string();
        self.shared
            .sockets
            .send(SocketCommand::Send(frame))
            .unwrap_or_default()
    }

    /// Push a raw text frame.
    pub fn push_raw(&self, text: &str) -> usize {
        self.shared
            .sockets
            .send(SocketCommand::Send(text.to_string()))
            .unwrap_or_default()
    }

    /// Close every open socket from the server side.
    pub fn drop_sockets(&self) {
        let _ = self.shared.sockets.send(SocketCommand::Close);
    }
}

/// Poll `condition` every 10ms for up to five seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..500 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

// =============================================================================
// Middleware
// =============================================================================

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn error(status: StatusCode, message: &str) -> Response {
    reply(status, json!({ "error": message }))
}

/// Routes anyone may call without a token.
fn is_public(method: &Method, path: &str) -> bool {
    if matches!(
        path,
        "/api/auth/login" | "/api/auth/register" | "/api/auth/refresh" | "/ws"
    ) {
        return true;
    }
    *method == Method::GET
        && (path.starts_with("/api/categories")
            || (path.starts_with("/api/products")
                && path != "/api/products/pending"
                && !path.ends_with("/ratings/me")))
}

/// Records the request, applies injected failures and checks the bearer
/// token on protected routes.
async fn gatekeeper(State(shared): State<Shared>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let route = format!("{} {path}", request.method());
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    {
        let mut backend = shared.lock();
        backend.requests.push(route.clone());
        if backend.failures.contains(&route) {
            return error(StatusCode::INTERNAL_SERVER_ERROR, "Injected failure");
        }
        if !is_public(request.method(), &path) {
            match bearer {
                None => {
                    return reply(
                        StatusCode::UNAUTHORIZED,
                        json!({ "msg": "Missing Authorization Header" }),
                    );
                }
                Some(token) if token != backend.access_token => {
                    return reply(StatusCode::UNAUTHORIZED, json!({ "msg": "Token has expired" }));
                }
                Some(_) => {}
            }
        }
    }

    next.run(request).await
}

// =============================================================================
// Auth
// =============================================================================

async fn login(State(shared): State<Shared>, Json(body): Json<Value>) -> Response {
    if body["password"].as_str() != Some(PASSWORD) {
        return error(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    let mut backend = shared.lock();
    backend.access_token = format!("access-{}", backend.next_id());
    let mut user = backend.user.clone();
    user["email"] = body["email"].clone();
    reply(
        StatusCode::OK,
        json!({
            "user": user,
            "access_token": backend.access_token,
            "refresh_token": backend.refresh_token,
        }),
    )
}

async fn refresh(State(shared): State<Shared>, request: Request) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    let mut backend = shared.lock();
    if presented.as_deref() != Some(backend.refresh_token.as_str()) {
        return reply(StatusCode::UNAUTHORIZED, json!({ "msg": "Token has been revoked" }));
    }
    backend.refresh_calls += 1;
    backend.access_token = format!("access-{}", backend.next_id());
    reply(StatusCode::OK, json!({ "access_token": backend.access_token }))
}

/// Creates the account and makes it the signed-in user.
async fn register(State(shared): State<Shared>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if email.is_empty() || body["password"].as_str().is_none_or(str::is_empty) {
        return error(StatusCode::BAD_REQUEST, "Email and password are required");
    }
    let mut backend = shared.lock();
    if backend.user["email"].as_str() == Some(email.as_str()) {
        return error(StatusCode::CONFLICT, "User with this email already exists");
    }

    let username = body["username"].as_str().map_or_else(
        || email.split('@').next().unwrap_or_default().to_string(),
        str::to_string,
    );
    let id = backend.next_id();
    backend.user = json!({
        "id": id,
        "email": email,
        "username": username,
        "first_name": body["first_name"],
        "last_name": body["last_name"],
        "user_type": "user",
    });
    backend.access_token = format!("access-{}", backend.next_id());
    reply(
        StatusCode::CREATED,
        json!({
            "message": "User created successfully",
            "user": backend.user,
            "access_token": backend.access_token,
            "refresh_token": backend.refresh_token,
        }),
    )
}

async fn me(State(shared): State<Shared>) -> Response {
    reply(StatusCode::OK, json!({ "user": shared.lock().user }))
}

// =============================================================================
// Products
// =============================================================================

fn matches_query(product: &Value, params: &HashMap<String, String>) -> bool {
    let search_ok = params.get("search").is_none_or(|q| {
        product["product_name"]
            .as_str()
            .is_some_and(|n| n.to_lowercase().contains(&q.to_lowercase()))
    });
    let category_ok = params.get("category").is_none_or(|c| {
        product["categories"].as_array().is_some_and(|cats| {
            cats.iter()
                .any(|cat| cat["name"].as_str().is_some_and(|n| n.eq_ignore_ascii_case(c)))
        })
    });
    search_ok && category_ok
}

async fn list_products(
    State(shared): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let backend = shared.lock();
    let products: Vec<Value> = backend
        .products
        .iter()
        .filter(|p| matches_query(p, &params))
        .cloned()
        .collect();
    reply(StatusCode::OK, json!({ "products": products }))
}

async fn pending_products(State(shared): State<Shared>) -> Response {
    let backend = shared.lock();
    let products: Vec<Value> = backend
        .products
        .iter()
        .filter(|p| p["approval_status"] == "pending")
        .cloned()
        .collect();
    reply(StatusCode::OK, json!({ "products": products }))
}

async fn get_product(State(shared): State<Shared>, Path(id): Path<String>) -> Response {
    match shared.lock().product(&id) {
        Some(product) => reply(StatusCode::OK, json!({ "product": product })),
        None => error(StatusCode::NOT_FOUND, "Product not found"),
    }
}

async fn create_product(State(shared): State<Shared>, Json(mut body): Json<Value>) -> Response {
    let mut backend = shared.lock();
    body["id"] = json!(backend.next_id());
    body["approval_status"] = json!("pending");
    backend.products.push(body.clone());
    reply(StatusCode::CREATED, json!({ "product": body }))
}

async fn update_product(
    State(shared): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = shared.lock();
    let Some(product) = backend
        .product_index(&id)
        .and_then(|i| backend.products.get_mut(i))
    else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    if let (Some(target), Some(fields)) = (product.as_object_mut(), body.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
    reply(StatusCode::OK, json!({ "product": product }))
}

async fn delete_product(State(shared): State<Shared>, Path(id): Path<String>) -> Response {
    let mut backend = shared.lock();
    let Some(index) = backend.product_index(&id) else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    backend.products.remove(index);
    reply(StatusCode::OK, json!({ "message": "Product deleted" }))
}

fn set_status(shared: &Shared, id: &str, status: &str, reason: Option<Value>) -> Response {
    let mut backend = shared.lock();
    let Some(product) = backend
        .product_index(id)
        .and_then(|i| backend.products.get_mut(i))
    else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    product["approval_status"] = json!(status);
    if let Some(reason) = reason {
        product["rejection_reason"] = reason;
    }
    reply(StatusCode::OK, json!({ "message": format!("Product {status}") }))
}

async fn approve_product(State(shared): State<Shared>, Path(id): Path<String>) -> Response {
    set_status(&shared, &id, "approved", None)
}

async fn reject_product(
    State(shared): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    set_status(&shared, &id, "rejected", body.get("reason").cloned())
}

// =============================================================================
// Ratings
// =============================================================================

async fn submit_rating(
    State(shared): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let Some(stars) = body["rating"]
        .as_u64()
        .and_then(|r| u8::try_from(r).ok())
        .filter(|r| (1..=5).contains(r))
    else {
        return error(StatusCode::BAD_REQUEST, "Rating must be between 1 and 5");
    };
    let review = body["review_text"].as_str().map(str::to_string);
    let mut backend = shared.lock();
    if backend.product(&id).is_none() {
        return error(StatusCode::NOT_FOUND, "Product not found");
    }
    backend.my_ratings.insert(id.clone(), (stars, review.clone()));
    reply(
        StatusCode::CREATED,
        json!({ "rating": { "id": backend.next_id(), "product_id": id, "rating": stars, "review_text": review } }),
    )
}

async fn my_rating(State(shared): State<Shared>, Path(id): Path<String>) -> Response {
    let backend = shared.lock();
    let rating = backend.my_ratings.get(&id).map(|(stars, review)| {
        json!({ "product_id": id, "rating": stars, "review_text": review })
    });
    reply(StatusCode::OK, json!({ "rating": rating }))
}

async fn rating_stats(State(shared): State<Shared>, Path(id): Path<String>) -> Response {
    reply(StatusCode::OK, json!({ "stats": shared.lock().rating_stats(&id) }))
}

// =============================================================================
// Categories
// =============================================================================

async fn list_categories(State(shared): State<Shared>) -> Response {
    reply(StatusCode::OK, json!({ "categories": shared.lock().categories }))
}

async fn commissions(State(shared): State<Shared>) -> Response {
    let backend = shared.lock();
    let rows: Vec<Value> = backend
        .categories
        .iter()
        .map(|c| {
            json!({
                "category_id": c["id"],
                "category_name": c["name"],
                "commission_rate": c["commission_rate"],
            })
        })
        .collect();
    reply(StatusCode::OK, json!({ "commissions": rows }))
}

// =============================================================================
// Bag
// =============================================================================

fn bag_index(backend: &Backend, id: &str) -> Option<usize> {
    backend.bag.iter().position(|line| id_of(&line["id"]) == id)
}

async fn get_bag(State(shared): State<Shared>) -> Response {
    let backend = shared.lock();
    let lines: Vec<Value> = backend.bag.iter().map(|l| backend.bag_line(l)).collect();
    reply(StatusCode::OK, json!({ "bag_items": lines }))
}

async fn add_to_bag(State(shared): State<Shared>, Json(body): Json<Value>) -> Response {
    let product_id = id_of(&body["product_id"]);
    let quantity = body["quantity"].as_u64().unwrap_or(1);
    let mut backend = shared.lock();
    if backend.product(&product_id).is_none() {
        return error(StatusCode::NOT_FOUND, "Product not found");
    }

    let same_line = |line: &Value| {
        id_of(&line["product_id"]) == product_id
            && line["selected_size"] == body["selected_size"]
            && line["selected_color"] == body["selected_color"]
    };
    let line = if let Some(line) = backend.bag.iter_mut().find(|l| same_line(l)) {
        let merged = line["quantity"].as_u64().unwrap_or(0) + quantity;
        line["quantity"] = json!(merged);
        line.clone()
    } else {
        let line = json!({
            "id": backend.next_id(),
            "product_id": product_id,
            "quantity": quantity,
            "selected_size": body["selected_size"],
            "selected_color": body["selected_color"],
        });
        backend.bag.push(line.clone());
        line
    };
    reply(StatusCode::CREATED, json!({ "bag_item": backend.bag_line(&line) }))
}

async fn update_bag_line(
    State(shared): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let delay = shared.lock().bag_update_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let Some(quantity) = body["quantity"].as_u64().filter(|q| *q >= 1) else {
        return error(StatusCode::BAD_REQUEST, "Quantity must be at least 1");
    };
    let mut backend = shared.lock();
    let Some(index) = bag_index(&backend, &id) else {
        return error(StatusCode::NOT_FOUND, "Bag item not found");
    };
    let Some(line) = backend.bag.get_mut(index) else {
        return error(StatusCode::NOT_FOUND, "Bag item not found");
    };
    line["quantity"] = json!(quantity);
    let line = line.clone();
    reply(StatusCode::OK, json!({ "bag_item": backend.bag_line(&line) }))
}

async fn remove_bag_line(State(shared): State<Shared>, Path(id): Path<String>) -> Response {
    let mut backend = shared.lock();
    let Some(index) = bag_index(&backend, &id) else {
        return error(StatusCode::NOT_FOUND, "Bag item not found");
    };
    backend.bag.remove(index);
    reply(StatusCode::OK, json!({ "message": "Item removed from bag" }))
}

async fn clear_bag(State(shared): State<Shared>) -> Response {
    shared.lock().bag.clear();
    reply(StatusCode::OK, json!({ "message": "Bag cleared" }))
}

// =============================================================================
// Wishlist
// =============================================================================

async fn get_wishlist(State(shared): State<Shared>) -> Response {
    let backend = shared.lock();
    let entries: Vec<Value> = backend
        .wishlist
        .iter()
        .map(|id| json!({ "product_id": id }))
        .collect();
    reply(StatusCode::OK, json!({ "wishlist": entries }))
}

async fn add_to_wishlist(State(shared): State<Shared>, Json(body): Json<Value>) -> Response {
    let product_id = id_of(&body["product_id"]);
    let mut backend = shared.lock();
    if backend.wishlist.contains(&product_id) {
        return error(StatusCode::BAD_REQUEST, "Product already in wishlist");
    }
    backend.wishlist.push(product_id);
    reply(StatusCode::CREATED, json!({ "message": "Added to wishlist" }))
}

async fn remove_from_wishlist(State(shared): State<Shared>, Path(id): Path<String>) -> Response {
    let mut backend = shared.lock();
    let before = backend.wishlist.len();
    backend.wishlist.retain(|p| *p != id);
    if backend.wishlist.len() == before {
        return error(StatusCode::NOT_FOUND, "Product not in wishlist");
    }
    reply(StatusCode::OK, json!({ "message": "Removed from wishlist" }))
}

// =============================================================================
// Orders
// =============================================================================

async fn create_order(State(shared): State<Shared>, Json(body): Json<Value>) -> Response {
    let product_id = id_of(&body["product_id"]);
    let quantity = body["quantity"].as_u64().unwrap_or(1);
    let mut backend = shared.lock();
    let Some(index) = backend.product_index(&product_id) else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    let Some(product) = backend.products.get_mut(index) else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    let stock = product["stock_quantity"].as_u64().unwrap_or(0);
    if stock < quantity {
        return error(StatusCode::BAD_REQUEST, "Insufficient stock");
    }
    product["stock_quantity"] = json!(stock - quantity);
    let unit = product["selling_price"].as_f64().unwrap_or_default();

    let id = backend.next_id();
    let order = json!({
        "id": id,
        "order_number": format!("BZ-{id}"),
        "product_id": product_id,
        "quantity": quantity,
        "status": "pending",
        "total_amount": unit * quantity as f64,
        "qr_code_data": format!("bbhc-pickup:{id}"),
        "pickup_location": body["pickup_location"],
    });
    backend.orders.push(order.clone());
    reply(StatusCode::CREATED, json!({ "order": order }))
}

async fn list_orders(State(shared): State<Shared>) -> Response {
    reply(StatusCode::OK, json!({ "orders": shared.lock().orders }))
}

// =============================================================================
// Realtime socket
// =============================================================================

async fn socket_upgrade(
    State(shared): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    upgrade: WebSocketUpgrade,
) -> Response {
    let authorized = params.get("token") == Some(&shared.lock().access_token);
    if !authorized {
        return error(StatusCode::UNAUTHORIZED, "Invalid token");
    }
    upgrade.on_upgrade(move |socket| serve_socket(shared, socket))
}

async fn serve_socket(shared: Shared, mut socket: WebSocket) {
    let mut commands = shared.sockets.subscribe();
    {
        let mut backend = shared.lock();
        backend.ws_clients += 1;
        backend.ws_connects += 1;
    }

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Ok(SocketCommand::Send(text)) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Ok(SocketCommand::Close) | Err(RecvError::Closed) => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                Err(RecvError::Lagged(_)) => {}
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    shared.lock().ws_clients -= 1;
}
