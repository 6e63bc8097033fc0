//! Shared test utilities: a scripted HTTP backend on localhost.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use futures_util::stream;
use reqwest::Url;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use tradedesk::api::ApiClient;
use tradedesk::config::BackendConfig;

pub const TEST_API_KEY: &str = "test-api-key";

/// A request as the stub server received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path relative to the `/api/` base, e.g. `APIServices/buy`.
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decodes an `application/x-www-form-urlencoded` body.
    pub fn form(&self) -> HashMap<String, String> {
        let url = Url::parse(&format!("http://form.invalid/?{}", self.body)).expect("form body");
        url.query_pairs().into_owned().collect()
    }
}

/// How the stub answers one request.
#[derive(Debug, Clone)]
enum Reply {
    Full(StatusCode, String),
    /// Announces more body bytes than it sends, then closes.
    Truncated(StatusCode, String),
    /// Never answers.
    Hang,
}

type Routes = HashMap<(Method, String), VecDeque<Reply>>;

#[derive(Clone, Default)]
struct StubState {
    routes: Arc<Mutex<Routes>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Answers each `(method, path)` with scripted responses in order; the last
/// one repeats. Unscripted requests get a 404.
pub struct StubServer {
    addr: SocketAddr,
    state: StubState,
    task: JoinHandle<()>,
}

impl StubServer {
    pub async fn start() -> Self {
        let state = StubState::default();
        let app = Router::new().fallback(scripted).with_state(state.clone());
        let (addr, task) = serve(app).await;
        Self { addr, state, task }
    }

    /// Scripts the next response for `method path`.
    pub fn respond(&self, method: &str, path: &str, status: u16, body: &str) -> &Self {
        self.script(method, path, Reply::Full(status_code(status), body.to_string()))
    }

    /// Scripts a response whose body breaks off after the status line.
    pub fn respond_truncated(&self, method: &str, path: &str, status: u16, body: &str) -> &Self {
        self.script(method, path, Reply::Truncated(status_code(status), body.to_string()))
    }

    /// Scripts a request that is accepted but never answered.
    pub fn hang(&self, method: &str, path: &str) -> &Self {
        self.script(method, path, Reply::Hang)
    }

    fn script(&self, method: &str, path: &str, reply: Reply) -> &Self {
        let method = Method::from_bytes(method.as_bytes()).expect("http method");
        self.state
            .routes
            .lock()
            .expect("routes lock")
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api/", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().expect("requests lock").clone()
    }

    /// Requests received for one path.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn backend_config(&self, api_key: Option<&str>) -> BackendConfig {
        BackendConfig {
            api_url: self.base_url(),
            api_key: api_key.map(str::to_string),
            timeout: Duration::from_secs(5),
        }
    }

    /// Like [`backend_config`](Self::backend_config) with a short timeout,
    /// for requests scripted to hang.
    pub fn impatient_config(&self, api_key: Option<&str>) -> BackendConfig {
        BackendConfig {
            timeout: Duration::from_millis(300),
            ..self.backend_config(api_key)
        }
    }

    /// A client already holding [`TEST_API_KEY`].
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.backend_config(Some(TEST_API_KEY))).expect("client")
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).expect("http status")
}

async fn scripted(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri.path().trim_start_matches("/api/").to_string();

    let reply = {
        let mut routes = state.routes.lock().expect("routes lock");
        match routes.get_mut(&(method.clone(), path.clone())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().expect("non-empty queue"),
            Some(queue) => queue.front().cloned().expect("non-empty queue"),
            None => Reply::Full(StatusCode::NOT_FOUND, "\"not found\"".to_string()),
        }
    };

    state
        .requests
        .lock()
        .expect("requests lock")
        .push(RecordedRequest {
            method,
            path,
            headers,
            body,
        });

    match reply {
        Reply::Full(status, body) => {
            (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        Reply::Truncated(status, body) => {
            // A streamed body has no known length, so the announced one wins.
            let announced = (body.len() + 64).to_string();
            let chunks = stream::once(async move { Ok::<_, std::io::Error>(body) });
            let body = Body::from_stream(chunks);
            (status, [(header::CONTENT_LENGTH, announced)], body).into_response()
        }
        Reply::Hang => std::future::pending::<Response>().await,
    }
}

async fn serve(app: Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub server");
    let addr = listener.local_addr().expect("local addr");
    let task = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, task)
}

/// Accepts requests and never answers. Returns the base URL.
pub async fn silent_server() -> (String, JoinHandle<()>) {
    let app = Router::new().fallback(|| std::future::pending::<StatusCode>());
    let (addr, task) = serve(app).await;
    (format!("http://{addr}/api/"), task)
}

/// A base URL nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}/api/")
}

/// A wallet body in the backend's account-row shape.
pub fn wallet_json(balance: &str, bitcoin: &str, ethereum: &str) -> String {
    format!(
        r#"{{"walletBalance": {{
            "walletId": "w-1", "balance": {balance},
            "bitcoin": {bitcoin}, "ethereum": {ethereum}, "otherCrypto": 0
        }}}}"#
    )
}

/// A wallet body that also holds `other` in the catch-all column.
pub fn wallet_with_other_json(balance: &str, other: &str) -> String {
    format!(
        r#"{{"walletBalance": {{
            "walletId": "w-1", "balance": {balance},
            "bitcoin": 0, "ethereum": 0, "otherCrypto": {other}
        }}}}"#
    )
}

/// A currency-info body with a string-encoded ticker, as the backend sends it.
pub fn currency_json(id: u32, symbol: &str, name: &str, price: &str) -> String {
    let ticker = serde_json::json!([{
        "id": id.to_string(),
        "symbol": symbol,
        "name": name,
        "nameid": name.to_ascii_lowercase(),
        "rank": 1,
        "price_usd": price,
        "percent_change_24h": "0.50"
    }])
    .to_string();
    serde_json::json!({
        "currencyData": ticker,
        "currencyHistory": [
            {"timestamp": "2025-05-01T10:00:00Z", "price": 100.5},
            {"timestamp": "2025-05-01T10:30:00Z", "price": 101.25},
            {"timestamp": "2025-05-01T11:00:00Z", "price": 99.75}
        ]
    })
    .to_string()
}
