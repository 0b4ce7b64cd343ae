use std::{
    collections::VecDeque,
    net::SocketAddr,
    sync::{Arc, Mutex, PoisonError},
};

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::post,
};
use config::IdentityConfig;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// A request received by the mock, keyed by the operation name from `X-Amz-Target`.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub operation: String,
    pub body: Value,
}

#[derive(Default)]
struct MockState {
    responses: Mutex<VecDeque<(StatusCode, Value)>>,
    requests: Mutex<Vec<ReceivedRequest>>,
}

/// Mock Cognito Identity service speaking the `awsJson1_1` protocol.
#[derive(Default)]
pub struct CognitoMock {
    responses: VecDeque<(StatusCode, Value)>,
}

impl CognitoMock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next request with an identity id, as `GetId` and `GetOpenIdToken` do.
    pub fn with_identity(self, identity_id: &str) -> Self {
        self.with_body(json!({ "IdentityId": identity_id, "Token": "open-id-token" }))
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.responses.push_back((StatusCode::OK, body));
        self
    }

    pub fn with_error(mut self, status: u16, code: &str, message: &str) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
        self.responses
            .push_back((status, json!({ "__type": code, "message": message })));
        self
    }

    pub async fn spawn(self) -> CognitoServer {
        let state = Arc::new(MockState {
            responses: Mutex::new(self.responses),
            requests: Mutex::default(),
        });

        let app = Router::new().route("/", post(handle)).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        CognitoServer { address, state }
    }
}

pub struct CognitoServer {
    address: SocketAddr,
    state: Arc<MockState>,
}

impl CognitoServer {
    /// Configuration pointing the Cognito backend at this server.
    pub fn config(&self, pool_id: &str) -> IdentityConfig {
        let mut config = IdentityConfig::new(pool_id, "us-east-1");
        config.endpoint_url = Some(format!("http://{}", self.address).parse().unwrap());

        config
    }

    pub fn requests(&self) -> Vec<ReceivedRequest> {
        self.state.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn operations(&self) -> Vec<String> {
        self.requests().into_iter().map(|request| request.operation).collect()
    }
}

async fn handle(State(state): State<Arc<MockState>>, headers: HeaderMap, body: Bytes) -> Response {
    let operation = headers
        .get("x-amz-target")
        .and_then(|target| target.to_str().ok())
        .and_then(|target| target.rsplit('.').next())
        .unwrap_or_default()
        .to_string();

    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);

    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(ReceivedRequest { operation, body });

    let (status, body) = state
        .responses
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
        .unwrap_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                json!({ "__type": "InvalidParameterException", "message": "no scripted response" }),
            )
        });

    (status, [(CONTENT_TYPE, "application/x-amz-json-1.1")], body.to_string()).into_response()
}
