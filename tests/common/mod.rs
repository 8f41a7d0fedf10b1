// Mock Excel service for driving the client in tests. An axum router on its
// own tokio runtime answers every request with one canned response and
// records what it got. The blocking client under test runs on the test
// thread, outside that runtime.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone)]
enum Behaviour {
    Respond { status: StatusCode, body: String },
    Silent { hold: Duration },
}

#[derive(Clone)]
struct MockState {
    behaviour: Behaviour,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct MockServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    /// Answer every request with `status` and `body`.
    pub fn respond(status: u16, body: &str) -> Self {
        Self::start(Behaviour::Respond {
            status: StatusCode::from_u16(status).expect("valid status code"),
            body: body.to_string(),
        })
    }

    /// Record requests but hold each one for `hold` before answering.
    pub fn silent(hold: Duration) -> Self {
        Self::start(Behaviour::Silent { hold })
    }

    fn start(behaviour: Behaviour) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            behaviour,
            requests: Arc::clone(&requests),
        };

        let (addr_tx, addr_rx) = mpsc::channel();
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .expect("mock server runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind mock server");
                addr_tx
                    .send(listener.local_addr().expect("mock server address"))
                    .expect("report mock server address");
                let app = Router::new().fallback(record).with_state(state);
                axum::serve(listener, app).await.expect("mock server");
            });
        });

        let addr = addr_rx.recv().expect("mock server started");
        MockServer { addr, requests }
    }

    pub fn url(&self) -> String {
        format!("http://{}/generar_excel", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

async fn record(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.requests.lock().expect("requests lock").push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers: headers
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect(),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    match state.behaviour {
        Behaviour::Respond { status, body } => {
            (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        Behaviour::Silent { hold } => {
            tokio::time::sleep(hold).await;
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

/// An endpoint on a port nothing listens on.
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{}/generar_excel", addr)
}

/// A service that reads the request and closes the socket without answering,
/// like one that crashed mid-request.
pub fn hang_up_url() -> String {
    raw_socket_url(None)
}

/// A service that answers with bytes that are not HTTP.
pub fn garbage_url() -> String {
    raw_socket_url(Some(b"NOT-HTTP garbage\r\n\r\n"))
}

// Socket-level misbehaviour no HTTP framework will produce.
fn raw_socket_url(reply: Option<&'static [u8]>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind raw socket");
    let addr = listener.local_addr().expect("raw socket address");
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            drain_request(&mut stream);
            if let Some(bytes) = reply {
                stream.write_all(bytes).expect("write raw reply");
            }
        }
    });
    format!("http://{}/generar_excel", addr)
}

/// Read until the JSON body's closing brace so the client is not still
/// writing when the socket goes away.
fn drain_request(stream: &mut TcpStream) {
    let mut seen = Vec::new();
    let mut buf = [0u8; 1024];
    while !seen.ends_with(b"}") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => seen.extend_from_slice(&buf[..n]),
        }
    }
}
