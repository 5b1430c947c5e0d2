#![allow(dead_code)]
//! Test harness utilities for svcbridge-net integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread;

use svcbridge_net::NetworkConfig;

/// How the stub server answers each request.
#[derive(Debug, Clone)]
pub enum StubReply {
    /// 200 with the request body sent back unchanged.
    Echo,
    /// A fixed status and body.
    Fixed { status: u16, body: String },
}

/// A request as seen by the stub server.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub url: String,
    pub body: String,
}

/// An in-process HTTP server on an ephemeral port.
///
/// The serving thread is detached and lives until the test process exits.
pub struct StubServer {
    addr: SocketAddr,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl StubServer {
    pub fn start(reply: StubReply) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("bind stub server");
        let addr = server.server_addr();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                log.lock().unwrap().push(SeenRequest {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    body: body.clone(),
                });

                let response = match &reply {
                    StubReply::Echo => tiny_http::Response::from_string(body),
                    StubReply::Fixed { status, body } => {
                        tiny_http::Response::from_string(body.clone()).with_status_code(*status)
                    }
                };
                let _ = request.respond(response);
            }
        });

        Self { addr, seen }
    }

    pub fn echo() -> Self {
        Self::start(StubReply::Echo)
    }

    pub fn fixed(status: u16, body: &str) -> Self {
        Self::start(StubReply::Fixed {
            status,
            body: body.to_string(),
        })
    }

    /// Network config pointing at this server.
    pub fn config(&self) -> NetworkConfig {
        NetworkConfig::new(self.addr.ip().to_string(), self.addr.port())
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

/// A config pointing at a port nothing listens on.
pub fn dead_endpoint() -> NetworkConfig {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe listener");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    NetworkConfig::new("127.0.0.1", port)
}
