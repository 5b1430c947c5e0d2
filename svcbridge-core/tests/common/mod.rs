#![allow(dead_code)]
//! Test harness utilities for svcbridge-core integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread;

use svcbridge_core::native::{InputLimits, NativeModule, NativeStrategy};
use svcbridge_net::{NetworkConfig, NetworkStrategy};
use svcbridge_types::{CallValue, ExecutionError, InvocationStrategy};

/// An in-process HTTP server on an ephemeral port.
///
/// Answers every request with `status` and either the request body
/// (`body == None`) or the fixed body.
pub struct StubServer {
    addr: SocketAddr,
    bodies: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    fn start(status: u16, fixed: Option<String>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("bind stub server");
        let addr = server.server_addr();
        let bodies = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&bodies);
        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                seen.lock().unwrap().push(body.clone());
                let reply = fixed.clone().unwrap_or(body);
                let _ = request
                    .respond(tiny_http::Response::from_string(reply).with_status_code(status));
            }
        });

        Self { addr, bodies }
    }

    pub fn echo() -> Self {
        Self::start(200, None)
    }

    pub fn fixed(status: u16, body: &str) -> Self {
        Self::start(status, Some(body.to_string()))
    }

    pub fn config(&self) -> NetworkConfig {
        NetworkConfig::new(self.addr.ip().to_string(), self.addr.port())
    }

    pub fn strategy(&self) -> Box<dyn InvocationStrategy> {
        Box::new(NetworkStrategy::new(&self.config()).expect("network strategy"))
    }

    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.bodies.lock().unwrap().len()
    }
}

/// Native module that returns its argument list, like the echo server.
pub struct EchoModule;

impl NativeModule for EchoModule {
    fn call_function(
        &self,
        _service_name: &str,
        _function_name: &str,
        args: &[CallValue],
    ) -> Result<CallValue, ExecutionError> {
        Ok(CallValue::Array(args.to_vec()))
    }
}

pub fn echo_native() -> Box<dyn InvocationStrategy> {
    Box::new(NativeStrategy::new(Box::new(EchoModule), InputLimits::default()))
}
