//! Local development instance of the health service.
//!
//! A synchronous `tiny_http` server exposing the same routes the client
//! talks to, backed by an in-memory key-value store partitioned by bearer
//! token. Launched via `healthsync serve` (default `127.0.0.1:9747`).

mod routes;
pub mod store;

use std::io::{Cursor, Read};
use std::net::SocketAddr;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, Server};

use crate::oplog::OperatorLog;
use store::KvStore;

pub struct LocalService {
    server: Server,
    store: KvStore,
    log: OperatorLog,
}

impl LocalService {
    /// Bind to `addr`. Use port `0` to let the OS pick one.
    pub fn bind(addr: &str, log: OperatorLog) -> Result<Self> {
        let server = Server::http(addr)
            .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;
        Ok(Self {
            server,
            store: KvStore::new(),
            log,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.server
            .server_addr()
            .to_ip()
            .context("server is not bound to an IP address")
    }

    /// Serve requests until the process exits. Requests are handled
    /// sequentially.
    pub fn run(self) -> Result<()> {
        for request in self.server.incoming_requests() {
            self.handle(request);
        }
        Ok(())
    }

    fn handle(&self, mut request: Request) {
        let method = request.method().clone();
        let url = request.url().to_string();
        let token = bearer_token(&request);

        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let response: Response<Cursor<Vec<u8>>> =
            match routes::dispatch(&self.store, &method, &url, token.as_deref(), body.as_deref()) {
                Ok(resp) => resp,
                Err(e) => {
                    self.log.error(&format!("{method} {url} failed: {e:#}"));
                    routes::error_response(500, &e.to_string())
                }
            };

        let status = response.status_code().0;
        let _ = request.respond(response);
        self.log.info(&format!("{method} {url} {status}"));
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Authorization"))
        .and_then(|h| h.value.as_str().strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap()
}
