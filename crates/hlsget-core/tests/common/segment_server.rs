//! Minimal HTTP/1.1 server serving playlists and segments for integration
//! tests.
//!
//! Serves a fixed route table. Each route can be scripted to fail a number
//! of times before succeeding (transient failures) or to always answer with
//! a fixed error status (permanent failures); every request is counted so
//! tests can assert attempt totals.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

/// One servable path.
#[derive(Debug, Clone)]
pub struct Route {
    pub path: String,
    pub body: Vec<u8>,
    /// Respond 500 this many times before the final behavior applies.
    pub fail_first: u32,
    /// Final status once `fail_first` is exhausted (200 serves `body`).
    pub status: u16,
}

impl Route {
    pub fn ok(path: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.to_string(),
            body: body.into(),
            fail_first: 0,
            status: 200,
        }
    }

    /// Fails with 500 `fail_first` times, then serves `body`.
    pub fn flaky(path: &str, body: impl Into<Vec<u8>>, fail_first: u32) -> Self {
        Self {
            fail_first,
            ..Self::ok(path, body)
        }
    }

    /// Always answers with `status` and an empty body.
    pub fn error(path: &str, status: u16) -> Self {
        Self {
            path: path.to_string(),
            body: Vec::new(),
            fail_first: 0,
            status,
        }
    }
}

struct ServerState {
    routes: HashMap<String, Route>,
    remaining_failures: Mutex<HashMap<String, u32>>,
    hits: Mutex<HashMap<String, u32>>,
}

/// Running server handle; the server lives until the process exits.
pub struct ServerHandle {
    pub base_url: String,
    state: Arc<ServerState>,
}

impl ServerHandle {
    /// Requests seen for `path` (e.g. "/seg2.ts").
    pub fn hits(&self, path: &str) -> u32 {
        *self.state.hits.lock().unwrap().get(path).unwrap_or(&0)
    }
}

/// Starts the server on an ephemeral port and returns its handle.
pub fn start(routes: Vec<Route>) -> ServerHandle {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();

    let remaining_failures = routes
        .iter()
        .filter(|r| r.fail_first > 0)
        .map(|r| (r.path.clone(), r.fail_first))
        .collect();
    let state = Arc::new(ServerState {
        routes: routes.into_iter().map(|r| (r.path.clone(), r)).collect(),
        remaining_failures: Mutex::new(remaining_failures),
        hits: Mutex::new(HashMap::new()),
    });

    let accept_state = Arc::clone(&state);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let state = Arc::clone(&accept_state);
            thread::spawn(move || handle(stream, &state));
        }
    });

    ServerHandle {
        base_url: format!("http://127.0.0.1:{}/", port),
        state,
    }
}

fn handle(mut stream: std::net::TcpStream, state: &ServerState) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let path = match request_path(request) {
        Some(p) => p.to_string(),
        None => return,
    };

    *state.hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

    let route = match state.routes.get(&path) {
        Some(r) => r,
        None => {
            respond(&mut stream, 404, b"");
            return;
        }
    };

    {
        let mut remaining = state.remaining_failures.lock().unwrap();
        if let Some(left) = remaining.get_mut(&path) {
            if *left > 0 {
                *left -= 1;
                respond(&mut stream, 500, b"");
                return;
            }
        }
    }

    if route.status == 200 {
        respond(&mut stream, 200, &route.body);
    } else {
        respond(&mut stream, route.status, b"");
    }
}

fn respond(stream: &mut std::net::TcpStream, status: u16, body: &[u8]) {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Error",
    };
    let header = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason,
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(body);
}

/// Extracts the path from the request line ("GET /path HTTP/1.1").
fn request_path(request: &str) -> Option<&str> {
    let line = request.lines().next()?;
    line.split_whitespace().nth(1)
}
