//! Common test utilities for integration tests

use dl::config::ResolvedConfig;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// One canned response served by [`TestServer`].
#[derive(Clone, Debug)]
pub struct Route {
    pub path: String,
    pub status: u16,
    pub body: Vec<u8>,
    pub content_type: &'static str,
    /// Number of initial requests answered with 503 before `status` is served.
    pub fail_first: usize,
    /// Pause before each body chunk after the first; 0 writes the body at once.
    pub chunk_delay_ms: u64,
}

/// Body chunk size used when `chunk_delay_ms` is set.
const SLOW_CHUNK_LEN: usize = 10;

#[allow(dead_code)]
impl Route {
    pub fn ok(path: &str, body: &[u8]) -> Self {
        Self {
            path: path.to_string(),
            status: 200,
            body: body.to_vec(),
            content_type: "application/octet-stream",
            fail_first: 0,
            chunk_delay_ms: 0,
        }
    }

    pub fn html(path: &str, html: &str) -> Self {
        Self {
            content_type: "text/html; charset=utf-8",
            ..Self::ok(path, html.as_bytes())
        }
    }

    pub fn status(path: &str, status: u16) -> Self {
        Self {
            status,
            ..Self::ok(path, b"error")
        }
    }

    /// Serves `body` in small chunks with `chunk_delay_ms` between them.
    pub fn slow(path: &str, body: &[u8], chunk_delay_ms: u64) -> Self {
        Self {
            chunk_delay_ms,
            ..Self::ok(path, body)
        }
    }

    pub fn flaky(path: &str, body: &[u8], fail_first: usize) -> Self {
        Self {
            fail_first,
            ..Self::ok(path, body)
        }
    }
}

/// Minimal HTTP/1.1 server on localhost that counts requests per path.
pub struct TestServer {
    addr: SocketAddr,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

#[allow(dead_code)]
impl TestServer {
    pub async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Arc<HashMap<String, Route>> =
            Arc::new(routes.into_iter().map(|r| (r.path.clone(), r)).collect());
        let hits: Arc<Mutex<HashMap<String, usize>>> = Arc::default();

        let server_hits = hits.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = routes.clone();
                let hits = server_hits.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, &routes, &hits).await;
                });
            }
        });

        Self { addr, hits }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

async fn serve(
    mut stream: TcpStream,
    routes: &HashMap<String, Route>,
    hits: &Mutex<HashMap<String, usize>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let request = String::from_utf8_lossy(&buf);
    let target = request.split_whitespace().nth(1).unwrap_or("/");
    let path = target.split('?').next().unwrap_or("/").to_string();

    let seen = {
        let mut hits = hits.lock().unwrap();
        let count = hits.entry(path.clone()).or_insert(0);
        *count += 1;
        *count
    };

    let (status, content_type, body, delay_ms): (u16, &str, &[u8], u64) = match routes.get(&path)
    {
        Some(route) if seen <= route.fail_first => (503, "text/plain", &b"unavailable"[..], 0),
        Some(route) => (
            route.status,
            route.content_type,
            route.body.as_slice(),
            route.chunk_delay_ms,
        ),
        None => (404, "text/plain", &b"not found"[..], 0),
    };

    let head = format!(
        "HTTP/1.1 {status} {}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        if status < 400 { "OK" } else { "Error" },
        body.len()
    );
    stream.write_all(head.as_bytes()).await?;
    if delay_ms == 0 {
        stream.write_all(body).await?;
    } else {
        for (i, piece) in body.chunks(SLOW_CHUNK_LEN).enumerate() {
            if i > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            }
            stream.write_all(piece).await?;
            stream.flush().await?;
        }
    }
    stream.shutdown().await
}

/// Config writing into `dir` with millisecond retry delays.
#[allow(dead_code)]
pub fn test_config(dir: &Path) -> ResolvedConfig {
    ResolvedConfig {
        output_dir: dir.to_path_buf(),
        retry_initial_delay_ms: 1,
        retry_max_delay_ms: 5,
        timeout_secs: 10,
        ..ResolvedConfig::default()
    }
}
