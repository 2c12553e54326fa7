//! Minimal HTTP/1.1 server with byte-exact control over responses
//!
//! Every response closes the connection, so each request is a fresh
//! connection and the recorded request log is exact.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sst_fetcher::app::{ArchiveClient, ClientConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use url::Url;

pub const FILE_2019_A: &str = "SEAFLUX-OSB-CDR_V02R00_SST_D20190101_C20190301.nc";
pub const FILE_2019_B: &str = "SEAFLUX-OSB-CDR_V02R00_SST_D20190102_C20190301.nc";
pub const FILE_2020_A: &str = "SEAFLUX-OSB-CDR_V02R00_SST_D20200101_C20200301.nc";

/// How a path is answered
#[derive(Clone)]
pub enum Route {
    /// Complete body with an accurate Content-Length (HEAD gets the same headers)
    Full(Vec<u8>),
    /// Announces `declared` bytes, sends `body`, then drops the connection
    Truncated { declared: u64, body: Vec<u8> },
    /// Sends `body` then stalls for a long time before dropping the connection
    Stall { declared: u64, body: Vec<u8> },
    /// Body delimited by connection close, no Content-Length
    NoLength(Vec<u8>),
    /// GET is complete, HEAD carries no Content-Length
    HeadUnknown(Vec<u8>),
    /// HTML index page
    Html(String),
}

pub struct TestServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<(String, String)>>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(routes: HashMap<String, Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let log = requests.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let routes = routes.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, &routes, &log).await;
                });
            }
        });

        Self {
            addr,
            requests,
            handle,
        }
    }

    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).unwrap()
    }

    pub fn url(&self, path: &str) -> Url {
        self.base_url().join(path.trim_start_matches('/')).unwrap()
    }

    pub fn client(&self) -> ArchiveClient {
        ArchiveClient::new(self.base_url(), test_client_config()).unwrap()
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|(m, p)| m == method && p == path)
            .count()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn test_client_config() -> ClientConfig {
    ClientConfig {
        rate_limit_rps: 1000,
        max_retries: 0,
        request_timeout: Duration::from_secs(30),
        connect_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

/// Deterministic file content of a given size
pub fn payload(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

pub fn index_page(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{}\">{}</a>\n", href, href))
        .collect();
    format!("<html><body>\n{}</body></html>", anchors)
}

async fn serve(
    mut stream: TcpStream,
    routes: &HashMap<String, Route>,
    log: &Mutex<Vec<(String, String)>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let mut parts = head.lines().next().unwrap_or_default().split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();
    log.lock().unwrap().push((method.clone(), path.clone()));
    let is_head = method == "HEAD";

    let Some(route) = routes.get(&path) else {
        let body = b"not found";
        stream
            .write_all(
                format!(
                    "HTTP/1.1 404 Not Found\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                )
                .as_bytes(),
            )
            .await?;
        if !is_head {
            stream.write_all(body).await?;
        }
        return stream.shutdown().await;
    };

    match route {
        Route::Full(body) => {
            write_head(&mut stream, "application/x-netcdf", Some(body.len() as u64)).await?;
            if !is_head {
                stream.write_all(body).await?;
            }
        }
        Route::Html(page) => {
            write_head(&mut stream, "text/html", Some(page.len() as u64)).await?;
            if !is_head {
                stream.write_all(page.as_bytes()).await?;
            }
        }
        Route::Truncated { declared, body } => {
            write_head(&mut stream, "application/x-netcdf", Some(*declared)).await?;
            if !is_head {
                stream.write_all(body).await?;
            }
        }
        Route::Stall { declared, body } => {
            write_head(&mut stream, "application/x-netcdf", Some(*declared)).await?;
            if !is_head {
                stream.write_all(body).await?;
                stream.flush().await?;
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
        }
        Route::NoLength(body) => {
            write_head(&mut stream, "application/x-netcdf", None).await?;
            if !is_head {
                stream.write_all(body).await?;
            }
        }
        Route::HeadUnknown(body) => {
            if is_head {
                write_head(&mut stream, "application/x-netcdf", None).await?;
            } else {
                write_head(&mut stream, "application/x-netcdf", Some(body.len() as u64)).await?;
                stream.write_all(body).await?;
            }
        }
    }

    stream.shutdown().await
}

async fn write_head(
    stream: &mut TcpStream,
    content_type: &str,
    content_length: Option<u64>,
) -> std::io::Result<()> {
    let mut head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nConnection: close\r\n",
        content_type
    );
    if let Some(len) = content_length {
        head.push_str(&format!("Content-Length: {}\r\n", len));
    }
    head.push_str("\r\n");
    stream.write_all(head.as_bytes()).await
}
