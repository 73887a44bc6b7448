//! Loopback HTTP/1.1 server that answers agent service calls from a route
//! function and records every request it sees.

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Project path every request is made under; stripped from `Recorded::path`.
const PROJECT_PATH: &str = "/api/projects/demo";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path relative to the project, without the query string.
    pub path: String,
    pub query: String,
    pub authorization: Option<String>,
    pub body: String,
}

impl Recorded {
    pub fn is(&self, method: &str, path: &str) -> bool {
        self.method == method && self.path == path
    }
}

pub struct TestServer {
    pub endpoint: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Serve `route(request) -> (status, json body)` on a random local port.
    pub async fn start<F>(route: F) -> Self
    where
        F: Fn(&Recorded) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let route = Arc::new(route);

        let log = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let route = Arc::clone(&route);
                let log = Arc::clone(&log);
                tokio::spawn(serve(stream, route, log));
            }
        });

        Self {
            endpoint: format!("http://{}{}", addr, PROJECT_PATH),
            requests,
            task,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn saw(&self, method: &str, path: &str) -> bool {
        self.requests().iter().any(|r| r.is(method, path))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve<F>(mut stream: TcpStream, route: Arc<F>, log: Arc<Mutex<Vec<Recorded>>>)
where
    F: Fn(&Recorded) -> (u16, String) + Send + Sync + 'static,
{
    let mut buffer = Vec::new();
    while let Some(request) = read_request(&mut stream, &mut buffer).await {
        let (status, body) = route(&request);
        log.lock().unwrap().push(request);

        let response = format!(
            "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{}",
            status,
            reason(status),
            body.len(),
            body
        );
        if stream.write_all(response.as_bytes()).await.is_err() {
            return;
        }
    }
}

async fn read_request(stream: &mut TcpStream, buffer: &mut Vec<u8>) -> Option<Recorded> {
    let head_end = loop {
        if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        fill(stream, buffer).await?;
    };

    let head = String::from_utf8_lossy(&buffer[..head_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let mut content_length = 0;
    let mut authorization = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap_or(0),
                "authorization" => authorization = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    while buffer.len() < head_end + content_length {
        fill(stream, buffer).await?;
    }
    let body = String::from_utf8_lossy(&buffer[head_end..head_end + content_length]).into_owned();
    buffer.drain(..head_end + content_length);

    let (path, query) = target.split_once('?').unwrap_or((target.as_str(), ""));
    Some(Recorded {
        method,
        path: path.strip_prefix(PROJECT_PATH).unwrap_or(path).to_string(),
        query: query.to_string(),
        authorization,
        body,
    })
}

async fn fill(stream: &mut TcpStream, buffer: &mut Vec<u8>) -> Option<()> {
    let mut chunk = [0u8; 4096];
    let n = stream.read(&mut chunk).await.ok()?;
    if n == 0 {
        return None;
    }
    buffer.extend_from_slice(&chunk[..n]);
    Some(())
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        _ => "Error",
    }
}
