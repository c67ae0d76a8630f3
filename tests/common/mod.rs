#![allow(dead_code)]

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One captured HTTP request.
#[derive(Debug, Clone)]
pub struct Captured {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is json")
    }
}

/// Serves `responses` in order, one connection per response, then stops.
pub struct FakeServer {
    pub base_url: String,
    handle: JoinHandle<Vec<Captured>>,
}

impl FakeServer {
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake server");
        let addr = listener.local_addr().expect("local addr");

        let handle = tokio::spawn(async move {
            let mut captured = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.expect("accept");
                captured.push(read_request(&mut stream).await);

                let response = format!(
                    "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    reason(status),
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.expect("write response");
                let _ = stream.shutdown().await;
            }
            captured
        });

        Self {
            base_url: format!("http://{addr}"),
            handle,
        }
    }

    /// Requests seen so far; waits until every response was served.
    pub async fn requests(self) -> Vec<Captured> {
        self.handle.await.expect("fake server task")
    }
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> Captured {
    let mut raw = Vec::new();
    let mut buf = [0_u8; 4096];

    let header_end = loop {
        let read = stream.read(&mut buf).await.expect("read request");
        assert!(read > 0, "connection closed before headers were complete");
        raw.extend_from_slice(&buf[..read]);
        if let Some(pos) = find(&raw, b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect::<Vec<_>>();

    let content_length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while raw.len() < body_start + content_length {
        let read = stream.read(&mut buf).await.expect("read body");
        assert!(read > 0, "connection closed before body was complete");
        raw.extend_from_slice(&buf[..read]);
    }

    Captured {
        request_line,
        headers,
        body: String::from_utf8_lossy(&raw[body_start..body_start + content_length]).to_string(),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}
