//! Minimal HTTP stub for exercising the real client.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use grid_pulse::config::FetchConfig;
use grid_pulse::data::EiaClient;
use reqwest::blocking::Client;

/// A canned HTTP response.
pub struct Reply {
    pub status: &'static str,
    pub body: String,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: "200 OK",
            body: body.into(),
        }
    }

    pub fn status(status: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A bound listener that never answers. Non-blocking, so a test can check
/// afterwards whether anything connected.
pub fn idle() -> (String, TcpListener) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let endpoint = format!("http://{}/v2/electricity/rto/region-data/data/", listener.local_addr().unwrap());
    (endpoint, listener)
}

/// Serve `replies` in order, one per connection, and return the request
/// targets (path + query) that were received.
pub fn serve(replies: Vec<Reply>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/v2/electricity/rto/region-data/data/", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let mut targets = Vec::new();
        for reply in replies {
            let (mut stream, _) = listener.accept().unwrap();

            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }

            let head = String::from_utf8_lossy(&raw);
            let target = head
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or_default()
                .to_string();
            targets.push(target);

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                reply.status,
                reply.body.len(),
                reply.body
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
        targets
    });

    (endpoint, handle)
}

/// An EIA-shaped envelope holding `n` hourly records starting at hour `start`.
pub fn page(start: usize, n: usize) -> String {
    let records: Vec<String> = (start..start + n)
        .map(|i| {
            format!(
                r#"{{"period":"2024-01-01T{i:02}","respondent":"CISO","type":"D","value":{},"value-units":"megawatthours"}}"#,
                20000 + i
            )
        })
        .collect();
    format!(r#"{{"response":{{"total":{n},"data":[{}]}}}}"#, records.join(","))
}

/// A client for `endpoint` that ignores any proxy set in the environment.
pub fn client(endpoint: String) -> EiaClient {
    let http = Client::builder().no_proxy().build().unwrap();
    EiaClient::with_client(http, FetchConfig::new("test-key").with_endpoint(endpoint))
}
