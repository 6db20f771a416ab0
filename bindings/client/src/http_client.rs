use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use breeze_instruments::Reporter;
use bytes::Bytes;
use breeze_instruments_derive::breeze_instrument;
use url::Url;

use crate::error::HttpClientError;

/// The parts of an HTTP response that checks can look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lower case. Repeated headers are joined with `, `.
    pub headers: HashMap<String, String>,
    /// The raw body, exactly as received.
    pub body: Bytes,
}

impl HttpResponse {
    /// The body decoded as UTF-8, with invalid sequences replaced. For display only.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A `reqwest` client that reports the duration and outcome of every request.
#[derive(Debug, Clone)]
pub struct HttpClientInstrumented {
    client: reqwest::Client,
    reporter: Arc<Reporter>,
}

impl HttpClientInstrumented {
    pub fn new(request_timeout: Duration, reporter: Arc<Reporter>) -> Result<Self, HttpClientError> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;

        Ok(Self { client, reporter })
    }

    /// Send a GET request without a body or custom headers.
    ///
    /// Any status outside of 2xx is returned as [HttpClientError::Status].
    #[breeze_instrument(prefix = "http_")]
    pub async fn get(&self, url: &str) -> Result<HttpResponse, HttpClientError> {
        let url = Url::parse(url)
            .map_err(|e| HttpClientError::InvalidRequest(format!("Invalid URL [{url}]: {e}")))?;

        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let mut headers = HashMap::<String, String>::new();
        for (name, value) in response.headers() {
            let Ok(value) = value.to_str() else {
                log::trace!("Skipping non-text header {name}");
                continue;
            };
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        let body = response.bytes().await?;

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use breeze_instruments::ReportConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve the same response to every connection and return the base URL.
    async fn serve(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 2048];
                    let _ = socket.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 {status_line}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{addr}")
    }

    fn client() -> (HttpClientInstrumented, Arc<Reporter>) {
        let reporter = Arc::new(ReportConfig::default().init());
        let client = HttpClientInstrumented::new(Duration::from_secs(5), reporter.clone()).unwrap();
        (client, reporter)
    }

    #[tokio::test]
    async fn get_returns_body_and_headers() {
        let base = serve("200 OK", "测试").await;
        let (client, reporter) = client();

        let response = client.get(&format!("{base}/api/user/1")).await.unwrap();

        assert_eq!(200, response.status);
        assert_eq!("测试".as_bytes(), response.body.as_ref());
        assert_eq!("测试", response.text());
        assert_eq!(
            Some("text/plain; charset=utf-8"),
            response.headers.get("content-type").map(String::as_str)
        );

        let stats = reporter.operation_stats();
        assert_eq!(1, stats["http_get"].count);
        assert_eq!(0, stats["http_get"].errors);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let base = serve("500 Internal Server Error", "oops").await;
        let (client, reporter) = client();

        let err = client.get(&format!("{base}/hello")).await.unwrap_err();

        assert!(matches!(err, HttpClientError::Status { status: 500, .. }));
        assert_eq!(1, reporter.operation_stats()["http_get"].errors);
    }

    #[tokio::test]
    async fn connection_refused_is_a_request_error() {
        // Bind and drop to find a port with nothing listening on it.
        let addr = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap()
            .local_addr()
            .unwrap();
        let (client, _reporter) = client();

        let err = client.get(&format!("http://{addr}/hello")).await.unwrap_err();

        assert!(matches!(err, HttpClientError::Request(_)));
    }

    #[tokio::test]
    async fn malformed_url_is_invalid_request() {
        let (client, _reporter) = client();

        let err = client.get("not a url").await.unwrap_err();

        assert!(matches!(err, HttpClientError::InvalidRequest(_)));
    }
}
