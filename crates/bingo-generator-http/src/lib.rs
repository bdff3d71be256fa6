// # HTTP Number Generator
//
// This crate provides the client for the external number generator.
//
// ## Protocol
//
// - `GET <url>` (by default `http://bingo-generator:8000/trigger`)
// - No request body
// - Response body: a plain-text decimal integer, surrounding whitespace allowed
//
// ## Behavior
//
// - One request per `generate()` call, no retries
// - Transport errors, timeouts and non-2xx statuses → `GeneratorUnreachable`
// - A body that is not an integer → `GeneratorResponseInvalid`
//
// Whether the generator also persists the number it returns does not matter
// to this client; the core caches the value with `SET NX PX` either way.

use async_trait::async_trait;
use bingo_core::config::GeneratorConfig;
use bingo_core::{Error, NumberGenerator, Result};
use std::time::Duration;

/// Default HTTP timeout for generator requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Generator reached over plain HTTP
#[derive(Debug, Clone)]
pub struct HttpNumberGenerator {
    /// Trigger endpoint
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpNumberGenerator {
    /// Create a generator client with the default timeout
    ///
    /// # Parameters
    ///
    /// - `url`: Trigger endpoint (e.g., "http://bingo-generator:8000/trigger")
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a generator client with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create from validated configuration
    pub fn from_config(config: &GeneratorConfig, timeout: Duration) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_timeout(config.url.clone(), timeout))
    }

    /// Trigger endpoint in use
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Parse a generator response body
pub fn parse_number(body: &str) -> Result<i64> {
    let trimmed = body.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| Error::generator_response(format!("not an integer: '{}'", trimmed)))
}

#[async_trait]
impl NumberGenerator for HttpNumberGenerator {
    async fn generate(&self) -> Result<i64> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::generator_unreachable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::generator_unreachable(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::generator_unreachable(format!("Failed to read response: {}", e)))?;

        let number = parse_number(&body)?;
        tracing::debug!(url = %self.url, number, "generator answered");
        Ok(number)
    }

    fn generator_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response on a loopback port
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{}/trigger", addr)
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("13").unwrap(), 13);
        assert_eq!(parse_number(" 13\n").unwrap(), 13);
        assert!(matches!(
            parse_number("thirteen"),
            Err(Error::GeneratorResponseInvalid(_))
        ));
        assert!(parse_number("").is_err());
    }

    #[test]
    fn test_from_config_rejects_bad_url() {
        let config = GeneratorConfig {
            url: "bingo-generator:8000".to_string(),
        };
        assert!(HttpNumberGenerator::from_config(&config, DEFAULT_HTTP_TIMEOUT).is_err());
    }

    #[tokio::test]
    async fn test_generate_reads_plain_text_integer() {
        let url = serve_once("HTTP/1.1 200 OK", "13\n").await;
        let generator = HttpNumberGenerator::new(url);

        assert_eq!(generator.generate().await.unwrap(), 13);
    }

    #[tokio::test]
    async fn test_generate_rejects_non_integer_body() {
        let url = serve_once("HTTP/1.1 200 OK", "lucky").await;
        let generator = HttpNumberGenerator::new(url);

        let err = generator.generate().await.unwrap_err();
        assert!(matches!(err, Error::GeneratorResponseInvalid(_)));
    }

    #[tokio::test]
    async fn test_generate_maps_error_status_to_unreachable() {
        let url = serve_once("HTTP/1.1 503 Service Unavailable", "busy").await;
        let generator = HttpNumberGenerator::new(url);

        let err = generator.generate().await.unwrap_err();
        assert!(matches!(err, Error::GeneratorUnreachable(_)));
    }

    #[tokio::test]
    async fn test_generate_connection_refused() {
        // Bind then drop to obtain a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let generator = HttpNumberGenerator::with_timeout(
            format!("http://{}/trigger", addr),
            Duration::from_secs(2),
        );
        let err = generator.generate().await.unwrap_err();
        assert!(matches!(err, Error::GeneratorUnreachable(_)));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and hold the connection without answering
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let generator = HttpNumberGenerator::with_timeout(
            format!("http://{}/trigger", addr),
            Duration::from_millis(200),
        );
        let err = generator.generate().await.unwrap_err();
        assert!(matches!(err, Error::GeneratorUnreachable(_)));
    }
}
