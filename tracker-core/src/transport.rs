//! Transport abstraction and the HTTP implementation
//!
//! The client only deals in URLs and wire documents; how they travel is the
//! transport's business. Tests substitute an in-memory implementation.

use crate::config::ClientConfig;
use crate::document::Document;
use crate::error::{Result, TrackerError};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::time::Duration;

/// HTTP verb of a service call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl ServiceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMethod::Get => "GET",
            ServiceMethod::Post => "POST",
            ServiceMethod::Put => "PUT",
            ServiceMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ServiceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<ServiceMethod> for reqwest::Method {
    fn from(method: ServiceMethod) -> Self {
        match method {
            ServiceMethod::Get => reqwest::Method::GET,
            ServiceMethod::Post => reqwest::Method::POST,
            ServiceMethod::Put => reqwest::Method::PUT,
            ServiceMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Moves wire documents to and from the service
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and parse the response document
    async fn fetch(&self, url: &str) -> Result<Document>;

    /// Send `payload` (if any) with `method` and parse the response document
    async fn submit(&self, url: &str, method: ServiceMethod, payload: Option<&str>)
    -> Result<Document>;

    /// GET `url` authenticating with a login and password
    async fn fetch_with_credentials(&self, url: &str, login: &str, password: &str)
    -> Result<Document>;

    /// POST raw file content
    async fn upload(&self, url: &str, data: Bytes) -> Result<Document>;
}

/// `reqwest`-backed transport
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http })
    }

    async fn read_document(
        method: ServiceMethod,
        url: &str,
        resp: reqwest::Response,
    ) -> Result<Document> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(TrackerError::Status {
                method: method.to_string(),
                url: redact_token(url),
                status: status.as_u16(),
                body,
            });
        }
        tracing::trace!("{} {} returned {} bytes", method, redact_token(url), body.len());
        Document::parse(&body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<Document> {
        tracing::debug!("GET {}", redact_token(url));
        let resp = self.http.get(url).send().await?;
        Self::read_document(ServiceMethod::Get, url, resp).await
    }

    async fn submit(
        &self,
        url: &str,
        method: ServiceMethod,
        payload: Option<&str>,
    ) -> Result<Document> {
        tracing::debug!("{} {}", method, redact_token(url));
        let mut request = self.http.request(method.into(), url);
        if let Some(payload) = payload {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/xml")
                .body(payload.to_string());
        }
        let resp = request.send().await?;
        Self::read_document(method, url, resp).await
    }

    async fn fetch_with_credentials(
        &self,
        url: &str,
        login: &str,
        password: &str,
    ) -> Result<Document> {
        tracing::debug!("GET {} as {}", url, login);
        let resp = self
            .http
            .get(url)
            .basic_auth(login, Some(password))
            .send()
            .await?;
        Self::read_document(ServiceMethod::Get, url, resp).await
    }

    async fn upload(&self, url: &str, data: Bytes) -> Result<Document> {
        tracing::debug!("POST {} ({} bytes)", redact_token(url), data.len());
        let resp = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await?;
        Self::read_document(ServiceMethod::Post, url, resp).await
    }
}

/// Hide the `token` query value in log lines and error messages
pub(crate) fn redact_token(url: &str) -> String {
    let Ok(mut parsed) = reqwest::Url::parse(url) else {
        return url.to_string();
    };
    if !parsed.query_pairs().any(|(key, _)| key == "token") {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "token" {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.into()
}
