use super::{HttpRequest, MultipartField, RawResponse, RequestBody, Transport};
use crate::config::Config;
use crate::error::{ApiError, Error, Result};
use log::warn;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use std::time::Duration;

pub fn build_client(cfg: &Config) -> Result<Client> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(USER_AGENT, HeaderValue::from_str(&cfg.user_agent)?);
    // The API key header is attached per request by `http::prepare`.
    Client::builder()
        .default_headers(default_headers)
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .use_rustls_tls()
        .build()
        .map_err(|e| ApiError::transport(e.to_string(), None).into())
}

/// Default transport over a single shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            client: build_client(cfg)?,
        })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

// Files are opened here, right before the send, and closed when the form is dropped.
async fn build_form(fields: Vec<MultipartField>) -> Result<Form> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            MultipartField::Text { name, value } => form.text(name, value),
            MultipartField::File { name, path } => {
                let file = tokio::fs::File::open(&path)
                    .await
                    .map_err(|source| Error::Upload {
                        path: path.clone(),
                        source,
                    })?;
                let mut part = Part::stream(Body::from(file));
                if let Some(file_name) = path.file_name() {
                    part = part.file_name(file_name.to_string_lossy().into_owned());
                }
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;
        let mut builder = self.client.request(method, url).headers(headers);
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(fields) => builder.multipart(build_form(fields).await?),
        };

        let res = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("error sending request: {}", e);
                return Err(ApiError::transport(e.to_string(), e.status()).into());
            }
        };

        let status = res.status();
        let headers = res.headers().clone();
        let body = match res.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!("error reading response body (status {}): {}", status, e);
                return Err(ApiError::transport(e.to_string(), Some(status)).into());
            }
        };
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
