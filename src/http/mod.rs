use crate::config::{Api, Config, Endpoint};
use crate::error::{ApiError, Error, Result};
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};
use std::future::Future;
use std::path::PathBuf;
use url::Url;

mod transport;

pub use transport::{build_client, ReqwestTransport};

pub const API_KEY_HEADER: &str = "x-adyo-apikey";

/// Multipart field whose value is a path to stream rather than a literal.
pub const FILE_FIELD: &str = "file";

pub type QueryParams = Vec<(String, String)>;

/// What a caller wants to send, before URL/header/body encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<QueryParams>,
    pub body: Option<Map<String, Value>>,
    pub multipart: bool,
    pub api: Api,
    /// Overrides the configured endpoint for this call only.
    pub endpoint: Option<Endpoint>,
    /// Accept a 2xx with no body (e.g. 204) as `null` instead of failing.
    pub allow_empty: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            body: None,
            multipart: false,
            api: Api::Primary,
            endpoint: None,
            allow_empty: false,
        }
    }

    pub fn query(mut self, query: Option<QueryParams>) -> Self {
        self.query = query;
        self
    }

    pub fn body(mut self, body: Map<String, Value>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn multipart(mut self, multipart: bool) -> Self {
        self.multipart = multipart;
        self
    }

    pub fn api(mut self, api: Api) -> Self {
        self.api = api;
        self
    }

    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn allow_empty(mut self, allow_empty: bool) -> Self {
        self.allow_empty = allow_empty;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartField {
    Text { name: String, value: String },
    File { name: String, path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    /// JSON object body; the content type header is set alongside.
    Json(Value),
    Multipart(Vec<MultipartField>),
}

/// Fully-built request handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// The HTTP capability the client runs on. One call, one request; no retries.
///
/// Failures below HTTP should come back as [`ApiError::transport`].
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<RawResponse>> + Send;
}

pub fn build_url(endpoint: &Endpoint, path: &str, query: Option<&QueryParams>) -> Result<Url> {
    let raw = format!(
        "{}/{}/{}",
        endpoint.base_url.trim_end_matches('/'),
        endpoint.version,
        path.trim_start_matches('/')
    );
    let mut url = Url::parse(&raw)?;
    if let Some(params) = query.filter(|q| !q.is_empty()) {
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Ok(url)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".into(),
        Value::Bool(false) => "0".into(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn multipart_fields(body: &Map<String, Value>) -> Vec<MultipartField> {
    let mut fields = Vec::with_capacity(body.len());
    for (name, value) in body {
        match value {
            Value::String(path) if name == FILE_FIELD => fields.push(MultipartField::File {
                name: name.clone(),
                path: PathBuf::from(path),
            }),
            Value::Array(items) => {
                let list_name = format!("{}[]", name);
                fields.extend(items.iter().map(|item| MultipartField::Text {
                    name: list_name.clone(),
                    value: scalar_text(item),
                }));
            }
            other => fields.push(MultipartField::Text {
                name: name.clone(),
                value: scalar_text(other),
            }),
        }
    }
    fields
}

/// Build the wire request: URL, auth/accept headers and the encoded body.
/// Fails as unauthorized before anything is sent when no key is configured.
pub fn prepare(cfg: &Config, request: ApiRequest) -> Result<HttpRequest> {
    let Some(api_key) = cfg.api_key.as_deref().filter(|k| !k.is_empty()) else {
        return Err(ApiError::missing_api_key().into());
    };
    let endpoint = request
        .endpoint
        .as_ref()
        .unwrap_or_else(|| cfg.endpoint(request.api));
    let url = build_url(endpoint, &request.path, request.query.as_ref())?;

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(API_KEY_HEADER),
        HeaderValue::from_str(api_key)?,
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let body = match request.body.filter(|b| !b.is_empty()) {
        None => RequestBody::Empty,
        Some(body) if request.multipart => RequestBody::Multipart(multipart_fields(&body)),
        Some(body) => {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            RequestBody::Json(Value::Object(body))
        }
    };

    Ok(HttpRequest {
        method: request.method,
        url,
        headers,
        body,
    })
}

/// Classify a response: JSON on 2xx, a typed [`ApiError`] otherwise.
/// A body that is not JSON, including an empty one, is an API error whatever the status.
pub fn decode_response(response: RawResponse) -> Result<Value> {
    let RawResponse {
        status,
        headers,
        body,
    } = response;

    let decoded: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!("undecodable response body (status {})", status);
            return Err(ApiError::invalid_body(&e, status, body, headers).into());
        }
    };

    if status.is_success() {
        return Ok(decoded);
    }

    let err = ApiError::from_response(status, &decoded, body, headers);
    warn!("API error: {}", err);
    Err(Error::Api(err))
}

/// One request through the transport, decoded.
pub async fn execute<T: Transport>(
    transport: &T,
    cfg: &Config,
    request: ApiRequest,
) -> Result<Value> {
    let allow_empty = request.allow_empty;
    let http_request = prepare(cfg, request)?;
    debug!("{} {}", http_request.method, http_request.url);
    let response = transport.send(http_request).await?;
    debug!("-> {}", response.status);
    if allow_empty && response.status.is_success() && response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    decode_response(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: body.to_string(),
        }
    }

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn url_has_version_and_query() {
        let ep = Endpoint::new("https://api.adyo.co.za/", "v1");
        let url = build_url(
            &ep,
            "placements",
            Some(&vec![
                ("page".into(), "2".into()),
                ("search".into(), "big banner".into()),
            ]),
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.adyo.co.za/v1/placements?page=2&search=big+banner"
        );
        let url = build_url(&ep, "zones/4", Some(&Vec::new())).unwrap();
        assert_eq!(url.as_str(), "https://api.adyo.co.za/v1/zones/4");
    }

    #[test]
    fn no_key_fails_before_sending() {
        let cfg = Config::default();
        let err = prepare(&cfg, ApiRequest::new(Method::GET, "zones")).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));
    }

    #[test]
    fn json_body_sets_content_type() {
        let cfg = Config::new("key");
        let req = prepare(
            &cfg,
            ApiRequest::new(Method::POST, "ad-sizes").body(obj(json!({"name": "A"}))),
        )
        .unwrap();
        assert_eq!(req.headers.get(API_KEY_HEADER).unwrap(), "key");
        assert_eq!(req.headers.get(ACCEPT).unwrap(), "application/json");
        assert_eq!(req.headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(req.body, RequestBody::Json(json!({"name": "A"})));
    }

    #[test]
    fn empty_body_sends_nothing() {
        let cfg = Config::new("key");
        let req = prepare(
            &cfg,
            ApiRequest::new(Method::POST, "ad-sizes").body(Map::new()),
        )
        .unwrap();
        assert_eq!(req.body, RequestBody::Empty);
        assert!(req.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn analytics_flag_and_override_pick_endpoint() {
        let mut cfg = Config::new("key");
        cfg.analytics = Endpoint::new("https://stats.example", "v3");
        let req = prepare(&cfg, ApiRequest::new(Method::POST, "heatmap").api(Api::Analytics)).unwrap();
        assert_eq!(req.url.as_str(), "https://stats.example/v3/heatmap");
        let req = prepare(
            &cfg,
            ApiRequest::new(Method::GET, "zones").endpoint(Endpoint::new("http://localhost:9", "v9")),
        )
        .unwrap();
        assert_eq!(req.url.as_str(), "http://localhost:9/v9/zones");
    }

    #[test]
    fn multipart_encoding() {
        let fields = multipart_fields(&obj(json!({
            "file": "tests/test.png",
            "name": "Banner",
            "width": 300,
            "enabled": true,
            "description": null,
            "zone_ids": [1, 2]
        })));
        assert!(fields.contains(&MultipartField::File {
            name: "file".into(),
            path: PathBuf::from("tests/test.png")
        }));
        assert!(fields.contains(&MultipartField::Text { name: "width".into(), value: "300".into() }));
        assert!(fields.contains(&MultipartField::Text { name: "enabled".into(), value: "1".into() }));
        assert!(fields.contains(&MultipartField::Text { name: "description".into(), value: "".into() }));
        assert!(fields.contains(&MultipartField::Text { name: "zone_ids[]".into(), value: "2".into() }));
        assert_eq!(fields.len(), 7);
    }

    #[test]
    fn decode_success() {
        assert_eq!(decode_response(raw(200, r#"{"id":1}"#)).unwrap(), json!({"id": 1}));
    }

    #[test]
    fn decode_empty_success_is_api_error() {
        for status in [200u16, 201, 204] {
            let err = decode_response(raw(status, "")).unwrap_err();
            let api = err.as_api().unwrap();
            assert_eq!(api.kind, ErrorKind::Api);
            assert_eq!(api.status_code(), Some(status));
            assert_eq!(api.body.as_deref(), Some(""));
        }
    }

    #[test]
    fn decode_malformed_success_is_api_error() {
        let err = decode_response(raw(200, "<html>oops")).unwrap_err();
        let api = err.as_api().unwrap();
        assert_eq!(api.kind, ErrorKind::Api);
        assert_eq!(api.status_code(), Some(200));
        assert_eq!(api.body.as_deref(), Some("<html>oops"));
        assert!(api.message.as_deref().unwrap().starts_with("Invalid response body from API"));
    }

    #[test]
    fn decode_error_table() {
        for (status, kind) in [
            (400, ErrorKind::BadRequest),
            (401, ErrorKind::Unauthorized),
            (404, ErrorKind::NotFound),
            (405, ErrorKind::MethodNotAllowed),
            (429, ErrorKind::RateLimit),
        ] {
            let err = decode_response(raw(status, r#"{"error":"nope"}"#)).unwrap_err();
            let api = err.as_api().unwrap();
            assert_eq!(api.kind, kind);
            assert_eq!(api.message.as_deref(), Some("nope"));
        }
    }

    #[test]
    fn decode_server_errors_keep_status() {
        for status in [500u16, 501, 502, 503, 504, 505, 511, 598, 599] {
            let err = decode_response(raw(status, r#"{"errors":["a","b"]}"#)).unwrap_err();
            let api = err.as_api().unwrap();
            assert_eq!(api.kind, ErrorKind::Api);
            assert_eq!(api.status_code(), Some(status));
            assert_eq!(api.message.as_deref(), Some("a.b"));
        }
    }

    #[test]
    fn decode_error_with_non_json_body() {
        let err = decode_response(raw(502, "Bad Gateway")).unwrap_err();
        let api = err.as_api().unwrap();
        assert_eq!(api.kind, ErrorKind::Api);
        assert_eq!(api.status_code(), Some(502));
        assert_eq!(api.body.as_deref(), Some("Bad Gateway"));
    }

    #[test]
    fn decode_error_without_message() {
        let err = decode_response(raw(404, "{}")).unwrap_err();
        let api = err.as_api().unwrap();
        assert_eq!(api.kind, ErrorKind::NotFound);
        assert_eq!(api.message, None);
    }
}
