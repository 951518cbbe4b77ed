//! Resource operations over any [`Transport`]. Every call issues exactly one HTTP request.

use crate::analytics::{self, AnalyticsResult, Heatmap, Metric};
use crate::config::{Api, Config};
use crate::error::{Error, Result};
use crate::http::{self, ApiRequest, QueryParams, ReqwestTransport, Transport};
use crate::mapper::{self, Resource};
use crate::pagination::Page;
use crate::resources::{Descriptor, ZONE_GROUP};
use log::debug;
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct Client<T = ReqwestTransport> {
    config: Config,
    transport: T,
}

impl Client<ReqwestTransport> {
    pub fn new(config: Config) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self { config, transport })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env())
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: Config, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a raw request and return the decoded JSON body.
    pub async fn request(&self, request: ApiRequest) -> Result<Value> {
        http::execute(&self.transport, &self.config, request).await
    }

    /// Create a resource. For upload-capable types the body goes out as multipart and a
    /// `file` entry is read as a path to stream.
    pub async fn create(
        &self,
        descriptor: &'static Descriptor,
        body: Map<String, Value>,
    ) -> Result<Resource> {
        let request = ApiRequest::new(Method::POST, descriptor.path)
            .body(body)
            .multipart(descriptor.accepts_upload);
        let json = self.request(request).await?;
        mapper::map_one(descriptor, json)
    }

    pub async fn retrieve(
        &self,
        descriptor: &'static Descriptor,
        id: impl Display,
        params: Option<QueryParams>,
    ) -> Result<Resource> {
        let request = ApiRequest::new(Method::GET, descriptor.item_path(&id.to_string()))
            .query(params);
        let json = self.request(request).await?;
        mapper::map_one(descriptor, json)
    }

    pub async fn retrieve_all(
        &self,
        descriptor: &'static Descriptor,
        params: Option<QueryParams>,
    ) -> Result<Page> {
        let request = ApiRequest::new(Method::GET, descriptor.path).query(params);
        let json = self.request(request).await?;
        mapper::map_page(descriptor, json)
    }

    /// Send every plain attribute currently set, then apply the returned representation.
    pub async fn save(&self, resource: &mut Resource) -> Result<()> {
        let descriptor = resource.descriptor();
        let id = live_id(resource)?;
        let request = ApiRequest::new(
            descriptor.update_method.method(),
            descriptor.item_path(&id),
        )
        .body(resource.save_body())
        .multipart(descriptor.accepts_upload);
        let json = self.request(request).await?;
        resource.update_from(json)
    }

    /// On success only the id survives and the instance is flagged deleted.
    /// A 204 or an empty 2xx body counts as success here, and only here.
    pub async fn delete(&self, resource: &mut Resource) -> Result<()> {
        let descriptor = resource.descriptor();
        let id = live_id(resource)?;
        self.request(ApiRequest::new(Method::DELETE, descriptor.item_path(&id)).allow_empty(true))
            .await?;
        resource.mark_deleted();
        debug!("deleted {} {}", descriptor.name, id);
        Ok(())
    }

    pub async fn attach_zones(&self, group: &mut Resource, zone_ids: &[u64]) -> Result<()> {
        self.zone_membership(group, "attach", zone_ids).await
    }

    pub async fn detach_zones(&self, group: &mut Resource, zone_ids: &[u64]) -> Result<()> {
        self.zone_membership(group, "detach", zone_ids).await
    }

    async fn zone_membership(
        &self,
        group: &mut Resource,
        action: &'static str,
        zone_ids: &[u64],
    ) -> Result<()> {
        let descriptor = group.descriptor();
        if !std::ptr::eq(descriptor, &ZONE_GROUP) {
            return Err(Error::Unsupported {
                resource: descriptor.name,
                operation: "zone membership",
            });
        }
        let id = live_id(group)?;
        let mut body = Map::new();
        body.insert("zone_ids".into(), json!(zone_ids));
        let request = ApiRequest::new(
            Method::POST,
            format!("{}/{}", descriptor.item_path(&id), action),
        )
        .body(body);
        let json = self.request(request).await?;
        group.update_from(json)
    }

    pub async fn metric(&self, metric: &Metric, body: Map<String, Value>) -> Result<AnalyticsResult> {
        let request = ApiRequest::new(Method::POST, metric.path)
            .body(body.clone())
            .api(metric.api);
        let json = self.request(request).await?;
        analytics::decode(metric, &body, json)
    }

    pub async fn impression_count(&self, body: Map<String, Value>) -> Result<AnalyticsResult> {
        self.metric(&analytics::IMPRESSION_COUNT, body).await
    }

    pub async fn click_through_rate(&self, body: Map<String, Value>) -> Result<AnalyticsResult> {
        self.metric(&analytics::CLICK_THROUGH_RATE, body).await
    }

    pub async fn click_user_count(&self, body: Map<String, Value>) -> Result<AnalyticsResult> {
        self.metric(&analytics::CLICK_USER_COUNT, body).await
    }

    pub async fn heatmap(&self, body: Map<String, Value>) -> Result<Heatmap> {
        let request = ApiRequest::new(Method::POST, analytics::HEATMAP_PATH)
            .body(body)
            .api(Api::Analytics);
        let json = self.request(request).await?;
        analytics::decode_heatmap(json)
    }
}

fn live_id(resource: &Resource) -> Result<String> {
    let descriptor = resource.descriptor();
    let id = resource.id_segment().ok_or(Error::MissingId {
        resource: descriptor.name,
    })?;
    if resource.is_deleted() {
        return Err(Error::Deleted {
            resource: descriptor.name,
            id,
        });
    }
    Ok(id)
}
