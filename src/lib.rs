//! Typed client for the Adyo ad-serving REST API.
//!
//! Resources are described by static [`resources::Descriptor`]s and handled by one generic
//! engine: [`Client`] turns an operation into a request, [`http`] classifies the response into
//! JSON or a typed [`ApiError`], and [`mapper`] rebuilds nested resources from the JSON.
//!
//! ```no_run
//! use adyo::{resources, Client, Config};
//! use serde_json::json;
//!
//! # async fn run() -> adyo::Result<()> {
//! let client = Client::new(Config::new("my-api-key"))?;
//! let placement = client
//!     .retrieve(&resources::PLACEMENT, 1, Some(vec![("expand".into(), "campaign".into())]))
//!     .await?;
//! if let Some(campaign) = placement.embedded_one("campaign") {
//!     println!("{:?}", campaign.value("name"));
//! }
//! let body = json!({"campaign_ids": [1, 2]}).as_object().cloned().unwrap_or_default();
//! let impressions = client.impression_count(body).await?;
//! println!("{:?}", impressions);
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod mapper;
pub mod pagination;
pub mod resources;
pub mod types;

pub use analytics::{AnalyticsResult, Heatmap};
pub use client::Client;
pub use config::{Api, Config, Endpoint};
pub use error::{ApiError, Error, ErrorKind, Result};
pub use mapper::{AttributeValue, Resource};
pub use pagination::Page;
pub use types::RateMeta;
