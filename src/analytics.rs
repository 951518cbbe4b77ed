//! Analytics endpoints: scalar metrics that turn into grouped rows when `group_by` is set,
//! and the heatmap, which always has the same shape.

use crate::config::Api;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metric {
    pub name: &'static str,
    pub path: &'static str,
    /// Field carrying the value in an ungrouped response.
    pub field: &'static str,
    pub api: Api,
}

pub const IMPRESSION_COUNT: Metric = Metric {
    name: "impression count",
    path: "analytics/impressions",
    field: "count",
    api: Api::Primary,
};

pub const CLICK_THROUGH_RATE: Metric = Metric {
    name: "click-through rate",
    path: "analytics/ctr",
    field: "rate",
    api: Api::Primary,
};

pub const CLICK_USER_COUNT: Metric = Metric {
    name: "click user count",
    path: "analytics/click-users",
    field: "count",
    api: Api::Primary,
};

pub const HEATMAP_PATH: &str = "heatmap";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalyticsResult {
    Single(Number),
    Aggregated(Vec<Record>),
}

impl AnalyticsResult {
    pub fn as_single(&self) -> Option<&Number> {
        match self {
            AnalyticsResult::Single(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_aggregated(&self) -> Option<&[Record]> {
        match self {
            AnalyticsResult::Aggregated(rows) => Some(rows),
            _ => None,
        }
    }
}

pub fn is_grouped(request: &Map<String, Value>) -> bool {
    request.get("group_by").is_some_and(|v| !v.is_null())
}

/// Which branch applies is decided by the request body alone.
pub fn decode(metric: &Metric, request: &Map<String, Value>, response: Value) -> Result<AnalyticsResult> {
    if is_grouped(request) {
        decode_aggregated(response).map(AnalyticsResult::Aggregated)
    } else {
        decode_single(metric, response).map(AnalyticsResult::Single)
    }
}

/// A missing or null metric field reads as zero.
pub fn decode_single(metric: &Metric, response: Value) -> Result<Number> {
    let Some(object) = response.as_object() else {
        return Err(Error::UnexpectedShape(format!(
            "{} response is not an object",
            metric.name
        )));
    };
    match object.get(metric.field) {
        None | Some(Value::Null) => Ok(Number::from(0)),
        Some(Value::Number(n)) => Ok(n.clone()),
        Some(other) => Err(Error::UnexpectedShape(format!(
            "{} `{}` is not a number: {}",
            metric.name, metric.field, other
        ))),
    }
}

pub fn decode_aggregated(response: Value) -> Result<Vec<Record>> {
    let rows = match response {
        Value::Array(rows) => rows,
        other => {
            return Err(Error::UnexpectedShape(format!(
                "grouped analytics response is not an array: {}",
                other
            )))
        }
    };
    rows.into_iter()
        .map(|row| match row {
            Value::Object(record) => Ok(record),
            other => Err(Error::UnexpectedShape(format!(
                "grouped analytics row is not an object: {}",
                other
            ))),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub bounding_box: BoundingBox,
    /// Points, typically `count`, `geohash`, `lat` and `lon`.
    pub items: Vec<Record>,
}

pub fn decode_heatmap(response: Value) -> Result<Heatmap> {
    serde_json::from_value(response)
        .map_err(|e| Error::UnexpectedShape(format!("bad heatmap response: {}", e)))
}
