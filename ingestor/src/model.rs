use serde::{Deserialize, Serialize};

/// A registered telemetry source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub name: String,
}

/// One stored measurement row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Reading {
    pub id: i64,
    pub device_id: i64,
    pub timestamp: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// The three measurement axes of a reading, as loaded for analytics
#[derive(Debug, Clone, Copy, PartialEq, sqlx::FromRow)]
pub struct Axes {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisStats {
    pub min: f64,
    pub max: f64,
    pub count: usize,
    pub sum: f64,
    pub median: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceAnalytics {
    pub x: AxisStats,
    pub y: AxisStats,
    pub z: AxisStats,
}

/// Analytics response body. Callers tell the variants apart by the
/// presence of `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalyticsResponse {
    NoData { message: String },
    Stats(DeviceAnalytics),
}

impl AnalyticsResponse {
    pub fn no_data() -> Self {
        AnalyticsResponse::NoData {
            message: "No data found".to_string(),
        }
    }
}

impl From<Option<DeviceAnalytics>> for AnalyticsResponse {
    fn from(analytics: Option<DeviceAnalytics>) -> Self {
        analytics.map_or_else(Self::no_data, AnalyticsResponse::Stats)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}
