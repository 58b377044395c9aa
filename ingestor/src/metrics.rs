use crate::errors::Result;
use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref DEVICES_REGISTERED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "ingestor_devices_registered_total",
        "Total devices registered"
    ))
    .unwrap();
    pub static ref DUPLICATE_DEVICES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "ingestor_duplicate_devices_total",
        "Total registrations rejected because the name was taken"
    ))
    .unwrap();
    pub static ref READINGS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "ingestor_readings_total",
        "Total readings stored"
    ))
    .unwrap();
    pub static ref REJECTED_READINGS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "ingestor_rejected_readings_total",
        "Total readings rejected (unknown device or invalid values)"
    ))
    .unwrap();
    pub static ref ANALYTICS_QUERIES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "ingestor_analytics_queries_total",
        "Total analytics queries served"
    ))
    .unwrap();
    pub static ref ANALYTICS_EMPTY_TOTAL: Counter = Counter::with_opts(Opts::new(
        "ingestor_analytics_empty_total",
        "Total analytics queries that matched no readings"
    ))
    .unwrap();
    pub static ref DB_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "ingestor_db_failures_total",
        "Total unclassified database failures"
    ))
    .unwrap();
    pub static ref ANALYTICS_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "ingestor_analytics_latency_seconds",
            "Time taken to load and summarize readings"
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0
        ])
    )
    .unwrap();
}

pub fn init_metrics() -> Result<()> {
    REGISTRY.register(Box::new(DEVICES_REGISTERED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DUPLICATE_DEVICES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(READINGS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REJECTED_READINGS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ANALYTICS_QUERIES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ANALYTICS_EMPTY_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DB_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ANALYTICS_LATENCY_SECONDS.clone()))?;
    Ok(())
}

pub fn gather_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
