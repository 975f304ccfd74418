use opentelemetry::{KeyValue, metrics::MeterProvider};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    metrics::{MeterProviderBuilder, PeriodicReader, SdkMeterProvider},
};
use std::time::Duration;

use crate::config::Config;

pub struct Metrics {
    pub lookup_counter: opentelemetry::metrics::Counter<u64>,
    pub lookup_duration: opentelemetry::metrics::Histogram<f64>,
}

impl Metrics {
    pub fn new(provider: &SdkMeterProvider) -> Self {
        let meter = provider.meter("user_lookup");

        Self {
            lookup_counter: meter
                .u64_counter("user_lookup_requests_total")
                .with_description("Lookup requests by outcome")
                .build(),
            lookup_duration: meter
                .f64_histogram("user_lookup_duration_milliseconds")
                .with_description("Lookup duration including the store query")
                .build(),
        }
    }

    /// Instruments backed by a provider without readers; nothing is exported
    pub fn disabled() -> Self {
        Self::new(&MeterProviderBuilder::default().build())
    }

    pub fn record_lookup(&self, outcome: &'static str, duration_ms: f64) {
        let labels = [KeyValue::new("outcome", outcome)];
        self.lookup_counter.add(1, &labels);
        self.lookup_duration.record(duration_ms, &labels);
    }
}

pub fn init_metrics(config: &Config) -> Result<(SdkMeterProvider, Metrics), anyhow::Error> {
    let resource = Resource::new(vec![KeyValue::new(
        "service.name",
        config.service_name.clone(),
    )]);

    let mut builder = MeterProviderBuilder::default().with_resource(resource);

    if let Some(endpoint) = &config.otlp_endpoint {
        let exporter = opentelemetry_otlp::MetricExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?;

        let reader = PeriodicReader::builder(exporter, opentelemetry_sdk::runtime::Tokio)
            .with_interval(Duration::from_secs(15))
            .build();

        builder = builder.with_reader(reader);
    }

    let provider = builder.build();
    let metrics = Metrics::new(&provider);

    Ok((provider, metrics))
}
