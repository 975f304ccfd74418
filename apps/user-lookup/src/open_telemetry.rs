use crate::config::{Config, RuntimeMode};
use opentelemetry::{KeyValue, global, trace::TracerProvider};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    logs::LoggerProvider as SdkLoggerProvider,
    propagation::TraceContextPropagator,
    runtime,
    trace::{RandomIdGenerator, Sampler, Tracer, TracerProvider as SdkTracerProvider},
};
use tracing::error;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "user_lookup=info,user_store=info,lambda_runtime=info";

/// Handles that must outlive the subscriber so batched telemetry gets flushed
pub struct Telemetry {
    logger_provider: Option<SdkLoggerProvider>,
}

impl Telemetry {
    pub fn shutdown(self) {
        global::shutdown_tracer_provider();
        if let Some(provider) = self.logger_provider {
            if let Err(e) = provider.shutdown() {
                error!(error = %e, "Failed to shutdown logger provider");
            }
        }
    }
}

struct OtlpPipeline {
    tracer: Tracer,
    logger_provider: SdkLoggerProvider,
}

/// Install the global subscriber.
///
/// Console output is JSON under Lambda (one object per line for CloudWatch) and
/// compact text otherwise. OTLP export is only wired when an endpoint is set.
pub fn init_tracing(config: &Config) -> Result<Telemetry, anyhow::Error> {
    let otlp = match &config.otlp_endpoint {
        Some(endpoint) => Some(otlp_pipeline(endpoint, &config.service_name)?),
        None => None,
    };

    let trace_layer = otlp
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer.clone()));
    let log_layer = otlp
        .as_ref()
        .map(|p| OpenTelemetryTracingBridge::new(&p.logger_provider));

    let (json_layer, text_layer) = match config.mode {
        RuntimeMode::Lambda => (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .without_time(),
            ),
            None,
        ),
        RuntimeMode::Server => (None, Some(tracing_subscriber::fmt::layer().compact())),
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    Registry::default()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(trace_layer)
        .with(log_layer)
        .try_init()?;

    Ok(Telemetry {
        logger_provider: otlp.map(|p| p.logger_provider),
    })
}

fn otlp_pipeline(endpoint: &str, service_name: &str) -> Result<OtlpPipeline, anyhow::Error> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::new(vec![KeyValue::new(
        "service.name",
        service_name.to_string(),
    )]);

    let trace_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(trace_exporter, runtime::Tokio)
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource.clone())
        .build();

    // Take the tracer before the provider moves into the global slot
    let tracer = tracer_provider.tracer(service_name.to_string());
    global::set_tracer_provider(tracer_provider);

    let log_exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let logger_provider = SdkLoggerProvider::builder()
        .with_batch_exporter(log_exporter, runtime::Tokio)
        .with_resource(resource)
        .build();

    Ok(OtlpPipeline {
        tracer,
        logger_provider,
    })
}
