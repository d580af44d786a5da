//! Lambda entry point that renders uploaded PDFs to page images.

use std::str::FromStr;

use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{LambdaEvent, run, service_fn};
use tracing_subscriber::{
    EnvFilter, Layer as _, filter::Directive, fmt::format::FmtSpan, layer::SubscriberExt,
    util::SubscriberInitExt as _,
};

use pdf_intake::{
    aws::load_aws_config,
    config::Config,
    handlers::rasterize,
    response::HandlerResponse,
    storage::{S3, Storage},
};

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    init_tracing();

    // Configuration and clients are built once and reused across
    // invocations of this sandbox.
    let config = Config::from_env()?;
    let aws_config = load_aws_config().await?;
    let storage = S3::new(&aws_config);

    let config_ref = &config;
    let storage_ref = &storage;
    run(service_fn(move |event: LambdaEvent<S3Event>| async move {
        handle(event, storage_ref, config_ref).await
    }))
    .await
}

/// Adapt the library handler to the Lambda runtime's error type.
async fn handle(
    event: LambdaEvent<S3Event>,
    storage: &dyn Storage,
    config: &Config,
) -> Result<HandlerResponse, lambda_runtime::Error> {
    Ok(rasterize::handle(event.payload, storage, config).await?)
}

/// Initialize tracing, writing to standard error for CloudWatch.
fn init_tracing() {
    let directive =
        Directive::from_str("info").expect("built-in directive should be valid");
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(subscriber).init();
}
