use api::{AppState, Config};
use chrono::Local;
use lambda::handler::function_handler;
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use serde_json::Value;
use tracing::{Level, Subscriber, info};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt};

/// Single-line events: timestamp, level, target, fields. No span context.
struct SimpleFmt;

impl<S, N> FormatEvent<S, N> for SimpleFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        write!(writer, "{} ", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))?;

        let level = match *event.metadata().level() {
            Level::ERROR => "ERROR",
            Level::WARN => "WARN ",
            Level::INFO => "INFO ",
            Level::DEBUG => "DEBUG",
            Level::TRACE => "TRACE",
        };
        write!(writer, "{} [{}] ", level, event.metadata().target())?;

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn init_tracing() -> Result<(), Error> {
    // CloudWatch shows escape codes verbatim
    unsafe {
        std::env::set_var("NO_COLOR", "1");
        std::env::set_var("TERM", "dumb");
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .event_format(SimpleFmt)
        .with_ansi(false);
    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);

    tracing::subscriber::set_global_default(subscriber).map_err(|e| {
        eprintln!("Failed to set tracing subscriber: {}", e);
        Error::from(format!("Failed to set tracing subscriber: {}", e))
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing()?;

    // Built once, shared by every invocation of this process
    let config = Config::from_env().map_err(|e| Error::from(format!("Invalid configuration: {:#}", e)))?;
    info!("Starting with {:?}", config);
    let state = AppState::from_config(config)
        .map_err(|e| Error::from(format!("Failed to initialize: {:#}", e)))?;
    let state = &state;

    run(service_fn(move |event: LambdaEvent<Value>| async move {
        function_handler(state, event).await
    }))
    .await
}
