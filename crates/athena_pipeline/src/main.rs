use std::sync::Arc;

use anyhow::Context;
use athena_client::config::Config;
use athena_client::http_client::ReqwestChatClient;
use athena_pipeline::store::NoopNotificationCenter;
use athena_pipeline::{
    Aggregator, ExportStore, PipelineConfig, SummaryKind, SummaryService, SystemClock,
};

fn usage() -> &'static str {
    "usage: athena [daily|workout|summarize <paragraphs>|remind]\n\
     health and calendar data are read from the JSON export at ATHENA_EXPORT_PATH;\n\
     `summarize` reads the text to summarize from stdin;\n\
     `remind` schedules the daily reminder at ATHENA_REMINDER_TIME"
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log filter from `ATHENA_LOG_LEVEL`, falling back to `RUST_LOG`, default `info`.
    let log_env = std::env::var("ATHENA_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    // Keep HTTP internals quiet by default
    let combined_filter = format!("{},hyper=warn,reqwest=warn", log_env);
    let env_filter = tracing_subscriber::EnvFilter::try_new(combined_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper=warn,reqwest=warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::info!("athena: log filter: {}", log_env);

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "daily".to_string());

    let chat_config = Config::from_env().context("reading chat configuration")?;
    let chat = ReqwestChatClient::from_config(&chat_config).context("building chat client")?;
    tracing::info!("athena: chat model {}", chat.model());

    let pipeline_config = PipelineConfig::from_env().context("reading pipeline configuration")?;

    let export = match std::env::var("ATHENA_EXPORT_PATH") {
        Ok(path) => ExportStore::from_path(&path).context("loading export")?,
        Err(_) => {
            tracing::warn!("athena: ATHENA_EXPORT_PATH not set, using an empty data set");
            ExportStore::default()
        }
    };
    let export = Arc::new(export);

    let aggregator = Aggregator::new(
        export.clone(),
        export,
        Arc::new(SystemClock),
        pipeline_config,
    );
    let service = SummaryService::new(aggregator, Arc::new(chat), Arc::new(NoopNotificationCenter));

    let result = match command.as_str() {
        "daily" => service.generate(SummaryKind::Daily).await,
        "workout" => service.generate(SummaryKind::Workout).await,
        "remind" => {
            let time = service.aggregator().config().reminder_time;
            if service.schedule_daily_reminder().await {
                println!("daily reminder scheduled for {}", time.format("%H:%M"));
            } else {
                println!("daily reminder not scheduled: notifications unavailable");
            }
            return Ok(());
        }
        "summarize" => {
            let paragraphs: u8 = args
                .next()
                .as_deref()
                .unwrap_or("3")
                .parse()
                .context("paragraph count must be a number")?;
            let text = tokio::task::spawn_blocking(|| std::io::read_to_string(std::io::stdin()))
                .await
                .context("reading stdin")??;
            service.summarize_text(&text, paragraphs).await
        }
        _ => {
            eprintln!("{}", usage());
            std::process::exit(2);
        }
    };

    match result {
        Ok(text) => {
            println!("{text}");
            Ok(())
        }
        Err(e) => {
            tracing::error!("athena: {}", e);
            anyhow::bail!(e.user_message())
        }
    }
}
