use blob_relay::cli::RelayArgs;
use blob_relay::{ReportNotifier, StorageProviderFactory, SweepOrchestrator};
use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = RelayArgs::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Blob relay failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: RelayArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let start = Instant::now();
    info!("Blob relay sweep triggered");

    let config = args.into_config()?;

    let live = StorageProviderFactory::from_config(config.source_storage_config()).await?;
    let archive = StorageProviderFactory::from_config(config.archive_storage_config()).await?;
    let destination =
        StorageProviderFactory::from_config(config.destination_storage_config()).await?;
    info!(
        "Stores ready source={} archive={} destination={}",
        live.base_path(),
        archive.base_path(),
        destination.base_path()
    );

    let notifier = ReportNotifier::from_config(&config.notification);
    let orchestrator = SweepOrchestrator::builder(live, archive, destination)
        .with_prefixes(config.source_prefixes.clone())
        .with_base_path(config.destination_base_path.clone())
        .with_failure_policy(config.failure_policy)
        .with_copy_confirmation(config.copy_confirmation)
        .with_notifier(notifier)
        .build();

    let report = orchestrator.run_sweep().await?;
    info!(
        "Blob relay sweep complete {} took={}",
        report,
        start.elapsed().as_millis()
    );
    Ok(())
}
