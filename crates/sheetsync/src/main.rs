use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use sheets_connector::SheetsClient;
use sheetsync::config::{JobConfig, SyncConfig};
use sheetsync::errors::{JobError, Result};
use sheetsync::job::JobRunner;
use tracing::error;

#[derive(Parser)]
#[clap(name = "sheetsync")]
struct Arguments {
    /// Path to the jobs configuration file.
    #[clap(short = 'c', long, default_value = "jobs.json")]
    config: PathBuf,
    /// Path to the service account key file used to authenticate.
    #[clap(long, env = "GCP_SERVICE_ACCOUNT", hide_env_values = true)]
    service_account: PathBuf,
    /// Emit logs as JSON instead of human-readable lines.
    #[clap(long)]
    json_logs: bool,
    /// Names of jobs to run.
    ///
    /// If omitted, every job in the configuration runs, in order.
    #[clap(trailing_var_arg = true)]
    jobs: Vec<String>,
}

fn main() {
    let args = Arguments::parse();
    let format = if args.json_logs {
        logutil::LogFormat::Json
    } else {
        logutil::LogFormat::HumanReadable
    };
    logutil::configure_global_logger(tracing::Level::INFO, format, io::stderr);

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(JobError::from)
        .and_then(|runtime| runtime.block_on(inner(args)));

    if let Err(err) = result {
        println!("ERROR: {err}");
        std::process::exit(1);
    }
}

async fn inner(args: Arguments) -> Result<()> {
    let config = SyncConfig::from_file(&args.config)?;
    let key = std::fs::read_to_string(&args.service_account)?;
    let client = Arc::new(SheetsClient::connect(&key).await?);

    let selected: Vec<&JobConfig> = if args.jobs.is_empty() {
        config.jobs.iter().collect()
    } else {
        args.jobs
            .iter()
            .map(|name| {
                config
                    .job(name)
                    .ok_or_else(|| JobError::UnknownJob(name.clone()))
            })
            .collect::<Result<_>>()?
    };

    let runner = JobRunner::new(client);
    let mut failed = 0;
    for job in selected {
        // One bad job shouldn't starve the rest of the schedule.
        if let Err(err) = runner.run(job).await {
            error!(job = %job.name, error = %err, "job failed");
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(JobError::JobsFailed(failed));
    }
    Ok(())
}
