//! `cleanroom` command line entry point.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, Instrument};

use cleanroom::client::{EnvToken, HttpResourceClient, ResourceClient};
use cleanroom::config::parse_parameters;
use cleanroom::controller::{ControllerSettings, NotebookRunRequest, StationController};
use cleanroom::core::StationRef;
use cleanroom::events::LoggingEventSink;
use cleanroom::handoff::{FileHandoffStore, HandoffScope, PhaseHandoffStore};
use cleanroom::observability::init_tracing;
use cleanroom::orchestrator::{run_phase, teardown_phase};

use crate::cli::{Cli, Command, HandoffArgs, ListArgs, RunArgs, StationArgs, TeardownArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format).context("failed to set up logging")?;

    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("cleanroom", run_id = %run_id);

    let result = async {
        match &cli.command {
            Command::Run(args) => run(&cli, args).await,
            Command::Teardown(args) => teardown(&cli, args).await,
            Command::ListStations(args) => list_stations(&cli, args).await,
        }
    }
    .instrument(span)
    .await;

    if let Err(err) = &result {
        error!(error = %format!("{err:#}"), "Command failed");
    }
    result
}

fn client(cli: &Cli) -> Result<Arc<dyn ResourceClient>> {
    let credentials = Arc::new(EnvToken::new(cli.token_env.clone()));
    let client = HttpResourceClient::new(&cli.client_config(), credentials)
        .context("failed to create platform client")?;
    Ok(Arc::new(client))
}

fn station(args: &StationArgs) -> Result<StationRef> {
    StationRef::new(args.clean_room.clone(), args.station_name.clone())
        .context("invalid station")
}

fn scope(args: &HandoffArgs) -> HandoffScope {
    let store: Arc<dyn PhaseHandoffStore> =
        Arc::new(FileHandoffStore::new(args.handoff_dir.clone()));
    HandoffScope::new(store, args.task_key.clone())
}

async fn run(cli: &Cli, args: &RunArgs) -> Result<()> {
    let station = station(&args.station)?;
    let notebook_parameters = parse_parameters("Notebook Parameters", &args.notebook_parameters)?;
    let output_tables =
        parse_parameters("Output Table Parameters", &args.output_table_parameters)?;

    let mut settings = ControllerSettings::new(args.user_name.clone())
        .with_polling(&args.polling_config());
    if let Some(host) = &args.browser_host {
        settings = settings.with_browser_host(host.clone());
    }

    let controller = StationController::new(client(cli)?, station, settings)?
        .with_event_sink(Arc::new(LoggingEventSink::info()));
    let request = NotebookRunRequest::new(args.collaborator.clone(), args.notebook_name.clone())
        .with_parameters(notebook_parameters)
        .with_output_tables(output_tables);

    let outcome = run_phase(&controller, &scope(&args.handoff), &request)
        .await
        .context("run phase failed")?;

    println!("{}", outcome.results_link_html());
    Ok(())
}

async fn teardown(cli: &Cli, args: &TeardownArgs) -> Result<()> {
    let station = station(&args.station)?;
    // Teardown never imports output, so no owner is needed.
    let controller = StationController::new(client(cli)?, station, ControllerSettings::new(""))?
        .with_event_sink(Arc::new(LoggingEventSink::info()));

    let summary = teardown_phase(&controller, &scope(&args.handoff))
        .await
        .context("teardown phase failed")?;

    if !summary.station_created {
        info!("Nothing to tear down");
        return Ok(());
    }
    if let Some(link) = summary.results_link_html() {
        println!("{link}");
    }
    Ok(())
}

async fn list_stations(cli: &Cli, args: &ListArgs) -> Result<()> {
    let stations = client(cli)?
        .list_stations(&args.clean_room)
        .await
        .with_context(|| format!("failed to list stations of {}", args.clean_room))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&stations).context("failed to render stations")?
    );
    Ok(())
}
