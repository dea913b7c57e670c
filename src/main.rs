use clap::Parser;
use distributed_calculator::agent::{Agent, AgentSettings};
use distributed_calculator::calculator::evaluate;
use distributed_calculator::config::{AgentArgs, Cli, Command, ServeArgs};
use distributed_calculator::orchestrator::handlers::router;
use distributed_calculator::orchestrator::{Housekeeper, Scheduler, SchedulerSettings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Agent(args) => run_agent(args).await,
        Command::Eval { expression } => {
            let value = evaluate(&expression)?;
            println!("{}", value);
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let settings = SchedulerSettings::from(&args);
    tracing::info!(
        "Lease timeout {:?}, operation times {:?}",
        settings.max_process_time,
        settings.operation_times
    );

    // 1. Scheduler and its stores:
    let scheduler = Scheduler::new(settings);

    // 2. Periodic cleanup:
    let housekeeping = Housekeeper::new(
        scheduler.clone(),
        args.housekeeping_interval(),
        args.expression_retention(),
    )
    .start();

    // 3. HTTP server:
    let app = router(scheduler);
    let listener = tokio::net::TcpListener::bind(args.bind).await?;

    tracing::info!("Orchestrator listening on {}", args.bind);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    housekeeping.abort();
    tracing::info!("Orchestrator stopped");
    Ok(())
}

async fn run_agent(args: AgentArgs) -> anyhow::Result<()> {
    let agent = Agent::new(AgentSettings::from(&args));
    let workers = agent.start();

    tracing::info!("Press Ctrl+C to shutdown");
    tokio::signal::ctrl_c().await?;

    for worker in workers {
        worker.abort();
    }
    tracing::info!("Agent stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
