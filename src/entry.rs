use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::time::Instant;
use tracing::info;

use crate::args::{BenchArgs, OutputFormat};
use crate::auth::resolve_token;
use crate::config::{RunConfig, load_config, resolve_run_config};
use crate::error::AppResult;
use crate::probe::{
    ExecutionModel, HttpProber, Prober, ProgressSink, RouteRunner, Scheduler, build_client,
};
use crate::report::{ConsoleProgress, RunReport, confirm, plan_lines, print_json, print_report};
use crate::shutdown_handlers::{setup_signal_shutdown_handler, shutdown_channel};

/// How long worker threads get to notice shutdown once the run is over.
const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Everything settled before the first request goes out.
struct PreparedRun {
    run: RunConfig,
    token: String,
    output_format: OutputFormat,
    no_color: bool,
}

/// Process entry: parse, prepare, probe, report.
///
/// # Errors
///
/// Returns an error for invalid arguments, configuration, or token, or when
/// the runtime or HTTP client cannot be built.
pub fn run() -> AppResult<()> {
    let args = BenchArgs::parse();
    crate::logger::init_logging(args.verbose, args.no_color);

    let Some(prepared) = prepare(&args)? else {
        return Ok(());
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let outcome = runtime.block_on(execute(prepared));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);

    match outcome {
        Err(err) if err.is_interrupted() => {
            eprintln!("Run interrupted; no report produced.");
            Ok(())
        }
        other => other,
    }
}

/// Loads config, resolves the token, and asks for confirmation. `None` means
/// the user declined.
fn prepare(args: &BenchArgs) -> AppResult<Option<PreparedRun>> {
    let loaded = load_config(args.config.as_deref())?;
    if loaded.created {
        eprintln!(
            "Config {} not found; created it with sample routes.",
            loaded.path.display()
        );
    }
    let run = resolve_run_config(&loaded.file, args)?;

    print_plan(&run, &loaded.path, args.output_format);
    let token = resolve_token(args.token.as_deref())?;

    if !args.yes && !confirm(&mut std::io::stdin().lock(), &mut std::io::stderr())? {
        eprintln!("Cancelled.");
        return Ok(None);
    }

    Ok(Some(PreparedRun {
        run,
        token,
        output_format: args.output_format,
        no_color: args.no_color,
    }))
}

/// The plan goes to stdout for text reports and stderr for JSON so stdout
/// stays parseable.
fn print_plan(run: &RunConfig, config_path: &Path, output_format: OutputFormat) {
    for line in plan_lines(run, config_path) {
        match output_format {
            OutputFormat::Text => println!("{}", line),
            OutputFormat::Json => eprintln!("{}", line),
        }
    }
}

async fn execute(prepared: PreparedRun) -> AppResult<()> {
    let PreparedRun {
        run,
        token,
        output_format,
        no_color,
    } = prepared;

    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let client = build_client(run.connection_pool_size, run.timeout)?;
    let prober: Arc<dyn Prober> = Arc::new(HttpProber::new(
        client,
        &token,
        &run.payload,
        run.timeout,
    )?);
    let console = Arc::new(ConsoleProgress::new(
        run.total_probes(),
        output_format == OutputFormat::Text,
        no_color,
    ));
    let progress: Arc<dyn ProgressSink> = Arc::clone(&console) as Arc<dyn ProgressSink>;
    let strategy = ExecutionModel::new(run.strategy, &shutdown_tx);
    let runner = RouteRunner::new(
        prober,
        strategy.clone(),
        run.route_settings(),
        Arc::clone(&progress),
    );
    let scheduler = Scheduler::new(runner, strategy, run.max_concurrent_routes, progress);

    info!(
        "Probing {} route(s) x {} with {} strategy",
        run.routes.len(),
        run.test_count,
        run.strategy.as_str()
    );
    let started = Instant::now();
    let outcome = scheduler
        .run_all_until_shutdown(&run.routes, &mut shutdown_rx)
        .await;
    let elapsed = started.elapsed();
    console.finish();

    // Releases the signal handler on a normal finish.
    drop(shutdown_tx.send(()));
    signal_handle.await?;

    let results = outcome?;
    info!("Run finished in {:?}", elapsed);
    let report = RunReport::new(&results, &run, elapsed);
    match output_format {
        OutputFormat::Text => print_report(&report, no_color),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}
