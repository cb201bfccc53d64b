//! rshell CLI
//!
//! Launches a short-lived task from an application's console template,
//! opens an interactive shell inside it and stops the task afterwards.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rshell::output::{
    format_descriptor, print_error, print_info, print_success, print_warning, progress_message,
};
use rshell::prompt::{confirm_stdin, confirm_unless_cancelled};
use rshell::session::{build_session_config, collect_identities, SessionOverrides};
use rshell_aws::{load_sdk_config, Ec2AddressResolver, EcsOrchestrator};
use rshell_bridge::SshBridge;
use rshell_core::config::load_client_config;
use rshell_core::duration::parse_duration;
use rshell_core::error::{ConfigError, SessionError};
use rshell_core::RshellError;
use rshell_lifecycle::{LifecycleState, TaskLifecycle};

#[derive(Parser)]
#[command(name = "rshell")]
#[command(author, version, about = "Interactive shell in a fresh remote task")]
struct Cli {
    /// Application name; the `<APP>-console` task template is launched
    #[arg(value_name = "APP")]
    app: Option<String>,

    /// Application name (alternative to the positional argument)
    #[arg(long = "app", value_name = "APP", conflicts_with = "app")]
    app_flag: Option<String>,

    /// Use the application name as the template name without a suffix
    #[arg(long)]
    exact: bool,

    /// Named AWS credentials profile
    #[arg(long)]
    profile: Option<String>,

    /// Idle limit for the remote shell, e.g. 30m (0 disables it)
    #[arg(long, value_parser = parse_duration)]
    idle_time: Option<Duration>,

    /// Maximum session length, e.g. 12h
    #[arg(long, value_parser = parse_duration)]
    max_time: Option<Duration>,

    /// Ask for confirmation before launching
    #[arg(short, long)]
    interactive: bool,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Private key to offer after the generated one
    #[arg(long, value_name = "PATH")]
    identity: Option<PathBuf>,

    /// Offer only the generated key
    #[arg(long)]
    no_local_keys: bool,

    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            print_error(&format!("Failed to start runtime: {}", e));
            return ExitCode::FAILURE;
        }
    };

    let code = match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    };

    // A pending read on stdin must not hold the process open
    runtime.shutdown_background();
    code
}

/// Print a failure and pick the exit status for it
fn report(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<RshellError>() {
        Some(e @ RshellError::Session(SessionError::RemoteExit { .. })) => {
            tracing::info!("{}", e);
            ExitCode::from(e.exit_code())
        }
        Some(e) => {
            print_error(&e.to_string());
            ExitCode::from(e.exit_code())
        }
        None => {
            print_error(&format!("{:#}", error));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_client_config(cli.config.as_deref()).map_err(RshellError::from)?;

    let app = cli
        .app
        .or(cli.app_flag)
        .filter(|app| !app.is_empty())
        .ok_or_else(|| RshellError::from(ConfigError::MissingField("application name".to_string())))?;

    if cli.profile.is_some() {
        config.aws_profile = cli.profile;
    }

    let overrides = SessionOverrides {
        idle_time: cli.idle_time,
        max_time: cli.max_time,
        identity: cli.identity,
        no_local_keys: cli.no_local_keys,
    };
    let (identities, authorized_key) =
        collect_identities(&config, &overrides).context("Failed to prepare identities")?;
    let session = build_session_config(&config, &overrides, identities, authorized_key);

    let sdk_config = load_sdk_config(config.aws_profile.as_deref()).await;
    let cancel = CancellationToken::new();
    spawn_interrupt_watcher(cancel.clone());

    let lifecycle = TaskLifecycle::new(
        Arc::new(EcsOrchestrator::new(&sdk_config)),
        Arc::new(Ec2AddressResolver::new(&sdk_config)),
        &config,
        session.clone(),
    )
    .with_cancellation(cancel.clone());

    let template = config.remote.template_name(&app, cli.exact);
    let descriptor = lifecycle.resolve(&template).await?;
    tracing::info!(
        "Task definition {} uses port {}",
        descriptor.template_id,
        descriptor.port
    );

    if cli.interactive {
        let question = format!("Launch {}?", format_descriptor(&descriptor));
        let answer = confirm_unless_cancelled(move || confirm_stdin(&question), &cancel)
            .await
            .context("Confirmation prompt failed")?;
        match answer {
            Some(true) => {}
            Some(false) => {
                print_warning("Not launching");
                return Ok(());
            }
            None => return Err(RshellError::Interrupted.into()),
        }
    } else if !cli.quiet {
        print_info(&format!("Launching {}", format_descriptor(&descriptor)));
    }

    if !cli.quiet {
        spawn_progress_reporter(lifecycle.subscribe());
    }

    let bridge = SshBridge::new(session);
    lifecycle.execute(&descriptor, &bridge).await?;

    if !cli.quiet {
        print_success("Remote shell finished");
    }
    Ok(())
}

/// Print a line for each lifecycle stage worth mentioning
fn spawn_progress_reporter(mut states: watch::Receiver<LifecycleState>) {
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            if let Some(message) = progress_message(state) {
                print_info(message);
            }
        }
    });
}

/// Turn SIGINT/SIGTERM into cancellation of the lifecycle
fn spawn_interrupt_watcher(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler");

        #[cfg(unix)]
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }

        #[cfg(not(unix))]
        let _ = ctrl_c.await;

        tracing::debug!("Interrupt received");
        cancel.cancel();
    });
}
