//! `capmatch` — prompt-time capability matching for the `UserPromptSubmit`
//! hook.
//!
//! Without a subcommand it runs as the hook: read one trigger payload from
//! stdin, evaluate every discovered matcher, and print a reply on stdout
//! when there is something worth suggesting. The hot path is tuned for the
//! common case of no matchers at all: discovery runs with plain std before
//! the async runtime is even built, and an empty scan exits immediately.
//!
//! The only failure the host should ever see is a malformed trigger
//! payload. Everything else — broken matchers, unreadable config, runtime
//! trouble — degrades to silence with a log line on stderr.

use std::{io::Read, process::ExitCode};

use {
    clap::{Parser, Subcommand},
    tracing::{debug, error},
    tracing_subscriber::EnvFilter,
};

use {
    capmatch_common::Protocol,
    capmatch_config::Settings,
    capmatch_context::{InvocationContext, TriggerPayload},
    capmatch_discovery::{SearchRoots, filter, records_from_candidates},
    capmatch_runner::pipeline,
};

#[derive(Debug, Parser)]
#[command(name = "capmatch", version, about = "Prompt-time capability matcher")]
struct Cli {
    /// Log filter directive, e.g. `warn` or `capmatch_runner=debug`.
    #[arg(long, env = "CAPMATCH_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every matcher discovery would run, with kind and origin.
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is reserved for the reply.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            error!(%e, "cannot resolve working directory");
            return ExitCode::SUCCESS;
        },
    };
    let roots = SearchRoots::defaults(&cwd);

    match cli.command {
        Some(Command::List) => list(&roots),
        None => hook(&roots),
    }
}

/// The hook path. Exits non-zero only for a malformed trigger payload.
fn hook(roots: &SearchRoots) -> ExitCode {
    // Fast filter: no matchers on disk means nothing to do, and no reason
    // to read stdin or pay for a runtime.
    let candidates = filter::candidates(roots, Protocol::CURRENT);
    if candidates.is_empty() {
        debug!("no matcher candidates, exiting");
        return ExitCode::SUCCESS;
    }

    let mut raw = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut raw) {
        error!(%e, "failed to read trigger payload");
        return ExitCode::FAILURE;
    }
    let payload = match TriggerPayload::from_json(&raw) {
        Ok(payload) => payload,
        Err(e) => {
            error!(%e, "rejecting trigger payload");
            return ExitCode::FAILURE;
        },
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(%e, "failed to start async runtime");
            return ExitCode::SUCCESS;
        },
    };

    runtime.block_on(async {
        let records = records_from_candidates(roots, Protocol::CURRENT, candidates);
        let ctx = InvocationContext::new(payload, Protocol::CURRENT);
        let settings = Settings::load();

        if let Some(reply) = pipeline::run(records, &ctx, &settings).await {
            match serde_json::to_string(&reply) {
                Ok(json) => println!("{json}"),
                Err(e) => error!(%e, "failed to serialize reply"),
            }
        }
    });

    ExitCode::SUCCESS
}

fn list(roots: &SearchRoots) -> ExitCode {
    let records = capmatch_discovery::discover(roots, Protocol::CURRENT);
    if records.is_empty() {
        println!("no matchers discovered");
        return ExitCode::SUCCESS;
    }
    for record in records {
        println!(
            "{:<10} {:<24} {:<8} {}",
            record.kind,
            record.name,
            record.source,
            record.path.display()
        );
    }
    ExitCode::SUCCESS
}
