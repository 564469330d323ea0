//! `debstash` command line.

mod error;

use crate::error::{ErrorKind, Result};
use clap::{Args, Parser, Subcommand};
use debstash_archive::Archive;
use debstash_catalogue::ListFilter;
use debstash_config::Config;
use debstash_extract::DebExtractor;
use debstash_index::{GpgSigner, SignerHandle};
use exn::ResultExt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "DEBSTASH_LOG";

/// Manage an APT repository of binary packages.
#[derive(Parser, Debug)]
#[command(name = "debstash", version, about, long_about = None)]
struct Cli {
    /// Configuration file, instead of searching the usual places.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log decisions as well as changes.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add package files to a release.
    Add(AddArgs),
    /// Withdraw a package from a release.
    Remove(RemoveArgs),
    /// List packages in the catalogue.
    List(ListArgs),
    /// Regenerate index files and release manifests.
    Publish(PublishArgs),
}

#[derive(Args, Debug)]
struct AddArgs {
    /// Target release; defaults to the configured default release.
    #[arg(short, long)]
    release: Option<String>,
    /// Target component; defaults to the component rules.
    #[arg(short, long)]
    component: Option<String>,
    /// Publish changed releases afterwards.
    #[arg(long)]
    publish: bool,
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct RemoveArgs {
    #[arg(short, long)]
    release: String,
    /// Publish changed releases afterwards.
    #[arg(long)]
    publish: bool,
    name: String,
    architecture: String,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(short, long)]
    release: Option<String>,
    #[arg(short, long)]
    component: Option<String>,
    #[arg(short, long)]
    architecture: Option<String>,
    /// Shell-style glob on package names.
    pattern: Option<String>,
}

#[derive(Args, Debug)]
struct PublishArgs {
    /// Rebuild every index, not just the changed ones.
    #[arg(long)]
    force: bool,
    /// Leave release manifests unsigned.
    #[arg(long)]
    no_sign: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let mut archive = Archive::open(config, Arc::new(DebExtractor)).await.or_raise(|| ErrorKind::Open)?;
    match cli.command {
        Command::Add(args) => add(&mut archive, args).await,
        Command::Remove(args) => {
            let removed = archive
                .remove(&args.name, &args.architecture, &args.release)
                .await
                .or_raise(|| ErrorKind::Command("remove"))?;
            println!(
                "removed {} ({}) from {}/{}, {} references left",
                args.name, args.architecture, removed.release, removed.component, removed.remaining
            );
            if args.publish {
                publish(&mut archive, false, false).await?;
            }
            Ok(())
        },
        Command::List(args) => list(&archive, args).await,
        Command::Publish(args) => publish(&mut archive, args.force, args.no_sign).await,
    }
}

async fn add(archive: &mut Archive, args: AddArgs) -> Result<()> {
    let report = archive
        .ingest_all(&args.files, args.release.as_deref(), args.component.as_deref())
        .await
        .or_raise(|| ErrorKind::Command("add"))?;
    for outcome in &report.ingested {
        println!(
            "{}/{}: {} (id {}) {}",
            outcome.release,
            outcome.component,
            outcome.path.display(),
            outcome.package_id,
            outcome.disposition
        );
    }
    if args.publish {
        publish(archive, false, false).await?;
    }
    if !report.is_success() {
        exn::bail!(ErrorKind::Partial(report.failed.len(), args.files.len()));
    }
    Ok(())
}

async fn list(archive: &Archive, args: ListArgs) -> Result<()> {
    let filter = ListFilter {
        release: args.release,
        component: args.component,
        architecture: args.architecture,
        pattern: args.pattern,
    };
    let references = archive
        .catalogue()
        .list(&filter)
        .await
        .or_raise(|| ErrorKind::Command("list"))?;
    for r in references {
        println!("{}\t{}\t{}\t{}\t{}\t{}", r.release, r.component, r.name, r.version, r.architecture, r.path.display());
    }
    Ok(())
}

async fn publish(archive: &mut Archive, force: bool, no_sign: bool) -> Result<()> {
    let signer: Option<SignerHandle> = if no_sign {
        None
    } else {
        Some(Arc::new(GpgSigner::discover().or_raise(|| ErrorKind::Command("publish"))?))
    };
    let published = archive.publish(force, signer).await.or_raise(|| ErrorKind::Command("publish"))?;
    for release in published {
        println!(
            "published {}: {} indexes rebuilt{}",
            release.release,
            release.rebuilt.len(),
            if release.signed { ", signed" } else { "" }
        );
    }
    Ok(())
}
