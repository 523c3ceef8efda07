use std::io::Write;

use anyhow::Context;
use bulkhead::config::Config;
use bulkhead::docker::detect::describe_environment;
use bulkhead::docker::logs::DEFAULT_TAIL;
use bulkhead::docker::{AutoRefresh, DockerClient, LogFetcher, Snapshot};
use bulkhead::stream::LogStream;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "bulkhead", about = "Inspect and drive a local Docker Engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all containers
    Ps,
    /// List images
    Images,
    /// Show a container with its inspect details
    Inspect { id: String },
    /// Show an image's inspect document
    Image { id: String },
    Start { id: String },
    Stop { id: String },
    /// Print the last lines of a container's logs
    Logs {
        id: String,
        #[arg(long, default_value_t = DEFAULT_TAIL)]
        tail: usize,
        /// Show stderr instead of stdout (non-TTY containers)
        #[arg(long)]
        stderr: bool,
    },
    /// Run a command in a running container and print its stdout
    Exec {
        id: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },
    /// Refresh container and image lists until interrupted
    Watch,
    /// Show or update stored preferences
    Config {
        #[arg(long)]
        socket: Option<String>,
        /// Refresh interval in seconds
        #[arg(long)]
        interval: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::load()?;

    if let Command::Config { socket, interval } = &cli.command {
        if let Some(socket) = socket {
            cfg.set_docker_host_path(socket.into());
        }
        if let Some(secs) = *interval {
            cfg.set_refresh_interval(secs)?;
        }
        if socket.is_some() || interval.is_some() {
            cfg.save()?;
        }
        print_config(&cfg);
        return Ok(());
    }

    let client = DockerClient::from_config(&cfg)?;
    if let Err(e) = run(cli.command, client, &cfg).await {
        if let Some(docker) = e.downcast_ref::<bulkhead::DockerError>() {
            tracing::error!(
                connection = docker.is_connection_error(),
                "{}",
                docker.recovery_suggestion()
            );
        }
        return Err(e);
    }

    Ok(())
}

async fn run(command: Command, client: DockerClient, cfg: &Config) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();

    match command {
        Command::Ps => {
            for c in client.list_containers().await? {
                writeln!(
                    out,
                    "{:<14} {:<30} {:<30} {}",
                    short_id(&c.id),
                    c.title(),
                    c.image,
                    c.status
                )?;
            }
        }
        Command::Images => {
            for image in client.list_images().await? {
                writeln!(
                    out,
                    "{:<14} {:<40} {}",
                    short_id(&image.id),
                    image.title(),
                    image.size
                )?;
            }
        }
        Command::Inspect { id } => {
            let containers = client.list_containers().await?;
            let base = containers
                .iter()
                .find(|c| c.id.starts_with(&id) || c.title() == id)
                .with_context(|| format!("no container matches {id}"))?;
            let enriched = client.enrich_container(base).await?;
            writeln!(out, "{}", serde_json::to_string_pretty(&enriched)?)?;
        }
        Command::Image { id } => {
            let inspection = client.inspect_image(&id).await?;
            writeln!(out, "{}", serde_json::to_string_pretty(&inspection)?)?;
        }
        Command::Start { id } => client.start_container(&id).await?,
        Command::Stop { id } => client.stop_container(&id).await?,
        Command::Logs { id, tail, stderr } => {
            let stream = if stderr { LogStream::Stderr } else { LogStream::Stdout };
            for line in LogFetcher::new(client).fetch_logs(&id, tail, stream).await? {
                out.write_all(&line)?;
            }
        }
        Command::Exec { id, command } => {
            let output = client.exec(&id, &command, false).await?;
            out.write_all(&output)?;
        }
        Command::Watch => {
            drop(out);
            watch_lists(client, cfg).await;
        }
        Command::Config { .. } => print_config(cfg),
    }

    Ok(())
}

async fn watch_lists(client: DockerClient, cfg: &Config) {
    let (tx, mut rx) = watch::channel(Snapshot::default());
    let cancel = CancellationToken::new();
    let refresher =
        tokio::spawn(AutoRefresh::new(client, cfg.refresh_interval).run(tx, cancel.clone()));

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                report(&snapshot);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    cancel.cancel();
    let _ = refresher.await;
}

fn report(snapshot: &Snapshot) {
    match (&snapshot.container_error, &snapshot.image_error) {
        (None, None) => tracing::info!(
            containers = snapshot.containers.len(),
            images = snapshot.images.len(),
            "Lists refreshed"
        ),
        (containers, images) => tracing::warn!(
            connection = snapshot.has_connection_error(),
            container_error = ?containers.as_ref().map(|e| e.to_string()),
            image_error = ?images.as_ref().map(|e| e.to_string()),
            "Refresh failed"
        ),
    }
}

fn print_config(cfg: &Config) {
    match &cfg.docker_host_path {
        Some(path) => println!(
            "dockerHostPath: {} ({}, from {:?})",
            path.display(),
            describe_environment(path),
            cfg.socket_source
        ),
        None => println!("dockerHostPath: <none>"),
    }
    println!("refreshInterval: {}", cfg.refresh_interval.as_secs_f64());
    println!("preferences: {}", cfg.preferences_path.display());
}

fn short_id(id: &str) -> &str {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    &id[..id.len().min(12)]
}
