use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use dgraph_sandbox::{AdminClient, InstanceHandle, Launcher, SandboxConfig, SchemaLoad};

#[derive(Parser)]
#[command(name = "dgraph-sandbox", about = "Disposable Dgraph instances in Docker")]
enum Cli {
    /// Start an instance and wait until it serves HTTP
    Start {
        /// Image to run (defaults to DGRAPH_SANDBOX_IMAGE or the pinned image)
        #[arg(long)]
        image: Option<String>,
        /// Schema file to load once the instance is up
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Write the instance handle here instead of stdout
        #[arg(long)]
        handle_file: Option<PathBuf>,
    },
    /// Stop and remove an instance
    Stop {
        #[arg(long)]
        handle_file: PathBuf,
    },
    /// Install a schema on a running instance
    LoadSchema {
        #[arg(long)]
        handle_file: PathBuf,
        schema: PathBuf,
    },
    /// Delete all data, keeping the schema
    DropData {
        #[arg(long)]
        handle_file: PathBuf,
    },
    /// Delete all data and the schema
    DropAll {
        #[arg(long)]
        handle_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dgraph_sandbox=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_tree::HierarchicalLayer::new(2)
                .with_targets(true)
                .with_bracketed_fields(false),
        )
        .init();

    let config = SandboxConfig::from_env();

    match Cli::parse() {
        Cli::Start {
            image,
            schema,
            handle_file,
        } => start(&config, image.as_deref(), schema.as_deref(), handle_file.as_deref()).await,
        Cli::Stop { handle_file } => {
            let handle = read_handle(&handle_file)?;
            let launcher = Launcher::connect(&config)
                .await
                .context("failed to connect to docker")?;
            launcher
                .teardown(&handle)
                .await
                .with_context(|| format!("failed to tear down {}", handle.container_id))
        }
        Cli::LoadSchema {
            handle_file,
            schema,
        } => {
            let handle = read_handle(&handle_file)?;
            load_schema(&config, &handle, &schema).await
        }
        Cli::DropData { handle_file } => {
            let handle = read_handle(&handle_file)?;
            AdminClient::from_config(&handle, &config)
                .drop_data()
                .await
                .context("drop data failed")
        }
        Cli::DropAll { handle_file } => {
            let handle = read_handle(&handle_file)?;
            AdminClient::from_config(&handle, &config)
                .drop_all()
                .await
                .context("drop all failed")
        }
    }
}

async fn start(
    config: &SandboxConfig,
    image: Option<&str>,
    schema: Option<&Path>,
    handle_file: Option<&Path>,
) -> Result<()> {
    let launcher = Launcher::connect(config)
        .await
        .context("failed to connect to docker")?;
    let started = launcher
        .start(image)
        .await
        .context("failed to start dgraph container")?;

    if !started.readiness.is_ready() {
        tracing::warn!(
            attempts = started.readiness.attempts(),
            "instance never answered 200; later calls may fail"
        );
    }

    // Persist the handle before anything else can fail, so it can be stopped.
    match handle_file {
        Some(path) => write_handle(path, &started.handle)?,
        None => println!("{}", serde_json::to_string_pretty(&started.handle)?),
    }

    if let Some(schema) = schema {
        load_schema(config, &started.handle, schema).await?;
    }
    Ok(())
}

async fn load_schema(config: &SandboxConfig, handle: &InstanceHandle, path: &Path) -> Result<()> {
    let schema = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema file {}", path.display()))?;

    match AdminClient::from_config(handle, config)
        .load_schema(&schema)
        .await
        .context("schema load failed")?
    {
        SchemaLoad::Succeeded { .. } => Ok(()),
        SchemaLoad::Exhausted { attempts } => {
            bail!("instance still not accepting the schema after {attempts} attempts")
        }
    }
}

fn read_handle(path: &Path) -> Result<InstanceHandle> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read handle file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid handle file {}", path.display()))
}

fn write_handle(path: &Path, handle: &InstanceHandle) -> Result<()> {
    let json = serde_json::to_string_pretty(handle)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write handle file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_file_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("handle.json");
        let handle = InstanceHandle::new("c0ffee", 41000);

        write_handle(&path, &handle).unwrap();
        assert_eq!(read_handle(&path).unwrap(), handle);
    }

    #[test]
    fn missing_handle_file_names_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nope.json");
        let err = read_handle(&path).unwrap_err();
        assert!(err.to_string().contains("nope.json"));
    }

    #[test]
    fn garbage_handle_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("handle.json");
        std::fs::write(&path, "not json").unwrap();
        let err = read_handle(&path).unwrap_err();
        assert!(err.to_string().contains("invalid handle file"));
    }

    #[test]
    fn cli_parses_start_flags() {
        let cli = Cli::try_parse_from([
            "dgraph-sandbox",
            "start",
            "--image",
            "dgraph/standalone:v23.1.0",
            "--handle-file",
            "/tmp/h.json",
        ])
        .unwrap();
        match cli {
            Cli::Start {
                image,
                schema,
                handle_file,
            } => {
                assert_eq!(image.as_deref(), Some("dgraph/standalone:v23.1.0"));
                assert!(schema.is_none());
                assert_eq!(handle_file, Some(PathBuf::from("/tmp/h.json")));
            }
            _ => panic!("expected start"),
        }
    }

    #[test]
    fn cli_requires_handle_file_for_stop() {
        assert!(Cli::try_parse_from(["dgraph-sandbox", "stop"]).is_err());
    }
}
