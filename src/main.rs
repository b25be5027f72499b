use clap::Parser; // for cli
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use toolbelt::config::{Args, Command, S3Command, ServeArgs};
use toolbelt::handlers::router;
use toolbelt::misc::{elapsed_since, format_std_duration};
use toolbelt::pruner::pruner;
use toolbelt::state::AppState;
use toolbelt::{Error, ObjectStorage, Result, S3Config, TimestampGate};

// this is main async function with tokio
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // parse cli arguments
    let args = Args::parse();

    match args.command {
        Command::Serve(serve_args) => serve(serve_args).await,
        Command::S3 { s3, op } => run_s3(S3Config::from(s3), op).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let ttl = args.gate_ttl();
    let prune_max_age = args.prune_max_age()?;
    let gate = Arc::new(TimestampGate::new(ttl));
    let mut state = AppState::new(Arc::clone(&gate));

    // spawn the background pruner
    if let Some(max_age) = prune_max_age {
        state = state.with_max_ttl(max_age);
        tokio::spawn(pruner(
            Arc::clone(&gate),
            Duration::from_secs(args.prune_interval),
            max_age,
        ));
    }
    let state = Arc::new(state);

    let app = router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Gate running on http://localhost:{}", args.port);
    info!("Default gate ttl: {}", format_std_duration(ttl));
    if let Some(max_age) = prune_max_age {
        info!(
            "Pruning every {} seconds, max age {}",
            args.prune_interval,
            format_std_duration(max_age)
        );
    }

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_s3(config: S3Config, op: S3Command) -> Result<()> {
    let storage = ObjectStorage::new(config);

    match op {
        S3Command::Put {
            key,
            file,
            content_type,
        } => {
            let data = tokio::fs::read(&file).await?;
            let size = data.len();
            let result = storage
                .put_object(data, &key, content_type.as_deref())
                .await?;
            println!(
                "uploaded {} ({} bytes) etag={}",
                key,
                size,
                result.e_tag.unwrap_or_default()
            );
        }
        S3Command::Get { key, output } => {
            let object = storage.get_object(&key).await?;
            write_output(output, &object.body).await?;
        }
        S3Command::List { prefix, marker } => {
            let page = storage
                .list_objects(prefix.as_deref().unwrap_or_default(), marker.as_deref())
                .await?;
            for meta in &page.objects {
                println!(
                    "{}\t{}\t{} ago",
                    meta.location,
                    meta.size,
                    elapsed_since(meta.last_modified.timestamp_millis())
                );
            }
            if let Some(next) = page.next_marker {
                println!("next marker: {next}");
            }
        }
        S3Command::Delete { key } => {
            storage.delete_object(&key).await?;
            println!("deleted {key}");
        }
    }

    Ok(())
}

async fn write_output(output: Option<PathBuf>, body: &[u8]) -> Result<()> {
    match output {
        Some(path) => tokio::fs::write(&path, body).await.map_err(Error::from),
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(body).await?;
            stdout.flush().await?;
            Ok(())
        }
    }
}
