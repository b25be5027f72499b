use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::s3::S3Config;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "toolbelt")]
#[command(about = "Keyed timestamp gate service and object storage utilities")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve a timestamp gate over HTTP
    Serve(ServeArgs),
    /// Put, get, list or delete objects in a bucket
    S3 {
        #[command(flatten)]
        s3: S3Args,
        #[command(subcommand)]
        op: S3Command,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Default time between two allowed checks of one id, in milliseconds
    #[arg(long, default_value_t = 300_000)]
    pub gate_ttl_ms: u64,

    // Prune entries older than the prune max age every N seconds (0 = never)
    #[arg(long, default_value_t = 0)]
    pub prune_interval: u64,

    // Age past which the pruner drops an entry, in milliseconds.
    // Defaults to the gate ttl; checks asking for a longer ttl are rejected
    #[arg(long)]
    pub prune_max_age_ms: Option<u64>,
}

impl ServeArgs {
    pub fn gate_ttl(&self) -> Duration {
        Duration::from_millis(self.gate_ttl_ms)
    }

    /// Max age the pruner should use, or `None` when pruning is off.
    ///
    /// A max age below the gate ttl would drop entries that still deny
    /// default checks, so it is a configuration error.
    pub fn prune_max_age(&self) -> Result<Option<Duration>> {
        if self.prune_interval == 0 {
            if self.prune_max_age_ms.is_some() {
                return Err(Error::Config(
                    "--prune-max-age-ms needs a non-zero --prune-interval".to_string(),
                ));
            }
            return Ok(None);
        }

        let max_age_ms = self.prune_max_age_ms.unwrap_or(self.gate_ttl_ms);
        if max_age_ms < self.gate_ttl_ms {
            return Err(Error::Config(format!(
                "--prune-max-age-ms ({max_age_ms}) is shorter than --gate-ttl-ms ({})",
                self.gate_ttl_ms
            )));
        }

        Ok(Some(Duration::from_millis(max_age_ms)))
    }
}

// Bucket connection, falling back to the usual AWS environment variables
#[derive(ClapArgs, Debug, Clone)]
pub struct S3Args {
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    #[arg(long, env = "S3_BUCKET")]
    pub bucket: String,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: String,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: String,

    // S3-compatible endpoint, e.g. http://localhost:9000 for MinIO
    #[arg(long, env = "S3_ENDPOINT")]
    pub endpoint: Option<String>,
}

impl From<S3Args> for S3Config {
    fn from(args: S3Args) -> Self {
        Self {
            region: args.region,
            bucket: args.bucket,
            access_key_id: args.access_key_id,
            secret_access_key: args.secret_access_key,
            endpoint: args.endpoint,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum S3Command {
    /// Upload a local file
    Put {
        key: String,
        file: PathBuf,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Download an object to a file, or stdout when no file is given
    Get {
        key: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List one page of objects under a prefix
    List {
        prefix: Option<String>,
        #[arg(long)]
        marker: Option<String>,
    },
    /// Delete an object
    Delete { key: String },
}
