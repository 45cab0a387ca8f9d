//! Command-line access to prefkit stores
//!
//! Inspect and edit preference stores on disk:
//! - list, read and write typed values
//! - open encrypted stores with `--password` or `PREFKIT_PASSWORD`
//! - check for, clear and delete whole stores

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use prefkit_store::{PreferenceValue, Preferences};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "prefkit")]
#[command(about = "Inspect and edit prefkit preference stores", long_about = None)]
struct Cli {
    /// App directory: a name under the user config directory, or an absolute path
    #[arg(short, long)]
    dir: String,

    /// Password for encrypted stores
    #[arg(short, long, env = "PREFKIT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a saved store exists
    Exists {
        /// Store name
        name: String,
    },

    /// Delete a saved store
    Delete {
        /// Store name
        name: String,
    },

    /// Print every entry of a store
    List {
        /// Store name
        name: String,
    },

    /// Print one value
    Get {
        /// Store name
        name: String,
        /// Key to read
        key: String,
    },

    /// Write one value and save
    Set {
        /// Store name
        name: String,
        /// Key to write
        key: String,
        #[command(flatten)]
        value: ValueArg,
    },

    /// Remove one key and save
    Unset {
        /// Store name
        name: String,
        /// Key to remove
        key: String,
    },

    /// Remove every key and save
    Clear {
        /// Store name
        name: String,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct ValueArg {
    /// 32-bit integer value
    #[arg(long, allow_hyphen_values = true)]
    int: Option<i32>,

    /// Boolean value (true/false)
    #[arg(long = "bool")]
    boolean: Option<bool>,

    /// UTF-8 string value
    #[arg(long)]
    string: Option<String>,

    /// Byte value as hex
    #[arg(long)]
    hex: Option<String>,
}

impl ValueArg {
    fn into_value(self) -> anyhow::Result<PreferenceValue> {
        if let Some(v) = self.int {
            return Ok(PreferenceValue::Int32(v));
        }
        if let Some(v) = self.boolean {
            return Ok(PreferenceValue::Bool(v));
        }
        if let Some(v) = self.string {
            return Ok(PreferenceValue::Str(v));
        }
        if let Some(v) = self.hex {
            let bytes = hex::decode(v.trim()).context("--hex expects an even number of hex digits")?;
            return Ok(PreferenceValue::Bytes(bytes));
        }
        bail!("one of --int, --bool, --string or --hex is required")
    }
}

/// Value as printed by `get`: strings unquoted, bytes as hex.
fn render(value: &PreferenceValue) -> String {
    match value {
        PreferenceValue::Str(s) => s.clone(),
        PreferenceValue::Bytes(b) => hex::encode(b),
        other => other.to_string(),
    }
}

struct Session {
    dir: PathBuf,
    password: Option<String>,
}

impl Session {
    fn open(&self, name: &str) -> anyhow::Result<Preferences> {
        let prefs = match &self.password {
            Some(password) => Preferences::open_encrypted_in(&self.dir, name, password),
            None => Preferences::open_in(&self.dir, name),
        };
        prefs.with_context(|| format!("Failed to open preferences `{name}`"))
    }

    fn dir(&self) -> &Path {
        &self.dir
    }
}

fn run(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let session = Session {
        dir: prefkit_store::resolve_app_dir(&cli.dir)
            .with_context(|| format!("Cannot use app directory `{}`", cli.dir))?,
        password: cli.password,
    };

    match cli.command {
        Commands::Exists { name } => {
            writeln!(out, "{}", prefkit_store::exists_in(session.dir(), &name))?;
        }
        Commands::Delete { name } => {
            prefkit_store::delete_in(session.dir(), &name)?;
            info!("Deleted `{}`", name);
        }
        Commands::List { name } => {
            let prefs = session.open(&name)?;
            let mut entries: Vec<_> = prefs.iter().collect();
            entries.sort_unstable_by_key(|(key, _)| *key);
            for (key, value) in entries {
                writeln!(out, "{}\t{}\t{}", key, value.kind(), value)?;
            }
        }
        Commands::Get { name, key } => {
            let prefs = session.open(&name)?;
            let value = prefs
                .get(&key)
                .with_context(|| format!("Key `{key}` not found in `{name}`"))?;
            writeln!(out, "{}", render(value))?;
        }
        Commands::Set { name, key, value } => {
            let mut prefs = session.open(&name)?;
            prefs.put(&key, value.into_value()?);
            prefs.save()?;
            info!("Set `{}` in `{}`", key, name);
        }
        Commands::Unset { name, key } => {
            let mut prefs = session.open(&name)?;
            if prefs.remove(&key).is_none() {
                bail!("Key `{key}` not found in `{name}`");
            }
            prefs.save()?;
        }
        Commands::Clear { name } => {
            let mut prefs = session.open(&name)?;
            prefs.clear();
            prefs.save()?;
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    run(cli, &mut io::stdout().lock())
}
