use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use mailstash::config::FetchConfig;
use mailstash::fetch::FetchLoop;
use mailstash::loader::load_all;
use mailstash::mail::{GmailClient, MailClient};
use mailstash::progress::{NoProgress, ProgressReporter, TerminalProgress};
use mailstash::record::{MessageRecord, RECORDED_HEADERS};
use mailstash::store::{JsonDirStore, Store};

/// Archive a Gmail mailbox as one JSON file per message.
#[derive(Debug, Parser)]
#[command(name = "mailstash", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Page through the mailbox and store every message.
    Fetch(FetchArgs),

    /// Load every stored record and print it.
    Load {
        #[arg(long)]
        store_dir: Option<PathBuf>,

        /// Print one JSON object per line instead of a summary table.
        #[arg(long)]
        json: bool,
    },

    /// Print one stored record.
    Show {
        id: String,

        #[arg(long)]
        store_dir: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct FetchArgs {
    /// Directory to write records to (default: emails).
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Gmail search expression, e.g. "newer_than:30d".
    #[arg(long, short)]
    query: Option<String>,

    /// Only list messages carrying this label. Repeatable.
    #[arg(long = "label", short)]
    labels: Vec<String>,

    /// Listing page size requested from the provider.
    #[arg(long)]
    page_size: Option<u32>,

    /// Stop after this many pages.
    #[arg(long)]
    max_pages: Option<u32>,

    /// Skip messages whose body cannot be decoded instead of aborting.
    #[arg(long, overrides_with = "no_skip_failures")]
    skip_failures: bool,

    /// Abort on the first undecodable body, even if MAILSTASH_SKIP_FAILURES is set.
    #[arg(long, overrides_with = "skip_failures")]
    no_skip_failures: bool,

    /// Suppress the progress line.
    #[arg(long)]
    quiet: bool,
}

impl FetchArgs {
    fn apply(&self, config: &mut FetchConfig) {
        if let Some(dir) = &self.store_dir {
            config.store_dir = dir.clone();
        }
        if self.query.is_some() {
            config.query = self.query.clone();
        }
        if !self.labels.is_empty() {
            config.label_ids = self.labels.clone();
        }
        if self.page_size.is_some() {
            config.page_size = self.page_size;
        }
        if self.max_pages.is_some() {
            config.max_pages = self.max_pages;
        }
        if self.skip_failures {
            config.skip_failures = true;
        } else if self.no_skip_failures {
            config.skip_failures = false;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Fetch(args) => {
            let mut config = FetchConfig::from_env()?;
            args.apply(&mut config);
            fetch(&config, args.quiet).await
        }
        Command::Load { store_dir, json } => {
            let dir = store_dir.unwrap_or_else(FetchConfig::store_dir_from_env);
            load(&dir, json).await
        }
        Command::Show { id, store_dir } => {
            let dir = store_dir.unwrap_or_else(FetchConfig::store_dir_from_env);
            show(&dir, &id).await
        }
    }
}

async fn fetch(config: &FetchConfig, quiet: bool) -> anyhow::Result<()> {
    let gmail = config.gmail_config()?;
    eprintln!("mailstash v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: {} (user {})", gmail.base_url, gmail.user_id);
    eprintln!("   Store: {}", config.store_dir.display());

    let client: Arc<dyn MailClient> = Arc::new(GmailClient::new(gmail)?);
    let store: Arc<dyn Store> = Arc::new(JsonDirStore::open(&config.store_dir).await?);
    let progress: Arc<dyn ProgressReporter> = if quiet {
        Arc::new(NoProgress)
    } else {
        Arc::new(TerminalProgress)
    };

    let report = FetchLoop::new(client, store)
        .with_options(config.fetch_options())
        .with_progress(progress)
        .run()
        .await?;

    eprintln!(
        "Stored {} messages from {} pages{}",
        report.stored,
        report.pages,
        if report.truncated { " (page limit reached)" } else { "" }
    );
    for skipped in &report.skipped {
        eprintln!("   skipped {}: {}", skipped.id, skipped.reason);
    }
    Ok(())
}

async fn open_existing(dir: &Path) -> anyhow::Result<JsonDirStore> {
    if !dir.is_dir() {
        anyhow::bail!("No record store at {}", dir.display());
    }
    Ok(JsonDirStore::open(dir).await?)
}

async fn load(dir: &Path, json: bool) -> anyhow::Result<()> {
    let store = open_existing(dir).await?;
    let records = load_all(&store).await?;

    for record in &records {
        if json {
            println!("{}", serde_json::to_string(record)?);
        } else {
            println!("{}", summary_line(record));
        }
    }
    eprintln!("Loaded {} records from {}", records.len(), dir.display());
    Ok(())
}

async fn show(dir: &Path, id: &str) -> anyhow::Result<()> {
    let store = open_existing(dir).await?;
    let record = store
        .get(id)
        .await
        .with_context(|| format!("reading record {id}"))?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// `id<TAB>From<TAB>Date<TAB>Subject`, with `-` for missing headers.
fn summary_line(record: &MessageRecord) -> String {
    let mut fields = vec![record.id.as_str()];
    fields.extend(RECORDED_HEADERS.iter().map(|name| record.header(name).unwrap_or("-")));
    fields.join("\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch_args(argv: &[&str]) -> FetchArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Command::Fetch(args) => args,
            other => panic!("expected fetch, got {other:?}"),
        }
    }

    fn env_skipping() -> FetchConfig {
        FetchConfig {
            skip_failures: true,
            ..Default::default()
        }
    }

    #[test]
    fn no_skip_failures_overrides_env() {
        let mut config = env_skipping();
        fetch_args(&["mailstash", "fetch", "--no-skip-failures"]).apply(&mut config);
        assert!(!config.skip_failures);
    }

    #[test]
    fn env_skip_failures_kept_without_flag() {
        let mut config = env_skipping();
        fetch_args(&["mailstash", "fetch"]).apply(&mut config);
        assert!(config.skip_failures);
    }

    #[test]
    fn last_failure_flag_wins() {
        let args = fetch_args(&["mailstash", "fetch", "--no-skip-failures", "--skip-failures"]);
        assert!(args.skip_failures && !args.no_skip_failures);

        let mut config = FetchConfig::default();
        args.apply(&mut config);
        assert!(config.skip_failures);
    }

    #[test]
    fn cli_flags_override_env_filters() {
        let mut config = FetchConfig {
            query: Some("from:env".to_string()),
            ..Default::default()
        };
        fetch_args(&["mailstash", "fetch", "-q", "is:unread", "-l", "INBOX", "--max-pages", "3"])
            .apply(&mut config);
        assert_eq!(config.query.as_deref(), Some("is:unread"));
        assert_eq!(config.label_ids, vec!["INBOX"]);
        assert_eq!(config.max_pages, Some(3));
    }

    #[test]
    fn summary_line_marks_missing_headers() {
        let mut record = MessageRecord::new("18c1f");
        record.set_header("Subject", "Hi");
        assert_eq!(summary_line(&record), "18c1f\t-\t-\tHi");
    }
}
