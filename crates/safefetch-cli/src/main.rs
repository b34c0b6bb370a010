//! SafeFetch CLI - Command-line interface for SSRF-guarded fetching

mod mcp;

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use safefetch::{ConfigError, DomainPolicy, Error, ErrorKind, FetchConfig, SafeFetcher};
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Output format for fetch subcommand
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Response body only
    #[default]
    Raw,
    /// JSON with status and metadata
    Json,
}

/// SafeFetch - fetch public web content without SSRF exposure
#[derive(Parser, Debug)]
#[command(name = "safefetch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the environment configuration
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Request timeout in seconds [env: URL_FETCH_TIMEOUT]
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// User-Agent sent with every request [env: URL_FETCH_USER_AGENT]
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Block private, loopback and metadata addresses [env: BLOCK_PRIVATE_IPS]
    #[arg(
        long,
        global = true,
        action = clap::ArgAction::Set,
        value_parser = BoolishValueParser::new(),
    )]
    block_private_ips: Option<bool>,

    /// Comma-separated hostnames; when set, only these are allowed [env: ALLOWED_DOMAINS]
    #[arg(long, global = true)]
    allowed_domains: Option<String>,

    /// Comma-separated hostnames that are always refused [env: BLOCKED_DOMAINS]
    #[arg(long, global = true)]
    blocked_domains: Option<String>,

    /// Maximum redirects to follow [env: URL_FETCH_MAX_REDIRECTS]
    #[arg(long, global = true)]
    max_redirects: Option<usize>,

    /// Maximum response body size in bytes [env: URL_FETCH_MAX_BYTES]
    #[arg(long, global = true)]
    max_bytes: Option<usize>,
}

impl ConfigArgs {
    /// Layer the command-line flags over `config`
    fn apply(self, mut config: FetchConfig) -> Result<FetchConfig, ConfigError> {
        if let Some(secs) = self.timeout {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(ua) = self.user_agent {
            config.user_agent = ua;
        }
        if let Some(enabled) = self.block_private_ips {
            config.ssrf_protection = enabled;
        }
        if let Some(max) = self.max_redirects {
            config.max_redirects = max;
        }
        if let Some(max) = self.max_bytes {
            config.max_body_bytes = Some(max);
        }
        if self.allowed_domains.is_some() || self.blocked_domains.is_some() {
            let allow: Vec<String> = match self.allowed_domains {
                Some(csv) => csv.split(',').map(str::to_string).collect(),
                None => config.domains.allowlist().iter().cloned().collect(),
            };
            let block: Vec<String> = match self.blocked_domains {
                Some(csv) => csv.split(',').map(str::to_string).collect(),
                None => config.domains.blocklist().iter().cloned().collect(),
            };
            config.domains = DomainPolicy::new(allow, block);
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch URL and print its body
    Fetch {
        /// URL to fetch
        url: String,

        /// Output format
        #[arg(long, short, default_value = "raw")]
        output: OutputFormat,
    },
    /// Validate URL and run SSRF checks without fetching
    Check {
        /// URL to check
        url: String,
    },
    /// Run as MCP (Model Context Protocol) server over stdio
    Mcp,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries bodies and MCP messages
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match FetchConfig::from_env().and_then(|config| cli.config.apply(config)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
    };

    let fetcher = match SafeFetcher::new(config) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
    };

    match cli.command {
        Commands::Fetch { url, output } => run_fetch(&fetcher, &url, output).await,
        Commands::Check { url } => run_check(&fetcher, &url).await,
        Commands::Mcp => {
            mcp::run_server(fetcher).await;
            ExitCode::SUCCESS
        }
    }
}

async fn run_fetch(fetcher: &SafeFetcher, url: &str, output: OutputFormat) -> ExitCode {
    match fetcher.fetch_page(url).await {
        Ok(page) => {
            match output {
                OutputFormat::Raw => writeln_safe(&page.content),
                OutputFormat::Json => match serde_json::to_string_pretty(&page) {
                    Ok(json) => writeln_safe(&json),
                    Err(e) => {
                        eprintln!("Error serializing response: {}", e);
                        return ExitCode::from(1);
                    }
                },
            }
            ExitCode::SUCCESS
        }
        Err(e) => report_error(&e),
    }
}

async fn run_check(fetcher: &SafeFetcher, url: &str) -> ExitCode {
    match fetcher.check(url).await {
        Ok(validated) => {
            writeln_safe(&format!("allowed: {}", validated));
            ExitCode::SUCCESS
        }
        Err(e) => report_error(&e),
    }
}

fn report_error(err: &Error) -> ExitCode {
    eprintln!("Error: {}", err);
    ExitCode::from(exit_code(err.kind()))
}

/// Exit status per error kind
fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Validation => 2,
        ErrorKind::SsrfBlocked => 3,
        ErrorKind::Fetch => 4,
    }
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
