// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Recon - Reconnaissance Toolkit
 * Command-line front end for the fingerprinting and intelligence modules
 *
 * Features:
 * - Apache Tomcat and Liferay fingerprinting, plus custom profiles
 * - CVE keyword search with GitHub PoC lookup
 * - Credential leak lookups (Dehashed, HIBP, LeakCheck)
 * - Censys host search
 * - Archived URL and subdomain checks
 *
 * (c) 2026 Bountyy Oy
 */

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use recon_scanner::aggregator::Aggregator;
use recon_scanner::config::{self, AppConfig, Credentials};
use recon_scanner::discovery::{
    ArchivedUrlScanner, CertTransparencyLines, FileLines, LineSource, SubdomainDiscovery, WaybackLines,
};
use recon_scanner::http_client::HttpClient;
use recon_scanner::query::censys::{self, CensysSource};
use recon_scanner::query::dehashed::{self, DehashedSource};
use recon_scanner::query::github::{self, GitHubSource};
use recon_scanner::query::hibp::{self, HibpSource};
use recon_scanner::query::leakcheck::{self, LeakCheckSource};
use recon_scanner::query::mitre::{self, filter_rce, MitreCveSearch};
use recon_scanner::query::{LeakPlatform, Lookup, RateLimitedClient, RemoteSource};
use recon_scanner::rate_limiter::PacerRegistry;
use recon_scanner::reporting::{ReportFormat, Reporter};
use recon_scanner::scanners::{liferay, tomcat, FingerprintScanner, ServiceProfile};
use recon_scanner::types::{input_lines, PrimaryItem, Target};

/// Recon - service fingerprinting and intelligence aggregation
#[derive(Parser)]
#[command(name = "recon")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version)]
#[command(about = "Reconnaissance toolkit: fingerprinting, CVE/PoC lookup, leak and asset search", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Quiet mode - only show results
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file (yaml, toml or json)
    #[arg(short, long, global = true, env = "RECON_CONFIG")]
    config: Option<PathBuf>,

    /// Output format: text or json
    #[arg(short = 'o', long, global = true, default_value = "text")]
    format: String,

    /// Request timeout in seconds (overrides config)
    #[arg(short, long, global = true)]
    timeout: Option<u64>,

    /// Concurrent targets / keys (overrides config)
    #[arg(long, global = true)]
    concurrency: Option<usize>,
}

/// Exactly one of a single value or a newline-delimited file
#[derive(Args)]
#[group(required = true, multiple = false)]
struct InputArgs {
    /// Single target
    #[arg(short = 'u', long = "url")]
    url: Option<String>,

    /// File with one entry per line (blank lines and # comments are skipped)
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect Apache Tomcat (ports 80, 443 and 8080 unless a port is given)
    Tomcat {
        #[command(flatten)]
        input: InputArgs,

        /// Ports to sweep, comma separated
        #[arg(long, value_delimiter = ',')]
        ports: Vec<u16>,
    },

    /// Detect Liferay and its version (http first, then https)
    Liferay {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Run a custom service profile loaded from file
    Profile {
        /// Profile file (yaml, toml or json)
        #[arg(short, long)]
        profile: PathBuf,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Search CVEs by keyword and look up public PoCs on GitHub
    CvePoc {
        /// Keyword, e.g. a product name
        keyword: String,

        /// Keep only CVEs describing code execution
        #[arg(long)]
        rce_only: bool,

        /// Only list the CVEs, skip the GitHub lookup
        #[arg(long)]
        list_only: bool,

        /// GitHub personal access token
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        github_token: Option<String>,
    },

    /// Look up leaked credentials for emails or domains
    Leaks {
        #[command(flatten)]
        input: InputArgs,

        /// dehashed, hibp, leakcheck, both (dehashed + hibp) or all.
        /// Domains only go to Dehashed; HIBP and LeakCheck take email addresses.
        #[arg(short, long, default_value = "all")]
        platform: String,

        #[arg(long, env = "DEHASHED_USERNAME")]
        dehashed_username: Option<String>,

        #[arg(long, env = "DEHASHED_API_KEY", hide_env_values = true)]
        dehashed_api_key: Option<String>,

        #[arg(long, env = "HIBP_API_KEY", hide_env_values = true)]
        hibp_api_key: Option<String>,

        #[arg(long, env = "LEAKCHECK_API_KEY", hide_env_values = true)]
        leakcheck_api_key: Option<String>,
    },

    /// Search Censys for open ports and services of a domain, IP or CIDR range
    Censys {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long, env = "CENSYS_API_ID")]
        api_id: Option<String>,

        #[arg(long, env = "CENSYS_API_SECRET", hide_env_values = true)]
        api_secret: Option<String>,
    },

    /// Flag archived URLs that hint at sensitive content
    Wayback {
        #[command(flatten)]
        input: InputArgs,

        /// Custom sensitive keywords (replace the defaults)
        #[arg(short, long, num_args = 1..)]
        keywords: Vec<String>,

        /// Read URLs from this file instead of the Wayback Machine index
        #[arg(long)]
        urls_file: Option<PathBuf>,
    },

    /// Harvest subdomains and check which ones serve HTTP
    Subdomains {
        /// Target domain, e.g. example.com
        #[arg(short = 'D', long)]
        domain: String,

        /// Read candidate names from this file instead of certificate transparency logs
        #[arg(long)]
        names_file: Option<PathBuf>,
    },
}

/// Shared state for one invocation
struct Session {
    config: AppConfig,
    http_client: Arc<HttpClient>,
    pacers: PacerRegistry,
    cancel: CancellationToken,
    format: ReportFormat,
}

impl Session {
    fn reporter(&self) -> Reporter<std::io::Stdout> {
        Reporter::new(std::io::stdout(), self.format)
    }

    async fn client<S: RemoteSource + 'static>(&self, source: S) -> Arc<dyn Lookup> {
        let policy = self.config.sources.policy(source.name());
        let client = RateLimitedClient::new(source, Arc::clone(&self.http_client), &self.pacers, policy)
            .await
            .with_cancellation(self.cancel.clone());
        Arc::new(client)
    }

    fn aggregator(&self, sources: Vec<Arc<dyn Lookup>>) -> Aggregator {
        Aggregator::new(sources, self.config.aggregation.concurrency).with_cancellation(self.cancel.clone())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let app_config = config::load_config(cli.config.as_deref())?.with_overrides(cli.timeout, cli.concurrency)?;

    // Initialize logging
    let log_level = if cli.debug {
        "debug".to_string()
    } else if cli.verbose {
        "info".to_string()
    } else if cli.quiet {
        "error".to_string()
    } else {
        app_config.observability.log_level.clone()
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Create async runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("recon-scanner")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli, app_config))
}

async fn async_main(cli: Cli, app_config: AppConfig) -> Result<()> {
    let format: ReportFormat = cli.format.parse()?;
    let http_client = Arc::new(app_config.http_client()?);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing in-flight work");
            on_signal.cancel();
        }
    });

    let ctx = Session {
        config: app_config,
        http_client,
        pacers: PacerRegistry::new(),
        cancel,
        format,
    };

    let started = Instant::now();
    let result = match cli.command {
        Commands::Tomcat { input, ports } => {
            let ports = if ports.is_empty() {
                ctx.config.fingerprint.tomcat_ports.clone()
            } else {
                ports
            };
            run_fingerprint(&ctx, tomcat::profile(&ports), &input).await
        }
        Commands::Liferay { input } => run_fingerprint(&ctx, liferay::profile(), &input).await,
        Commands::Profile { profile, input } => {
            let profile = config::load_profile(&profile)?;
            run_fingerprint(&ctx, profile, &input).await
        }
        Commands::CvePoc {
            keyword,
            rce_only,
            list_only,
            github_token,
        } => {
            let credentials = Credentials {
                github_token,
                ..Credentials::default()
            };
            run_cve_poc(&ctx, &keyword, rce_only, list_only, &credentials).await
        }
        Commands::Leaks {
            input,
            platform,
            dehashed_username,
            dehashed_api_key,
            hibp_api_key,
            leakcheck_api_key,
        } => {
            let credentials = Credentials {
                dehashed_username,
                dehashed_api_key,
                hibp_api_key,
                leakcheck_api_key,
                ..Credentials::default()
            };
            run_leaks(&ctx, &input, &platform, &credentials).await
        }
        Commands::Censys {
            input,
            api_id,
            api_secret,
        } => {
            let credentials = Credentials {
                censys_api_id: api_id,
                censys_api_secret: api_secret,
                ..Credentials::default()
            };
            run_censys(&ctx, &input, &credentials).await
        }
        Commands::Wayback {
            input,
            keywords,
            urls_file,
        } => run_wayback(&ctx, &input, keywords, urls_file).await,
        Commands::Subdomains { domain, names_file } => run_subdomains(&ctx, &domain, names_file).await,
    };

    info!("Finished in {:.1}s", started.elapsed().as_secs_f64());
    result
}

fn read_inputs(input: &InputArgs) -> Result<Vec<String>> {
    match (&input.url, &input.file) {
        (Some(value), _) => Ok(vec![value.trim().to_string()]),
        (None, Some(path)) => read_list(path),
        (None, None) => Err(anyhow::anyhow!("Either --url or --file is required")),
    }
}

fn read_list(path: &Path) -> Result<Vec<String>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read input file {:?}", path))?;
    Ok(input_lines(&content))
}

fn parse_targets(values: Vec<String>) -> Vec<Target> {
    values
        .into_iter()
        .filter_map(|value| match value.parse::<Target>() {
            Ok(target) => Some(target),
            Err(e) => {
                warn!("Skipping {}", e);
                None
            }
        })
        .collect()
}

async fn run_fingerprint(ctx: &Session, profile: ServiceProfile, input: &InputArgs) -> Result<()> {
    let targets = parse_targets(read_inputs(input)?);
    if targets.is_empty() {
        return Err(anyhow::anyhow!("No valid targets"));
    }

    let scanner = FingerprintScanner::from_profile(
        &profile,
        &ctx.http_client,
        ctx.config.request_timeout(),
        ctx.config.fingerprint.concurrency,
    )?;
    info!("Fingerprinting {} target(s) for {}", targets.len(), scanner.name());

    let mut reporter = ctx.reporter();
    let verdicts = scanner.scan(targets, ctx.cancel.clone());
    futures::pin_mut!(verdicts);

    let mut detected = 0usize;
    while let Some(verdict) = verdicts.next().await {
        if verdict.detected {
            detected += 1;
        }
        reporter.verdict(&verdict)?;
    }
    reporter.flush()?;

    info!("{}: {} positive verdict(s)", scanner.name(), detected);
    Ok(())
}

async fn run_cve_poc(
    ctx: &Session,
    keyword: &str,
    rce_only: bool,
    list_only: bool,
    credentials: &Credentials,
) -> Result<()> {
    let sources = &ctx.config.sources;
    let http_client = Arc::clone(&ctx.http_client);

    // Token and quota problems surface before the CVE search runs
    let github = if list_only {
        None
    } else {
        let credentials = credentials.clone().or(Credentials::from_env());
        let source = GitHubSource::with_base_url(sources.github.base_url_or(github::DEFAULT_BASE_URL), credentials.github()?);
        let pacer = ctx
            .pacers
            .pacer(github::SOURCE_NAME, sources.policy(github::SOURCE_NAME).pacing)
            .await;
        source.check_rate_limit(&http_client, &pacer).await?;
        Some(source)
    };

    let search = MitreCveSearch::with_base_url(Arc::clone(&http_client), sources.mitre.base_url_or(mitre::DEFAULT_BASE_URL))
        .with_retry(sources.policy(mitre::SOURCE_NAME).retry);
    let mut cves = search.search(keyword).await?;
    if rce_only {
        cves = filter_rce(cves);
        info!("{} CVE(s) describe code execution", cves.len());
    }

    let mut reporter = ctx.reporter();
    let Some(github) = github else {
        reporter.primary_items(&cves)?;
        return Ok(reporter.flush()?);
    };

    if cves.is_empty() {
        info!("No CVEs found for '{}'", keyword);
        return Ok(());
    }

    let lookup = ctx.client(github).await;
    let report = ctx
        .aggregator(vec![lookup])
        .with_empty_marker(github::NO_POCS_MARKER)
        .aggregate(cves)
        .await;

    reporter.aggregate(&report)?;
    reporter.flush()?;
    Ok(())
}

async fn run_leaks(ctx: &Session, input: &InputArgs, platform: &str, credentials: &Credentials) -> Result<()> {
    let platform: LeakPlatform = platform.parse()?;
    let credentials = credentials.clone().or(Credentials::from_env());
    credentials.ensure(platform.sources())?;

    let sources = &ctx.config.sources;
    let mut lookups: Vec<Arc<dyn Lookup>> = Vec::new();
    for name in platform.sources() {
        let lookup = match *name {
            dehashed::SOURCE_NAME => {
                let (username, api_key) = credentials.dehashed()?;
                let base_url = sources.dehashed.base_url_or(dehashed::DEFAULT_BASE_URL);
                ctx.client(DehashedSource::with_base_url(base_url, username, api_key)).await
            }
            hibp::SOURCE_NAME => {
                let base_url = sources.hibp.base_url_or(hibp::DEFAULT_BASE_URL);
                ctx.client(HibpSource::with_base_url(base_url, credentials.hibp()?)).await
            }
            leakcheck::SOURCE_NAME => {
                let base_url = sources.leakcheck.base_url_or(leakcheck::DEFAULT_BASE_URL);
                ctx.client(LeakCheckSource::with_base_url(base_url, credentials.leakcheck()?)).await
            }
            other => return Err(anyhow::anyhow!("Unsupported leak source {}", other)),
        };
        lookups.push(lookup);
    }

    let keys: Vec<PrimaryItem> = read_inputs(input)?.into_iter().map(PrimaryItem::new).collect();
    let report = ctx.aggregator(lookups).aggregate(keys).await;

    let mut reporter = ctx.reporter();
    reporter.aggregate(&report)?;
    reporter.flush()?;
    Ok(())
}

async fn run_censys(ctx: &Session, input: &InputArgs, credentials: &Credentials) -> Result<()> {
    let credentials = credentials.clone().or(Credentials::from_env());
    let (api_id, api_secret) = credentials.censys()?;
    let base_url = ctx.config.sources.censys.base_url_or(censys::DEFAULT_BASE_URL);
    let lookup = ctx.client(CensysSource::with_base_url(base_url, api_id, api_secret)).await;

    let keys: Vec<PrimaryItem> = read_inputs(input)?.into_iter().map(PrimaryItem::new).collect();
    let report = ctx.aggregator(vec![lookup]).aggregate(keys).await;

    let mut reporter = ctx.reporter();
    reporter.aggregate(&report)?;
    reporter.flush()?;
    Ok(())
}

async fn run_wayback(
    ctx: &Session,
    input: &InputArgs,
    keywords: Vec<String>,
    urls_file: Option<PathBuf>,
) -> Result<()> {
    let source: Arc<dyn LineSource> = match urls_file {
        Some(path) => Arc::new(FileLines::new(path)),
        None => Arc::new(WaybackLines::new(Arc::clone(&ctx.http_client))),
    };
    let scanner = ArchivedUrlScanner::new(source).with_keywords(keywords);

    let mut reporter = ctx.reporter();
    for domain in read_inputs(input)? {
        if ctx.cancel.is_cancelled() {
            break;
        }
        let report = scanner.scan(&domain).await;
        reporter.archive(&report)?;
    }
    reporter.flush()?;
    Ok(())
}

async fn run_subdomains(ctx: &Session, domain: &str, names_file: Option<PathBuf>) -> Result<()> {
    let source: Arc<dyn LineSource> = match names_file {
        Some(path) => Arc::new(FileLines::new(path)),
        None => Arc::new(CertTransparencyLines::new(Arc::clone(&ctx.http_client))),
    };
    let discovery = SubdomainDiscovery::new(source, Arc::clone(&ctx.http_client), ctx.config.fingerprint.concurrency);
    let report = discovery.discover(domain, ctx.cancel.clone()).await;

    if report.subdomains.is_empty() {
        warn!("No subdomains found for {}", domain);
    }

    let mut reporter = ctx.reporter();
    reporter.subdomains(&report)?;
    reporter.flush()?;
    Ok(())
}
