use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolforge_codegen::{CodeGenerator, HttpModelClient};
use toolforge_deploy::{Deployer, HttpHostingClient, IntervalTicker};
use toolforge_pipeline::{Pipeline, PipelineConfig};
use toolforge_scanner::{ScanPolicy, scan_project};
use toolforge_source::{CodeHost, SourceNormalizer};
use toolforge_types::{ProjectFiles, SourceDescriptor};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "toolforge", version, about = "Turn an HTTP API into a deployed tool server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the YAML configuration file
    #[arg(long, env = "TOOLFORGE_CONFIG", default_value = "toolforge.yaml", global = true)]
    config: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceKindArg {
    Spec,
    Docs,
    Repo,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: normalize, generate, scan, deploy
    Run {
        /// What the URL points at
        #[arg(long, value_enum)]
        kind: SourceKindArg,
        /// Specification document, documentation page, or repository URL
        url: String,
        /// Display name; derived from the source when omitted
        #[arg(long)]
        name: Option<String>,
        /// Owner recorded on the server
        #[arg(long, default_value = "cli")]
        owner: String,
        /// Environment variable for the deployed server, KEY=VALUE (repeatable)
        #[arg(long = "env", value_name = "KEY=VALUE")]
        env: Vec<String>,
        /// Redact critical findings and re-scan when the first scan fails
        #[arg(long)]
        sanitize: bool,
        /// Stop after the scan; do not deploy
        #[arg(long)]
        no_deploy: bool,
    },
    /// Scan a project bundle from disk (a JSON path→content mapping)
    Scan {
        bundle: PathBuf,
        /// Allow filesystem modules in the scanned code
        #[arg(long)]
        allow_filesystem: bool,
    },
}

fn init_logging(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Run {
            kind,
            url,
            name,
            owner,
            env,
            sanitize,
            no_deploy,
        } => run(&cli.config, kind, url, name, &owner, &env, sanitize, no_deploy).await,
        Commands::Scan {
            bundle,
            allow_filesystem,
        } => scan_bundle(&bundle, allow_filesystem),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run(
    config_path: &std::path::Path,
    kind: SourceKindArg,
    url: String,
    name: Option<String>,
    owner: &str,
    env: &[String],
    sanitize: bool,
    no_deploy: bool,
) -> anyhow::Result<()> {
    let config = PipelineConfig::load(config_path)?;
    let pipeline = build_pipeline(&config)?;
    let env = parse_env_pairs(env)?;

    let source = match kind {
        SourceKindArg::Spec => SourceDescriptor::Spec { url },
        SourceKindArg::Docs => SourceDescriptor::Docs { url },
        SourceKindArg::Repo => SourceDescriptor::Repo { url },
    };
    let name = name.unwrap_or_default();

    let server = pipeline.create(owner, &name, source);
    let id = server.id;

    let server = pipeline.generate(id).await?;
    println!(
        "generated {} v{}: {} files, {} tools",
        server.slug,
        server.version,
        server.code.len(),
        server.tools.len()
    );

    let mut scan = pipeline.scan(id, owner)?;
    print_scan(&scan);
    if !scan.passed && sanitize {
        scan = pipeline.sanitize(id, owner)?;
        println!("after sanitization:");
        print_scan(&scan);
    }
    if !scan.passed {
        anyhow::bail!("security scan failed (score {}); not deploying", scan.score);
    }
    if no_deploy {
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let guard = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            guard.cancel();
        }
    });

    let server = pipeline.deploy(id, &env, &cancel).await?;
    println!(
        "deployed {} at {}",
        server.slug,
        server.deployment_url.as_deref().unwrap_or("<no url>")
    );
    Ok(())
}

fn scan_bundle(path: &std::path::Path, allow_filesystem: bool) -> anyhow::Result<()> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("read bundle {}", path.display()))?;
    let files = ProjectFiles::from_code_field(&body);
    let result = scan_project(&files, &ScanPolicy { allow_filesystem });
    print_scan(&result);
    for issue in &result.issues {
        let location = match (&issue.file, issue.line) {
            (Some(file), Some(line)) => format!("{file}:{line}"),
            (Some(file), None) => file.clone(),
            _ => "-".to_string(),
        };
        println!("  [{}] {} ({})", issue.severity, issue.message, location);
    }
    if result.passed { Ok(()) } else { anyhow::bail!("scan failed") }
}

fn build_pipeline(config: &PipelineConfig) -> anyhow::Result<Pipeline> {
    let model = Arc::new(HttpModelClient::new(config.model_config()?));
    let generator = Arc::new(CodeGenerator::new(model));
    let normalizer = SourceNormalizer::new(
        Arc::clone(&generator),
        CodeHost::new(config.code_host_config()),
        config.explorer_config(),
    );
    let deploy_config = config.deploy_config();
    let deployer = Deployer::new(
        Arc::new(HttpHostingClient::new(config.hosting_config()?)),
        Arc::new(IntervalTicker::new(deploy_config.poll_interval)),
        deploy_config,
    );
    Ok(Pipeline::new(
        normalizer,
        generator,
        deployer,
        ScanPolicy {
            allow_filesystem: config.scan.allow_filesystem,
        },
    ))
}

fn parse_env_pairs(pairs: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .with_context(|| format!("--env {pair:?} is not KEY=VALUE"))
        })
        .collect()
}

fn print_scan(scan: &toolforge_scanner::ScanResult) {
    println!(
        "scan: score {} / 100, {} issue(s), {}",
        scan.score,
        scan.issues.len(),
        if scan.passed { "passed" } else { "FAILED" }
    );
}
