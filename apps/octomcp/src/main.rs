//! GitHub MCP server over stdio.
//!
//! The binary wires configuration into the framework crates: accounts and
//! host into `octomcp-github`, the catalog and filters into
//! `octomcp-core`, and the resulting registry into the `octomcp-server`
//! stdio loop. Exit code 0 on graceful shutdown, 1 on any startup failure;
//! upstream errors at runtime never abort the process.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use octomcp_core::{FeatureChecker, Registry};
use octomcp_github::{
    AccountRouter, ApiHost, GitHubDeps, RepoAccessCache, compare_scopes, load_accounts_file,
    single_token_account,
};
use octomcp_server::{
    Dispatcher, Notifier, ServerInfo, SharedRegistry, dynamic_tool_declarations,
    dynamic_toolset_meta, serve_stdio,
};
use secrecy::SecretString;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "octomcp")]
#[command(about = "GitHub MCP server over stdio", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve MCP over stdin/stdout.
    Stdio(ServeArgs),

    /// Print the tool catalog as the current flags would expose it.
    Tools(ServeArgs),

    /// Compare the token's granted scopes against what the exposed tools
    /// require.
    Scopes(ServeArgs),
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// GitHub host (github.com or a GitHub Enterprise installation).
    #[arg(long, env = "GITHUB_HOST", default_value = "https://api.github.com")]
    host: String,

    /// Personal access token. Takes priority over --accounts-file.
    #[arg(long, env = "GITHUB_PERSONAL_ACCESS_TOKEN", hide_env_values = true)]
    personal_access_token: Option<String>,

    /// JSON file describing an ordered list of accounts.
    #[arg(long, env = "GITHUB_ACCOUNTS_FILE")]
    accounts_file: Option<PathBuf>,

    /// Expose only read-only tools.
    #[arg(long, env = "GITHUB_READ_ONLY")]
    read_only: bool,

    /// Comma-separated toolset ids; `all` disables the gate, `default`
    /// expands to the default set.
    #[arg(
        long,
        env = "GITHUB_TOOLSETS",
        value_delimiter = ',',
        default_value = "default"
    )]
    toolsets: Vec<String>,

    /// Comma-separated tool names exposed regardless of toolset.
    #[arg(long, env = "GITHUB_TOOLS", value_delimiter = ',')]
    tools: Vec<String>,

    /// Comma-separated feature flag names to enable.
    #[arg(long, env = "GITHUB_FEATURE_FLAGS", value_delimiter = ',')]
    feature_flags: Vec<String>,

    /// Start with no toolsets and let the agent enable them at runtime.
    #[arg(long, env = "GITHUB_DYNAMIC_TOOLSETS")]
    dynamic_toolsets: bool,

    /// TTL for the repo-access cache (0 disables it).
    #[arg(long, env = "GITHUB_REPO_CACHE_TTL", default_value = "5m", value_parser = humantime::parse_duration)]
    repo_cache_ttl: Duration,

    /// Truncation window for tool content in logs.
    #[arg(long, env = "GITHUB_CONTENT_WINDOW_SIZE", default_value_t = 5000)]
    content_window_size: usize,
}

/// Everything a subcommand needs after configuration is resolved. The
/// shared registry already holds the filtered catalog.
struct Runtime {
    shared: SharedRegistry<GitHubDeps>,
    notifier: Notifier,
    deps: GitHubDeps,
    content_window: usize,
}

async fn build_runtime(args: &ServeArgs) -> anyhow::Result<Runtime> {
    let accounts = match (&args.personal_access_token, &args.accounts_file) {
        (Some(token), _) => single_token_account(SecretString::from(token.clone())),
        (None, Some(path)) => load_accounts_file(path)
            .with_context(|| format!("loading accounts from {}", path.display()))?,
        (None, None) => {
            bail!("no credentials: set GITHUB_PERSONAL_ACCESS_TOKEN or pass --accounts-file")
        }
    };

    let host = ApiHost::resolve(&args.host).context("resolving GitHub host")?;
    let router = Arc::new(AccountRouter::new(accounts));
    let cache = Arc::new(RepoAccessCache::new(args.repo_cache_ttl));
    let flags: BTreeSet<String> = args
        .feature_flags
        .iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    let deps = GitHubDeps::new(
        router,
        host,
        cache,
        flags.clone(),
        args.content_window_size,
    )
    .context("building HTTP client")?;

    let shared = SharedRegistry::new(Registry::empty());
    let notifier = Notifier::new();

    let mut builder = octomcp_toolsets::default_registry_builder();
    if args.dynamic_toolsets {
        builder = builder.toolset(dynamic_toolset_meta());
        builder = builder.tools(dynamic_tool_declarations(&shared, &notifier));
    }
    let registry = builder.build().context("building tool registry")?;

    let registry = if args.dynamic_toolsets {
        registry
            .with_toolsets(&[] as &[&str])
            .with_toolset_enabled(octomcp_server::DYNAMIC_TOOLSET_ID)
    } else {
        registry.with_toolsets(&args.toolsets)
    };
    let checker: FeatureChecker = Arc::new(move |flag| flags.contains(flag));
    let registry = registry
        .with_read_only(args.read_only)
        .with_tools(&args.tools)
        .with_feature_checker(checker);

    for unknown in registry.unrecognized_toolsets() {
        tracing::warn!(toolset = unknown.as_str(), "ignoring unrecognized toolset");
    }

    shared.replace(registry).await;
    Ok(Runtime {
        shared,
        notifier,
        deps,
        content_window: args.content_window_size,
    })
}

async fn run_stdio(runtime: Runtime) -> anyhow::Result<()> {
    let dispatcher = Arc::new(Dispatcher::new(
        runtime.shared,
        runtime.deps,
        ServerInfo {
            name: "octomcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        runtime.content_window,
    ));
    tracing::info!("serving MCP over stdio");
    serve_stdio(dispatcher, runtime.notifier, CancellationToken::new()).await
}

async fn run_tools(runtime: Runtime) -> anyhow::Result<()> {
    let registry = runtime.shared.view().await;
    let mut current_toolset = String::new();
    for decl in registry.available_tools() {
        if decl.toolset != current_toolset {
            current_toolset = decl.toolset.clone();
            let description = registry
                .toolset(&current_toolset)
                .map(|t| t.description.clone())
                .unwrap_or_default();
            println!("{current_toolset}: {description}");
        }
        let marker = if decl.read_only { "ro" } else { "rw" };
        println!("  [{marker}] {:<28} {}", decl.name, decl.description);
    }
    Ok(())
}

async fn run_scopes(runtime: Runtime) -> anyhow::Result<()> {
    let registry = runtime.shared.view().await;
    let required: Vec<String> = registry.required_scopes().into_iter().collect();
    let ctx = octomcp_core::CallContext::default();
    let clients = runtime.deps.clients();
    let held = octomcp_github::scopes::fetch_held_scopes(&clients.rest, &ctx)
        .await
        .context("fetching granted scopes")?;

    let Some(held) = held else {
        println!(
            "token reports no OAuth scopes (fine-grained token?); cannot compare against: {}",
            required.join(", ")
        );
        return Ok(());
    };

    let comparison = compare_scopes(&held, &required);
    println!("held:     {}", held.join(", "));
    println!("required: {}", required.join(", "));
    if comparison.has_all {
        println!("missing:  none");
    } else {
        println!("missing:  {}", comparison.missing.join(", "));
    }
    if !comparison.extra.is_empty() {
        println!("extra:    {}", comparison.extra.join(", "));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol; all diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Stdio(args) => run_stdio(build_runtime(&args).await?).await,
        Command::Tools(args) => run_tools(build_runtime(&args).await?).await,
        Command::Scopes(args) => run_scopes(build_runtime(&args).await?).await,
    }
}
