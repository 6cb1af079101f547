#![allow(clippy::print_stdout)]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use console_shell_core::{
    MenuLayout, RawMenuNode, Resolver, RouteCatalog, ShellConfig, StaticRoutes,
    default_route_catalog,
};
use console_shell_runtime::{
    MemoryPagePool, MemoryRouter, MemorySearchIndex, MemorySession, NavigationGuard,
    NavigationMode, PermissionStore, ShellServices, StaticMenuSource,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

#[derive(Parser)]
#[command(name = "console-shell")]
#[command(about = "Resolve console menu trees and replay navigations through the permission guard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the menus, permissions, and route table derived from a raw tree.
    Resolve(ResolveArgs),
    /// Run each path through the navigation guard in order.
    Navigate(NavigateArgs),
}

#[derive(Args)]
struct ResolveArgs {
    /// JSON file holding the raw menu tree.
    tree: PathBuf,
    /// JSON route catalog to match against instead of the built-in one.
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Args)]
struct NavigateArgs {
    tree: PathBuf,
    #[arg(required = true)]
    paths: Vec<String>,
    /// Session token; without one the session is anonymous.
    #[arg(long)]
    token: Option<String>,
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ShellConfig::from_env().context("invalid console shell configuration")?;
    match cli.command {
        Commands::Resolve(args) => run_resolve(&config, args),
        Commands::Navigate(args) => run_navigate(config, args).await,
    }
}

fn run_resolve(config: &ShellConfig, args: ResolveArgs) -> Result<()> {
    let tree = read_tree(&args.tree)?;
    let resolver = build_resolver(config, args.catalog.as_deref())?;
    let resolution = resolver.resolve(&tree);
    let MenuLayout { header, aside } = resolution.menus;
    print_json(&json!({
        "header_menu": header,
        "aside_menu": aside,
        "permissions": resolution.permissions,
        "routes": resolution.routes,
    }))
}

async fn run_navigate(config: ShellConfig, args: NavigateArgs) -> Result<()> {
    let tree = read_tree(&args.tree)?;
    let resolver = build_resolver(&config, args.catalog.as_deref())?;
    let session = match args.token {
        Some(token) => MemorySession::signed_in(token),
        None => MemorySession::anonymous(),
    };
    let services = ShellServices {
        menu_source: Arc::new(StaticMenuSource::new(tree)),
        session: Arc::new(session),
        router: Arc::new(MemoryRouter::new(resolver.constant_table())),
        page_pool: Arc::new(MemoryPagePool::default()),
        search: Arc::new(MemorySearchIndex::default()),
    };
    let guard = NavigationGuard::new(Arc::new(PermissionStore::new(resolver, services)), config);

    let mut transitions = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        let transition = guard.navigate(path, NavigationMode::Push).await;
        tracing::debug!(path = %path, decision = ?transition.decision, "navigation replayed");
        transitions.push(transition);
    }
    let transitions = serde_json::to_value(&transitions).context("failed to encode transitions")?;
    print_json(&transitions)
}

fn build_resolver(config: &ShellConfig, catalog: Option<&Path>) -> Result<Resolver> {
    let catalog: RouteCatalog = match catalog {
        Some(path) => read_json(path)?,
        None => default_route_catalog(),
    };
    Ok(Resolver::new(
        config.dictionary.clone(),
        catalog,
        StaticRoutes::default(),
    ))
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = read_file(path)?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Menu trees may nest deeper than serde_json's default limit.
fn read_tree(path: &Path) -> Result<Vec<RawMenuNode>> {
    let raw = read_file(path)?;
    RawMenuNode::parse_tree(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_json(value: &Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON output")?;
    println!("{rendered}");
    Ok(())
}
