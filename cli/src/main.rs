//! web3data CLI.
//!
//! # Commands
//! ```text
//! web3data chains
//! web3data get   <chain> <route> [--param key=value]...
//! web3data rpc   <chain> <method> [param]... [--id <n>]
//! web3data watch <chain> <topic>... [--filter <json>] [--count <n>] [--reconnect]
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use web3data::{ApiResponse, Chain, ClientConfig, QueryParams, Topics, Web3Data};

mod logging;

use logging::LogConfig;

#[derive(Parser)]
#[command(
    name = "web3data",
    about = "Query the web3data blockchain API from the command line",
    long_about = "
Query REST endpoints, make JSON-RPC calls and stream WebSocket subscriptions.

ENVIRONMENT VARIABLES:
  AMBERDATA_API_KEY    API key (overridden by --api-key)
  WEB3DATA_REST_URL    REST base URL override
  WEB3DATA_RPC_URL     JSON-RPC endpoint override
  WEB3DATA_WS_URL      WebSocket endpoint override
  RUST_LOG             Log filter (overrides --log-level)
",
    version
)]
struct Cli {
    /// API key; defaults to $AMBERDATA_API_KEY
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Default log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit JSON logs
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported chains and their capabilities
    Chains,

    /// GET a REST route relative to the API base URL
    Get {
        /// Chain slug, e.g. eth, btc, eth-rinkeby
        chain: Chain,
        /// Route, e.g. addresses/0x.../balances
        route: String,
        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },

    /// Make a JSON-RPC call over HTTP
    Rpc {
        chain: Chain,
        method: String,
        /// Parameters; each is parsed as JSON, falling back to a plain string
        params: Vec<String>,
        /// JSON-RPC request id
        #[arg(long, default_value_t = 1)]
        id: u64,
    },

    /// Subscribe to WebSocket topics and print every push as a JSON line
    Watch {
        chain: Chain,
        /// Topics sent as one subscribe request
        #[arg(required = true)]
        topics: Vec<String>,
        /// JSON filter object appended to the topic parameters
        #[arg(long)]
        filter: Option<String>,
        /// Stop after this many messages
        #[arg(long)]
        count: Option<u64>,
        /// Reconnect when the connection drops
        #[arg(long)]
        reconnect: bool,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{s}`"))
}

fn parse_param(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_tracing(&LogConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
        ..LogConfig::default()
    });

    let mut config = ClientConfig::from_env();
    if let Some(key) = cli.api_key {
        config.api_key = key;
    }

    match cli.command {
        Commands::Chains => cmd_chains(),
        Commands::Get {
            chain,
            route,
            params,
        } => cmd_get(config, chain, &route, params.into_iter().collect()).await,
        Commands::Rpc {
            chain,
            method,
            params,
            id,
        } => {
            let params = params.iter().map(|p| parse_param(p)).collect();
            cmd_rpc(config, chain, &method, params, id).await
        }
        Commands::Watch {
            chain,
            topics,
            filter,
            count,
            reconnect,
        } => cmd_watch(config, chain, topics, filter, count, reconnect).await,
    }
}

fn cmd_chains() -> Result<()> {
    println!("{:<12} {:<34} {:<8} rpc", "chain", "blockchain id", "limited");
    for chain in Chain::ALL {
        println!(
            "{:<12} {:<34} {:<8} {}",
            chain.slug(),
            chain.blockchain_id(),
            chain.is_limited(),
            chain.supports_rpc()
        );
    }
    Ok(())
}

async fn cmd_get(config: ClientConfig, chain: Chain, route: &str, params: QueryParams) -> Result<()> {
    let w3d = Web3Data::with_config(config)?;
    let rest = w3d.chain(chain).rest();
    match rest.query(rest.base_url(), route, &params).await? {
        ApiResponse::Json(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        ApiResponse::Text(text) => print!("{text}"),
    }
    Ok(())
}

async fn cmd_rpc(config: ClientConfig, chain: Chain, method: &str, params: Vec<Value>, id: u64) -> Result<()> {
    let w3d = Web3Data::with_config(config)?;
    let resp = w3d.chain(chain).rpc(method, params, id).await?;
    let result = resp
        .into_result()
        .map_err(|e| anyhow!("RPC error {}: {}", e.code, e.message))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn cmd_watch(
    config: ClientConfig,
    chain: Chain,
    topics: Vec<String>,
    filter: Option<String>,
    count: Option<u64>,
    reconnect: bool,
) -> Result<()> {
    let w3d = Web3Data::with_config(config)?;
    let mut ws_config = w3d.chain(chain).websocket_config();
    ws_config.reconnect = reconnect;
    let mut client = web3data::WebsocketClient::new(ws_config);

    let mut topics = Topics::from(topics);
    if let Some(filter) = filter {
        let filter: Value = serde_json::from_str(&filter).context("--filter is not valid JSON")?;
        topics = topics.with_filter(filter);
    }

    let received = Arc::new(AtomicU64::new(0));
    let seen = Arc::clone(&received);
    client.register(topics, move |ctx, msg| {
        println!("{}", serde_json::to_string(&msg["params"]["result"])?);
        let n = seen.fetch_add(1, Ordering::Relaxed) + 1;
        if count.is_some_and(|limit| n >= limit) {
            ctx.close();
        }
        Ok(())
    })?;
    client.on_open(|ctx| tracing::info!(url = %ctx.url(), "subscribed"));
    client.on_error(|_, e| tracing::warn!(error = %e, "subscription error"));

    let handle = client.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = handle.close();
        }
    });

    client.run().await?;
    tracing::info!(messages = received.load(Ordering::Relaxed), "done");
    Ok(())
}
