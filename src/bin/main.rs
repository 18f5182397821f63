//! Twinchain CLI - wallet session host
//!
//!   twinchain serve                → HTTP surface for the presentation layer
//!   twinchain status               → connect, sync balances, print snapshot
//!   twinchain send-evm <address>   → connect, send 0.01 native EVM unit
//!   twinchain send-btc <address>   → connect, send 1 sat
//!
//! Configuration (flag, then env, then `.env`):
//!   --evm-rpc <url>       TWINCHAIN_EVM_RPC
//!   --btc-rpc <url>       TWINCHAIN_BTC_RPC
//!   --btc-user <user>     TWINCHAIN_BTC_RPC_USER
//!   --btc-pass <pass>     TWINCHAIN_BTC_RPC_PASS
//!   --balance-api <url>   TWINCHAIN_BALANCE_API
//!   --port <port>         TWINCHAIN_PORT
//!   --auto-connect        TWINCHAIN_AUTO_CONNECT=1

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::{debug, info};
use twinchain::core::paths::routes;
use twinchain::logging::init_logging;
use twinchain::{create_router, install_signal_handlers, rpc_providers, BridgeConfig, Session, SessionConfig};

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }
    if opts.version {
        println!("twinchain {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if opts.command.is_none() {
        print_usage();
        return;
    }

    // .env is applied before any runtime thread exists.
    let result = tokio::runtime::Runtime::new()
        .context("create runtime")
        .and_then(|rt| rt.block_on(run(&opts)));

    let pretty = opts.pretty || (!opts.json && std::io::stdout().is_terminal());
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": format!("{:#}", e)}), pretty));
            std::process::exit(1);
        }
    }
}

async fn run(opts: &ParsedArgs) -> Result<Value> {
    match opts.command.as_deref() {
        Some("serve") => cmd_serve(opts).await,
        Some("status") => cmd_status(opts).await,
        Some("send-evm") => cmd_send(opts, Chain::Evm).await,
        Some("send-btc") => cmd_send(opts, Chain::Btc).await,
        Some(cmd) => bail!("unknown command: {}", cmd),
        None => bail!("missing command"),
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Clone, Copy)]
enum Chain { Evm, Btc }

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    target: Option<String>,
    evm_rpc: Option<String>,
    btc_rpc: Option<String>,
    btc_user: Option<String>,
    btc_pass: Option<String>,
    balance_api: Option<String>,
    port: Option<u16>,
    auto_connect: bool,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        load_dotenv();

        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--auto-connect" => opts.auto_connect = true,
                "--evm-rpc" => opts.evm_rpc = iter.next().cloned(),
                "--btc-rpc" => opts.btc_rpc = iter.next().cloned(),
                "--btc-user" => opts.btc_user = iter.next().cloned(),
                "--btc-pass" => opts.btc_pass = iter.next().cloned(),
                "--balance-api" => opts.balance_api = iter.next().cloned(),
                "--port" | "-p" => opts.port = iter.next().and_then(|p| p.parse().ok()),
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
        }

        let mut positional = positional.into_iter();
        opts.command = positional.next();
        opts.target = positional.next();

        // Environment fills whatever the flags left unset
        let env_opt = |key: &str| env::var(key).ok().filter(|s| !s.is_empty());
        opts.evm_rpc = opts.evm_rpc.or_else(|| env_opt("TWINCHAIN_EVM_RPC"));
        opts.btc_rpc = opts.btc_rpc.or_else(|| env_opt("TWINCHAIN_BTC_RPC"));
        opts.btc_user = opts.btc_user.or_else(|| env_opt("TWINCHAIN_BTC_RPC_USER"));
        opts.btc_pass = opts.btc_pass.or_else(|| env_opt("TWINCHAIN_BTC_RPC_PASS"));
        opts.balance_api = opts.balance_api.or_else(|| env_opt("TWINCHAIN_BALANCE_API"));
        opts.port = opts.port.or_else(|| env_opt("TWINCHAIN_PORT").and_then(|p| p.parse().ok()));
        opts.auto_connect = opts.auto_connect || env_opt("TWINCHAIN_AUTO_CONNECT").as_deref() == Some("1");

        opts
    }

    fn bridge_config(&self) -> BridgeConfig {
        let mut config = BridgeConfig::default();
        if let Some(url) = &self.evm_rpc { config = config.with_evm_rpc(url); }
        if let Some(url) = &self.btc_rpc { config = config.with_btc_rpc(url); }
        if let (Some(user), Some(pass)) = (&self.btc_user, &self.btc_pass) { config = config.with_btc_auth(user, pass); }
        if let Some(url) = &self.balance_api { config = config.with_balance_api(url); }
        config
    }

    fn session(&self) -> Arc<Session> {
        let bridge = self.bridge_config();
        debug!(evm = %bridge.evm_rpc_url, btc = %bridge.btc_rpc_url, "wiring providers");
        let config = SessionConfig::new().with_auto_connect(self.auto_connect);
        Arc::new(Session::new(rpc_providers(&bridge), config))
    }
}

/// `KEY=value` lines from `./.env`; never overrides the real environment.
fn load_dotenv() {
    let Ok(contents) = std::fs::read_to_string(".env") else { return };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() && env::var(key.trim()).is_err() {
                env::set_var(key.trim(), value);
            }
        }
    }
}

fn print_usage() {
    println!(
        r#"twinchain - dual-chain wallet session

USAGE:
    twinchain <command> [address] [options]

COMMANDS:
    serve                   Start HTTP server
    status                  Connect, sync balances, print session snapshot
    send-evm <address>      Send 0.01 of the EVM native unit
    send-btc <address>      Send 1 sat

OPTIONS:
    --evm-rpc <url>         EVM JSON-RPC endpoint (env: TWINCHAIN_EVM_RPC)
    --btc-rpc <url>         Bitcoin Core wallet RPC (env: TWINCHAIN_BTC_RPC)
    --btc-user <user>       Bitcoin Core RPC user (env: TWINCHAIN_BTC_RPC_USER)
    --btc-pass <pass>       Bitcoin Core RPC password (env: TWINCHAIN_BTC_RPC_PASS)
    --balance-api <url>     Blockcypher base URL (env: TWINCHAIN_BALANCE_API)
    --port, -p <port>       Server port (default: 8080, env: TWINCHAIN_PORT)
    --auto-connect          Connect on startup (env: TWINCHAIN_AUTO_CONNECT=1)
    --json                  Raw JSON output
    --pretty                Pretty-print JSON
    --version, -V           Print version

EXAMPLES:
    twinchain status --evm-rpc http://127.0.0.1:8545 --btc-rpc http://127.0.0.1:18332
    twinchain send-btc tb1qexampleaddress --json | jq .tx_hash
    twinchain serve --port 8080 --auto-connect
"#
    );
}

async fn connected_session(opts: &ParsedArgs) -> Result<Arc<Session>> {
    let session = opts.session();
    session.connect().await.context("connect")?;
    Ok(session)
}

async fn cmd_status(opts: &ParsedArgs) -> Result<Value> {
    let session = connected_session(opts).await?;
    Ok(serde_json::to_value(session.snapshot().await)?)
}

async fn cmd_send(opts: &ParsedArgs, chain: Chain) -> Result<Value> {
    let Some(target) = opts.target.clone() else { bail!("missing destination address") };
    let session = connected_session(opts).await?;
    let result = match chain {
        Chain::Evm => {
            session.set_evm_address_input(target).await;
            session.submit_evm_tx().await
        }
        Chain::Btc => {
            session.set_btc_address_input(target).await;
            session.submit_btc_tx().await
        }
    };
    Ok(serde_json::to_value(result)?)
}

async fn cmd_serve(opts: &ParsedArgs) -> Result<Value> {
    let port = opts.port.unwrap_or(8080);
    let session = opts.session();
    let shutdown = install_signal_handlers();

    if let Err(e) = session.start().await {
        // Connection failures stay visible through GET /session.
        info!(error = %e, "auto-connect failed, waiting for a connect intent");
    }

    let router = create_router(session);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("bind {}", addr))?;

    info!("twinchain listening on http://{}", addr);
    for route in routes::ALL {
        debug!("  {}", route);
    }

    let signal = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { signal.wait().await })
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(json!({"status": "stopped"}))
}
