use clap::{Args, Parser, Subcommand};

mod orders;
mod watch;

use orders::{fetch_order_once, list_orders, print_health};
use watch::watch_order;

#[derive(Parser, Debug)]
#[command(version, about = "Operator tools for the Mercado payment gateway")]
pub struct Arguments {
    /// Base URL of the payment server
    #[arg(short = 's', long = "server", env = "MPG_SERVER_URL", default_value = "http://127.0.0.1:3001")]
    server: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[clap(name = "health", about = "Check that the payment server is up")]
    Health,
    #[clap(name = "order", about = "Fetch an order once and print it")]
    Order(OrderParams),
    #[clap(
        name = "watch-order",
        about = "Poll an order until its payment resolves, the way the checkout waiting page does"
    )]
    WatchOrder(WatchParams),
    #[clap(name = "orders", about = "List every order in the store (admin)")]
    Orders(AdminParams),
}

#[derive(Debug, Args)]
pub struct OrderParams {
    /// The order id to fetch
    order_id: String,
}

#[derive(Debug, Args)]
pub struct WatchParams {
    /// The order id to watch
    order_id: String,
    /// Seconds between polls
    #[arg(short = 'i', long = "interval", env = "MPG_POLL_INTERVAL_SECS")]
    interval: Option<u64>,
    /// Total poll attempts before giving up as unresolved
    #[arg(short = 'a', long = "attempts", env = "MPG_POLL_MAX_ATTEMPTS")]
    attempts: Option<u32>,
    /// Consecutive not-found responses before assuming the payment was rejected
    #[arg(short = 'n', long = "not-found-limit", env = "MPG_POLL_NOT_FOUND_LIMIT")]
    not_found_limit: Option<u32>,
}

#[derive(Debug, Args)]
pub struct AdminParams {
    /// Admin API key for the server
    #[arg(short = 'k', long = "api-key", env = "MPG_ADMIN_API_KEY")]
    api_key: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let args = Arguments::parse();
    match args.command {
        Command::Health => print_health(&args.server).await,
        Command::Order(params) => fetch_order_once(&args.server, &params.order_id).await,
        Command::WatchOrder(params) => watch_order(&args.server, params).await,
        Command::Orders(params) => list_orders(&args.server, &params.api_key).await,
    }
}
