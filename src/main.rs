use alloy::primitives::utils::parse_units;
use alloy::primitives::{Address, U256};
use alloy::providers::ProviderBuilder;
use clap::{Parser, Subcommand};
use eyre::{eyre, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use vault_router::assets::{Asset, AssetClassifier, OnchainClassifier};
use vault_router::config::{thresholds, RouterConfig};
use vault_router::display::{print_routes, print_trade_output};
use vault_router::graph::AssetGraphBuilder;
use vault_router::pools::{PoolDiscovery, SubgraphIndexer};
use vault_router::quoting::{OnchainQuoter, RouteQuoteEngine, TradeDirection};
use vault_router::routing::RouteBuilder;
use vault_router::trade::{
    BestTradeSelector, Router, RoutingMode, TradeRequest, TradeSession, TradeState,
};

#[derive(Parser)]
#[command(name = "vault-router")]
#[command(about = "Multi-hop swap router with boosted vault routes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find and quote the best trade
    Quote {
        #[arg(long)]
        token_in: Address,

        #[arg(long)]
        token_out: Address,

        /// Human amount: input for exact-in, output with --exact-out
        #[arg(long)]
        amount: String,

        /// Quote a fixed output amount instead of a fixed input
        #[arg(long, default_value = "false")]
        exact_out: bool,

        /// Only route through pools, never through vaults
        #[arg(long, default_value = "false")]
        no_boosted: bool,

        /// Slippage tolerance in bps (e.g., 50 = 0.5%)
        #[arg(long, default_value_t = thresholds::DEFAULT_SLIPPAGE_BPS)]
        slippage: u32,
    },

    /// List every candidate route with its quote
    Routes {
        #[arg(long)]
        token_in: Address,

        #[arg(long)]
        token_out: Address,

        #[arg(long)]
        amount: String,

        #[arg(long, default_value = "false")]
        exact_out: bool,

        #[arg(long, default_value = "false")]
        no_boosted: bool,
    },
}

struct Context {
    router: Arc<Router>,
    classifier: Arc<dyn AssetClassifier>,
    boosted_routing: bool,
}

async fn connect() -> Result<Context> {
    let config = RouterConfig::from_env()?;

    let url: reqwest::Url = config.rpc_url.parse()?;
    let provider = ProviderBuilder::new().connect_http(url);

    let classifier = Arc::new(OnchainClassifier::new(provider.clone()));
    classifier.preload(&config.boosted_vaults).await?;

    let mut bases = Vec::with_capacity(config.base_tokens.len());
    for &token in &config.base_tokens {
        bases.push(classifier.classify(token).await?);
    }
    info!(
        "Connected to chain {} ({} base tokens, {} vaults, {} custom deployers)",
        config.chain_id,
        bases.len(),
        config.boosted_vaults.len(),
        config.custom_deployers.len()
    );

    let classifier: Arc<dyn AssetClassifier> = classifier;
    let discovery = PoolDiscovery::new(
        config.discovery(),
        Arc::new(SubgraphIndexer::new(config.subgraph_url.clone())),
        classifier.clone(),
    );
    let engine = RouteQuoteEngine::new(Arc::new(OnchainQuoter::new(provider, config.quoter)));
    let router = Router::new(
        AssetGraphBuilder::new(bases, classifier.clone()),
        discovery,
        RouteBuilder::new(config.max_hops),
        engine,
    );

    Ok(Context {
        router: Arc::new(router),
        classifier,
        boosted_routing: config.boosted_routing,
    })
}

fn direction(exact_out: bool) -> TradeDirection {
    if exact_out {
        TradeDirection::ExactOut
    } else {
        TradeDirection::ExactIn
    }
}

fn parse_amount(amount: &str, asset: &Asset) -> Result<U256> {
    Ok(parse_units(amount, asset.decimals)?.get_absolute())
}

async fn request(
    ctx: &Context,
    token_in: Address,
    token_out: Address,
    amount: &str,
    exact_out: bool,
    no_boosted: bool,
) -> Result<TradeRequest> {
    let asset_in = ctx.classifier.classify(token_in).await?;
    let asset_out = ctx.classifier.classify(token_out).await?;
    let direction = direction(exact_out);
    let amount = match direction {
        TradeDirection::ExactIn => parse_amount(amount, &asset_in)?,
        TradeDirection::ExactOut => parse_amount(amount, &asset_out)?,
    };
    let mode = if no_boosted || !ctx.boosted_routing {
        RoutingMode::Regular
    } else {
        RoutingMode::Boosted
    };
    Ok(TradeRequest::new(asset_in, asset_out, amount, direction).with_mode(mode))
}

async fn run_quote(request: TradeRequest, ctx: Context, slippage: u32) -> Result<()> {
    let session = TradeSession::new(ctx.router);
    let mut updates = session.subscribe();
    let generation = session.submit(request);

    let output = tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            let update = updates.borrow_and_update().clone();
            if update.generation == generation && update.output.state != TradeState::Loading {
                return Ok::<_, eyre::Report>(update.output);
            }
            updates
                .changed()
                .await
                .map_err(|_| eyre!("trade session closed"))?;
        }
    })
    .await
    .map_err(|_| eyre!("timed out waiting for quotes"))??;

    print_trade_output(&output, slippage);
    Ok(())
}

async fn run_routes(request: TradeRequest, ctx: Context) -> Result<()> {
    let (Some(asset_in), Some(asset_out), Some(amount)) =
        (&request.asset_in, &request.asset_out, request.amount)
    else {
        return Err(eyre!("incomplete request"));
    };
    let boosted = request.routing_mode.boosted_enabled();

    let set = ctx
        .router
        .candidate_routes(asset_in, asset_out, request.direction, boosted)
        .await;
    let routes = BestTradeSelector::new(boosted).candidates(&set);
    let quotes = ctx
        .router
        .engine()
        .quote_all(&routes, amount, request.direction)
        .await;

    println!(
        "  {} -> {} | {} regular, {} boosted",
        asset_in,
        asset_out,
        set.regular.len(),
        set.boosted.len()
    );
    print_routes(&routes, &quotes);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let ctx = connect().await?;

    match cli.command {
        Commands::Quote { token_in, token_out, amount, exact_out, no_boosted, slippage } => {
            let request = request(&ctx, token_in, token_out, &amount, exact_out, no_boosted).await?;
            run_quote(request, ctx, slippage).await
        }
        Commands::Routes { token_in, token_out, amount, exact_out, no_boosted } => {
            let request = request(&ctx, token_in, token_out, &amount, exact_out, no_boosted).await?;
            run_routes(request, ctx).await
        }
    }
}
