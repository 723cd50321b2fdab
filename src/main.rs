// Mock-auction simulator entry point.
//
// Startup sequence:
// 1. Initialize tracing
// 2. Load config (copying defaults on first run)
// 3. Open the results database
// 4. Load the player and team pools
// 5. Perturb AI price ceilings for this session
// 6. Assemble the session and spawn the engine
// 7. Drain engine events into the log
// 8. Record the finished session

use std::path::Path;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tracing::info;

use auction_sim::auction::agent::StochasticAgent;
use auction_sim::auction::engine::{AuctionEngine, AuctionEvent};
use auction_sim::auction::player::perturb_ceilings;
use auction_sim::auction::seat::AutoSeat;
use auction_sim::auction::session::{crores, AuctionSession};
use auction_sim::auction::team::SquadQuotas;
use auction_sim::{config, pool, store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing();
    info!("auction simulator starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "config loaded: human team {}, squad cap {}, overseas cap {}",
        config.auction.my_team, config.auction.squad_cap, config.auction.overseas_cap
    );

    // 3. Open the results database
    let db = store::Database::open(&config.db_path).context("failed to open results database")?;
    info!("results database opened at {}", config.db_path);

    // 4. Load the pools
    let mut players = pool::load_players(Path::new(&config.data_paths.players))
        .context("failed to load player pool")?;
    let teams =
        pool::load_teams(Path::new(&config.data_paths.teams)).context("failed to load team pool")?;
    info!("loaded {} players, {} teams", players.len(), teams.len());

    // 5. Perturb the AI price ceilings once for this session
    let mut rng = StdRng::from_entropy();
    perturb_ceilings(&mut players, config.auction.ceiling_spread, &mut rng);

    // 6. Assemble the session and spawn the engine
    let session = AuctionSession::new(teams, &config.auction.my_team)
        .context("failed to assemble auction session")?;
    let quotas = SquadQuotas {
        squad_cap: config.auction.squad_cap,
        overseas_cap: config.auction.overseas_cap,
    };
    let policy = StochasticAgent::new(
        config.agent.clone(),
        config.personalities.clone(),
        quotas,
    );

    let (event_tx, mut event_rx) = mpsc::channel(256);
    let engine = AuctionEngine::new(config.clone(), session, policy, AutoSeat, event_tx);
    let engine_handle = tokio::spawn(engine.run(players));

    // 7. Drain engine events into the log until the channel closes
    while let Some(event) = event_rx.recv().await {
        log_event(&event);
    }

    let session = engine_handle
        .await
        .context("engine task panicked")?
        .context("auction session failed")?;

    // 8. Record the finished session
    let session_id = store::Database::generate_session_id();
    db.record_session(&session_id, &session)
        .context("failed to record session results")?;
    info!("session {session_id} recorded");

    for team in &session.teams {
        info!(
            "{}: {} players, ₹{:.1}Cr spent, ₹{:.1}Cr remaining",
            team.team_name,
            team.players.len(),
            crores(team.spent()),
            crores(team.budget)
        );
    }

    info!("auction simulator shut down cleanly");
    Ok(())
}

fn log_event(event: &AuctionEvent) {
    match event {
        AuctionEvent::SessionStarted { lots } => info!("session started with {lots} lots"),
        AuctionEvent::LotOpened {
            player_name,
            role,
            base_price,
            ..
        } => info!(
            "up next: {player_name} ({role}) at ₹{:.1}Cr",
            crores(*base_price)
        ),
        AuctionEvent::BidPlaced {
            team_name, amount, ..
        } => info!("{team_name} bids ₹{:.1}Cr", crores(*amount)),
        AuctionEvent::NoBid { streak } => info!("no takers (round {streak})"),
        AuctionEvent::FinalCall {
            player_name,
            next_bid,
            ..
        } => info!("final call on {player_name}: ₹{:.1}Cr to match", crores(*next_bid)),
        AuctionEvent::Sold {
            player_name,
            team_name,
            amount,
            ..
        } => info!("SOLD: {player_name} to {team_name} for ₹{:.1}Cr", crores(*amount)),
        AuctionEvent::Unsold { player_name, .. } => info!("UNSOLD: {player_name}"),
        AuctionEvent::SessionComplete { sold, unsold } => {
            info!("hammer down: {sold} sold, {unsold} unsold")
        }
    }
}

/// Initialize tracing to stderr with an env-filter override
/// (`RUST_LOG=auction_sim=debug` for the noisy version).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("auction_sim=info,gavel=info,warn")),
        )
        .with_target(false)
        .init();
}
