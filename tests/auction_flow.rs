// Integration tests for the auction simulator.
//
// These exercise the full system end-to-end through the library crate's
// public API: pool assembly, the turn controller against the stochastic
// agent, session invariants, and recording the finished session.

use std::collections::HashMap;

use tokio::sync::mpsc;

use auction_sim::auction::agent::StochasticAgent;
use auction_sim::auction::engine::{AuctionEngine, AuctionEvent};
use auction_sim::auction::player::{perturb_ceilings, AuctionPlayer, PlayerType, Role};
use auction_sim::auction::seat::AutoSeat;
use auction_sim::auction::session::AuctionSession;
use auction_sim::auction::team::{SquadQuotas, TeamState};
use auction_sim::config::{
    AgentConfig, AuctionConfig, AuctionSection, DataPaths, LadderConfig, PacingConfig,
};
use auction_sim::store::Database;

use rand::rngs::StdRng;
use rand::SeedableRng;

// ===========================================================================
// Test helpers
// ===========================================================================

/// Build a fast-forward config -- single source of truth for the suite.
fn test_config() -> AuctionConfig {
    let mut personalities = HashMap::new();
    personalities.insert("mi".to_string(), 1.2);
    personalities.insert("csk".to_string(), 1.1);

    AuctionConfig {
        auction: AuctionSection {
            my_team: "csk".into(),
            squad_cap: 25,
            overseas_cap: 8,
            final_call_after: 3,
            ceiling_spread: 0.3,
        },
        ladder: LadderConfig::default(),
        agent: AgentConfig::default(),
        pacing: PacingConfig {
            fast_forward: true,
            ..PacingConfig::default()
        },
        personalities,
        db_path: ":memory:".into(),
        data_paths: DataPaths {
            players: "data/players.csv".into(),
            teams: "data/teams.csv".into(),
        },
    }
}

/// Build a four-team pool -- single source of truth for the suite.
fn test_teams() -> Vec<TeamState> {
    vec![
        TeamState::new(
            "csk",
            "Chennai Super Kings",
            "#FFFF3C",
            1_200_000_000,
            vec![Role::Batter],
        ),
        TeamState::new(
            "mi",
            "Mumbai Indians",
            "#045093",
            1_200_000_000,
            vec![Role::Bowler, Role::WicketKeeper],
        ),
        TeamState::new(
            "rcb",
            "Royal Challengers Bengaluru",
            "#EC1C24",
            1_200_000_000,
            vec![Role::Bowler],
        ),
        TeamState::new(
            "rr",
            "Rajasthan Royals",
            "#EA1A85",
            1_200_000_000,
            vec![Role::AllRounder],
        ),
    ]
}

fn make_player(set: &str, name: &str, role: Role, player_type: PlayerType) -> AuctionPlayer {
    AuctionPlayer {
        id: AuctionPlayer::derive_id(set, name),
        name: name.into(),
        role,
        player_type,
        base_price: 20_000_000,
        min_expected_price: 24_000_000,
        max_expected_price: 50_000_000,
        is_interested: false,
        is_new_buy: false,
        price: None,
    }
}

fn test_pool() -> Vec<AuctionPlayer> {
    let mut pool = vec![
        make_player("M1", "Opening Bat", Role::Batter, PlayerType::India),
        make_player("B1", "Strike Bowler", Role::Bowler, PlayerType::Overseas),
        make_player("A1", "Finisher", Role::AllRounder, PlayerType::India),
        make_player("W1", "Gloveman", Role::WicketKeeper, PlayerType::Overseas),
        make_player("B1", "Net Bowler", Role::Bowler, PlayerType::Uncapped),
        make_player("M1", "Anchor Bat", Role::Batter, PlayerType::India),
    ];
    pool[2].is_interested = true;
    pool[3].is_interested = true;
    pool
}

/// Run a complete session with the stochastic agent on auto-pilot and
/// return the final session plus every event it emitted.
async fn run_session(seed: u64) -> (AuctionSession, Vec<AuctionEvent>) {
    let config = test_config();
    let quotas = SquadQuotas {
        squad_cap: config.auction.squad_cap,
        overseas_cap: config.auction.overseas_cap,
    };

    let mut players = test_pool();
    let mut rng = StdRng::seed_from_u64(seed);
    perturb_ceilings(&mut players, config.auction.ceiling_spread, &mut rng);

    let policy = StochasticAgent::seeded(
        config.agent.clone(),
        config.personalities.clone(),
        quotas,
        seed,
    );
    let session = AuctionSession::new(test_teams(), &config.auction.my_team).unwrap();

    let (tx, mut rx) = mpsc::channel(4096);
    let engine = AuctionEngine::with_seed(config, session, policy, AutoSeat, tx, seed);
    let session = engine.run(players).await.expect("session should complete");

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    (session, events)
}

// ===========================================================================
// Full-session invariants
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn every_lot_is_accounted_for() {
    for seed in [1, 7, 42, 1234] {
        let (session, events) = run_session(seed).await;

        let opened = events
            .iter()
            .filter(|e| matches!(e, AuctionEvent::LotOpened { .. }))
            .count();
        assert_eq!(opened, 6, "every player goes under the hammer (seed {seed})");

        let (sold, unsold) = events
            .iter()
            .find_map(|e| match e {
                AuctionEvent::SessionComplete { sold, unsold } => Some((*sold, *unsold)),
                _ => None,
            })
            .expect("session should complete");
        assert_eq!(sold + unsold, 6, "sold + unsold covers the pool (seed {seed})");
        assert_eq!(session.sold_players.len(), sold);
        assert!(session.auction_started);
        assert!(session.current_player.is_none());
    }
}

#[tokio::test(start_paused = true)]
async fn budgets_are_conserved() {
    for seed in [1, 7, 42, 1234] {
        let (session, _events) = run_session(seed).await;

        // Per-team: spent + remaining == initial, always.
        for team in &session.teams {
            assert_eq!(team.budget + team.spent(), team.initial_budget);
            let squad_total: u64 = team.players.iter().filter_map(|p| p.price).sum();
            assert_eq!(squad_total, team.spent(), "squad prices equal team spend");
        }

        // League-wide: the audit trail matches the money that moved.
        let audited: u64 = session.sold_players.values().map(|r| r.amount).sum();
        assert_eq!(session.total_spent(), audited, "seed {seed}");
    }
}

#[tokio::test(start_paused = true)]
async fn sold_players_appear_exactly_once() {
    for seed in [1, 7, 42, 1234] {
        let (session, _events) = run_session(seed).await;

        for (player_id, record) in &session.sold_players {
            let mut appearances = 0;
            for team in &session.teams {
                for player in &team.players {
                    if &player.id == player_id {
                        appearances += 1;
                        assert!(player.is_new_buy);
                        assert_eq!(player.price, Some(record.amount));
                        assert_eq!(team.team_id, record.team_id);
                    }
                }
            }
            assert_eq!(appearances, 1, "player {player_id} on exactly one squad");
        }

        // No phantom buys: every squad member traces back to the audit.
        for team in &session.teams {
            for player in &team.players {
                assert!(session.sold_players.contains_key(&player.id));
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn bids_walk_the_ladder_per_lot() {
    for seed in [1, 7, 42, 1234] {
        let (_session, events) = run_session(seed).await;

        let ladder = LadderConfig::default();
        let mut current: Option<u64> = None;
        for event in &events {
            match event {
                AuctionEvent::LotOpened { base_price, .. } => {
                    current = Some(*base_price);
                }
                AuctionEvent::BidPlaced { amount, .. } => {
                    let prev = current.expect("bid before any lot opened");
                    assert_eq!(
                        *amount,
                        auction_sim::auction::ladder::next_bid(prev, &ladder),
                        "every raise is exactly one ladder step (seed {seed})"
                    );
                    assert!(*amount > prev, "bids are strictly increasing");
                    current = Some(*amount);
                }
                _ => {}
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn interested_players_open_the_auction() {
    let (_session, events) = run_session(7).await;

    let opened: Vec<String> = events
        .iter()
        .filter_map(|e| match e {
            AuctionEvent::LotOpened { player_name, .. } => Some(player_name.clone()),
            _ => None,
        })
        .collect();

    // The two flagged players lead in their original relative order.
    assert_eq!(opened[0], "Finisher");
    assert_eq!(opened[1], "Gloveman");
}

#[tokio::test(start_paused = true)]
async fn overseas_quota_holds_league_wide() {
    // Tiny quota: no squad may ever exceed one overseas player.
    let mut config = test_config();
    config.auction.overseas_cap = 1;
    let quotas = SquadQuotas {
        squad_cap: config.auction.squad_cap,
        overseas_cap: config.auction.overseas_cap,
    };

    let policy = StochasticAgent::seeded(
        config.agent.clone(),
        config.personalities.clone(),
        quotas,
        99,
    );
    let session = AuctionSession::new(test_teams(), &config.auction.my_team).unwrap();
    let (tx, _rx) = mpsc::channel(4096);
    let engine = AuctionEngine::with_seed(config, session, policy, AutoSeat, tx, 99);
    let session = engine.run(test_pool()).await.unwrap();

    for team in &session.teams {
        assert!(
            team.overseas_count() <= 1,
            "{} breached the overseas quota",
            team.team_name
        );
    }
}

// ===========================================================================
// Result recording
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn finished_session_round_trips_through_the_store() {
    let (session, _events) = run_session(42).await;

    let db = Database::open(":memory:").unwrap();
    db.record_session("auction-integration", &session).unwrap();

    let results = db.load_session("auction-integration").unwrap();
    assert_eq!(results.len(), session.teams.len());

    for team in &session.teams {
        let stored = results
            .iter()
            .find(|r| r.team_id == team.team_id)
            .expect("every team is recorded");
        assert_eq!(stored.budget_remaining, team.budget);
        assert_eq!(stored.initial_budget, team.initial_budget);
        assert_eq!(stored.squad.len(), team.players.len());
        for player in &team.players {
            let entry = stored
                .squad
                .iter()
                .find(|e| e.player_id == player.id)
                .expect("every squad member is recorded");
            assert_eq!(entry.price, player.price.unwrap_or(0));
            assert_eq!(entry.is_new_buy, player.is_new_buy);
        }
    }

    assert_eq!(db.list_sessions().unwrap(), vec!["auction-integration"]);
}
