// Session pool loading: the player and team pools from CSV data files.
//
// These are the engine's inbound collaborator boundary. A missing or empty
// pool is fatal (the session cannot begin without one), while individual
// malformed rows are skipped with a warning.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::auction::player::{AuctionPlayer, PlayerType, Role};
use crate::auction::team::TeamState;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    /// A collaborator failed to supply usable session data. Fatal.
    #[error("session data missing: {0}")]
    MissingData(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// One row of players.csv.
#[derive(Debug, Deserialize)]
struct RawPlayerRow {
    set: String,
    name: String,
    role: String,
    #[serde(rename = "type")]
    player_type: String,
    base_price: u64,
    min_expected_price: u64,
    max_expected_price: u64,
    #[serde(default)]
    interested: bool,
}

/// One row of teams.csv. `needed_roles` is pipe-separated
/// (e.g. "BOWLER|WICKETKEEPER").
#[derive(Debug, Deserialize)]
struct RawTeamRow {
    team_id: String,
    name: String,
    #[serde(default)]
    color: String,
    budget: u64,
    #[serde(default)]
    needed_roles: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load the full player pool for a session.
pub fn load_players(path: &Path) -> Result<Vec<AuctionPlayer>, PoolError> {
    let display = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| PoolError::Io {
        path: display.clone(),
        source: e,
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let mut players = Vec::new();
    for result in reader.deserialize::<RawPlayerRow>() {
        let raw = result.map_err(|e| PoolError::Csv {
            path: display.clone(),
            source: e,
        })?;
        match convert_player(raw) {
            Some(player) => players.push(player),
            None => continue,
        }
    }

    if players.is_empty() {
        return Err(PoolError::MissingData(format!(
            "player pool at {display} is empty"
        )));
    }
    Ok(players)
}

/// Load the full team pool for a session.
pub fn load_teams(path: &Path) -> Result<Vec<TeamState>, PoolError> {
    let display = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| PoolError::Io {
        path: display.clone(),
        source: e,
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let mut teams = Vec::new();
    for result in reader.deserialize::<RawTeamRow>() {
        let raw = result.map_err(|e| PoolError::Csv {
            path: display.clone(),
            source: e,
        })?;
        teams.push(convert_team(raw));
    }

    if teams.is_empty() {
        return Err(PoolError::MissingData(format!(
            "team pool at {display} is empty"
        )));
    }
    Ok(teams)
}

fn convert_player(raw: RawPlayerRow) -> Option<AuctionPlayer> {
    let Some(role) = Role::from_str_role(&raw.role) else {
        warn!("skipping player {}: unknown role `{}`", raw.name, raw.role);
        return None;
    };
    let Some(player_type) = PlayerType::from_str_type(&raw.player_type) else {
        warn!(
            "skipping player {}: unknown type `{}`",
            raw.name, raw.player_type
        );
        return None;
    };
    if raw.base_price == 0 {
        warn!("skipping player {}: base price is zero", raw.name);
        return None;
    }

    Some(AuctionPlayer {
        id: AuctionPlayer::derive_id(&raw.set, &raw.name),
        name: raw.name,
        role,
        player_type,
        base_price: raw.base_price,
        min_expected_price: raw.min_expected_price,
        max_expected_price: raw.max_expected_price,
        is_interested: raw.interested,
        is_new_buy: false,
        price: None,
    })
}

fn convert_team(raw: RawTeamRow) -> TeamState {
    let needed_roles: Vec<Role> = raw
        .needed_roles
        .split('|')
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            let role = Role::from_str_role(s);
            if role.is_none() {
                warn!("team {}: ignoring unknown needed role `{s}`", raw.team_id);
            }
            role
        })
        .collect();

    TeamState::new(raw.team_id, raw.name, raw.color, raw.budget, needed_roles)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
