// Auction session state: the single record of the sale in progress.
//
// The session is owned and mutated exclusively by the turn controller;
// the ledger is only touched through `resolve_sale`. That single-writer
// rule is the core correctness invariant of the whole engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::player::AuctionPlayer;
use super::team::{LedgerError, SquadQuotas, TeamState};

#[derive(Debug, Error)]
pub enum SessionError {
    /// A collaborator failed to supply the player/team pool. Fatal:
    /// the session cannot begin.
    #[error("session data missing: {0}")]
    DataMissing(String),

    #[error("unknown team id `{0}`")]
    UnknownTeam(String),
}

/// Why a resolution attempt did not change anything.
#[derive(Debug, Error)]
pub enum SaleError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("no player is under the hammer")]
    NoActiveLot,
}

/// Audit entry for one completed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoldRecord {
    pub amount: u64,
    pub team_id: String,
    pub team_name: String,
}

/// Format rupees as crores for ticker messages (1 Cr = 10,000,000).
pub fn crores(amount: u64) -> f64 {
    amount as f64 / 10_000_000.0
}

/// The complete state of a mock-auction session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionSession {
    /// All franchises, human team included.
    pub teams: Vec<TeamState>,
    /// Index into `teams` for the human-controlled team.
    pub human_team_idx: usize,
    /// The player under active bidding, if any.
    pub current_player: Option<AuctionPlayer>,
    /// Current high bid; the lot's base price until someone raises.
    pub current_bid: u64,
    /// Team id holding the high bid. `None` means no bid yet.
    pub current_bidder: Option<String>,
    /// Ladder rounds in a row where nobody raised. Drives the final call.
    pub consecutive_no_bids: u32,
    /// Append-only audit of completed sales, keyed by player id.
    pub sold_players: HashMap<String, SoldRecord>,
    /// Human-readable ticker, newest first.
    pub live_messages: Vec<String>,
    /// Set once the sequencer starts feeding lots.
    pub auction_started: bool,
}

impl AuctionSession {
    /// Assemble a session from the loaded team pool.
    pub fn new(teams: Vec<TeamState>, human_team_id: &str) -> Result<Self, SessionError> {
        if teams.is_empty() {
            return Err(SessionError::DataMissing("team pool is empty".into()));
        }
        let human_team_idx = teams
            .iter()
            .position(|t| t.team_id == human_team_id)
            .ok_or_else(|| SessionError::UnknownTeam(human_team_id.to_string()))?;

        Ok(AuctionSession {
            teams,
            human_team_idx,
            current_player: None,
            current_bid: 0,
            current_bidder: None,
            consecutive_no_bids: 0,
            sold_players: HashMap::new(),
            live_messages: Vec::new(),
            auction_started: false,
        })
    }

    pub fn human_team(&self) -> &TeamState {
        &self.teams[self.human_team_idx]
    }

    /// Look up a team by id.
    pub fn team(&self, team_id: &str) -> Option<&TeamState> {
        self.teams.iter().find(|t| t.team_id == team_id)
    }

    /// Total purse spent across all teams.
    pub fn total_spent(&self) -> u64 {
        self.teams.iter().map(|t| t.spent()).sum()
    }

    /// Put a player under the hammer at its base price with no bidder.
    pub fn open_lot(&mut self, player: AuctionPlayer) {
        self.current_bid = player.base_price;
        self.current_bidder = None;
        self.consecutive_no_bids = 0;
        self.push_message(format!(
            "{} up for auction at ₹{:.1}Cr",
            player.name,
            crores(player.base_price)
        ));
        self.current_player = Some(player);
    }

    /// Record an accepted raise by the team at `team_idx`.
    ///
    /// Resets the no-bid streak: any accepted bid restarts the countdown
    /// to the final call.
    pub fn record_raise(&mut self, team_idx: usize, amount: u64) {
        let team = &self.teams[team_idx];
        let message = format!("{} bids ₹{:.1}Cr", team.team_name, crores(amount));
        self.current_bid = amount;
        self.current_bidder = Some(team.team_id.clone());
        self.consecutive_no_bids = 0;
        self.push_message(message);
    }

    /// Record a ladder round where nobody raised. Returns the new streak.
    pub fn record_no_bid(&mut self) -> u32 {
        self.consecutive_no_bids += 1;
        self.consecutive_no_bids
    }

    /// Resolve the current lot as sold to the team at `team_idx` for
    /// `amount`.
    ///
    /// The ledger write is all-or-nothing: on any gate failure nothing
    /// changes (not the team, not the lot, not the audit trail) and the
    /// caller decides what to do next.
    pub fn resolve_sale(
        &mut self,
        team_idx: usize,
        amount: u64,
        quotas: &SquadQuotas,
    ) -> Result<SoldRecord, SaleError> {
        let player = self
            .current_player
            .as_ref()
            .ok_or(SaleError::NoActiveLot)?
            .clone();

        self.teams[team_idx].apply_sale(&player, amount, quotas)?;

        let team = &self.teams[team_idx];
        let record = SoldRecord {
            amount,
            team_id: team.team_id.clone(),
            team_name: team.team_name.clone(),
        };
        if self
            .sold_players
            .insert(player.id.clone(), record.clone())
            .is_some()
        {
            warn!("player {} recorded as sold twice", player.id);
        }
        self.push_message(format!(
            "{} sold to {} for ₹{:.1}Cr",
            player.name,
            record.team_name,
            crores(amount)
        ));

        self.current_player = None;
        self.current_bidder = None;
        self.current_bid = 0;

        Ok(record)
    }

    /// Resolve the current lot as unsold. Returns the passed player, or
    /// `None` when no lot was active.
    pub fn resolve_pass(&mut self) -> Option<AuctionPlayer> {
        let player = self.current_player.take()?;
        self.push_message(format!("{} goes unsold", player.name));
        self.current_bidder = None;
        self.current_bid = 0;
        Some(player)
    }

    fn push_message(&mut self, message: String) {
        self.live_messages.insert(0, message);
    }
}
