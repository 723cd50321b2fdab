// Roster/budget ledger: per-team purse, squad, and quota enforcement.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::player::{AuctionPlayer, Role};

/// Squad caps enforced on every acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquadQuotas {
    /// Maximum players per squad.
    pub squad_cap: usize,
    /// Maximum overseas players per squad.
    pub overseas_cap: usize,
}

impl Default for SquadQuotas {
    fn default() -> Self {
        SquadQuotas {
            squad_cap: 25,
            overseas_cap: 8,
        }
    }
}

/// Why an acquisition was refused. Every variant is recovered locally:
/// the buy is rejected, nothing is mutated, and the team is simply
/// excluded from willingness checks at that price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient budget: {team} has {budget} remaining, bid is {amount}")]
    InsufficientBudget {
        team: String,
        budget: u64,
        amount: u64,
    },

    #[error("squad full: {team} already has {count} players (cap {cap})")]
    SquadFull {
        team: String,
        count: usize,
        cap: usize,
    },

    #[error("overseas quota reached: {team} has {count} overseas players (cap {cap})")]
    OverseasQuota {
        team: String,
        count: usize,
        cap: usize,
    },
}

/// The state of a single franchise during the auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamState {
    /// Team identifier (e.g. "csk").
    pub team_id: String,
    /// Display name of the team.
    pub team_name: String,
    /// Display color, passed through untouched for front-ends.
    #[serde(default)]
    pub color: String,
    /// Remaining purse.
    pub budget: u64,
    /// Purse at auction start. Immutable for the session.
    pub initial_budget: u64,
    /// Existing squad plus players bought this session.
    pub players: Vec<AuctionPlayer>,
    /// Roles the team is short on. Advisory: raises the AI's willingness.
    pub needed_roles: Vec<Role>,
}

impl TeamState {
    /// Create a team with a full purse and an empty squad.
    pub fn new(
        team_id: impl Into<String>,
        team_name: impl Into<String>,
        color: impl Into<String>,
        budget: u64,
        needed_roles: Vec<Role>,
    ) -> Self {
        TeamState {
            team_id: team_id.into(),
            team_name: team_name.into(),
            color: color.into(),
            budget,
            initial_budget: budget,
            players: Vec::new(),
            needed_roles,
        }
    }

    pub fn can_afford(&self, amount: u64) -> bool {
        self.budget >= amount
    }

    pub fn squad_full(&self, squad_cap: usize) -> bool {
        self.players.len() >= squad_cap
    }

    pub fn overseas_count(&self) -> usize {
        self.players
            .iter()
            .filter(|p| p.player_type.is_overseas())
            .count()
    }

    /// Squad slots still to fill. The AI's budget spread is computed
    /// against this.
    pub fn players_still_needed(&self, squad_cap: usize) -> usize {
        squad_cap.saturating_sub(self.players.len())
    }

    /// Total purse spent so far.
    pub fn spent(&self) -> u64 {
        self.initial_budget.saturating_sub(self.budget)
    }

    pub fn needs_role(&self, role: Role) -> bool {
        self.needed_roles.contains(&role)
    }

    /// Check every gate an acquisition must pass: budget first, then the
    /// squad-size cap, then the overseas quota.
    pub fn check_acquisition(
        &self,
        player: &AuctionPlayer,
        amount: u64,
        quotas: &SquadQuotas,
    ) -> Result<(), LedgerError> {
        if !self.can_afford(amount) {
            return Err(LedgerError::InsufficientBudget {
                team: self.team_name.clone(),
                budget: self.budget,
                amount,
            });
        }
        if self.squad_full(quotas.squad_cap) {
            return Err(LedgerError::SquadFull {
                team: self.team_name.clone(),
                count: self.players.len(),
                cap: quotas.squad_cap,
            });
        }
        if player.player_type.is_overseas() && self.overseas_count() >= quotas.overseas_cap {
            return Err(LedgerError::OverseasQuota {
                team: self.team_name.clone(),
                count: self.overseas_count(),
                cap: quotas.overseas_cap,
            });
        }
        Ok(())
    }

    /// Apply a completed sale: debit the purse and append the player to
    /// the squad tagged as a new buy.
    ///
    /// All-or-nothing: every gate is re-checked first and nothing is
    /// mutated on failure.
    pub fn apply_sale(
        &mut self,
        player: &AuctionPlayer,
        amount: u64,
        quotas: &SquadQuotas,
    ) -> Result<(), LedgerError> {
        self.check_acquisition(player, amount, quotas)?;
        self.budget -= amount;
        self.players.push(player.sold_copy(amount));
        Ok(())
    }
}
