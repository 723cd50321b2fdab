// Auction player model: roles, nationality types, and sale tagging.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Playing role of an auction player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Batter,
    Bowler,
    AllRounder,
    WicketKeeper,
}

impl Role {
    /// Parse a role string into a Role enum.
    ///
    /// Handles the spellings that show up in auction lists:
    /// - "BATTER" / "BATSMAN" -> Batter
    /// - "ALL-ROUNDER" / "ALLROUNDER" / "ALL ROUNDER" -> AllRounder
    /// - "WICKETKEEPER" / "WICKET-KEEPER" / "WK" -> WicketKeeper
    pub fn from_str_role(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "BATTER" | "BATSMAN" => Some(Role::Batter),
            "BOWLER" => Some(Role::Bowler),
            "ALL-ROUNDER" | "ALLROUNDER" | "ALL ROUNDER" => Some(Role::AllRounder),
            "WICKETKEEPER" | "WICKET-KEEPER" | "WK" => Some(Role::WicketKeeper),
            _ => None,
        }
    }

    /// Return the display string for this role.
    pub fn display_str(&self) -> &'static str {
        match self {
            Role::Batter => "BATTER",
            Role::Bowler => "BOWLER",
            Role::AllRounder => "ALL-ROUNDER",
            Role::WicketKeeper => "WICKETKEEPER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// Nationality classification driving the overseas squad quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerType {
    India,
    Overseas,
    Uncapped,
}

impl PlayerType {
    pub fn from_str_type(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "INDIA" | "INDIAN" => Some(PlayerType::India),
            "OVERSEAS" => Some(PlayerType::Overseas),
            "UNCAPPED" => Some(PlayerType::Uncapped),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            PlayerType::India => "India",
            PlayerType::Overseas => "Overseas",
            PlayerType::Uncapped => "Uncapped",
        }
    }

    /// Whether this player counts against the overseas quota.
    pub fn is_overseas(&self) -> bool {
        matches!(self, PlayerType::Overseas)
    }
}

impl fmt::Display for PlayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// A player in the auction pool.
///
/// Created once from the reference list at session start and never deleted.
/// `price` and `is_new_buy` are written exactly once, at the moment of sale,
/// on the copy appended to the winning team's squad.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionPlayer {
    /// Stable identifier derived from the auction set and player name.
    pub id: String,
    pub name: String,
    pub role: Role,
    pub player_type: PlayerType,
    /// Opening price for the lot (rupees; 1 Cr = 10,000,000).
    pub base_price: u64,
    pub min_expected_price: u64,
    /// Soft ceiling used by the AI agent. Perturbed once per session so
    /// AI behavior varies between runs.
    pub max_expected_price: u64,
    /// User flag: interested players are auctioned first.
    #[serde(default)]
    pub is_interested: bool,
    /// True only on squad copies created by a sale this session.
    #[serde(default)]
    pub is_new_buy: bool,
    /// Winning price; `None` until sold.
    #[serde(default)]
    pub price: Option<u64>,
}

impl AuctionPlayer {
    /// Derive the stable player id from auction set and name,
    /// e.g. ("M1", "Virat Kohli") -> "m1-virat-kohli".
    pub fn derive_id(set: &str, name: &str) -> String {
        let slug = |s: &str| {
            s.to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("-")
        };
        format!("{}-{}", slug(set), slug(name))
    }

    /// The copy of this player that joins the winning team's squad.
    pub fn sold_copy(&self, amount: u64) -> AuctionPlayer {
        AuctionPlayer {
            price: Some(amount),
            is_new_buy: true,
            ..self.clone()
        }
    }
}

/// Scale every player's `max_expected_price` by an independent uniform
/// factor in `[1 - spread, 1 + spread]`. Called once per session so the AI
/// ceilings differ between runs.
pub fn perturb_ceilings<R: Rng>(players: &mut [AuctionPlayer], spread: f64, rng: &mut R) {
    for player in players.iter_mut() {
        let factor = rng.gen_range(1.0 - spread..=1.0 + spread);
        player.max_expected_price = (player.max_expected_price as f64 * factor).round() as u64;
    }
}
