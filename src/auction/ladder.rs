// Bid ladder: maps the current price to the next minimum raise.

use crate::config::LadderConfig;

/// The next minimum bid above `current`.
///
/// Tiers are checked in ascending order; the first bracket the current bid
/// falls under supplies the increment, and bids above every bracket use
/// `top_increment`. Deterministic and strictly increasing; the only upper
/// bound on a lot's price is the teams' budgets.
pub fn next_bid(current: u64, ladder: &LadderConfig) -> u64 {
    for tier in &ladder.tiers {
        if current < tier.below {
            return current + tier.increment;
        }
    }
    current + ladder.top_increment
}
