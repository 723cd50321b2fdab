// Player sequencer: the order in which the pool goes under the hammer.

use rand::seq::SliceRandom;
use rand::Rng;

use super::player::AuctionPlayer;

/// Build the auction order: players the user flagged as interested come
/// first, keeping their original relative order; everyone else follows in
/// a uniformly shuffled order. Reshuffling per session is intended; there
/// is no deterministic replay requirement.
pub fn build_order<R: Rng>(players: Vec<AuctionPlayer>, rng: &mut R) -> Vec<AuctionPlayer> {
    let (mut interested, mut rest): (Vec<_>, Vec<_>) =
        players.into_iter().partition(|p| p.is_interested);
    rest.shuffle(rng);
    interested.extend(rest);
    interested
}
