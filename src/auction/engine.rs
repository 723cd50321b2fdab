// Auction turn controller: the state machine that sells one player at a
// time.
//
// One lot at a time, one ladder round at a time. AI decisions inside a
// round are applied sequentially, so at most one bid resolution is ever in
// flight and `current_bid`/`current_bidder` have a single writer by
// construction. Every wait is bounded: the pre-lot countdown and the
// final-call window both carry timeouts with defined default outcomes.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::AuctionConfig;

use super::agent::BidPolicy;
use super::ladder;
use super::player::{AuctionPlayer, Role};
use super::seat::{FinalCallPrompt, HumanSeat, SeatDecision};
use super::session::{AuctionSession, SessionError, SoldRecord};
use super::team::SquadQuotas;

/// Progress notifications for whatever front-end is listening. Sends are
/// best-effort: a dropped receiver never stalls the auction.
#[derive(Debug, Clone, PartialEq)]
pub enum AuctionEvent {
    SessionStarted {
        lots: usize,
    },
    LotOpened {
        player_id: String,
        player_name: String,
        role: Role,
        base_price: u64,
    },
    BidPlaced {
        team_id: String,
        team_name: String,
        amount: u64,
    },
    /// A ladder round where nobody raised.
    NoBid {
        streak: u32,
    },
    FinalCall {
        player_name: String,
        current_bid: u64,
        current_bidder: Option<String>,
        next_bid: u64,
    },
    Sold {
        player_id: String,
        player_name: String,
        team_id: String,
        team_name: String,
        amount: u64,
    },
    Unsold {
        player_id: String,
        player_name: String,
    },
    SessionComplete {
        sold: usize,
        unsold: usize,
    },
}

/// The turn controller. Owns the session for the duration of the run and
/// hands it back when the pool is exhausted.
pub struct AuctionEngine<P: BidPolicy, S: HumanSeat> {
    config: AuctionConfig,
    session: AuctionSession,
    policy: P,
    seat: S,
    events: mpsc::Sender<AuctionEvent>,
    rng: StdRng,
}

impl<P: BidPolicy, S: HumanSeat> AuctionEngine<P, S> {
    pub fn new(
        config: AuctionConfig,
        session: AuctionSession,
        policy: P,
        seat: S,
        events: mpsc::Sender<AuctionEvent>,
    ) -> Self {
        AuctionEngine {
            config,
            session,
            policy,
            seat,
            events,
            rng: StdRng::from_entropy(),
        }
    }

    /// A reproducible engine for tests (sequencer shuffle, thinking
    /// delays, and winner selection all draw from this seed).
    pub fn with_seed(
        config: AuctionConfig,
        session: AuctionSession,
        policy: P,
        seat: S,
        events: mpsc::Sender<AuctionEvent>,
        seed: u64,
    ) -> Self {
        AuctionEngine {
            config,
            session,
            policy,
            seat,
            events,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Run the full session: order the pool, sell every lot, and return
    /// the final session state for the result recorder.
    pub async fn run(mut self, players: Vec<AuctionPlayer>) -> Result<AuctionSession, SessionError> {
        if players.is_empty() {
            return Err(SessionError::DataMissing("player pool is empty".into()));
        }

        let order = super::sequencer::build_order(players, &mut self.rng);
        self.session.auction_started = true;
        info!("auction started: {} lots", order.len());
        let _ = self
            .events
            .send(AuctionEvent::SessionStarted { lots: order.len() })
            .await;

        let mut unsold = 0usize;
        for player in order {
            if !self.run_lot(player).await {
                unsold += 1;
            }
        }

        let sold = self.session.sold_players.len();
        info!("auction complete: {sold} sold, {unsold} unsold");
        let _ = self
            .events
            .send(AuctionEvent::SessionComplete { sold, unsold })
            .await;

        Ok(self.session)
    }

    /// Sell (or pass) a single lot. Returns true if the player was sold.
    async fn run_lot(&mut self, player: AuctionPlayer) -> bool {
        self.await_intro().await;

        let quotas = self.quotas();
        info!(
            "lot opened: {} ({}) at base ₹{:.1}Cr",
            player.name,
            player.role,
            super::session::crores(player.base_price)
        );
        self.session.open_lot(player.clone());
        let _ = self
            .events
            .send(AuctionEvent::LotOpened {
                player_id: player.id.clone(),
                player_name: player.name.clone(),
                role: player.role,
                base_price: player.base_price,
            })
            .await;

        loop {
            let next = ladder::next_bid(self.session.current_bid, &self.config.ladder);

            // The human seat gets first crack at every ladder step.
            if self.seat.pending_raise() && self.try_human_raise(&player, next, &quotas).await {
                continue;
            }

            let willing = self.willing_teams(&player, next, &quotas);
            if willing.is_empty() {
                let streak = self.session.record_no_bid();
                debug!("no bids at ₹{:.1}Cr (streak {streak})", super::session::crores(next));
                let _ = self.events.send(AuctionEvent::NoBid { streak }).await;
                if streak >= self.config.auction.final_call_after {
                    break;
                }
                // The ladder step is not consumed; the same price is
                // offered again next round.
                continue;
            }

            self.thinking_pause().await;

            let Some(&winner_idx) = willing.choose(&mut self.rng) else {
                continue;
            };
            self.session.record_raise(winner_idx, next);
            let team = &self.session.teams[winner_idx];
            let _ = self
                .events
                .send(AuctionEvent::BidPlaced {
                    team_id: team.team_id.clone(),
                    team_name: team.team_name.clone(),
                    amount: next,
                })
                .await;
        }

        self.resolve_final_call(&player, &quotas).await
    }

    /// Every AI team (not the human, not the standing bidder) that both
    /// passes the hard ledger gates and is willing to raise to `next`.
    ///
    /// The gates are enforced here, not just inside the default policy, so
    /// a team that cannot afford the price or would breach a squad quota
    /// is excluded from willingness no matter what policy is in play.
    fn willing_teams(&mut self, player: &AuctionPlayer, next: u64, quotas: &SquadQuotas) -> Vec<usize> {
        let mut willing = Vec::new();
        for (idx, team) in self.session.teams.iter().enumerate() {
            if idx == self.session.human_team_idx {
                continue;
            }
            if self.session.current_bidder.as_deref() == Some(team.team_id.as_str()) {
                continue;
            }
            if let Err(reason) = team.check_acquisition(player, next, quotas) {
                debug!("{} excluded from bidding: {reason}", team.team_name);
                continue;
            }
            if self.policy.will_bid(team, player, next) {
                willing.push(idx);
            }
        }
        willing
    }

    /// Apply a queued human raise if it is legal. Returns true when the
    /// raise was accepted.
    async fn try_human_raise(&mut self, player: &AuctionPlayer, next: u64, quotas: &SquadQuotas) -> bool {
        let human_idx = self.session.human_team_idx;
        let team = &self.session.teams[human_idx];
        if self.session.current_bidder.as_deref() == Some(team.team_id.as_str()) {
            return false;
        }
        if let Err(reason) = team.check_acquisition(player, next, quotas) {
            warn!("human raise rejected: {reason}");
            return false;
        }

        let (team_id, team_name) = (team.team_id.clone(), team.team_name.clone());
        self.session.record_raise(human_idx, next);
        let _ = self
            .events
            .send(AuctionEvent::BidPlaced {
                team_id,
                team_name,
                amount: next,
            })
            .await;
        true
    }

    /// The last chance to bid once the AI field has gone quiet, then the
    /// lot resolves.
    ///
    /// If the human already holds the high bid there is nothing to ask;
    /// otherwise the seat gets one bounded window to match `next_bid`.
    /// A rejected buy (budget/quota) is a local no-op and the lot falls
    /// back to the standing bid. No standing bid at all means the player
    /// goes unsold and the session moves on.
    async fn resolve_final_call(&mut self, player: &AuctionPlayer, quotas: &SquadQuotas) -> bool {
        let human_idx = self.session.human_team_idx;
        let human_id = self.session.teams[human_idx].team_id.clone();
        let human_holds_bid = self.session.current_bidder.as_deref() == Some(human_id.as_str());

        if !human_holds_bid {
            let next = ladder::next_bid(self.session.current_bid, &self.config.ladder);
            let bidder_name = self
                .session
                .current_bidder
                .as_deref()
                .and_then(|id| self.session.team(id))
                .map(|t| t.team_name.clone());

            let _ = self
                .events
                .send(AuctionEvent::FinalCall {
                    player_name: player.name.clone(),
                    current_bid: self.session.current_bid,
                    current_bidder: bidder_name.clone(),
                    next_bid: next,
                })
                .await;

            let prompt = FinalCallPrompt {
                player_name: player.name.clone(),
                interested: player.is_interested,
                current_bid: self.session.current_bid,
                current_bidder: bidder_name,
                next_bid: next,
            };
            let window = Duration::from_millis(self.config.pacing.final_call_window_ms);
            let decision = match timeout(window, self.seat.final_call(prompt)).await {
                Ok(decision) => decision,
                Err(_) => {
                    info!("final call timed out for {}, treating as pass", player.name);
                    SeatDecision::Pass
                }
            };

            if decision == SeatDecision::Bid {
                match self.session.resolve_sale(human_idx, next, quotas) {
                    Ok(record) => {
                        self.emit_sold(player, &record).await;
                        return true;
                    }
                    Err(reason) => {
                        warn!("final-call buy of {} rejected: {reason}", player.name);
                    }
                }
            }
        }

        // The standing high bid (AI or human) wins; no bid means unsold.
        match self.session.current_bidder.clone() {
            Some(bidder_id) => {
                let idx = self
                    .session
                    .teams
                    .iter()
                    .position(|t| t.team_id == bidder_id);
                let amount = self.session.current_bid;
                match idx {
                    Some(idx) => match self.session.resolve_sale(idx, amount, quotas) {
                        Ok(record) => {
                            self.emit_sold(player, &record).await;
                            true
                        }
                        Err(reason) => {
                            // Gates were checked when the bid was accepted,
                            // so this is unexpected, but it must never
                            // corrupt the ledger.
                            warn!("standing bid on {} failed to settle: {reason}", player.name);
                            self.emit_unsold(player).await;
                            false
                        }
                    },
                    None => {
                        warn!("standing bidder {bidder_id} is not a known team");
                        self.emit_unsold(player).await;
                        false
                    }
                }
            }
            None => {
                self.emit_unsold(player).await;
                false
            }
        }
    }

    async fn emit_sold(&mut self, player: &AuctionPlayer, record: &SoldRecord) {
        info!(
            "{} sold to {} for ₹{:.1}Cr",
            player.name,
            record.team_name,
            super::session::crores(record.amount)
        );
        let _ = self
            .events
            .send(AuctionEvent::Sold {
                player_id: player.id.clone(),
                player_name: player.name.clone(),
                team_id: record.team_id.clone(),
                team_name: record.team_name.clone(),
                amount: record.amount,
            })
            .await;
    }

    async fn emit_unsold(&mut self, player: &AuctionPlayer) {
        info!("{} goes unsold", player.name);
        self.session.resolve_pass();
        let _ = self
            .events
            .send(AuctionEvent::Unsold {
                player_id: player.id.clone(),
                player_name: player.name.clone(),
            })
            .await;
    }

    /// Countdown before the lot opens. A seat command short-circuits it;
    /// the timeout is the default outcome.
    async fn await_intro(&mut self) {
        let ms = if self.config.pacing.fast_forward {
            0
        } else {
            self.config.pacing.lot_intro_ms
        };
        if ms == 0 {
            return;
        }
        let _ = timeout(Duration::from_millis(ms), self.seat.skip_intro()).await;
    }

    /// The simulated AI "thinking" delay before a bid lands. Pacing only;
    /// bids are already serialized by the round loop.
    async fn thinking_pause(&mut self) {
        if self.config.pacing.fast_forward {
            return;
        }
        let ms = self
            .rng
            .gen_range(self.config.pacing.thinking_min_ms..=self.config.pacing.thinking_max_ms);
        sleep(Duration::from_millis(ms)).await;
    }

    fn quotas(&self) -> SquadQuotas {
        SquadQuotas {
            squad_cap: self.config.auction.squad_cap,
            overseas_cap: self.config.auction.overseas_cap,
        }
    }
}
