// Human seat: how the one human-controlled team takes part in the auction.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Commands an interactive front-end can send to its seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatCommand {
    /// Raise to the next ladder step during open bidding.
    Raise,
    /// Skip the pre-lot countdown.
    Skip,
    /// Answer a final call.
    FinalCall(SeatDecision),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatDecision {
    Bid,
    Pass,
}

/// Everything the human needs to answer a final call.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalCallPrompt {
    pub player_name: String,
    /// Whether the user flagged this player before the auction.
    pub interested: bool,
    pub current_bid: u64,
    /// Display name of the standing high bidder, if any.
    pub current_bidder: Option<String>,
    /// What a Bid answer pays.
    pub next_bid: u64,
}

/// The human team's hooks into the turn controller.
///
/// Every wait on a seat is bounded by the engine (intro countdown, final
/// call window), so implementations are free to block forever: timing out
/// has a defined outcome (proceed / pass).
#[async_trait]
pub trait HumanSeat: Send {
    /// Non-blocking check for a raise queued at the current ladder step.
    fn pending_raise(&mut self) -> bool;

    /// Resolves when the human asks to skip the pre-lot countdown.
    async fn skip_intro(&mut self);

    /// Answer a final call.
    async fn final_call(&mut self, prompt: FinalCallPrompt) -> SeatDecision;
}

/// A seat driven by an mpsc command channel: the attachment point for an
/// interactive front-end.
///
/// Commands are interpreted against the current phase: a `FinalCall`
/// answer that arrives outside a final call (or a `Skip` outside the
/// countdown) is stale and silently dropped.
pub struct ChannelSeat {
    rx: mpsc::Receiver<SeatCommand>,
}

impl ChannelSeat {
    pub fn new(rx: mpsc::Receiver<SeatCommand>) -> Self {
        ChannelSeat { rx }
    }

    /// Build a (sender, seat) pair with the given channel capacity.
    pub fn channel(buffer: usize) -> (mpsc::Sender<SeatCommand>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, ChannelSeat { rx })
    }

    /// Park forever once the front-end is gone; the engine's timeout
    /// supplies the default outcome.
    async fn disconnected() {
        std::future::pending::<()>().await;
    }
}

#[async_trait]
impl HumanSeat for ChannelSeat {
    fn pending_raise(&mut self) -> bool {
        let mut raise = false;
        while let Ok(cmd) = self.rx.try_recv() {
            if cmd == SeatCommand::Raise {
                raise = true;
            }
        }
        raise
    }

    async fn skip_intro(&mut self) {
        loop {
            match self.rx.recv().await {
                Some(SeatCommand::Skip) => return,
                Some(_) => continue,
                None => Self::disconnected().await,
            }
        }
    }

    async fn final_call(&mut self, _prompt: FinalCallPrompt) -> SeatDecision {
        loop {
            match self.rx.recv().await {
                Some(SeatCommand::FinalCall(decision)) => return decision,
                Some(_) => continue,
                None => Self::disconnected().await,
            }
        }
    }
}

/// Auto-pilot seat: the "simulate auction" mode. Never raises during open
/// bidding and answers final calls by bidding only on players the user
/// flagged as interested.
pub struct AutoSeat;

#[async_trait]
impl HumanSeat for AutoSeat {
    fn pending_raise(&mut self) -> bool {
        false
    }

    async fn skip_intro(&mut self) {
        // Let the countdown run; fast-forward pacing removes it entirely.
        std::future::pending::<()>().await
    }

    async fn final_call(&mut self, prompt: FinalCallPrompt) -> SeatDecision {
        if prompt.interested {
            SeatDecision::Bid
        } else {
            SeatDecision::Pass
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn prompt() -> FinalCallPrompt {
        FinalCallPrompt {
            player_name: "Test Player".into(),
            interested: false,
            current_bid: 20_000_000,
            current_bidder: None,
            next_bid: 21_000_000,
        }
    }

    #[tokio::test]
    async fn pending_raise_drains_queued_commands() {
        let (tx, mut seat) = ChannelSeat::channel(8);
        tx.send(SeatCommand::Raise).await.unwrap();
        tx.send(SeatCommand::Raise).await.unwrap();

        assert!(seat.pending_raise());
        // The queue was drained; nothing is pending now.
        assert!(!seat.pending_raise());
    }

    #[tokio::test]
    async fn final_call_skips_stale_commands() {
        let (tx, mut seat) = ChannelSeat::channel(8);
        tx.send(SeatCommand::Raise).await.unwrap();
        tx.send(SeatCommand::Skip).await.unwrap();
        tx.send(SeatCommand::FinalCall(SeatDecision::Bid)).await.unwrap();

        let decision = seat.final_call(prompt()).await;
        assert_eq!(decision, SeatDecision::Bid);
    }

    #[tokio::test]
    async fn skip_intro_waits_for_skip() {
        let (tx, mut seat) = ChannelSeat::channel(8);
        tx.send(SeatCommand::Skip).await.unwrap();
        seat.skip_intro().await;
    }

    #[tokio::test(start_paused = true)]
    async fn disconnected_seat_never_resolves() {
        let (tx, mut seat) = ChannelSeat::channel(8);
        drop(tx);
        // The engine bounds every seat wait; a dead channel just times out.
        let result = timeout(Duration::from_secs(5), seat.final_call(prompt())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn auto_seat_bids_only_on_interested_players() {
        let mut seat = AutoSeat;
        assert!(!seat.pending_raise());

        let mut interested = prompt();
        interested.interested = true;
        assert_eq!(seat.final_call(interested).await, SeatDecision::Bid);
        assert_eq!(seat.final_call(prompt()).await, SeatDecision::Pass);
    }
}
