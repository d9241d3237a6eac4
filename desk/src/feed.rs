//! Reference-price synchronization: polling with one socket attempt.
//!
//! The feed lifecycle is a tagged state machine with a single pure
//! transition function, [`advance`]. The rule it enforces structurally:
//! after a successful initial fetch, exactly one WebSocket connection
//! attempt is made, after a settle delay; if the initial fetch or the
//! socket fails — or the socket later closes — the feed never
//! reconnects and relies on the polling loop, which runs unconditionally
//! regardless of socket state. [`Command::ConnectSocket`] is only
//! reachable from [`SocketPhase::Scheduled`], and no transition returns
//! there.
//!
//! [`PriceFeedSync`] is the driver that executes the machine's commands
//! on the tokio runtime.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::time::MissedTickBehavior;

use certbook_gateway::{FeedEvent, Gateway, PriceFeedSocket};

use crate::scope::ScopeHandle;
use crate::store::{MarketStore, Resource};

/// Where the one socket attempt stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SocketPhase {
    /// Initial fetch succeeded; the attempt is waiting out the settle delay
    Scheduled,
    /// The connection attempt is in progress
    Attempting,
    /// The socket is connected and delivering price messages
    Active,
    /// The attempt was spent (failed, errored, or closed); polling only
    Spent,
}

/// Feed lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Not yet activated
    Idle,
    /// Initial price fetch in progress
    FetchingInitial,
    /// Polling loop running; socket in the given phase
    Polling { socket: SocketPhase },
    /// Torn down; terminal
    Stopped,
}

/// Everything that can happen to the feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Activated,
    InitialFetchSucceeded,
    InitialFetchFailed,
    SettleElapsed,
    SocketOpened,
    SocketError,
    SocketClosed,
    Teardown,
}

/// Side effects the driver must execute after a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Perform the initial price fetch
    FetchInitial,
    /// Start the unconditional polling loop
    StartPolling,
    /// Arm the settle-delay timer for the one socket attempt
    ScheduleSocketAttempt,
    /// Open the socket (the one attempt)
    ConnectSocket,
    /// Detach the socket consumer, then close the connection
    DetachSocket,
    /// Cancel the polling timer
    StopPolling,
}

/// Advance the machine by one event.
///
/// Unexpected events are absorbed without a state change; in particular
/// socket errors and closes after the attempt is spent are silent, and
/// nothing moves out of [`State::Stopped`].
pub fn advance(state: State, event: Event) -> (State, Vec<Command>) {
    use SocketPhase::*;

    match (state, event) {
        (State::Idle, Event::Activated) => (State::FetchingInitial, vec![Command::FetchInitial]),

        (State::FetchingInitial, Event::InitialFetchSucceeded) => (
            State::Polling { socket: Scheduled },
            vec![Command::StartPolling, Command::ScheduleSocketAttempt],
        ),
        // Initial failure: polling still starts, the socket never does
        (State::FetchingInitial, Event::InitialFetchFailed) => (
            State::Polling { socket: Spent },
            vec![Command::StartPolling],
        ),

        (State::Polling { socket: Scheduled }, Event::SettleElapsed) => (
            State::Polling { socket: Attempting },
            vec![Command::ConnectSocket],
        ),

        (State::Polling { socket: Attempting }, Event::SocketOpened) => {
            (State::Polling { socket: Active }, vec![])
        }
        (State::Polling { socket: Attempting }, Event::SocketError | Event::SocketClosed)
        | (State::Polling { socket: Active }, Event::SocketError | Event::SocketClosed) => {
            (State::Polling { socket: Spent }, vec![])
        }

        (state @ (State::Idle | State::FetchingInitial | State::Polling { .. }), Event::Teardown) => {
            let mut commands = Vec::new();
            if let State::Polling { socket } = state {
                if matches!(socket, Attempting | Active) {
                    commands.push(Command::DetachSocket);
                }
                commands.push(Command::StopPolling);
            }
            (State::Stopped, commands)
        }

        // Everything else is absorbed
        (state, _) => (state, vec![]),
    }
}

/// Driver: executes the machine's commands against a gateway, a socket,
/// and the store.
pub struct PriceFeedSync<G, S> {
    gateway: Arc<G>,
    socket: Arc<S>,
    store: Arc<MarketStore>,
    poll_interval: Duration,
    settle_delay: Duration,
    state: State,
}

impl<G: Gateway, S: PriceFeedSocket> PriceFeedSync<G, S> {
    pub fn new(
        gateway: Arc<G>,
        socket: Arc<S>,
        store: Arc<MarketStore>,
        poll_interval: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            gateway,
            socket,
            store,
            poll_interval,
            settle_delay,
            state: State::Idle,
        }
    }

    fn step(&mut self, event: Event) -> Vec<Command> {
        let (next, commands) = advance(self.state, event);
        if next != self.state {
            debug!("price feed: {:?} -> {:?} on {:?}", self.state, next, event);
        }
        self.state = next;
        commands
    }

    /// Run the feed until the scope is cancelled.
    pub async fn run(mut self, mut scope: ScopeHandle) {
        // Activation: the machine asks for the initial fetch.
        let commands = self.step(Event::Activated);
        debug_assert_eq!(commands, vec![Command::FetchInitial]);

        let initial = self.gateway.current_prices().await;
        if !scope.is_live() {
            return;
        }
        let event = match initial {
            Ok(prices) => {
                self.store.publish_prices(prices);
                self.store.set_error(Resource::Prices, false);
                Event::InitialFetchSucceeded
            }
            Err(e) => {
                warn!("initial price fetch failed, polling only: {e}");
                self.store.set_error(Resource::Prices, true);
                Event::InitialFetchFailed
            }
        };

        let mut settle: Option<std::pin::Pin<Box<tokio::time::Sleep>>> = None;
        for command in self.step(event) {
            match command {
                Command::StartPolling => {}
                Command::ScheduleSocketAttempt => {
                    settle = Some(Box::pin(tokio::time::sleep(self.settle_delay)));
                }
                _ => unreachable!("machine emits no other command here"),
            }
        }

        // The polling interval runs for the whole lifetime, whatever the
        // socket is doing. First tick fires immediately; the initial
        // fetch already ran, so skip one.
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await;

        let mut feed_rx: Option<tokio::sync::mpsc::Receiver<FeedEvent>> = None;

        loop {
            tokio::select! {
                _ = scope.cancelled() => {
                    for command in self.step(Event::Teardown) {
                        match command {
                            // Dropping the receiver detaches the consumer
                            // before the transport closes.
                            Command::DetachSocket => drop(feed_rx.take()),
                            // Breaking the loop cancels the interval.
                            Command::StopPolling => {}
                            _ => {}
                        }
                    }
                    break;
                }

                _ = interval.tick() => {
                    let result = self.gateway.current_prices().await;
                    if !scope.is_live() {
                        continue;
                    }
                    match result {
                        Ok(prices) => {
                            self.store.publish_prices(prices);
                            self.store.set_error(Resource::Prices, false);
                        }
                        Err(e) => {
                            warn!("price poll failed: {e}");
                            self.store.set_error(Resource::Prices, true);
                        }
                    }
                }

                _ = async { settle.as_mut().unwrap().await }, if settle.is_some() => {
                    settle = None;
                    for command in self.step(Event::SettleElapsed) {
                        if command == Command::ConnectSocket {
                            match self.socket.connect().await {
                                Ok(rx) => {
                                    feed_rx = Some(rx);
                                    self.step(Event::SocketOpened);
                                }
                                Err(e) => {
                                    debug!("socket attempt failed, polling remains: {e}");
                                    self.step(Event::SocketError);
                                }
                            }
                        }
                    }
                }

                event = async { feed_rx.as_mut().unwrap().recv().await }, if feed_rx.is_some() => {
                    match event {
                        Some(FeedEvent::Prices(prices)) => {
                            if scope.is_live() {
                                self.store.publish_prices(prices);
                            }
                        }
                        Some(FeedEvent::Error(e)) => {
                            debug!("socket error, polling remains: {e}");
                            feed_rx = None;
                            self.step(Event::SocketError);
                        }
                        Some(FeedEvent::Closed) | None => {
                            debug!("socket closed, polling remains");
                            feed_rx = None;
                            self.step(Event::SocketClosed);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_events(events: &[Event]) -> (State, Vec<Command>) {
        let mut state = State::Idle;
        let mut all = Vec::new();
        for &event in events {
            let (next, commands) = advance(state, event);
            state = next;
            all.extend(commands);
        }
        (state, all)
    }

    fn connects(commands: &[Command]) -> usize {
        commands
            .iter()
            .filter(|&&c| c == Command::ConnectSocket)
            .count()
    }

    #[test]
    fn happy_path_connects_once() {
        let (state, commands) = run_events(&[
            Event::Activated,
            Event::InitialFetchSucceeded,
            Event::SettleElapsed,
            Event::SocketOpened,
        ]);
        assert_eq!(
            state,
            State::Polling {
                socket: SocketPhase::Active
            }
        );
        assert_eq!(connects(&commands), 1);
        assert!(commands.contains(&Command::StartPolling));
    }

    #[test]
    fn initial_failure_never_touches_the_socket() {
        let (state, commands) = run_events(&[
            Event::Activated,
            Event::InitialFetchFailed,
            // Stray timer/socket events must be absorbed
            Event::SettleElapsed,
            Event::SocketError,
            Event::SocketClosed,
        ]);
        assert_eq!(
            state,
            State::Polling {
                socket: SocketPhase::Spent
            }
        );
        assert_eq!(connects(&commands), 0);
        assert!(commands.contains(&Command::StartPolling));
    }

    #[test]
    fn socket_error_does_not_reconnect() {
        let (state, commands) = run_events(&[
            Event::Activated,
            Event::InitialFetchSucceeded,
            Event::SettleElapsed,
            Event::SocketOpened,
            Event::SocketError,
            // Whatever arrives later changes nothing
            Event::SettleElapsed,
            Event::SocketClosed,
            Event::SocketError,
        ]);
        assert_eq!(
            state,
            State::Polling {
                socket: SocketPhase::Spent
            }
        );
        assert_eq!(connects(&commands), 1);
    }

    #[test]
    fn failed_attempt_is_spent() {
        let (state, commands) = run_events(&[
            Event::Activated,
            Event::InitialFetchSucceeded,
            Event::SettleElapsed,
            Event::SocketError, // connect() itself failed
            Event::SettleElapsed,
        ]);
        assert_eq!(
            state,
            State::Polling {
                socket: SocketPhase::Spent
            }
        );
        assert_eq!(connects(&commands), 1);
    }

    #[test]
    fn teardown_from_active_detaches_then_stops_polling() {
        let (state, commands) = run_events(&[
            Event::Activated,
            Event::InitialFetchSucceeded,
            Event::SettleElapsed,
            Event::SocketOpened,
            Event::Teardown,
        ]);
        assert_eq!(state, State::Stopped);
        let detach = commands
            .iter()
            .position(|&c| c == Command::DetachSocket)
            .unwrap();
        let stop = commands
            .iter()
            .position(|&c| c == Command::StopPolling)
            .unwrap();
        assert!(detach < stop, "detach before the timer is cancelled");
    }

    #[test]
    fn teardown_without_socket_only_stops_polling() {
        let (state, commands) =
            run_events(&[Event::Activated, Event::InitialFetchFailed, Event::Teardown]);
        assert_eq!(state, State::Stopped);
        assert!(!commands.contains(&Command::DetachSocket));
        assert!(commands.contains(&Command::StopPolling));
    }

    #[test]
    fn stopped_is_terminal() {
        let (state, commands) = run_events(&[
            Event::Activated,
            Event::Teardown,
            Event::Activated,
            Event::InitialFetchSucceeded,
            Event::SettleElapsed,
        ]);
        assert_eq!(state, State::Stopped);
        assert_eq!(connects(&commands), 0);
    }
}
