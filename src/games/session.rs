//! Round state machine shared by every game kind
//!
//! Each room gets its own `RoundState` behind a `tokio::sync::Mutex`. Chat handlers and the
//! round's timer task both go through that lock, and the timer carries the generation it was
//! spawned for: once a newer round starts, or the round ends, the old timer sees a mismatch on
//! its next tick and exits without touching anything.

use super::{
    messages::{formatter_for, MessageFormatter},
    types::{GameKind, GuessOutcome, RoundState, StartOutcome, StopOutcome},
};
use crate::{
    config::GameConfig,
    content::ContentProvider,
    cooldown::CooldownTracker,
    errors::ContentError,
    ledger::PointsLedger,
    matcher::{self, MatchThresholds, MatchVerdict},
    metrics::GameMetrics,
    outbound::Outbound,
};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::{
    sync::Mutex,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

/// Shared collaborators handed to every session
#[derive(Clone)]
pub struct SessionDeps {
    pub ledger: Arc<PointsLedger>,
    pub outbound: Arc<dyn Outbound>,
    pub cooldowns: Arc<CooldownTracker>,
    pub metrics: Arc<GameMetrics>,
}

/// One game kind across all rooms
pub struct GameSession {
    kind: GameKind,
    config: GameConfig,
    content: Arc<dyn ContentProvider>,
    messages: Box<dyn MessageFormatter>,
    deps: SessionDeps,
    rounds: DashMap<String, Arc<Mutex<RoundState>>>,
}

impl GameSession {
    pub fn new(
        kind: GameKind,
        config: GameConfig,
        content: Arc<dyn ContentProvider>,
        deps: SessionDeps,
    ) -> Self {
        Self::with_messages(kind, config, content, deps, formatter_for(kind))
    }

    /// Build with a custom message strategy
    pub fn with_messages(
        kind: GameKind,
        config: GameConfig,
        content: Arc<dyn ContentProvider>,
        deps: SessionDeps,
        messages: Box<dyn MessageFormatter>,
    ) -> Self {
        Self {
            kind,
            config,
            content,
            messages,
            deps,
            rounds: DashMap::new(),
        }
    }

    pub fn kind(&self) -> GameKind {
        self.kind
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Start a round in `room` on behalf of `requester`
    pub async fn start(self: &Arc<Self>, room: &str, requester: &str) -> StartOutcome {
        let round = self.round(room);
        let mut state = round.lock().await;
        let now = Instant::now();

        if state.active {
            let announced = state.elapsed() > self.config.grace();
            if announced {
                self.deps
                    .outbound
                    .send(room, &self.messages.already_running(requester));
            }
            return StartOutcome::AlreadyRunning { announced };
        }

        if let Some(left) = self.deps.cooldowns.remaining(room, self.kind.as_str()) {
            debug!(room, kind = %self.kind, remaining_ms = left.as_millis() as u64, "Start blocked by silent cooldown");
            return StartOutcome::CoolingDown;
        }

        let Some(prompt) = self.content.next_prompt() else {
            warn!(room, kind = %self.kind, "No content available");
            self.deps.outbound.send(room, &self.messages.no_content());
            return StartOutcome::ContentUnavailable;
        };

        let display = self.kind.present(&prompt);
        let prompt_id = prompt.id.clone();
        let (round_id, generation) = state.begin(prompt, display, now);
        self.deps
            .cooldowns
            .arm(room, self.kind.as_str(), self.config.cooldown());

        self.deps
            .outbound
            .send(room, &self.messages.prompt(&state.display));
        self.deps.metrics.record_round_started();
        info!(room, kind = %self.kind, %round_id, generation, prompt_id = %prompt_id, requester, "Round started");
        debug!(room, kind = %self.kind, answer = state.answer().unwrap_or_default(), "Round answer");

        drop(state);
        tokio::spawn(Arc::clone(self).run_timer(room.to_string(), round, generation));

        StartOutcome::Started {
            round_id,
            generation,
        }
    }

    /// End the live round in `room`, if any. Stopping an idle room emits nothing.
    pub async fn stop(&self, room: &str) -> StopOutcome {
        let Some(round) = self.existing_round(room) else {
            return StopOutcome::NotRunning;
        };
        let mut state = round.lock().await;
        if !state.active {
            return StopOutcome::NotRunning;
        }

        state.active = false;
        self.deps.outbound.send(room, &self.messages.stopped());
        self.deps.metrics.record_round_stopped();
        info!(room, kind = %self.kind, generation = state.generation, "Round stopped");
        StopOutcome::Stopped
    }

    /// Score `text` from `author` against the live round in `room`
    pub async fn submit_guess(&self, room: &str, text: &str, author: &str) -> GuessOutcome {
        if text.chars().count() > self.config.max_guess_len {
            return GuessOutcome::Ignored;
        }
        let Some(round) = self.existing_round(room) else {
            return GuessOutcome::Ignored;
        };
        let mut state = round.lock().await;
        if !state.active {
            return GuessOutcome::Ignored;
        }
        let Some(answer) = state.answer().map(str::to_string) else {
            return GuessOutcome::Ignored;
        };

        match matcher::evaluate(text, &answer, self.thresholds()) {
            MatchVerdict::Correct(score) => {
                state.active = false;
                let generation = state.generation;
                drop(state);

                let points = self.award(author, score);
                self.deps
                    .outbound
                    .send(room, &self.messages.correct(author, &answer, points));
                self.deps.metrics.record_round_solved(points);
                info!(room, kind = %self.kind, generation, winner = author, points, score, "Round solved");

                GuessOutcome::Solved {
                    winner: author.to_string(),
                    answer,
                    points,
                    score,
                }
            }
            MatchVerdict::Close(score) => {
                self.deps
                    .outbound
                    .send(room, &self.messages.close(author, text, score));
                self.deps.metrics.record_close_call();
                debug!(room, kind = %self.kind, user = author, score, "Close guess");
                GuessOutcome::Close { score }
            }
            MatchVerdict::Miss(_) => GuessOutcome::Miss,
        }
    }

    pub async fn is_active(&self, room: &str) -> bool {
        let Some(round) = self.existing_round(room) else {
            return false;
        };
        let active = round.lock().await.active;
        active
    }

    /// Answer of the live round, for moderators
    pub async fn current_answer(&self, room: &str) -> Option<String> {
        let round = self.existing_round(room)?;
        let state = round.lock().await;
        if state.active {
            state.answer().map(str::to_string)
        } else {
            None
        }
    }

    /// Re-read the content source. Live rounds keep the prompt they drew.
    pub fn reload_content(&self) -> Result<usize, ContentError> {
        let count = self.content.reload()?;
        info!(kind = %self.kind, count, "Content reloaded");
        Ok(count)
    }

    fn thresholds(&self) -> MatchThresholds {
        MatchThresholds {
            correct: self.config.correct_threshold,
            close: self.config.close_threshold,
        }
    }

    fn award(&self, winner: &str, score: f64) -> u64 {
        let points = if score >= self.config.bonus_threshold {
            self.config.bonus_points
        } else {
            self.config.reward_points
        };
        if points == 0 {
            return 0;
        }

        match self.deps.ledger.add_points(winner, points) {
            Ok(_) => points,
            Err(e) => {
                warn!(user = winner, points, error = %e, "Failed to award round points");
                0
            }
        }
    }

    fn round(&self, room: &str) -> Arc<Mutex<RoundState>> {
        Arc::clone(self.rounds.entry(room.to_string()).or_default().value())
    }

    fn existing_round(&self, room: &str) -> Option<Arc<Mutex<RoundState>>> {
        self.rounds.get(room).map(|round| Arc::clone(round.value()))
    }

    async fn run_timer(self: Arc<Self>, room: String, round: Arc<Mutex<RoundState>>, generation: u64) {
        let mut ticker = time::interval_at(Instant::now() + self.config.tick(), self.config.tick());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let mut state = round.lock().await;
            if !state.is_current(generation) {
                debug!(room = %room, kind = %self.kind, generation, "Timer retired");
                return;
            }

            // A late tick may cross both thresholds; the hint still goes out first.
            let elapsed = state.elapsed();
            if elapsed >= self.config.hint_after() && !state.hint_given {
                state.hint_given = true;
                let hint = matcher::hint(state.answer().unwrap_or_default());
                self.deps.outbound.send(&room, &self.messages.hint(&hint));
                info!(room = %room, kind = %self.kind, generation, "Hint revealed");
            }

            if elapsed >= self.config.timeout() {
                state.active = false;
                let answer = state.answer().unwrap_or_default().to_string();
                self.deps.outbound.send(&room, &self.messages.timeout(&answer));
                self.deps.metrics.record_round_timed_out();
                info!(room = %room, kind = %self.kind, generation, "Round timed out");
                return;
            }
        }
    }
}
