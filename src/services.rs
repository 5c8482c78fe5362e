//! Service layer wiring the games and the economy behind one facade
//!
//! [`Parlor`] is what a chat front end talks to. [`ServiceBuilder`] assembles it from a
//! configuration, with overrides for content, persistence and outbound delivery.

use crate::{
    config::{ConfigLoader, ParlorConfig},
    content::{ContentProvider, ScrambleSource, TriviaSource},
    cooldown::{CooldownTracker, GLOBAL_SCOPE},
    errors::{ContentError, ParlorResult, StorageError, ValidationError},
    gambler::{Gambler, Wager, WagerOutcome, WagerResolution},
    games::{GameKind, GameSession, GuessOutcome, SessionDeps, StartOutcome, StopOutcome},
    leaderboard::{Leaderboard, LeaderboardEntry, Rank},
    ledger::{account_key, PointsLedger},
    metrics::{GameMetrics, MetricsSnapshot},
    outbound::Outbound,
    storage::{AccountStore, JsonFileStore},
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

const GAMBLE_COMMAND: &str = "gamble";
const DAILY_COMMAND: &str = "daily";

/// Result of a daily bonus claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyOutcome {
    Granted { amount: u64, new_balance: u64 },
    TooSoon { remaining: Duration },
}

/// Facade over the game sessions, the ledger and their collaborators
pub struct Parlor {
    config: ParlorConfig,
    ledger: Arc<PointsLedger>,
    gambler: Gambler,
    leaderboard: Leaderboard,
    cooldowns: Arc<CooldownTracker>,
    metrics: Arc<GameMetrics>,
    store: Arc<dyn AccountStore>,
    trivia: Arc<GameSession>,
    scramble: Arc<GameSession>,
}

impl Parlor {
    pub fn config(&self) -> &ParlorConfig {
        &self.config
    }

    pub fn ledger(&self) -> Arc<PointsLedger> {
        Arc::clone(&self.ledger)
    }

    pub fn session(&self, kind: GameKind) -> &Arc<GameSession> {
        match kind {
            GameKind::Trivia => &self.trivia,
            GameKind::Scramble => &self.scramble,
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub async fn start_game(&self, kind: GameKind, room: &str, requester: &str) -> StartOutcome {
        self.session(kind).start(room, requester).await
    }

    pub async fn stop_game(&self, kind: GameKind, room: &str) -> StopOutcome {
        self.session(kind).stop(room).await
    }

    /// Oversized guesses are rejected before they reach the round
    pub async fn submit_guess(
        &self,
        kind: GameKind,
        room: &str,
        text: &str,
        author: &str,
    ) -> Result<GuessOutcome, ValidationError> {
        let session = self.session(kind);
        let max = session.config().max_guess_len;
        let len = text.chars().count();
        if len > max {
            return Err(ValidationError::GuessTooLong { len, max });
        }
        Ok(session.submit_guess(room, text, author).await)
    }

    pub async fn is_active(&self, kind: GameKind, room: &str) -> bool {
        self.session(kind).is_active(room).await
    }

    pub async fn current_answer(&self, kind: GameKind, room: &str) -> Option<String> {
        self.session(kind).current_answer(room).await
    }

    pub fn reload_content(&self, kind: GameKind) -> Result<usize, ContentError> {
        self.session(kind).reload_content()
    }

    pub fn get_balance(&self, user: &str) -> u64 {
        self.ledger.get_balance(user)
    }

    /// Move points between users; returns both new balances.
    ///
    /// `receiver` may carry a leading `@`.
    pub fn transfer(&self, sender: &str, receiver: &str, amount: i64) -> ParlorResult<(u64, u64)> {
        if amount <= 0 {
            return Err(ValidationError::NonPositiveAmount.into());
        }
        let receiver = parse_username(receiver)?;
        if account_key(sender) == account_key(&receiver) {
            return Err(ValidationError::SelfTransfer.into());
        }

        Ok(self.ledger.transfer(sender, &receiver, amount as u64)?)
    }

    /// Parse and settle a wager.
    ///
    /// Returns `Ok(None)` without parsing anything while the global gamble cooldown is hot.
    pub fn place_wager(
        &self,
        user: &str,
        wager_text: &str,
        win_probability: f64,
    ) -> ParlorResult<Option<WagerResolution>> {
        if !(0.0..=1.0).contains(&win_probability) {
            return Err(ValidationError::InvalidProbability.into());
        }
        if self.cooldowns.is_on_cooldown(
            GLOBAL_SCOPE,
            GAMBLE_COMMAND,
            self.config.economy.gamble_cooldown(),
        ) {
            info!(user, "Wager blocked by silent cooldown");
            return Ok(None);
        }

        let wager: Wager = wager_text.parse()?;
        let resolution = self.gambler.resolve(user, wager, win_probability)?;

        match resolution.outcome {
            WagerOutcome::Win => self.metrics.record_wager(true, resolution.delta),
            WagerOutcome::Loss => self.metrics.record_wager(false, resolution.delta),
            _ => {}
        }
        Ok(Some(resolution))
    }

    pub fn top_by_balance(&self, n: usize) -> Vec<LeaderboardEntry> {
        self.leaderboard.top_by_balance(n)
    }

    pub fn top_by_gamble_loss(&self, n: usize) -> Vec<LeaderboardEntry> {
        self.leaderboard.top_by_gamble_loss(n)
    }

    pub fn rank(&self, user: &str) -> Rank {
        self.leaderboard.rank(user)
    }

    /// Grant the daily bonus once per cooldown window
    pub fn claim_daily(&self, user: &str) -> ParlorResult<DailyOutcome> {
        let economy = &self.config.economy;
        if self
            .cooldowns
            .is_on_cooldown(user, DAILY_COMMAND, economy.daily_cooldown())
        {
            let remaining = self
                .cooldowns
                .remaining(user, DAILY_COMMAND)
                .unwrap_or_default();
            return Ok(DailyOutcome::TooSoon { remaining });
        }

        match self.ledger.add_points(user, economy.daily_bonus) {
            Ok(new_balance) => {
                self.metrics.record_points_awarded(economy.daily_bonus);
                info!(user, amount = economy.daily_bonus, new_balance, "Daily bonus granted");
                Ok(DailyOutcome::Granted {
                    amount: economy.daily_bonus,
                    new_balance,
                })
            }
            Err(e) => {
                self.cooldowns.clear(user, DAILY_COMMAND);
                Err(e.into())
            }
        }
    }

    /// Moderator grant; returns the target's new balance
    pub fn grant_points(&self, target: &str, amount: i64) -> ParlorResult<u64> {
        if amount <= 0 {
            return Err(ValidationError::NonPositiveAmount.into());
        }
        let target = parse_username(target)?;
        let new_balance = self.ledger.add_points(&target, amount as u64)?;

        self.metrics.record_points_awarded(amount as u64);
        info!(user = %target, amount, new_balance, "Points granted");
        Ok(new_balance)
    }

    /// Forget cooldowns that have already expired; returns how many were dropped
    pub fn purge_cooldowns(&self) -> usize {
        let purged = self.cooldowns.purge_expired();
        if purged > 0 {
            debug!(purged, "Expired cooldowns purged");
        }
        purged
    }

    /// Replace the ledger with the stored snapshot. A failed load leaves the ledger empty.
    pub fn load_accounts(&self) -> usize {
        match self.store.load_accounts() {
            Ok(accounts) => {
                let count = accounts.len();
                self.ledger.restore(accounts);
                count
            }
            Err(e) => {
                warn!(error = %e, "Failed to load accounts, starting with an empty ledger");
                self.ledger.restore(Vec::new());
                0
            }
        }
    }

    /// Write the current ledger snapshot; returns the number of accounts saved
    pub fn save_accounts(&self) -> Result<usize, StorageError> {
        let accounts = self.ledger.snapshot();
        self.store.save_accounts(&accounts)?;
        Ok(accounts.len())
    }
}

/// Strip a leading `@` and require ASCII alphanumerics or `_`
pub fn parse_username(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    let name = name.strip_prefix('@').unwrap_or(name);
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(ValidationError::InvalidUsername(raw.to_string()));
    }
    Ok(name.to_string())
}

/// Builder for [`Parlor`]
pub struct ServiceBuilder {
    outbound: Arc<dyn Outbound>,
    config: Option<ParlorConfig>,
    config_path: Option<String>,
    store_override: Option<Arc<dyn AccountStore>>,
    trivia_override: Option<Arc<dyn ContentProvider>>,
    scramble_override: Option<Arc<dyn ContentProvider>>,
}

impl ServiceBuilder {
    /// Every message the games emit goes to `outbound`
    pub fn new(outbound: Arc<dyn Outbound>) -> Self {
        Self {
            outbound,
            config: None,
            config_path: None,
            store_override: None,
            trivia_override: None,
            scramble_override: None,
        }
    }

    /// Use an already loaded configuration
    pub fn with_config(mut self, config: ParlorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load configuration from a TOML file (plus environment overrides)
    pub fn with_config_path(mut self, path: String) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Override account persistence (useful for testing)
    pub fn with_store(mut self, store: Arc<dyn AccountStore>) -> Self {
        self.store_override = Some(store);
        self
    }

    pub fn with_trivia_content(mut self, content: Arc<dyn ContentProvider>) -> Self {
        self.trivia_override = Some(content);
        self
    }

    pub fn with_scramble_content(mut self, content: Arc<dyn ContentProvider>) -> Self {
        self.scramble_override = Some(content);
        self
    }

    pub fn build(self) -> ParlorResult<Parlor> {
        let config = match (self.config, self.config_path) {
            (Some(config), _) => {
                config.validate()?;
                config
            }
            (None, Some(path)) => ConfigLoader::new().with_path(path).load()?,
            (None, None) => ConfigLoader::new().load()?,
        };

        let store: Arc<dyn AccountStore> = match self.store_override {
            Some(store) => store,
            None => Arc::new(JsonFileStore::new(&config.storage.accounts_path)),
        };
        let trivia_content: Arc<dyn ContentProvider> = match self.trivia_override {
            Some(content) => content,
            None => Arc::new(TriviaSource::open(&config.storage.trivia_path)),
        };
        let scramble_content: Arc<dyn ContentProvider> = match self.scramble_override {
            Some(content) => content,
            None => Arc::new(ScrambleSource::open(&config.storage.scramble_path)),
        };

        let ledger = Arc::new(PointsLedger::new());
        let cooldowns = Arc::new(CooldownTracker::new());
        let metrics = Arc::new(GameMetrics::new());
        let deps = SessionDeps {
            ledger: Arc::clone(&ledger),
            outbound: self.outbound,
            cooldowns: Arc::clone(&cooldowns),
            metrics: Arc::clone(&metrics),
        };

        let trivia = Arc::new(GameSession::new(
            GameKind::Trivia,
            config.trivia.clone(),
            trivia_content,
            deps.clone(),
        ));
        let scramble = Arc::new(GameSession::new(
            GameKind::Scramble,
            config.scramble.clone(),
            scramble_content,
            deps,
        ));

        Ok(Parlor {
            gambler: Gambler::new(Arc::clone(&ledger)),
            leaderboard: Leaderboard::new(Arc::clone(&ledger)),
            config,
            ledger,
            cooldowns,
            metrics,
            store,
            trivia,
            scramble,
        })
    }
}
