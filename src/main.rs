//! Parlor console
//!
//! Reads `user: message` lines from stdin as if they were chat in a single room, dispatches
//! prefixed commands and prints everything the bot says.

use clap::Parser;
use parlor::{
    errors::{LedgerError, ParlorError, ValidationError, WagerError},
    gambler::WagerOutcome,
    games::GameKind,
    leaderboard::LeaderboardEntry,
    outbound::{ChannelOutbound, Outbound},
    ConfigLoader, DailyOutcome, Parlor, ServiceBuilder,
};
use std::{sync::Arc, time::Duration};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    signal,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "parlor")]
#[command(about = "Chat minigames and points economy on the console", long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<String>,

    /// Room the console plays in
    #[arg(long)]
    room: Option<String>,

    /// Command prefix
    #[arg(long)]
    prefix: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match args.config {
        Some(ref path) => ConfigLoader::new().with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;
    if let Some(room) = args.room {
        config.chat.room = room;
    }
    if let Some(prefix) = args.prefix {
        config.chat.prefix = prefix;
    }
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.monitoring.log_level.as_directive().into()),
        )
        .init();

    let (outbound, mut messages) = ChannelOutbound::new();
    let parlor = ServiceBuilder::new(Arc::new(outbound.clone()))
        .with_config(config)
        .build()?;
    let accounts = parlor.load_accounts();

    let console = Console {
        room: parlor.config().chat.room.clone(),
        prefix: parlor.config().chat.prefix.clone(),
        parlor,
        outbound,
    };
    info!(room = %console.room, prefix = %console.prefix, accounts, "Parlor console ready");

    let printer = tokio::spawn(async move {
        while let Some(message) = messages.recv().await {
            println!("[{}] {}", message.room, message.text);
        }
    });

    let mut autosave = time::interval(console.parlor.config().storage.autosave_interval());
    autosave.set_missed_tick_behavior(MissedTickBehavior::Delay);
    autosave.tick().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => console.handle_line(&line).await,
                Ok(None) => {
                    info!("End of input");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            },
            _ = autosave.tick() => {
                console.save();
                console.parlor.purge_cooldowns();
            }
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C signal");
                break;
            }
        }
    }

    console.save();
    drop(console);
    // Live round timers keep senders open
    let _ = time::timeout(Duration::from_millis(200), printer).await;
    Ok(())
}

struct Console {
    parlor: Parlor,
    outbound: ChannelOutbound,
    room: String,
    prefix: String,
}

impl Console {
    fn say(&self, text: impl AsRef<str>) {
        self.outbound.send(&self.room, text.as_ref());
    }

    fn save(&self) {
        match self.parlor.save_accounts() {
            Ok(count) => debug!(count, "Autosave complete"),
            Err(e) => warn!(error = %e, "Failed to save accounts"),
        }
    }

    async fn handle_line(&self, line: &str) {
        let Some((user, message)) = split_line(line) else {
            warn!(line, "Expected `user: message`");
            return;
        };
        debug!(user, text = message, "Chat");

        if let Some(command) = message.strip_prefix(self.prefix.as_str()) {
            self.dispatch(user, command).await;
            return;
        }

        for kind in [GameKind::Trivia, GameKind::Scramble] {
            if let Err(e) = self.parlor.submit_guess(kind, &self.room, message, user).await {
                debug!(user, kind = %kind, error = %e, "Guess dropped");
            }
        }

        if message.to_lowercase().contains("bot") {
            self.say("👀 Called?");
        }
    }

    async fn dispatch(&self, user: &str, command: &str) {
        let mut parts = command.split_whitespace();
        let Some(name) = parts.next().map(str::to_lowercase) else {
            return;
        };
        let args: Vec<&str> = parts.collect();
        let room = self.room.as_str();

        match name.as_str() {
            "quiz" => {
                self.parlor.start_game(GameKind::Trivia, room, user).await;
            }
            "paraquiz" => {
                self.parlor.stop_game(GameKind::Trivia, room).await;
            }
            "embaralha" => {
                self.parlor.start_game(GameKind::Scramble, room, user).await;
            }
            "paraembaralha" => {
                self.parlor.stop_game(GameKind::Scramble, room).await;
            }
            "roleta" => self.roulette(user, args.first().copied().unwrap_or_default()),
            "pontos" => self.say(format!(
                "@{} You have {} points.",
                user,
                self.parlor.get_balance(user)
            )),
            "dar" | "doar" | "enviar" => self.give(user, &args),
            "top" | "toppontos" => {
                let size = self.parlor.config().economy.leaderboard_size;
                self.say(leaderboard_line("Top points", &self.parlor.top_by_balance(size)));
            }
            "topperda" => {
                let size = self.parlor.config().economy.leaderboard_size;
                self.say(leaderboard_line(
                    "Top gamble losses",
                    &self.parlor.top_by_gamble_loss(size),
                ));
            }
            "rank" | "ranking" => {
                let rank = self.parlor.rank(user);
                self.say(format!(
                    "@{} You are #{} in points and #{} in gamble losses.",
                    user, rank.balance, rank.gamble_loss
                ));
            }
            "addpontos" => self.grant(user, &args),
            "diario" => self.daily(user),
            "hora" => self.say(format!("🕒 It is {}", chrono::Local::now().format("%H:%M:%S"))),
            "bot" => self.say("🤖 Hi! I am a bot written in Rust."),
            other => debug!(command = other, "Unknown command"),
        }
    }

    fn roulette(&self, user: &str, wager: &str) {
        let win_probability = self.parlor.config().economy.win_probability;
        let resolution = match self.parlor.place_wager(user, wager, win_probability) {
            Ok(Some(resolution)) => resolution,
            Ok(None) => return,
            Err(ParlorError::Wager(WagerError::Empty)) => {
                return self.say(format!("[Roulette] @{} Please specify a wager.", user))
            }
            Err(ParlorError::Wager(WagerError::NonPositive)) => {
                return self.say(format!("[Roulette] @{} The wager must be positive.", user))
            }
            Err(e) => {
                debug!(user, wager, error = %e, "Wager rejected");
                return;
            }
        };

        let text = match resolution.outcome {
            WagerOutcome::Win => format!(
                "[Roulette] @{} You won {} points and now have {} points.",
                user, resolution.delta, resolution.new_balance
            ),
            WagerOutcome::Loss => format!(
                "[Roulette] @{} You lost {} points and now have {} points.",
                user, resolution.delta, resolution.new_balance
            ),
            WagerOutcome::NoPoints => format!("[Roulette] @{} You have no points.", user),
            WagerOutcome::InsufficientFunds => {
                format!("[Roulette] @{} You don't have enough points for that.", user)
            }
            WagerOutcome::InvalidPercent => format!(
                "[Roulette] @{} You cannot bet more than 100% of your points.",
                user
            ),
        };
        self.say(text);
    }

    fn give(&self, user: &str, args: &[&str]) {
        let [receiver, amount] = args else {
            return self.say(format!("[Give] @{} Usage: {}doar <user> <amount>", user, self.prefix));
        };
        let Ok(amount) = amount.parse::<i64>() else {
            debug!(user, amount, "Invalid transfer amount");
            return;
        };

        let text = match self.parlor.transfer(user, receiver, amount) {
            Ok(_) => format!(
                "[Give] @{} Gave {} points to {}.",
                user,
                amount,
                receiver.trim_start_matches('@')
            ),
            Err(ParlorError::Validation(ValidationError::NonPositiveAmount)) => {
                format!("[Give] @{} The amount must be positive.", user)
            }
            Err(ParlorError::Validation(ValidationError::SelfTransfer)) => {
                format!("[Give] @{} Nice try.", user)
            }
            Err(ParlorError::Validation(ValidationError::InvalidUsername(name))) => {
                debug!(user, recipient = %name, "Invalid recipient");
                return;
            }
            Err(ParlorError::Ledger(LedgerError::InsufficientFunds { .. })) => {
                format!("[Give] @{} You cannot give more points than you have.", user)
            }
            Err(e) => {
                warn!(user, error = %e, "Transfer failed");
                format!("[Give] @{} Transfer failed.", user)
            }
        };
        self.say(text);
    }

    fn grant(&self, user: &str, args: &[&str]) {
        let [target, amount] = args else {
            return self.say(format!(
                "[AddPoints] @{} Usage: {}addpontos <user> <amount>",
                user, self.prefix
            ));
        };
        let Ok(amount) = amount.parse::<i64>() else {
            return self.say(format!("[AddPoints] @{} Invalid amount.", user));
        };

        let text = match self.parlor.grant_points(target, amount) {
            Ok(new_balance) => format!(
                "[AddPoints] @{} Added {} points to {} (new balance: {}).",
                user,
                amount,
                target.trim_start_matches('@'),
                new_balance
            ),
            Err(ParlorError::Validation(ValidationError::NonPositiveAmount)) => {
                format!("[AddPoints] @{} The amount must be positive.", user)
            }
            Err(e) => {
                warn!(user, error = %e, "Grant failed");
                format!("[AddPoints] @{} Could not add points.", user)
            }
        };
        self.say(text);
    }

    fn daily(&self, user: &str) {
        match self.parlor.claim_daily(user) {
            Ok(DailyOutcome::Granted {
                amount,
                new_balance,
            }) => self.say(format!(
                "[Daily] @{} You received {} daily points! New balance: {}",
                user, amount, new_balance
            )),
            Ok(DailyOutcome::TooSoon { remaining }) => {
                let minutes = remaining.as_secs().div_ceil(60);
                self.say(format!(
                    "[Daily] @{} Already claimed. Come back in {}h{:02}m.",
                    user,
                    minutes / 60,
                    minutes % 60
                ))
            }
            Err(e) => warn!(user, error = %e, "Daily bonus failed"),
        }
    }
}

/// Split `user: message`; both sides are trimmed and must be non-empty
fn split_line(line: &str) -> Option<(&str, &str)> {
    let (user, message) = line.split_once(':')?;
    let (user, message) = (user.trim(), message.trim());
    if user.is_empty() || message.is_empty() {
        return None;
    }
    Some((user, message))
}

fn leaderboard_line(title: &str, entries: &[LeaderboardEntry]) -> String {
    if entries.is_empty() {
        return format!("[{}] No users found.", title);
    }
    let ranking: Vec<String> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("{}. {} ({})", i + 1, entry.username, entry.value))
        .collect();
    format!("[{}] {}", title, ranking.join(", "))
}
