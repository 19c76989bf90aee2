// src/cooldown.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

pub const FAST_COMMAND_COOLDOWN: Duration = Duration::from_secs(1);
pub const NORMAL_COMMAND_COOLDOWN: Duration = Duration::from_secs(2);
pub const SLOW_COMMAND_COOLDOWN: Duration = Duration::from_secs(5);

const FAST_COMMANDS: &[&str] = &["balance", "seebalance", "open", "spawn"];
const NORMAL_COMMANDS: &[&str] = &[
    "map", "claim", "unclaim", "autoclaim", "newsletter", "pay", "deposit", "withdraw", "leave",
];
const SLOW_COMMANDS: &[&str] = &["create", "join", "disband"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: Duration,
}

impl RateLimitResult {
    pub fn allowed() -> Self {
        Self { allowed: true, remaining: Duration::ZERO }
    }

    pub fn denied(remaining: Duration) -> Self {
        Self { allowed: false, remaining }
    }

    /// Remaining cooldown rounded up to whole seconds
    pub fn remaining_seconds(&self) -> u64 {
        let millis = self.remaining.as_millis() as u64;
        (millis + 999) / 1000
    }
}

/// Per-player cooldown for a single command
pub struct RateLimiter {
    command: String,
    cooldown: Duration,
    last_execution: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    pub fn new(command: impl Into<String>, cooldown: Duration) -> Self {
        Self {
            command: command.into(),
            cooldown,
            last_execution: Mutex::new(HashMap::new()),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.last_execution.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn evaluate(&self, last: Option<Instant>, now: Instant) -> RateLimitResult {
        match last {
            Some(last) => {
                let elapsed = now.saturating_duration_since(last);
                if elapsed >= self.cooldown {
                    RateLimitResult::allowed()
                } else {
                    RateLimitResult::denied(self.cooldown - elapsed)
                }
            }
            None => RateLimitResult::allowed(),
        }
    }

    /// Check and, when allowed, record an execution at `now`
    pub fn can_execute_at(&self, player: &str, now: Instant) -> RateLimitResult {
        let mut entries = self.entries();
        let result = self.evaluate(entries.get(player).copied(), now);
        if result.allowed {
            entries.insert(player.to_string(), now);
        } else {
            debug!(
                "{} denied for {}: {}ms left",
                self.command,
                player,
                result.remaining.as_millis()
            );
        }
        result
    }

    pub fn can_execute(&self, player: &str) -> RateLimitResult {
        self.can_execute_at(player, Instant::now())
    }

    pub fn check_only_at(&self, player: &str, now: Instant) -> RateLimitResult {
        self.evaluate(self.entries().get(player).copied(), now)
    }

    pub fn check_only(&self, player: &str) -> RateLimitResult {
        self.check_only_at(player, Instant::now())
    }

    pub fn remaining_cooldown(&self, player: &str) -> Duration {
        self.check_only(player).remaining
    }

    pub fn reset_cooldown(&self, player: &str) {
        self.entries().remove(player);
    }

    pub fn clear_all(&self) {
        self.entries().clear();
    }
}

/// Cooldowns of all economy commands, keyed by command name
#[derive(Default)]
pub struct RateLimitRegistry {
    limiters: Mutex<HashMap<String, Arc<RateLimiter>>>,
}

impl RateLimitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let registry = Self::new();
        for (commands, cooldown) in [
            (FAST_COMMANDS, FAST_COMMAND_COOLDOWN),
            (NORMAL_COMMANDS, NORMAL_COMMAND_COOLDOWN),
            (SLOW_COMMANDS, SLOW_COMMAND_COOLDOWN),
        ] {
            for command in commands {
                registry.register(command, cooldown);
            }
        }
        registry
    }

    fn limiters(&self) -> MutexGuard<'_, HashMap<String, Arc<RateLimiter>>> {
        self.limiters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, command: &str, cooldown: Duration) -> Arc<RateLimiter> {
        let limiter = Arc::new(RateLimiter::new(command, cooldown));
        self.limiters().insert(command.to_string(), limiter.clone());
        limiter
    }

    pub fn get(&self, command: &str) -> Option<Arc<RateLimiter>> {
        self.limiters().get(command).cloned()
    }

    pub fn get_or_create(&self, command: &str) -> Arc<RateLimiter> {
        self.limiters()
            .entry(command.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::new(command, Duration::ZERO)))
            .clone()
    }

    /// Unregistered commands are never limited
    pub fn can_execute(&self, command: &str, player: &str) -> RateLimitResult {
        match self.get(command) {
            Some(limiter) => limiter.can_execute(player),
            None => RateLimitResult::allowed(),
        }
    }

    pub fn check_only(&self, command: &str, player: &str) -> RateLimitResult {
        match self.get(command) {
            Some(limiter) => limiter.check_only(player),
            None => RateLimitResult::allowed(),
        }
    }

    pub fn clear_player(&self, player: &str) {
        for limiter in self.limiters().values() {
            limiter.reset_cooldown(player);
        }
    }

    pub fn clear_all(&self) {
        for limiter in self.limiters().values() {
            limiter.clear_all();
        }
    }
}
