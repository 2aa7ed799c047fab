//! Coordinator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable prefix read by [`CoordinatorConfig::from_env`].
pub const ENV_PREFIX: &str = "PERMIT_POOL_";

/// Coordinator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Number of resources and admission permits.
    pub capacity: usize,
    /// Longest a worker waits for admission before retrying (milliseconds).
    pub admission_timeout_ms: u64,
    /// How long a worker holds its resource (milliseconds).
    pub work_interval_ms: u64,
    /// Pause after releasing before competing again (milliseconds).
    pub cooldown_ms: u64,
    /// Time each execution gets to stop on its own during shutdown (milliseconds).
    pub shutdown_grace_ms: u64,
    /// Size of the in-memory transition journal; zero disables it.
    pub transition_log_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            capacity: 3,
            admission_timeout_ms: 1_000,
            work_interval_ms: 2_000,
            cooldown_ms: 1_000,
            shutdown_grace_ms: 2_000,
            transition_log_capacity: 256,
        }
    }
}

impl CoordinatorConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pool capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the admission timeout.
    #[must_use]
    pub const fn with_admission_timeout_ms(mut self, ms: u64) -> Self {
        self.admission_timeout_ms = ms;
        self
    }

    /// Set the work interval.
    #[must_use]
    pub const fn with_work_interval_ms(mut self, ms: u64) -> Self {
        self.work_interval_ms = ms;
        self
    }

    /// Set the cooldown.
    #[must_use]
    pub const fn with_cooldown_ms(mut self, ms: u64) -> Self {
        self.cooldown_ms = ms;
        self
    }

    /// Set the shutdown grace period.
    #[must_use]
    pub const fn with_shutdown_grace_ms(mut self, ms: u64) -> Self {
        self.shutdown_grace_ms = ms;
        self
    }

    /// Set the transition journal size.
    #[must_use]
    pub const fn with_transition_log_capacity(mut self, events: usize) -> Self {
        self.transition_log_capacity = events;
        self
    }

    /// Admission timeout as a duration.
    #[must_use]
    pub const fn admission_timeout(&self) -> Duration {
        Duration::from_millis(self.admission_timeout_ms)
    }

    /// Work interval as a duration.
    #[must_use]
    pub const fn work_interval(&self) -> Duration {
        Duration::from_millis(self.work_interval_ms)
    }

    /// Cooldown as a duration.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Shutdown grace period as a duration.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".into());
        }
        if u32::try_from(self.capacity).is_err() {
            return Err("capacity must fit in a resource id".into());
        }
        if self.admission_timeout_ms == 0 {
            return Err("admission_timeout_ms must be greater than 0".into());
        }
        if self.work_interval_ms == 0 {
            return Err("work_interval_ms must be greater than 0".into());
        }
        if self.shutdown_grace_ms == 0 {
            return Err("shutdown_grace_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment.
    ///
    /// A `.env` file is loaded first if present. Every field can be overridden
    /// by `PERMIT_POOL_<FIELD>` in upper case, e.g. `PERMIT_POOL_CAPACITY`.
    ///
    /// # Errors
    ///
    /// Returns a message naming the variable that failed to parse, or a
    /// validation message.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup using the same keys
    /// as [`from_env`](Self::from_env).
    ///
    /// # Errors
    ///
    /// Returns a message naming the key that failed to parse, or a validation
    /// message.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            field: &str,
            target: &mut T,
        ) -> Result<(), String> {
            let key = format!("{ENV_PREFIX}{field}");
            if let Some(raw) = lookup(&key) {
                *target = raw
                    .trim()
                    .parse()
                    .map_err(|_| format!("{key}: cannot parse `{raw}`"))?;
            }
            Ok(())
        }

        let mut cfg = Self::default();
        parse(&lookup, "CAPACITY", &mut cfg.capacity)?;
        parse(&lookup, "ADMISSION_TIMEOUT_MS", &mut cfg.admission_timeout_ms)?;
        parse(&lookup, "WORK_INTERVAL_MS", &mut cfg.work_interval_ms)?;
        parse(&lookup, "COOLDOWN_MS", &mut cfg.cooldown_ms)?;
        parse(&lookup, "SHUTDOWN_GRACE_MS", &mut cfg.shutdown_grace_ms)?;
        parse(&lookup, "TRANSITION_LOG_CAPACITY", &mut cfg.transition_log_capacity)?;
        cfg.validate()?;
        Ok(cfg)
    }
}
