use std::env;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Civil timezone every window check is evaluated in.
pub const DEFAULT_TIMEZONE: &str = "Europe/Tirane";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub clock: ClockConfig,
    pub dispatch: DispatchConfig,
    pub audit: AuditConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `FRIDAY_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_opt("FRIDAY_PROFILE").unwrap_or_default();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            clock: ClockConfig::from_env_profiled(p),
            dispatch: DispatchConfig::from_env_profiled(p),
            audit: AuditConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  clock:     timezone={}, poll={}s", self.clock.timezone, self.clock.poll_interval_secs);
        tracing::info!(
            "  dispatch:  restaurant={}, contact={}",
            self.dispatch.restaurant,
            if self.dispatch.contact_phone.is_some() { "set" } else { "(none)" }
        );
        tracing::info!("  audit:     max_entries={}", self.audit.max_entries);
    }
}

// ── Clock ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// IANA timezone name, e.g. "Europe/Tirane".
    pub timezone: String,
    /// How often long-running views refresh the countdown.
    pub poll_interval_secs: u64,
}

impl ClockConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            timezone: profiled_env_or(p, "FRIDAY_TIMEZONE", DEFAULT_TIMEZONE),
            poll_interval_secs: profiled_env_u64(p, "FRIDAY_POLL_INTERVAL_SECS", 60).max(1),
        }
    }

    /// Resolve the configured timezone, falling back to [`DEFAULT_TIMEZONE`]
    /// when the name is not a known IANA zone.
    pub fn tz(&self) -> Tz {
        match self.timezone.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                tracing::warn!(
                    timezone = %self.timezone,
                    fallback = DEFAULT_TIMEZONE,
                    "unknown timezone, using default"
                );
                chrono_tz::Europe::Tirane
            }
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            poll_interval_secs: 60,
        }
    }
}

// ── Dispatch ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub restaurant: String,
    pub contact_phone: Option<String>,
}

impl DispatchConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            restaurant: profiled_env_or(p, "FRIDAY_RESTAURANT", "Tony's (Tirana)"),
            contact_phone: profiled_env_opt(p, "FRIDAY_CONTACT_PHONE"),
        }
    }
}

// ── Audit ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub max_entries: usize,
}

impl AuditConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            max_entries: profiled_env_u64(p, "FRIDAY_AUDIT_MAX_ENTRIES", 500).max(1) as usize,
        }
    }
}
