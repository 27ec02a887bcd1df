use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    /// Seconds between automation passes.
    pub automation_interval_secs: u64,
    /// Default no-show deadline applied to new online pairings.
    pub default_pairing_deadline_hours: i64,
    /// Default window the opponent has to confirm an OTB result claim.
    pub default_confirmation_minutes: i64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:tourney.db".to_string()),
            automation_interval_secs: env::var("AUTOMATION_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            default_pairing_deadline_hours: env::var("PAIRING_DEADLINE_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            default_confirmation_minutes: env::var("RESULT_CONFIRMATION_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            automation_interval_secs: 300,
            default_pairing_deadline_hours: 24,
            default_confirmation_minutes: 10,
        }
    }
}
