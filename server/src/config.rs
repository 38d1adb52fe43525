use std::{env, str::FromStr, time::Duration};

use tracing::warn;

use crate::data::BreakoutConfig;

/// Reads `name` from the environment, falling back to `default` when it is
/// unset or does not parse.
pub fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring unparsable {}={:?}", name, value);
            default
        }),
        Err(_) => default,
    }
}

pub fn breakout_config() -> BreakoutConfig {
    BreakoutConfig {
        single_bounce: env_or("BREAKOUT_SINGLE_BOUNCE", false),
        ..BreakoutConfig::default()
    }
}

pub fn breakout_tick_interval() -> Duration {
    Duration::from_millis(env_or("BREAKOUT_TICK_MILLIS", 16u64).max(1))
}
