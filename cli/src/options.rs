//! Merges command-line overrides with [`GameDefaults`] into player settings and session limits.

use std::time::Duration;

use config::GameDefaults;
use questline::{PlayerSettings, SessionConfig};

/// Values given on the command line; `None` keeps the configured default.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub backend: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub max_steps: Option<u32>,
    pub delay: Option<u64>,
}

/// Everything needed to open a session.
#[derive(Clone, Debug)]
pub struct Resolved {
    pub backend_url: String,
    pub request_timeout: Duration,
    pub settings: PlayerSettings,
    pub session: SessionConfig,
}

/// Budget is clamped to `1..=MAX_STEPS_LIMIT` and delay to `MAX_DELAY`.
pub fn resolve(defaults: &GameDefaults, overrides: &Overrides) -> Resolved {
    let mut settings = PlayerSettings::default();
    if let Some(provider) = &overrides.provider {
        settings.provider = provider.clone();
    }
    if let Some(model) = &overrides.model {
        settings.model = model.clone();
    }
    if let Some(key) = &overrides.api_key {
        settings.api_key = key.clone();
    }
    if let Some(url) = &overrides.api_url {
        settings.api_url = url.clone();
    }
    settings.delay_secs = defaults.clamp_delay(overrides.delay.unwrap_or(defaults.delay_secs));

    let budget = defaults.clamp_budget(overrides.max_steps.unwrap_or(defaults.max_steps));
    Resolved {
        backend_url: overrides
            .backend
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| defaults.backend_base_url()),
        request_timeout: Duration::from_secs(defaults.request_timeout_secs),
        settings,
        session: SessionConfig {
            default_budget: budget,
            budget_floor: defaults.max_steps_limit,
        },
    }
}
