//! Typed game defaults read from the (already layered) process environment.
//!
//! | variable | default |
//! |---|---|
//! | `DEFAULT_MAX_STEPS` | 5 |
//! | `MAX_STEPS_LIMIT` | 20 |
//! | `DEFAULT_DELAY` | 2 (seconds) |
//! | `MAX_DELAY` | 5 (seconds) |
//! | `REQUEST_TIMEOUT` | 120 (seconds) |
//! | `SERVER_HOST` | 127.0.0.1 |
//! | `SERVER_PORT` | 7860 |
//! | `QUESTLINE_BACKEND_URL` | unset (derived from host and port) |

/// Defaults for a play session and for the demo backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameDefaults {
    pub max_steps: u32,
    /// Ceiling for the step budget before any extension.
    pub max_steps_limit: u32,
    pub delay_secs: u64,
    pub max_delay_secs: u64,
    pub request_timeout_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    pub backend_url: Option<String>,
}

impl Default for GameDefaults {
    fn default() -> Self {
        Self {
            max_steps: 5,
            max_steps_limit: 20,
            delay_secs: 2,
            max_delay_secs: 5,
            request_timeout_secs: 120,
            server_host: "127.0.0.1".to_string(),
            server_port: 7860,
            backend_url: None,
        }
    }
}

impl GameDefaults {
    /// Reads every variable from the process environment; unset or unparsable values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup (used by tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(v: Option<String>, default: T) -> T {
            v.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
        }
        let d = Self::default();
        let max_steps_limit = parsed(lookup("MAX_STEPS_LIMIT"), d.max_steps_limit).max(1);
        let max_delay_secs = parsed(lookup("MAX_DELAY"), d.max_delay_secs);
        Self {
            max_steps: parsed(lookup("DEFAULT_MAX_STEPS"), d.max_steps).clamp(1, max_steps_limit),
            max_steps_limit,
            delay_secs: parsed(lookup("DEFAULT_DELAY"), d.delay_secs).min(max_delay_secs),
            max_delay_secs,
            request_timeout_secs: parsed(lookup("REQUEST_TIMEOUT"), d.request_timeout_secs),
            server_host: lookup("SERVER_HOST")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(d.server_host),
            server_port: parsed(lookup("SERVER_PORT"), d.server_port),
            backend_url: lookup("QUESTLINE_BACKEND_URL").filter(|s| !s.trim().is_empty()),
        }
    }

    /// Backend base URL: `QUESTLINE_BACKEND_URL` or `http://SERVER_HOST:SERVER_PORT`.
    pub fn backend_base_url(&self) -> String {
        self.backend_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.server_host, self.server_port))
    }

    /// Address the demo backend binds to.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Clamps a requested step budget to `1..=max_steps_limit`.
    pub fn clamp_budget(&self, steps: u32) -> u32 {
        steps.clamp(1, self.max_steps_limit)
    }

    /// Clamps a requested inter-step delay to `max_delay_secs`.
    pub fn clamp_delay(&self, secs: u64) -> u64 {
        secs.min(self.max_delay_secs)
    }
}
