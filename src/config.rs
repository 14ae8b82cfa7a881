use crate::constants::{
    ENV_SUPABASE_PROJECT_REF, ENV_SUPABASE_SERVICE_KEY, ENV_SUPABASE_SERVICE_ROLE_KEY,
    ENV_SUPABASE_URL, ENV_WEBHOOK_SECRET,
};
use std::fmt;
use tracing::warn;

/// Where the device registry and sales tables live
#[derive(Clone, Default)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    pub service_key: Option<String>,
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("service_key", &self.service_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Process-wide settings, read once at startup and never mutated afterwards
#[derive(Clone, Default)]
pub struct WebhookConfig {
    pub supabase: SupabaseConfig,
    pub webhook_secret: Option<String>,
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("supabase", &self.supabase)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl WebhookConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        // Allow either a full URL or a project ref
        let url = get(ENV_SUPABASE_URL)
            .or_else(|| get(ENV_SUPABASE_PROJECT_REF).map(|r| format!("https://{}.supabase.co", r)));
        let service_key = get(ENV_SUPABASE_SERVICE_KEY).or_else(|| get(ENV_SUPABASE_SERVICE_ROLE_KEY));

        Self {
            supabase: SupabaseConfig { url, service_key },
            webhook_secret: get(ENV_WEBHOOK_SECRET),
        }
    }

    pub fn missing_vars(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.supabase.url.is_none() {
            missing.push(ENV_SUPABASE_URL);
        }
        if self.supabase.service_key.is_none() {
            missing.push(ENV_SUPABASE_SERVICE_KEY);
        }
        if self.webhook_secret.is_none() {
            missing.push(ENV_WEBHOOK_SECRET);
        }
        missing
    }

    /// Logs a startup warning when anything is missing. Returns true when complete.
    pub fn warn_if_incomplete(&self) -> bool {
        let missing = self.missing_vars();
        if missing.is_empty() {
            return true;
        }
        warn!(
            "Missing required env vars: {}; requests needing them will be rejected",
            missing.join(", ")
        );
        false
    }
}
