use std::collections::HashMap;

/// Configuration for the model gateway, teacher-style env-driven with
/// sensible local defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    /// Base URL of the model service.
    pub endpoint: String,
    /// Model used for the primary per-file analysis.
    pub model: String,
    /// Smaller model used for the JSON repair escalation.
    pub repair_model: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after a failed transport attempt (one bounded retry by default).
    pub max_retries: u32,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "deepseek-r1".to_string(),
            repair_model: "llama3.2".to_string(),
            timeout_secs: 120,
            max_retries: 1,
        }
    }
}

impl GatewaySettings {
    const ENDPOINT_ENV: &'static str = "CODEQUAL_ENDPOINT";
    const MODEL_ENV: &'static str = "CODEQUAL_MODEL";
    const REPAIR_MODEL_ENV: &'static str = "CODEQUAL_REPAIR_MODEL";
    const TIMEOUT_ENV: &'static str = "CODEQUAL_TIMEOUT_SECS";
    const RETRIES_ENV: &'static str = "CODEQUAL_MAX_RETRIES";

    /// Load settings from the environment, falling back to defaults.
    ///
    /// * `CODEQUAL_ENDPOINT` — model service base URL.
    /// * `CODEQUAL_MODEL` — primary analysis model.
    /// * `CODEQUAL_REPAIR_MODEL` — repair-pass model.
    /// * `CODEQUAL_TIMEOUT_SECS` / `CODEQUAL_MAX_RETRIES` — call policy.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.overlay_map(&std::env::vars().collect());
        settings
    }

    /// Apply any environment overrides present in the map onto `self`.
    pub fn overlay_env(&mut self) {
        self.overlay_map(&std::env::vars().collect());
    }

    fn overlay_map(&mut self, vars: &HashMap<String, String>) {
        let non_empty = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        if let Some(endpoint) = non_empty(Self::ENDPOINT_ENV) {
            self.endpoint = endpoint;
        }
        if let Some(model) = non_empty(Self::MODEL_ENV) {
            self.model = model;
        }
        if let Some(repair_model) = non_empty(Self::REPAIR_MODEL_ENV) {
            self.repair_model = repair_model;
        }
        if let Some(timeout) = non_empty(Self::TIMEOUT_ENV).and_then(|v| v.parse().ok()) {
            self.timeout_secs = timeout;
        }
        if let Some(retries) = non_empty(Self::RETRIES_ENV).and_then(|v| v.parse().ok()) {
            self.max_retries = retries;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::env;
    use std::sync::Mutex;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn with_clean_env<F: FnOnce()>(func: F) {
        let _guard = ENV_LOCK.lock().unwrap();
        for key in [
            GatewaySettings::ENDPOINT_ENV,
            GatewaySettings::MODEL_ENV,
            GatewaySettings::REPAIR_MODEL_ENV,
            GatewaySettings::TIMEOUT_ENV,
            GatewaySettings::RETRIES_ENV,
        ] {
            env::remove_var(key);
        }
        func();
    }

    #[test]
    fn defaults_point_at_local_ollama() {
        with_clean_env(|| {
            let settings = GatewaySettings::from_env();
            assert_eq!(settings.endpoint, "http://localhost:11434");
            assert_eq!(settings.model, "deepseek-r1");
            assert_eq!(settings.repair_model, "llama3.2");
            assert_eq!(settings.timeout_secs, 120);
            assert_eq!(settings.max_retries, 1);
        });
    }

    #[test]
    fn env_overrides_apply() {
        with_clean_env(|| {
            env::set_var(GatewaySettings::ENDPOINT_ENV, "http://remote:11434");
            env::set_var(GatewaySettings::MODEL_ENV, "qwen2.5:3b");
            env::set_var(GatewaySettings::TIMEOUT_ENV, "45");
            let settings = GatewaySettings::from_env();
            assert_eq!(settings.endpoint, "http://remote:11434");
            assert_eq!(settings.model, "qwen2.5:3b");
            assert_eq!(settings.timeout_secs, 45);
            env::remove_var(GatewaySettings::ENDPOINT_ENV);
            env::remove_var(GatewaySettings::MODEL_ENV);
            env::remove_var(GatewaySettings::TIMEOUT_ENV);
        });
    }

    #[test]
    fn blank_and_invalid_values_keep_defaults() {
        with_clean_env(|| {
            env::set_var(GatewaySettings::MODEL_ENV, "   ");
            env::set_var(GatewaySettings::TIMEOUT_ENV, "not-a-number");
            let settings = GatewaySettings::from_env();
            assert_eq!(settings.model, "deepseek-r1");
            assert_eq!(settings.timeout_secs, 120);
            env::remove_var(GatewaySettings::MODEL_ENV);
            env::remove_var(GatewaySettings::TIMEOUT_ENV);
        });
    }
}
