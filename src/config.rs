//! Runtime configuration (SPEC_FULL.md ambient stack; values and defaults
//! per spec §6 "Configuration").

use std::time::Duration;

/// Plain struct with `Default`, overridable via environment variables —
/// mirrors the teacher's `RuntimeConfig` pattern, generalized to this
/// domain's configuration surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub lm_timeout_secs: u64,
    pub sandbox_timeout_secs: u64,
    pub step_timeout_secs: u64,
    pub intent_confidence_threshold: f32,
    pub dup_question_overlap_threshold: f32,
    pub evaluation_turn_threshold: u32,
    pub code_max_bytes: usize,
    pub output_truncate_bytes: usize,
    pub status_poll_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lm_timeout_secs: 15,
            sandbox_timeout_secs: 30,
            step_timeout_secs: 60,
            intent_confidence_threshold: 0.7,
            dup_question_overlap_threshold: 0.8,
            evaluation_turn_threshold: 20,
            code_max_bytes: 100_000,
            output_truncate_bytes: 65_536,
            status_poll_interval_secs: 5,
        }
    }
}

impl Config {
    /// Load defaults, then apply any of the enumerated env vars present
    /// (after trying to load a `.env` file via `dotenvy`, same as the
    /// teacher's `RuntimeConfig::default`).
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();
        if let Some(v) = env_u64("LM_TIMEOUT_SECS") {
            cfg.lm_timeout_secs = v;
        }
        if let Some(v) = env_u64("SANDBOX_TIMEOUT_SECS") {
            cfg.sandbox_timeout_secs = v;
        }
        if let Some(v) = env_u64("STEP_TIMEOUT_SECS") {
            cfg.step_timeout_secs = v;
        }
        if let Some(v) = env_f32("INTENT_CONFIDENCE_THRESHOLD") {
            cfg.intent_confidence_threshold = v;
        }
        if let Some(v) = env_f32("DUP_QUESTION_OVERLAP_THRESHOLD") {
            cfg.dup_question_overlap_threshold = v;
        }
        if let Some(v) = env_u64("EVALUATION_TURN_THRESHOLD") {
            cfg.evaluation_turn_threshold = v as u32;
        }
        if let Some(v) = env_u64("CODE_MAX_BYTES") {
            cfg.code_max_bytes = v as usize;
        }
        if let Some(v) = env_u64("OUTPUT_TRUNCATE_BYTES") {
            cfg.output_truncate_bytes = v as usize;
        }
        if let Some(v) = env_u64("STATUS_POLL_INTERVAL_SECS") {
            cfg.status_poll_interval_secs = v;
        }
        cfg
    }

    #[must_use]
    pub fn lm_timeout(&self) -> Duration {
        Duration::from_secs(self.lm_timeout_secs)
    }

    #[must_use]
    pub fn sandbox_timeout(&self) -> Duration {
        Duration::from_secs(self.sandbox_timeout_secs)
    }

    #[must_use]
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }

    #[must_use]
    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_secs(self.status_poll_interval_secs)
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_f32(key: &str) -> Option<f32> {
    std::env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let cfg = Config::default();
        assert_eq!(cfg.lm_timeout_secs, 15);
        assert_eq!(cfg.sandbox_timeout_secs, 30);
        assert_eq!(cfg.step_timeout_secs, 60);
        assert!((cfg.intent_confidence_threshold - 0.7).abs() < f32::EPSILON);
        assert!((cfg.dup_question_overlap_threshold - 0.8).abs() < f32::EPSILON);
        assert_eq!(cfg.evaluation_turn_threshold, 20);
        assert_eq!(cfg.code_max_bytes, 100_000);
        assert_eq!(cfg.output_truncate_bytes, 65_536);
        assert_eq!(cfg.status_poll_interval_secs, 5);
    }
}
