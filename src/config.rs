//! Resolver configuration.
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "token_dist": 1,
//!   "late_match_penalty": 0.1,
//!   "override_threshold": 0.5,
//!   "acceptance_threshold": 0.5
//! }
//! ```
//!
//! Every field is optional and falls back to the defaults above.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default adjacency distance for merging tokens into one span.
pub const DEFAULT_TOKEN_DIST: usize = 1;
/// Default per-position penalty for one-token n-gram scoring.
pub const DEFAULT_LATE_MATCH_PENALTY: f64 = 0.1;
/// Default minimum score for the one-token n-gram override.
pub const DEFAULT_OVERRIDE_THRESHOLD: f64 = 0.5;
/// Default score a resolved match needs to be kept by `annotate`.
pub const DEFAULT_ACCEPTANCE_THRESHOLD: f64 = 0.5;

/// Static configuration shared by every resolution pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Two co-occurring tokens join one span if their index distance is at
    /// most this value.
    pub token_dist: usize,
    /// Penalty per position in the skill name for one-token n-gram matches.
    pub late_match_penalty: f64,
    /// Score a one-token n-gram needs to override the arg-max winner.
    pub override_threshold: f64,
    /// Score a winner needs to survive `SkillResolver::annotate`.
    pub acceptance_threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            token_dist: DEFAULT_TOKEN_DIST,
            late_match_penalty: DEFAULT_LATE_MATCH_PENALTY,
            override_threshold: DEFAULT_OVERRIDE_THRESHOLD,
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
        }
    }
}

impl ResolverConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON, rejecting unknown fields
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the adjacency distance
    pub fn with_token_dist(mut self, token_dist: usize) -> Self {
        self.token_dist = token_dist;
        self
    }

    /// Set the late-match penalty coefficient
    pub fn with_late_match_penalty(mut self, penalty: f64) -> Self {
        self.late_match_penalty = penalty;
        self
    }

    /// Set the override threshold
    pub fn with_override_threshold(mut self, threshold: f64) -> Self {
        self.override_threshold = threshold;
        self
    }

    /// Set the acceptance threshold
    pub fn with_acceptance_threshold(mut self, threshold: f64) -> Self {
        self.acceptance_threshold = threshold;
        self
    }

    /// Check that every field is usable.
    pub fn validate(&self) -> Result<()> {
        if self.token_dist == 0 {
            return Err(Error::invalid_config("token_dist must be at least 1"));
        }
        if !self.late_match_penalty.is_finite() || self.late_match_penalty < 0.0 {
            return Err(Error::invalid_config(format!(
                "late_match_penalty must be a non-negative number, got {}",
                self.late_match_penalty
            )));
        }
        if !self.override_threshold.is_finite() {
            return Err(Error::invalid_config("override_threshold must be finite"));
        }
        if !self.acceptance_threshold.is_finite() {
            return Err(Error::invalid_config("acceptance_threshold must be finite"));
        }
        Ok(())
    }
}
