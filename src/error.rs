//! Error types

use thiserror::Error;

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the caller.
///
/// Similarity failures are not here: they fall back to string similarity.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A candidate match violates the input contract.
    #[error("invalid candidate for skill {skill_id:?}: {reason}")]
    InvalidCandidate { skill_id: String, reason: String },

    /// The skill identifier is not in the skill database.
    #[error("unknown skill: {0}")]
    UnknownSkill(String),

    /// The skill database entry cannot be used for scoring.
    #[error("invalid skill entry {skill_id:?}: {reason}")]
    InvalidSkill { skill_id: String, reason: String },

    /// The token sequence does not fit the corpus it is scored against.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Configuration failed to parse or validate.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl Error {
    #[must_use]
    pub fn invalid_candidate(skill_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCandidate {
            skill_id: skill_id.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn unknown_skill(skill_id: impl Into<String>) -> Self {
        Self::UnknownSkill(skill_id.into())
    }

    #[must_use]
    pub fn invalid_skill(skill_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSkill {
            skill_id: skill_id.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }

    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::invalid_candidate("S1", "empty doc_node_id");
        assert_eq!(err.to_string(), "invalid candidate for skill \"S1\": empty doc_node_id");

        let err = Error::unknown_skill("S9");
        assert_eq!(err.to_string(), "unknown skill: S9");

        let err = Error::invalid_document("2 tokens for a corpus of 4");
        assert_eq!(err.to_string(), "invalid document: 2 tokens for a corpus of 4");
    }

    #[test]
    fn test_from_json_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
