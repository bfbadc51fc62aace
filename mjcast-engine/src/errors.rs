use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    /// Caller broke an engine contract (round number below 1, advancing an
    /// unresolved round, mutating history).
    ContractViolation { message: String },
    /// Operator input that cannot be applied (bad win event, dora index).
    InvalidEvent { message: String },
    /// `advance` was called on a round that closed the match.
    MatchEnded { round_count: u32 },
    /// Record encoding/decoding failure.
    Serialization { message: String },
}

impl ScoreError {
    pub(crate) fn contract(message: impl Into<String>) -> Self {
        ScoreError::ContractViolation {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_event(message: impl Into<String>) -> Self {
        ScoreError::InvalidEvent {
            message: message.into(),
        }
    }
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreError::ContractViolation { message } => {
                write!(f, "Contract violation: {}", message)
            }
            ScoreError::InvalidEvent { message } => {
                write!(f, "Invalid event: {}", message)
            }
            ScoreError::MatchEnded { round_count } => {
                write!(f, "Match already ended at round {}", round_count)
            }
            ScoreError::Serialization { message } => {
                write!(f, "Serialization error: {}", message)
            }
        }
    }
}

impl std::error::Error for ScoreError {}

impl From<serde_json::Error> for ScoreError {
    fn from(err: serde_json::Error) -> Self {
        ScoreError::Serialization {
            message: err.to_string(),
        }
    }
}

pub type ScoreResult<T> = Result<T, ScoreError>;
