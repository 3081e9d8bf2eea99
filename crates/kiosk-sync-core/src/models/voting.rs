//! Voting payload model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One answered question in a survey response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    /// Question identifier
    pub question: String,
    /// Chosen answer option identifier
    pub answer_option: String,
}

impl Vote {
    #[must_use]
    pub fn new(question: impl Into<String>, answer_option: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer_option: answer_option.into(),
        }
    }
}

/// A completed survey response, as submitted to the remote authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voting {
    /// Survey identifier
    pub survey: String,
    /// Completion date
    pub date: DateTime<Utc>,
    /// Answers in question order
    pub votes: Vec<Vote>,
}

impl Voting {
    /// Create a voting completed now
    #[must_use]
    pub fn new(survey: impl Into<String>, votes: Vec<Vote>) -> Self {
        Self {
            survey: survey.into(),
            date: Utc::now(),
            votes,
        }
    }

    /// Parse a voting from its JSON representation
    pub fn from_json(raw: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Serialize the voting to the JSON stored alongside a job
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
