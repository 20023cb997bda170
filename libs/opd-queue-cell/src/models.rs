use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOKEN_STATUS: &str = "pending";
pub const TOKEN_ID_PREFIX: &str = "TKN";

/// Admission class of a token. Lower rank means more urgent, and the derived
/// `Ord` follows the rank so a priority can be used directly as a sort key.
///
/// On the wire a priority is written as its literal name and read back from
/// either the name or the integer rank (0-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "PriorityRepr")]
pub enum Priority {
    Emergency = 0,
    PaidPriority = 1,
    FollowUp = 2,
    Online = 3,
    WalkIn = 4,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Emergency,
        Priority::PaidPriority,
        Priority::FollowUp,
        Priority::Online,
        Priority::WalkIn,
    ];

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn from_rank(rank: u8) -> Option<Self> {
        Self::ALL.get(rank as usize).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Emergency => "EMERGENCY",
            Priority::PaidPriority => "PAID_PRIORITY",
            Priority::FollowUp => "FOLLOW_UP",
            Priority::Online => "ONLINE",
            Priority::WalkIn => "WALK_IN",
        }
    }

    /// Emergencies are admitted even when the slot is already full.
    pub fn bypasses_capacity(self) -> bool {
        self == Priority::Emergency
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if let Ok(rank) = value.parse::<u8>() {
            return Priority::from_rank(rank).ok_or_else(|| format!("unknown priority rank: {rank}"));
        }
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| format!("unknown priority: {value}"))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriorityRepr {
    Rank(u8),
    Label(String),
}

impl TryFrom<PriorityRepr> for Priority {
    type Error = String;

    fn try_from(repr: PriorityRepr) -> Result<Self, Self::Error> {
        match repr {
            PriorityRepr::Rank(rank) => {
                Priority::from_rank(rank).ok_or_else(|| format!("unknown priority rank: {rank}"))
            }
            PriorityRepr::Label(label) => label.parse(),
        }
    }
}

fn default_token_status() -> String {
    DEFAULT_TOKEN_STATUS.to_string()
}

/// One patient's place in a slot queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub token_id: String,
    pub patient_name: String,
    pub priority: Priority,
    #[serde(default = "default_token_status")]
    pub status: String,
    #[serde(default = "Utc::now")]
    pub issued_at: DateTime<Utc>,
}

impl Token {
    pub fn new(token_id: impl Into<String>, patient_name: impl Into<String>, priority: Priority) -> Self {
        Self {
            token_id: token_id.into(),
            patient_name: patient_name.into(),
            priority,
            status: default_token_status(),
            issued_at: Utc::now(),
        }
    }
}

/// A bookable time window for one doctor, holding its token queue.
///
/// `tokens` is kept sorted by ascending priority rank with admission order
/// preserved inside a rank. Every mutation goes through [`Slot::sort_tokens`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub slot_id: String,
    pub start_time: String,
    pub end_time: String,
    pub max_capacity: u32,
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(skip)]
    issued_tokens: u32,
}

impl Slot {
    pub fn new(
        slot_id: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        max_capacity: u32,
    ) -> Self {
        Self {
            slot_id: slot_id.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            max_capacity,
            tokens: Vec::new(),
            issued_tokens: 0,
        }
    }

    pub fn with_tokens(mut self, tokens: Vec<Token>) -> Self {
        self.tokens = tokens;
        self.sort_tokens();
        self
    }

    pub fn is_full(&self) -> bool {
        self.tokens.len() >= self.max_capacity as usize
    }

    /// Stable sort by priority; equal priorities keep their relative order.
    pub fn sort_tokens(&mut self) {
        self.tokens.sort_by_key(|token| token.priority);
    }

    /// Next `TKN-<n>` label for this slot. The counter only moves forward and
    /// skips labels already held by a token, so ids never repeat within the
    /// slot even after cancellations or when tokens were supplied at setup.
    pub fn next_token_id(&mut self) -> String {
        loop {
            self.issued_tokens += 1;
            let candidate = format!("{}-{}", TOKEN_ID_PREFIX, self.issued_tokens);
            if !self.tokens.iter().any(|token| token.token_id == candidate) {
                return candidate;
            }
        }
    }

    pub fn position_of(&self, token_id: &str) -> Option<usize> {
        self.tokens.iter().position(|token| token.token_id == token_id)
    }
}

/// Emitted when the fairness pass promotes the tail token of a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityUpgrade {
    pub doctor_id: String,
    pub slot_id: String,
    pub token_id: String,
    pub patient_name: String,
    pub previous_priority: Priority,
    pub new_priority: Priority,
    pub upgraded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookTokenQuery {
    pub name: String,
    pub priority: Priority,
}
