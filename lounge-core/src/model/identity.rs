use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Colors handed out to new profiles.
pub const PALETTE: [&str; 7] = [
    "#7289da", "#9656ce", "#ed5555", "#00ff7f", "#fff176", "#e0f7fa", "#26a69a",
];

/// Routing key for every signaling exchange and session lookup.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ParticipantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Role {
    Host,
    Viewer,
}

/// A participant profile. Created once before orchestration starts and
/// never mutated afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub id: ParticipantId,
    #[serde(rename = "name", alias = "displayName")]
    pub display_name: String,
    pub role: Role,
    pub color: String,
}

impl Identity {
    pub fn new(display_name: impl Into<String>, role: Role) -> Self {
        let id = ParticipantId::new();
        let color = PALETTE[id.0.as_bytes()[0] as usize % PALETTE.len()].to_owned();

        Self {
            id,
            display_name: display_name.into(),
            role,
            color,
        }
    }

    pub fn is_host(&self) -> bool {
        self.role == Role::Host
    }

    /// Up to two uppercase initials, used by text renderers in place of an avatar.
    pub fn initials(&self) -> String {
        self.display_name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.id)
    }
}
