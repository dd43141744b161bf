//! Seat occupants of a match.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use core::fmt;

use crate::ai::OpponentAgent;

/// Opaque identifier of a human participant (a session or connection id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(transparent))]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        ParticipantId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        ParticipantId(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        ParticipantId(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who sits in a seat: a human identified by id, or the scripted agent with
/// its decision state.
#[derive(Debug, Clone)]
pub enum Participant {
    Human(ParticipantId),
    Agent(Box<OpponentAgent>),
}

impl Participant {
    pub fn human(id: impl Into<ParticipantId>) -> Self {
        Participant::Human(id.into())
    }

    pub fn agent() -> Self {
        Participant::Agent(Box::default())
    }

    pub fn is_agent(&self) -> bool {
        matches!(self, Participant::Agent(_))
    }

    /// Human id, `None` for the agent.
    pub fn id(&self) -> Option<&ParticipantId> {
        match self {
            Participant::Human(id) => Some(id),
            Participant::Agent(_) => None,
        }
    }

    pub fn matches(&self, id: &ParticipantId) -> bool {
        self.id() == Some(id)
    }

    pub fn agent_mut(&mut self) -> Option<&mut OpponentAgent> {
        match self {
            Participant::Agent(agent) => Some(agent),
            Participant::Human(_) => None,
        }
    }

    /// Label shown to the other side.
    pub fn label(&self) -> String {
        match self {
            Participant::Human(id) => id.to_string(),
            Participant::Agent(_) => "agent".to_string(),
        }
    }
}
