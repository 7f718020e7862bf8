//! Agent type enum

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of coaching agents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    #[default]
    Educational,
    Discovery,
    Refinement,
    Management,
    Goal,
}

impl AgentType {
    /// Order in which agents are offered a message during intent analysis
    pub const PRIORITY: [AgentType; 5] = [
        AgentType::Goal,
        AgentType::Educational,
        AgentType::Discovery,
        AgentType::Refinement,
        AgentType::Management,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Educational => "educational",
            AgentType::Discovery => "discovery",
            AgentType::Refinement => "refinement",
            AgentType::Management => "management",
            AgentType::Goal => "goal",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentType::Educational => "Educational Agent",
            AgentType::Discovery => "Discovery Agent",
            AgentType::Refinement => "Refinement Agent",
            AgentType::Management => "Management Agent",
            AgentType::Goal => "Goal Agent",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "educational" | "education" => Ok(AgentType::Educational),
            "discovery" => Ok(AgentType::Discovery),
            "refinement" | "refine" => Ok(AgentType::Refinement),
            "management" | "manage" => Ok(AgentType::Management),
            "goal" | "goals" => Ok(AgentType::Goal),
            other => Err(DomainError::UnknownAgent(other.to_string())),
        }
    }
}
