//! Agent registry keyed by [`AgentType`]

use crate::agent::agent_type::AgentType;
use crate::agent::traits::Agent;
use crate::agent::{DiscoveryAgent, EducationalAgent, GoalAgent, ManagementAgent, RefinementAgent};
use std::collections::HashMap;

/// The agents available to the conversation manager
pub struct AgentRegistry {
    agents: HashMap<AgentType, Box<dyn Agent>>,
}

impl AgentRegistry {
    /// A registry with no agents
    pub fn empty() -> Self {
        Self {
            agents: HashMap::new(),
        }
    }

    /// Add an agent, replacing any agent of the same type
    pub fn register(mut self, agent: impl Agent + 'static) -> Self {
        self.agents.insert(agent.agent_type(), Box::new(agent));
        self
    }

    pub fn get(&self, agent_type: AgentType) -> Option<&dyn Agent> {
        self.agents.get(&agent_type).map(|a| a.as_ref())
    }

    pub fn contains(&self, agent_type: AgentType) -> bool {
        self.agents.contains_key(&agent_type)
    }

    /// Registered types, in routing priority order
    pub fn types(&self) -> Vec<AgentType> {
        AgentType::PRIORITY
            .into_iter()
            .filter(|t| self.contains(*t))
            .collect()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::empty()
            .register(EducationalAgent)
            .register(DiscoveryAgent)
            .register(RefinementAgent)
            .register(ManagementAgent)
            .register(GoalAgent)
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.types())
            .finish()
    }
}
