//! Chat parameters: what every coach turn is sent with.

use bestself_domain::{AgentType, Model};
use serde::{Deserialize, Serialize};

/// Model and sampling parameters for coach turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatParams {
    pub model: Model,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Agent a fresh conversation starts with
    pub initial_agent: AgentType,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            model: Model::default(),
            temperature: 0.7,
            max_tokens: 1000,
            initial_agent: AgentType::Educational,
        }
    }
}

impl ChatParams {
    // ==================== Builder Methods ====================

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_initial_agent(mut self, agent: AgentType) -> Self {
        self.initial_agent = agent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = ChatParams::default();
        assert_eq!(params.model, Model::Gpt4oMini);
        assert_eq!(params.max_tokens, 1000);
        assert_eq!(params.initial_agent, AgentType::Educational);
    }

    #[test]
    fn test_builder() {
        let params = ChatParams::default()
            .with_temperature(0.2)
            .with_initial_agent(AgentType::Goal);
        assert_eq!(params.temperature, 0.2);
        assert_eq!(params.initial_agent, AgentType::Goal);
    }
}
