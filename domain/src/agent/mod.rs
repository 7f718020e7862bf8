//! Agent domain module
//!
//! The five coaching agents, the [`Agent`] trait they share, and the
//! [`AgentRegistry`] the conversation manager routes through.

pub mod agent_type;
pub mod discovery;
pub mod educational;
pub mod goal;
pub mod management;
pub mod prompt;
pub mod refinement;
pub mod registry;
pub mod traits;

pub use agent_type::AgentType;
pub use discovery::DiscoveryAgent;
pub use educational::EducationalAgent;
pub use goal::GoalAgent;
pub use management::ManagementAgent;
pub use refinement::RefinementAgent;
pub use registry::AgentRegistry;
pub use traits::{Agent, AgentResult};
