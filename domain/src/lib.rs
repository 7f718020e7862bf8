//! Domain layer for bestself-coach
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Agents
//!
//! Five stateless coaching agents (Educational, Discovery, Refinement,
//! Management, Goal). Each decides whether it can handle a message, writes the
//! system prompt the LLM runs under, and parses the reply into actions.
//!
//! ## Action Grammar
//!
//! Coach replies confirm changes with tagged lines such as
//! `PERSONA_CONFIRMED: name | north star`. The [`action::grammar`] parsers turn
//! those lines into [`PersonaAction`]s and [`GoalAction`]s and strip them from
//! the text shown to the user.
//!
//! ## Conversation Context
//!
//! An owned value threaded through each turn: current agent, target persona,
//! scratch state and history. Every update returns a new context.

pub mod action;
pub mod agent;
pub mod conversation;
pub mod core;
pub mod goal;
pub mod persona;
pub mod session;
pub mod user;

// Re-export commonly used types
pub use action::{GoalAction, GoalActionKind, PersonaAction, PersonaActionKind, TransitionAction};
pub use agent::{Agent, AgentRegistry, AgentResult, AgentType};
pub use conversation::{
    ContextUpdates, ConversationContext, ConversationMessage, ConversationRecord,
    ConversationStatus, IntentMatch, NewConversation, PersonaSummary, Sender, TemporaryState,
    analyze_intent,
};
pub use core::{error::DomainError, model::Model};
pub use goal::{Goal, GoalPatch, GoalStatus, NewGoal, default_review_date, find_goal_by_name};
pub use persona::{
    MAX_PERSONAS, NewPersona, Persona, PersonaChange, PersonaPatch, resolve_action,
};
pub use session::entities::{Message, Role};
pub use user::{NewUser, User};
