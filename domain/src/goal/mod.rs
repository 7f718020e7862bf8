//! Goal domain module

pub mod entities;

pub use entities::{
    DEFAULT_REVIEW_DAYS, Goal, GoalPatch, GoalStatus, NewGoal, clamp_percentage,
    default_review_date,
};

use crate::core::string::names_match;

/// Find a goal by case-insensitive exact name
pub fn find_goal_by_name<'a>(goals: &'a [Goal], name: &str) -> Option<&'a Goal> {
    goals.iter().find(|g| names_match(&g.name, name))
}
