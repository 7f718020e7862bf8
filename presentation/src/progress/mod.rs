//! Progress reporting while the coach is working

pub mod reporter;
