//! Action selection by one-step entropy lookahead.

pub mod selector;

pub use selector::{ActionDecision, ActionSelector, SelectorConfig};
