//! llm-router - Category-routing LLM gateway
//!
//! Classifies each chat request into a task category, resolves the category
//! to an ordered list of backend models, and dispatches with fallback,
//! skipping backends whose circuit breaker is open.

pub mod agent;
pub mod api;
pub mod circuit;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod routing;
pub mod session;
