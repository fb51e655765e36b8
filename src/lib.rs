//! StrayMatch: intake wizards and assistant chat for reporting and fostering
//! stray animals.

pub mod auth;
pub mod chat;
pub mod config;
pub mod context;
pub mod emergency;
pub mod error;
pub mod intake;
pub mod llm;
pub mod matches;
pub mod store;
pub mod terminal;
