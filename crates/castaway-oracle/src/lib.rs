//! LLM-backed reasoning collaborator for the Castaway simulation.
//!
//! The core asks its collaborator four questions: which goal and plan an
//! actor should pursue, how to answer a trade offer, what a freshly
//! discovered invention is, and what its icon looks like. This crate
//! answers them by rendering `minijinja` prompt templates, calling an HTTP
//! LLM backend (OpenAI-compatible, Anthropic, or Gemini), and parsing the
//! JSON reply leniently.
//!
//! # Modules
//!
//! - [`config`] -- Backend selection from environment variables.
//! - [`error`] -- [`OracleError`] and its mapping into the core's error.
//! - [`llm`] -- HTTP backends.
//! - [`parse`] -- Tolerant reply parsing.
//! - [`prompt`] -- Template loading and rendering.
//! - [`reasoner`] -- [`LlmReasoner`], the [`castaway_core::Reasoner`]
//!   implementation.
//!
//! [`OracleError`]: error::OracleError
//! [`LlmReasoner`]: reasoner::LlmReasoner

pub mod config;
pub mod error;
pub mod llm;
pub mod parse;
pub mod prompt;
pub mod reasoner;

pub use config::OracleConfig;
pub use error::OracleError;
pub use reasoner::LlmReasoner;
