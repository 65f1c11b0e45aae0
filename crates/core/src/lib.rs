//! Core library for dockgen
//!
//! This crate implements the **Functional Core** of the dockgen application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The dockgen project uses a two-crate architecture to enforce separation of concerns:
//!
//! - **`dockgen_core`** (this crate): Pure transformation functions with zero I/O
//! - **`dockgen`**: I/O operations and orchestration (the Imperative Shell)
//!
//! ## Functional Core Principles
//!
//! All functions in this crate adhere to these principles:
//!
//! - **Pure functions**: Same input always produces the same output
//! - **No side effects**: No I/O operations, no external state mutations
//! - **Deterministic**: Behavior is predictable and reproducible
//! - **Testable**: Can be tested with simple fixture data, no mocking required
//!
//! The shell talks to two external collaborators: repomix, which flattens a
//! repository into one text blob, and an OpenAI-compatible model, which turns
//! that blob into a Docker configuration. Neither sends data we can trust, so
//! everything that decides what their output means lives here.
//!
//! # Module Organization
//!
//! - [`context`]: File selection policy, repository location checks, context
//!   size bound and context builder failure classification
//! - [`docker`]: Prompt assembly, response normalization, schema validation and
//!   the client-facing error taxonomy
//! - [`models`]: Filtering of the provider's model listing
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use dockgen_core::docker::{build_prompt, parse_generation_result, strip_code_fence};
//!
//! let prompt = build_prompt("<file path=\"main.py\">...</file>");
//!
//! // ...send `prompt` to the model...
//!
//! let result = parse_generation_result(&strip_code_fence(&raw_model_output))?;
//! assert_eq!(result.dockerfile.language.as_str(), "dockerfile");
//! ```

pub mod context;
pub mod docker;
pub mod models;
