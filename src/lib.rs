//! Semantic code search core: chunking, embedding, vector indexing,
//! and ranked retrieval across indexed projects, exposed as an MCP
//! tool surface.
//!
//! See `SPEC_FULL.md` and `DESIGN.md` at the workspace root for the
//! requirements this crate implements and how each module is
//! grounded.

pub mod config;
pub mod context;
pub mod domain;
pub mod embedding;
pub mod index;
pub mod indexer;
pub mod queue;
pub mod search;
pub mod server;
pub mod store;
pub mod vectormath;
