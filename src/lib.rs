//! # docchat
//!
//! A chat assistant over hosted document search and LLM completion services.
//!
//! Questions are answered by an external data platform: a hosted search
//! service retrieves ranked document chunks, a hosted completion endpoint
//! generates the answer, and a document stage serves signed links to the
//! source files. The local code is one linear request/response cycle per
//! question plus a thin UI: no local index, storage, or concurrency.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌─────────────────────┐
//! │   UI     │──▶│   Assistant   │──▶│   PlatformClient    │
//! │ page/CLI │   │ ask() cycle   │   │ search · complete   │
//! └──────────┘   └───────────────┘   │ stage · signed URLs │
//!                                    └─────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Typed domain records |
//! | [`platform`] | Trait seam over the hosted services |
//! | [`client`] | HTTP client for the platform gateway |
//! | [`prompt`] | Prompt assembly and document-reference extraction |
//! | [`chat`] | The per-question orchestration cycle |
//! | [`server`] | Chat page and JSON API |

pub mod chat;
pub mod client;
pub mod config;
pub mod models;
pub mod platform;
pub mod prompt;
pub mod server;
