//! Core data types flowing through a single question/answer cycle.
//!
//! Everything here is request-scoped: produced for one question and dropped
//! afterwards. The loose JSON the hosted services speak is parsed into these
//! records at the client boundary and stays typed from there on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// The closed set of completion models the platform serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelId {
    #[serde(rename = "mixtral-8x7b")]
    Mixtral8x7b,
    #[serde(rename = "snowflake-arctic")]
    SnowflakeArctic,
    #[serde(rename = "mistral-large")]
    MistralLarge,
    #[serde(rename = "llama3-8b")]
    Llama3_8b,
    #[serde(rename = "llama3-70b")]
    Llama3_70b,
    #[serde(rename = "reka-flash")]
    RekaFlash,
    #[serde(rename = "mistral-7b")]
    Mistral7b,
    #[serde(rename = "llama2-70b-chat")]
    Llama2_70bChat,
    #[serde(rename = "gemma-7b")]
    Gemma7b,
}

impl ModelId {
    /// All supported models, in the order they are offered in the UI.
    pub const ALL: [ModelId; 9] = [
        ModelId::Mixtral8x7b,
        ModelId::SnowflakeArctic,
        ModelId::MistralLarge,
        ModelId::Llama3_8b,
        ModelId::Llama3_70b,
        ModelId::RekaFlash,
        ModelId::Mistral7b,
        ModelId::Llama2_70bChat,
        ModelId::Gemma7b,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Mixtral8x7b => "mixtral-8x7b",
            ModelId::SnowflakeArctic => "snowflake-arctic",
            ModelId::MistralLarge => "mistral-large",
            ModelId::Llama3_8b => "llama3-8b",
            ModelId::Llama3_70b => "llama3-70b",
            ModelId::RekaFlash => "reka-flash",
            ModelId::Mistral7b => "mistral-7b",
            ModelId::Llama2_70bChat => "llama2-70b-chat",
            ModelId::Gemma7b => "gemma-7b",
        }
    }
}

impl Default for ModelId {
    fn default() -> Self {
        ModelId::Mixtral8x7b
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::ALL
            .iter()
            .find(|m| m.as_str() == s)
            .copied()
            .ok_or_else(|| {
                let valid: Vec<&str> = ModelId::ALL.iter().map(|m| m.as_str()).collect();
                format!("unknown model '{}'. Valid models: {}", s, valid.join(", "))
            })
    }
}

/// Category constraint applied to a search request.
///
/// `All` is the sentinel selection meaning no filtering; anything else
/// becomes an equality filter on that exact category value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Category(String),
}

impl CategoryFilter {
    /// Sentinel shown first in the category selector.
    pub const ALL_SENTINEL: &'static str = "ALL";

    pub fn from_selection(value: &str) -> Self {
        if value == Self::ALL_SENTINEL {
            CategoryFilter::All
        } else {
            CategoryFilter::Category(value.to_string())
        }
    }

    /// The filter object sent to the search service, or `None` for `All`.
    pub fn to_filter_object(&self) -> Option<serde_json::Value> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Category(value) => {
                Some(serde_json::json!({ "@eq": { "category": value } }))
            }
        }
    }
}

/// One retrieved context snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: String,
    pub relative_path: String,
    pub category: String,
}

/// Ranked snippets returned by the search service, at most `num_chunks` long.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

impl SearchResponse {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Source documents referenced by the retrieved context.
///
/// `Disabled` is the sentinel used when retrieval is off: link resolution is
/// skipped entirely, which is not the same as resolving zero links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentRefs {
    Disabled,
    Paths(BTreeSet<String>),
}

impl DocumentRefs {
    pub fn is_disabled(&self) -> bool {
        matches!(self, DocumentRefs::Disabled)
    }

    pub fn paths(&self) -> Option<&BTreeSet<String>> {
        match self {
            DocumentRefs::Disabled => None,
            DocumentRefs::Paths(paths) => Some(paths),
        }
    }
}

/// Per-question settings, passed explicitly through the call chain.
#[derive(Debug, Clone)]
pub struct AskOptions {
    pub model: ModelId,
    pub category: CategoryFilter,
    pub use_retrieval: bool,
}

impl Default for AskOptions {
    fn default() -> Self {
        Self {
            model: ModelId::default(),
            category: CategoryFilter::All,
            use_retrieval: true,
        }
    }
}

/// A resolved, time-limited link to a source document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocLink {
    pub path: String,
    pub label: String,
    pub url: String,
}

/// Display label for a document path: its basename.
pub fn display_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
