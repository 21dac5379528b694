//! The seam between orchestration and the hosted platform services.
//!
//! Every network edge the assistant touches (category listing, search,
//! completion, stage listing, URL signing) goes through the [`Platform`]
//! trait. Production code uses [`crate::client::PlatformClient`]; tests
//! substitute an in-process double.
//!
//! None of these operations retry: a failure is terminal for the current
//! interaction and is surfaced by the caller as a diagnostic.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{CategoryFilter, ModelId, SearchResponse};

#[async_trait]
pub trait Platform: Send + Sync {
    /// Distinct document categories known to the corpus, in whatever order
    /// the platform returns them.
    async fn list_categories(&self) -> Result<Vec<String>>;

    /// Top-`limit` ranked snippets for `query`, optionally constrained by an
    /// equality filter on category.
    async fn search(
        &self,
        query: &str,
        filter: &CategoryFilter,
        limit: usize,
    ) -> Result<SearchResponse>;

    /// Generated text for `prompt` from the given model, or `None` when the
    /// response carries no text field.
    async fn complete(&self, model: &ModelId, prompt: &str) -> Result<Option<String>>;

    /// Names of the files stored on the document stage.
    async fn list_documents(&self) -> Result<Vec<String>>;

    /// A time-limited signed URL for one stored document.
    async fn signed_url(&self, path: &str) -> Result<String>;
}

#[async_trait]
impl<P: Platform + ?Sized> Platform for Arc<P> {
    async fn list_categories(&self) -> Result<Vec<String>> {
        (**self).list_categories().await
    }

    async fn search(
        &self,
        query: &str,
        filter: &CategoryFilter,
        limit: usize,
    ) -> Result<SearchResponse> {
        (**self).search(query, filter, limit).await
    }

    async fn complete(&self, model: &ModelId, prompt: &str) -> Result<Option<String>> {
        (**self).complete(model, prompt).await
    }

    async fn list_documents(&self) -> Result<Vec<String>> {
        (**self).list_documents().await
    }

    async fn signed_url(&self, path: &str) -> Result<String> {
        (**self).signed_url(path).await
    }
}
