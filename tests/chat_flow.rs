//! End-to-end tests for the question/answer cycle, driven against an
//! in-process platform double that records every call it receives.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use docchat::chat::Assistant;
use docchat::models::{
    AskOptions, CategoryFilter, DocumentRefs, ModelId, SearchHit, SearchResponse,
};
use docchat::platform::Platform;

#[derive(Default)]
struct MockPlatform {
    hits: Vec<SearchHit>,
    categories: Vec<String>,
    documents: Vec<String>,
    answer: Option<String>,
    fail_categories: bool,
    fail_documents: bool,
    fail_search: bool,
    fail_complete: bool,
    fail_url_for: Option<String>,
    search_calls: Mutex<Vec<(String, CategoryFilter, usize)>>,
    complete_calls: Mutex<Vec<(ModelId, String)>>,
    url_calls: Mutex<Vec<String>>,
}

#[async_trait]
impl Platform for MockPlatform {
    async fn list_categories(&self) -> Result<Vec<String>> {
        if self.fail_categories {
            return Err(anyhow!("category backend down"));
        }
        Ok(self.categories.clone())
    }

    async fn search(
        &self,
        query: &str,
        filter: &CategoryFilter,
        limit: usize,
    ) -> Result<SearchResponse> {
        self.search_calls
            .lock()
            .unwrap()
            .push((query.to_string(), filter.clone(), limit));
        if self.fail_search {
            return Err(anyhow!("search backend down"));
        }
        Ok(SearchResponse {
            results: self.hits.iter().take(limit).cloned().collect(),
        })
    }

    async fn complete(&self, model: &ModelId, prompt: &str) -> Result<Option<String>> {
        self.complete_calls
            .lock()
            .unwrap()
            .push((*model, prompt.to_string()));
        if self.fail_complete {
            return Err(anyhow!("completion backend down"));
        }
        Ok(self.answer.clone())
    }

    async fn list_documents(&self) -> Result<Vec<String>> {
        if self.fail_documents {
            return Err(anyhow!("stage listing down"));
        }
        Ok(self.documents.clone())
    }

    async fn signed_url(&self, path: &str) -> Result<String> {
        self.url_calls.lock().unwrap().push(path.to_string());
        if self.fail_url_for.as_deref() == Some(path) {
            return Err(anyhow!("signing failed for {}", path));
        }
        Ok(format!("https://signed.example.com/{}?token=abc", path))
    }
}

fn hit(chunk: &str, path: &str) -> SearchHit {
    SearchHit {
        chunk: chunk.to_string(),
        relative_path: path.to_string(),
        category: "Bikes".to_string(),
    }
}

fn assistant(mock: MockPlatform) -> (Arc<MockPlatform>, Assistant<Arc<MockPlatform>>) {
    let mock = Arc::new(mock);
    let assistant = Assistant::new(mock.clone(), 3);
    (mock, assistant)
}

#[tokio::test]
async fn test_rag_flow_answers_and_links() {
    let (mock, assistant) = assistant(MockPlatform {
        hits: vec![
            hit("Use PTFE-based chain oil on the premium bike.", "a.pdf"),
            hit("Re-lubricate the chain every 500 km.", "b.pdf"),
        ],
        answer: Some("Use a PTFE-based chain oil.".to_string()),
        ..Default::default()
    });

    let outcome = assistant
        .ask(
            "What lubricant for the premium bike?",
            &AskOptions::default(),
        )
        .await;

    // One search with the sentinel filter and the configured limit.
    let searches = mock.search_calls.lock().unwrap();
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].0, "What lubricant for the premium bike?");
    assert_eq!(searches[0].1, CategoryFilter::All);
    assert_eq!(searches[0].2, 3);

    // The composed prompt carries both snippets and the question.
    let completions = mock.complete_calls.lock().unwrap();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].0, ModelId::Mixtral8x7b);
    let prompt = &completions[0].1;
    assert!(prompt.contains("Use PTFE-based chain oil on the premium bike."));
    assert!(prompt.contains("Re-lubricate the chain every 500 km."));
    assert!(prompt.contains("What lubricant for the premium bike?"));

    assert_eq!(outcome.answer.as_deref(), Some("Use a PTFE-based chain oil."));
    let paths = outcome.refs.paths().unwrap();
    assert_eq!(paths.len(), 2);
    assert!(paths.contains("a.pdf") && paths.contains("b.pdf"));

    assert_eq!(outcome.links.len(), 2);
    assert_eq!(outcome.links[0].label, "a.pdf");
    assert_eq!(
        outcome.links[0].url,
        "https://signed.example.com/a.pdf?token=abc"
    );
    assert_eq!(outcome.links[1].label, "b.pdf");
    assert!(outcome.diagnostics.is_empty());
}

#[tokio::test]
async fn test_category_filter_is_passed_exactly() {
    let (mock, assistant) = assistant(MockPlatform {
        hits: vec![hit("text", "a.pdf")],
        answer: Some("ok".to_string()),
        ..Default::default()
    });

    let opts = AskOptions {
        category: CategoryFilter::from_selection("Bikes"),
        ..Default::default()
    };
    assistant.ask("q", &opts).await;

    let searches = mock.search_calls.lock().unwrap();
    assert_eq!(
        searches[0].1,
        CategoryFilter::Category("Bikes".to_string())
    );
    assert_eq!(
        searches[0].1.to_filter_object().unwrap(),
        serde_json::json!({ "@eq": { "category": "Bikes" } })
    );
}

#[tokio::test]
async fn test_snippet_count_capped_at_limit() {
    let (mock, assistant) = assistant(MockPlatform {
        hits: vec![
            hit("one", "1.pdf"),
            hit("two", "2.pdf"),
            hit("three", "3.pdf"),
            hit("four", "4.pdf"),
            hit("five", "5.pdf"),
        ],
        answer: Some("ok".to_string()),
        ..Default::default()
    });

    let outcome = assistant.ask("q", &AskOptions::default()).await;

    assert_eq!(mock.search_calls.lock().unwrap()[0].2, 3);
    // Only the top three documents are referenced.
    assert_eq!(outcome.refs.paths().unwrap().len(), 3);
}

#[tokio::test]
async fn test_retrieval_off_uses_minimal_prompt_and_skips_links() {
    let (mock, assistant) = assistant(MockPlatform {
        hits: vec![hit("should not be used", "a.pdf")],
        answer: Some("General knowledge answer.".to_string()),
        ..Default::default()
    });

    let opts = AskOptions {
        use_retrieval: false,
        ..Default::default()
    };
    let outcome = assistant.ask("What is the warranty period?", &opts).await;

    assert!(mock.search_calls.lock().unwrap().is_empty());
    let completions = mock.complete_calls.lock().unwrap();
    assert_eq!(
        completions[0].1,
        "Question:\nWhat is the warranty period?\nAnswer:"
    );

    // Sentinel, not an empty set: link resolution is skipped entirely.
    assert_eq!(outcome.refs, DocumentRefs::Disabled);
    assert!(mock.url_calls.lock().unwrap().is_empty());
    assert!(outcome.links.is_empty());
    assert_eq!(
        outcome.answer.as_deref(),
        Some("General knowledge answer.")
    );
}

#[tokio::test]
async fn test_empty_retrieval_never_requests_completion() {
    let (mock, assistant) = assistant(MockPlatform {
        answer: Some("should never be produced".to_string()),
        ..Default::default()
    });

    let outcome = assistant.ask("q", &AskOptions::default()).await;

    assert!(mock.complete_calls.lock().unwrap().is_empty());
    assert!(outcome.answer.is_none());
    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| d.contains("No matching context")));
}

#[tokio::test]
async fn test_duplicate_paths_referenced_once() {
    let (mock, assistant) = assistant(MockPlatform {
        hits: vec![
            hit("first chunk", "manual.pdf"),
            hit("second chunk", "manual.pdf"),
        ],
        answer: Some("ok".to_string()),
        ..Default::default()
    });

    let outcome = assistant.ask("q", &AskOptions::default()).await;

    assert_eq!(outcome.refs.paths().unwrap().len(), 1);
    assert_eq!(mock.url_calls.lock().unwrap().len(), 1);
    assert_eq!(outcome.links.len(), 1);
    assert_eq!(outcome.links[0].label, "manual.pdf");
}

#[tokio::test]
async fn test_whitespace_completion_counts_as_no_answer() {
    let (mock, assistant) = assistant(MockPlatform {
        hits: vec![hit("text", "a.pdf")],
        answer: Some("   \n".to_string()),
        ..Default::default()
    });

    let outcome = assistant.ask("q", &AskOptions::default()).await;

    assert!(outcome.answer.is_none());
    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| d.contains("Completion returned no answer")));
    // No answer rendered, so no links are resolved.
    assert!(mock.url_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_failure_surfaces_and_short_circuits() {
    let (mock, assistant) = assistant(MockPlatform {
        fail_search: true,
        answer: Some("should never be produced".to_string()),
        ..Default::default()
    });

    let outcome = assistant.ask("q", &AskOptions::default()).await;

    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| d.contains("Search failed") && d.contains("search backend down")));
    assert!(mock.complete_calls.lock().unwrap().is_empty());
    assert!(outcome.answer.is_none());
}

#[tokio::test]
async fn test_completion_failure_surfaces_diagnostic() {
    let (mock, assistant) = assistant(MockPlatform {
        hits: vec![hit("text", "a.pdf")],
        fail_complete: true,
        ..Default::default()
    });

    let outcome = assistant.ask("q", &AskOptions::default()).await;

    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| d.contains("Completion failed")));
    assert!(outcome.answer.is_none());
    assert!(mock.url_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_link_failure_keeps_answer_and_earlier_links() {
    let (_mock, assistant) = assistant(MockPlatform {
        hits: vec![hit("first", "a.pdf"), hit("second", "b.pdf")],
        answer: Some("ok".to_string()),
        fail_url_for: Some("b.pdf".to_string()),
        ..Default::default()
    });

    let outcome = assistant.ask("q", &AskOptions::default()).await;

    assert_eq!(outcome.answer.as_deref(), Some("ok"));
    assert_eq!(outcome.links.len(), 1);
    assert_eq!(outcome.links[0].label, "a.pdf");
    // One diagnostic for the whole batch, not one per path.
    let link_diags: Vec<_> = outcome
        .diagnostics
        .iter()
        .filter(|d| d.contains("Failed to generate document links"))
        .collect();
    assert_eq!(link_diags.len(), 1);
}

#[tokio::test]
async fn test_categories_start_with_sentinel_in_platform_order() {
    let (_mock, assistant) = assistant(MockPlatform {
        categories: vec!["Snow".to_string(), "Bikes".to_string()],
        ..Default::default()
    });

    let (categories, diagnostic) = assistant.categories().await;
    assert_eq!(categories, vec!["ALL", "Snow", "Bikes"]);
    assert!(diagnostic.is_none());
}

#[tokio::test]
async fn test_categories_fall_back_to_sentinel_on_failure() {
    let (_mock, assistant) = assistant(MockPlatform {
        fail_categories: true,
        ..Default::default()
    });

    let (categories, diagnostic) = assistant.categories().await;
    assert_eq!(categories, vec!["ALL"]);
    assert!(diagnostic.unwrap().contains("Failed to fetch categories"));
}

#[tokio::test]
async fn test_document_listing_failure_yields_empty_list() {
    let (_mock, assistant) = assistant(MockPlatform {
        fail_documents: true,
        ..Default::default()
    });

    let (documents, diagnostic) = assistant.documents().await;
    assert!(documents.is_empty());
    assert!(diagnostic.unwrap().contains("Failed to fetch document list"));
}

#[tokio::test]
async fn test_context_payload_exposed_for_debugging() {
    let (_mock, assistant) = assistant(MockPlatform {
        hits: vec![hit("text", "a.pdf")],
        answer: Some("ok".to_string()),
        ..Default::default()
    });

    let outcome = assistant.ask("q", &AskOptions::default()).await;

    let context = outcome.context.unwrap();
    assert_eq!(context["results"][0]["relative_path"], "a.pdf");
}
