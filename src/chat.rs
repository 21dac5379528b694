//! The per-question orchestration cycle.
//!
//! [`Assistant::ask`] runs the single linear chain behind one user question:
//! retrieve context (when enabled) → build the prompt → request a completion
//! → resolve source-document links. Every external call is guarded at its
//! call site: a failure becomes a diagnostic naming the operation and is
//! replaced by a safe default, never a crash. Nothing retries and nothing
//! runs concurrently with anything else.

use std::collections::BTreeSet;

use crate::models::{
    display_name, AskOptions, CategoryFilter, DocLink, DocumentRefs, SearchResponse,
};
use crate::platform::Platform;
use crate::prompt;

/// Everything one question produced: the answer (if any), resolved links,
/// the referenced document set, accumulated diagnostics, and the raw context
/// payload for the debug panel.
#[derive(Debug)]
pub struct AskOutcome {
    pub answer: Option<String>,
    pub links: Vec<DocLink>,
    pub refs: DocumentRefs,
    pub diagnostics: Vec<String>,
    pub context: Option<serde_json::Value>,
}

impl AskOutcome {
    fn new() -> Self {
        Self {
            answer: None,
            links: Vec::new(),
            refs: DocumentRefs::Disabled,
            diagnostics: Vec::new(),
            context: None,
        }
    }
}

/// The chat orchestrator. Owns the injected platform handle and the
/// retrieval limit; holds no per-question state.
pub struct Assistant<P: Platform> {
    platform: P,
    num_chunks: usize,
}

impl<P: Platform> Assistant<P> {
    pub fn new(platform: P, num_chunks: usize) -> Self {
        Self {
            platform,
            num_chunks,
        }
    }

    /// Category values for the filter selector: the `ALL` sentinel first,
    /// then the discovered categories in platform order. Any error falls
    /// back to the sentinel alone; this populates a UI control, it is not
    /// a correctness-critical path.
    pub async fn categories(&self) -> (Vec<String>, Option<String>) {
        let mut out = vec![CategoryFilter::ALL_SENTINEL.to_string()];
        match self.platform.list_categories().await {
            Ok(discovered) => {
                out.extend(discovered);
                (out, None)
            }
            Err(e) => (out, Some(format!("Failed to fetch categories: {e:#}"))),
        }
    }

    /// File names stored on the document stage, for display. Errors yield an
    /// empty list plus a diagnostic; the page still renders.
    pub async fn documents(&self) -> (Vec<String>, Option<String>) {
        match self.platform.list_documents().await {
            Ok(files) => (files, None),
            Err(e) => (
                Vec::new(),
                Some(format!("Failed to fetch document list: {e:#}")),
            ),
        }
    }

    /// Answer one question. See the module docs for the flow; the notable
    /// edge cases:
    ///
    /// - retrieval enabled but zero hits: no prompt is built and the
    ///   completion endpoint is never called.
    /// - a completion whose text is absent or trims to empty counts as no
    ///   answer and is reported, not rendered.
    /// - links are resolved only after a rendered answer, and only when the
    ///   document set is not the disabled sentinel.
    pub async fn ask(&self, question: &str, opts: &AskOptions) -> AskOutcome {
        let mut outcome = AskOutcome::new();

        let bundle = if opts.use_retrieval {
            let context = match self
                .platform
                .search(question, &opts.category, self.num_chunks)
                .await
            {
                Ok(context) => context,
                Err(e) => {
                    outcome.diagnostics.push(format!("Search failed: {e:#}"));
                    SearchResponse::default()
                }
            };
            outcome.context = serde_json::to_value(&context).ok();

            match prompt::rag_prompt(question, &context) {
                Some(bundle) => bundle,
                None => {
                    outcome
                        .diagnostics
                        .push("No matching context found for this question.".to_string());
                    return outcome;
                }
            }
        } else {
            prompt::plain_prompt(question)
        };

        outcome.refs = bundle.refs.clone();

        match self.platform.complete(&opts.model, &bundle.prompt).await {
            Ok(Some(text)) if !text.trim().is_empty() => outcome.answer = Some(text),
            Ok(_) => outcome
                .diagnostics
                .push("Completion returned no answer.".to_string()),
            Err(e) => outcome.diagnostics.push(format!("Completion failed: {e:#}")),
        }

        if outcome.answer.is_some() {
            if let DocumentRefs::Paths(paths) = &outcome.refs {
                let (links, diagnostic) = self.resolve_links(paths).await;
                outcome.links = links;
                if let Some(diagnostic) = diagnostic {
                    outcome.diagnostics.push(diagnostic);
                }
            }
        }

        outcome
    }

    /// Resolve signed links for each referenced path. One failure aborts the
    /// batch with a single diagnostic; links resolved so far are kept. Link
    /// resolution is cosmetic, so this is deliberately coarse.
    async fn resolve_links(&self, paths: &BTreeSet<String>) -> (Vec<DocLink>, Option<String>) {
        let mut links = Vec::new();
        for path in paths {
            match self.platform.signed_url(path).await {
                Ok(url) => links.push(DocLink {
                    label: display_name(path).to_string(),
                    path: path.clone(),
                    url,
                }),
                Err(e) => {
                    return (
                        links,
                        Some(format!("Failed to generate document links: {e:#}")),
                    )
                }
            }
        }
        (links, None)
    }
}
