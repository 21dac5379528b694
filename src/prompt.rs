//! Prompt assembly for the completion endpoint.
//!
//! Two modes, selected by the caller's retrieval flag:
//!
//! - retrieval on: the retrieved context block is embedded between
//!   `<context>` tags under a fixed instruction preamble, and the distinct
//!   `relative_path` values become the referenced document set. Zero hits
//!   produce no prompt at all; the caller must not request a completion.
//! - retrieval off: a minimal `Question:/Answer:` template around the bare
//!   question, with the document set disabled (links are skipped entirely,
//!   not resolved as an empty batch).

use std::collections::BTreeSet;

use crate::models::{DocumentRefs, SearchResponse};

/// Instruction preamble for retrieval-augmented prompts. The contract: the
/// model answers only from the supplied context, admits when the context has
/// no answer, and never mentions that context was used.
const CONTEXT_PREAMBLE: &str = "\
You are an expert assistant that extracts information from the CONTEXT \
provided between the <context> and </context> tags. Answer the question \
contained between the <question> and </question> tags concisely and without \
making anything up. Only answer if the information can be extracted from the \
CONTEXT; if you do not have the information, say so. Do not mention the \
CONTEXT in your answer.";

/// An assembled prompt plus the documents it references.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptBundle {
    pub prompt: String,
    pub refs: DocumentRefs,
}

/// Build a retrieval-augmented prompt, or `None` when there is no context to
/// ground an answer in.
pub fn rag_prompt(question: &str, context: &SearchResponse) -> Option<PromptBundle> {
    if context.is_empty() {
        return None;
    }

    let context_block = serde_json::to_string_pretty(context).unwrap_or_default();
    let prompt = format!(
        "{CONTEXT_PREAMBLE}\n\n<context>\n{context_block}\n</context>\n<question>\n{question}\n</question>\nAnswer:"
    );

    let paths: BTreeSet<String> = context
        .results
        .iter()
        .map(|hit| hit.relative_path.clone())
        .collect();

    Some(PromptBundle {
        prompt,
        refs: DocumentRefs::Paths(paths),
    })
}

/// Build the minimal prompt used when retrieval is disabled.
pub fn plain_prompt(question: &str) -> PromptBundle {
    PromptBundle {
        prompt: format!("Question:\n{question}\nAnswer:"),
        refs: DocumentRefs::Disabled,
    }
}
