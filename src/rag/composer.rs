//! Answer composition: fill the instruction template and ask the chat model
//!
//! The model's reply is returned exactly as produced. The source-link line is
//! inspected afterwards and reported, never rewritten.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::cases::types::LABEL_SOURCE_LINK;
use crate::errors::{RagError, Result};
use crate::llm::CompletionProvider;
use crate::rag::context::AssembledContext;

/// Reply used when no case could be retrieved
pub const FALLBACK_ANSWER: &str = "유사한 사례가 없습니다. 좀 더 구체적인 상황 설명이 필요합니다.";

/// Fill the fixed instruction template
pub fn render_prompt(documents: &str, question: &str) -> String {
    format!(
        "\n\
         당신은 사고 상황을 설명하면 과실비율을 알려주는 챗봇입니다.\n\
         질문을 보고 참고 문서의 사고 설명과 가장 유사한 사고유형을 찾고, 먼저 사고 설명을 말해줍니다.\n\
         그다음 과실비율을 알려줍니다.\n\
         또한 마지막에 관례 판결을 보고 싶으면 사고 링크를 제공해줍니다.\n\
         사고 링크는 반드시 포함되어야 합니다.\n\
         사고 링크는 \"사고 링크: [링크]\" 형식으로 작성해주세요.\n\
         유사한 사례가 없다면 \"{fallback}\" 라고 말하세요.\n\
         대답은 한국어로 해주세요.\n\
         \n\
         # 참고 문서: {documents}\n\
         \n\
         # 질문: {question}\n",
        fallback = FALLBACK_ANSWER,
        documents = documents,
        question = question,
    )
}

/// Pull the URL out of the first `사고 링크:` line, if any.
///
/// Accepts bare URLs, `[url]`, `<url>` and markdown `[text](url)` forms.
pub fn extract_source_link(answer: &str) -> Option<String> {
    let label = format!("{}:", LABEL_SOURCE_LINK);

    for line in answer.lines() {
        let Some(pos) = line.find(&label) else {
            continue;
        };
        let rest = line[pos + label.len()..].trim();

        if let Some(start) = rest.find("http") {
            let url: String = rest[start..]
                .chars()
                .take_while(|c| !c.is_whitespace() && !matches!(c, ')' | ']' | '>' | '"' | '\''))
                .collect();
            if !url.is_empty() {
                return Some(url);
            }
        }

        let bare = rest.trim_matches(|c: char| matches!(c, '[' | ']' | '<' | '>' | '*' | '`'));
        if !bare.is_empty() {
            return Some(bare.to_string());
        }
    }
    None
}

/// A composed answer with its inspection report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedAnswer {
    /// Raw model output, or the fallback sentence
    pub text: String,
    /// Link found on the `사고 링크:` line
    pub source_link: Option<String>,
    /// Whether that link belongs to one of the retrieved cases
    pub link_retrieved: bool,
    /// True when the fallback sentence was returned without a model call
    pub fallback: bool,
}

/// Composes answers from retrieved context
pub struct AnswerComposer {
    completer: Arc<dyn CompletionProvider>,
}

impl AnswerComposer {
    pub fn new(completer: Arc<dyn CompletionProvider>) -> Self {
        Self { completer }
    }

    /// Generate an answer for `question` grounded on `context`
    pub async fn compose(&self, context: &AssembledContext, question: &str) -> Result<ComposedAnswer> {
        if question.trim().is_empty() {
            return Err(RagError::EmptyQuery);
        }

        if context.is_empty() {
            tracing::info!("No similar cases retrieved; returning fallback answer");
            return Ok(ComposedAnswer {
                text: FALLBACK_ANSWER.to_string(),
                source_link: None,
                link_retrieved: false,
                fallback: true,
            });
        }

        let prompt = render_prompt(&context.text, question);
        let started = Instant::now();
        let text = self.completer.complete(&prompt).await?;

        tracing::debug!(
            model = self.completer.name(),
            prompt_chars = prompt.chars().count(),
            answer_chars = text.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generated answer"
        );

        let source_link = extract_source_link(&text);
        let link_retrieved = match &source_link {
            Some(link) => context.source_links.iter().any(|l| l == link),
            None => false,
        };

        match &source_link {
            None => tracing::warn!("Answer does not cite a source link"),
            Some(link) if !link_retrieved => {
                tracing::warn!(link = %link, "Answer cites a link outside the retrieved cases")
            }
            Some(_) => {}
        }

        Ok(ComposedAnswer {
            text,
            source_link,
            link_retrieved,
            fallback: false,
        })
    }
}
