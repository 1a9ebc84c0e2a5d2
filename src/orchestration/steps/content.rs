use super::{StepContext, StepExecutor};
use crate::orchestration::checklist::StepKind;
use crate::orchestration::error::OrchestratorError;
use crate::orchestration::records::{ContentSection, DraftedContent};
use crate::orchestration::state::{StepOutput, TaskState};
use crate::provider::{parse_embedded, ProviderError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ContentReply {
    sections: Vec<ContentSection>,
}

/// Drafts the deliverable from the research (and context, when present) as
/// timed sections.
pub struct ContentStep;

impl StepExecutor for ContentStep {
    fn kind(&self) -> StepKind {
        StepKind::Content
    }

    fn run(&self, ctx: &StepContext<'_>, state: &TaskState) -> Result<StepOutput, OrchestratorError> {
        let output = ctx.complete(StepKind::Content, &content_prompt(state))?;
        let reply: ContentReply =
            parse_embedded(&output).map_err(|err| ctx.step_error(StepKind::Content, err))?;
        let sections: Vec<ContentSection> = reply
            .sections
            .into_iter()
            .filter(|section| !section.text.trim().is_empty())
            .collect();
        if sections.is_empty() {
            return Err(ctx.step_error(
                StepKind::Content,
                ProviderError::ParseFailure {
                    reason: "content reply has no non-empty sections".to_string(),
                },
            ));
        }
        Ok(StepOutput::Content(DraftedContent::from_sections(sections)))
    }
}

fn content_prompt(state: &TaskState) -> String {
    let sources_text = state
        .sources
        .iter()
        .flatten()
        .map(|source| {
            if source.topic.trim().is_empty() {
                format!("- {}", source.citation)
            } else {
                format!("- {}: {}", source.citation, source.topic)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    let context = state
        .context
        .as_ref()
        .and_then(|mapping| serde_json::to_string_pretty(mapping).ok())
        .unwrap_or_else(|| "{}".to_string());

    format!(
        r#"Generate a {deliverable} based on these sources:

{sources_text}

User request: {user_input}

Current events context: {context}

Create structured content with:
1. Opening (1 minute)
2. Main points (3-4 minutes each)
3. Practical application (1 minute)
4. Closing (30 seconds)

Include exact citations and timing cues. Return JSON:
{{
    "sections": [
        {{"kind": "opening|main_point|application|closing", "title": "...", "duration_seconds": 60, "text": "...", "citations": ["..."]}}
    ]
}}"#,
        deliverable = state.task_type.deliverable(),
        user_input = state.user_input,
    )
}
