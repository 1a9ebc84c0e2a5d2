use super::{StepContext, StepExecutor};
use crate::orchestration::checklist::StepKind;
use crate::orchestration::error::OrchestratorError;
use crate::orchestration::records::SourceRecord;
use crate::orchestration::state::{StepOutput, TaskState};
use crate::provider::parse_embedded;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ResearchReply {
    #[serde(default)]
    search_terms: Vec<String>,
    #[serde(default)]
    sources: Vec<SourceRecord>,
}

/// Finds citations in the Rebbe's sichos, igros kodesh and the halachic
/// sources he referenced.
pub struct ResearchStep;

impl StepExecutor for ResearchStep {
    fn kind(&self) -> StepKind {
        StepKind::Research
    }

    fn run(&self, ctx: &StepContext<'_>, state: &TaskState) -> Result<StepOutput, OrchestratorError> {
        let output = ctx.complete(StepKind::Research, &research_prompt(&state.user_input))?;
        let reply: ResearchReply =
            parse_embedded(&output).map_err(|err| ctx.step_error(StepKind::Research, err))?;

        let sources = reply
            .sources
            .into_iter()
            .filter(|source| !source.citation.trim().is_empty())
            .collect();
        let search_terms = reply
            .search_terms
            .into_iter()
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty())
            .collect();
        Ok(StepOutput::Research {
            sources,
            search_terms,
        })
    }
}

fn research_prompt(user_input: &str) -> String {
    format!(
        r#"You are a research agent specializing in the Lubavitcher Rebbe's teachings.

Given this query: "{user_input}"

Identify:
1. What Sichos (talks) are relevant
2. What Igros Kodesh (letters) might contain related content
3. What Halachic sources the Rebbe referenced

Return as JSON:
{{
    "search_terms": ["term1", "term2"],
    "sources": [
        {{"type": "sicha|igros|halacha", "citation": "Sichos Kodesh 5747, Behar-Bechukosai", "topic": "Shleimus HaAretz", "url": "https://...", "page": "478-482"}}
    ]
}}"#
    )
}
