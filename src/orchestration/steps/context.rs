use super::{StepContext, StepExecutor};
use crate::orchestration::checklist::StepKind;
use crate::orchestration::error::OrchestratorError;
use crate::orchestration::records::ContextMapping;
use crate::orchestration::state::{StepOutput, TaskState};
use crate::provider::parse_embedded;

/// Maps current events in the request onto the Rebbe's teachings and prophecies.
pub struct ContextStep;

impl StepExecutor for ContextStep {
    fn kind(&self) -> StepKind {
        StepKind::Context
    }

    fn run(&self, ctx: &StepContext<'_>, state: &TaskState) -> Result<StepOutput, OrchestratorError> {
        let output = ctx.complete(StepKind::Context, &context_prompt(&state.user_input))?;
        let mapping: ContextMapping =
            parse_embedded(&output).map_err(|err| ctx.step_error(StepKind::Context, err))?;
        Ok(StepOutput::Context(mapping))
    }
}

fn context_prompt(user_input: &str) -> String {
    format!(
        r#"Extract current events mentioned in this query and map to Rebbe's teachings:

Query: "{user_input}"

Return JSON:
{{
    "current_events": ["event1", "event2"],
    "rebbe_prophecies": [
        {{"prophecy": "description", "year": "YYYY", "fulfillment": "how it relates"}}
    ],
    "relevant_sichos": ["sicha1", "sicha2"]
}}"#
    )
}
