use super::{StepContext, StepExecutor};
use crate::orchestration::checklist::StepKind;
use crate::orchestration::error::OrchestratorError;
use crate::orchestration::records::TranslationSet;
use crate::orchestration::state::{StepOutput, TaskState};
use crate::provider::parse_embedded;

/// Builds a Hebrew/English glossary for the drafted content. Configured
/// chassidic terms are always kept untranslated.
pub struct TranslationStep;

impl StepExecutor for TranslationStep {
    fn kind(&self) -> StepKind {
        StepKind::Translation
    }

    fn run(&self, ctx: &StepContext<'_>, state: &TaskState) -> Result<StepOutput, OrchestratorError> {
        let output = ctx.complete(
            StepKind::Translation,
            &translation_prompt(state, ctx.preserved_terms),
        )?;
        let mut set: TranslationSet =
            parse_embedded(&output).map_err(|err| ctx.step_error(StepKind::Translation, err))?;
        set.preserved_terms = merge_preserved_terms(ctx.preserved_terms, &set.preserved_terms);
        Ok(StepOutput::Translation(set))
    }
}

/// Configured terms first, then any new ones from the model, case-insensitively
/// deduplicated.
pub fn merge_preserved_terms(configured: &[String], suggested: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for term in configured.iter().chain(suggested) {
        let term = term.trim();
        if term.is_empty() {
            continue;
        }
        if !merged.iter().any(|seen| seen.eq_ignore_ascii_case(term)) {
            merged.push(term.to_string());
        }
    }
    merged
}

fn translation_prompt(state: &TaskState, preserved_terms: &[String]) -> String {
    let text = state
        .content
        .as_ref()
        .map(|content| content.english_text.as_str())
        .filter(|text| !text.trim().is_empty())
        .unwrap_or(state.user_input.as_str());
    format!(
        r#"Translate the key terms of this text between Hebrew and English, preserving Chassidic terminology.

Keep these terms untranslated: {terms}

Text:
{text}

Return JSON:
{{
    "hebrew_to_english": {{"שלימות הארץ": "the integrity of the Land"}},
    "english_to_hebrew": {{"miracle": "נס"}},
    "preserved_terms": ["term1"]
}}"#,
        terms = preserved_terms.join(", ")
    )
}
