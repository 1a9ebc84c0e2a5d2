use crate::orchestration::checklist::{StepKind, TaskType};
use crate::orchestration::records::{
    ContextMapping, DraftedContent, LinkCheck, SourceRecord, TranslationSet,
};
use crate::orchestration::state::TaskState;
use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalResult {
    pub task_id: String,
    pub task_type: TaskType,
    pub completed_steps: Vec<StepKind>,
    #[serde(default)]
    pub sources: Vec<SourceRecord>,
    #[serde(default)]
    pub content: DraftedContent,
    #[serde(default)]
    pub verified_links: Vec<LinkCheck>,
    #[serde(default)]
    pub broken_links: Vec<String>,
    #[serde(default)]
    pub context: ContextMapping,
    #[serde(default)]
    pub translations: TranslationSet,
    pub generated_at: String,
}

impl FinalResult {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Collects whatever outputs are present; missing ones become empty defaults.
/// Partial states assemble without error.
pub fn assemble(state: &TaskState, now: i64) -> FinalResult {
    let links = state.links.clone().unwrap_or_default();
    FinalResult {
        task_id: state.task_id.to_string(),
        task_type: state.task_type,
        completed_steps: state.completed_steps.clone(),
        sources: state.sources.clone().unwrap_or_default(),
        content: state.content.clone().unwrap_or_default(),
        verified_links: links.verified,
        broken_links: links.broken,
        context: state.context.clone().unwrap_or_default(),
        translations: state.translations.clone().unwrap_or_default(),
        generated_at: rfc3339(now),
    }
}

pub fn rfc3339(now: i64) -> String {
    DateTime::from_timestamp(now, 0)
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| now.to_string())
}
