use crate::orchestration::assembler::FinalResult;
use crate::orchestration::checklist::{StepKind, TaskType};
use crate::orchestration::error::OrchestratorError;
use crate::orchestration::records::{
    ContextMapping, DraftedContent, LinkReport, SourceRecord, TranslationSet,
};
use crate::shared::TaskId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl RunState {
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (RunState::Queued, RunState::Running)
                | (RunState::Queued, RunState::Failed)
                | (RunState::Running, RunState::Succeeded)
                | (RunState::Running, RunState::Failed)
                | (RunState::Failed, RunState::Running)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Queued => write!(f, "queued"),
            RunState::Running => write!(f, "running"),
            RunState::Succeeded => write!(f, "succeeded"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

/// Output of one step executor. Each variant lands in exactly one field of
/// `TaskState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutput {
    Research {
        sources: Vec<SourceRecord>,
        search_terms: Vec<String>,
    },
    Context(ContextMapping),
    Content(DraftedContent),
    Links(LinkReport),
    Translation(TranslationSet),
}

impl StepOutput {
    pub fn kind(&self) -> StepKind {
        match self {
            StepOutput::Research { .. } => StepKind::Research,
            StepOutput::Context(_) => StepKind::Context,
            StepOutput::Content(_) => StepKind::Content,
            StepOutput::Links(_) => StepKind::Links,
            StepOutput::Translation(_) => StepKind::Translation,
        }
    }

    /// One-line progress note written after the step completes.
    pub fn summary(&self) -> String {
        match self {
            StepOutput::Research { sources, .. } => format!("Found {} sources", sources.len()),
            StepOutput::Context(mapping) => format!(
                "Mapped {} current events to {} teachings",
                mapping.current_events.len(),
                mapping.rebbe_prophecies.len() + mapping.relevant_sichos.len()
            ),
            StepOutput::Content(content) => format!(
                "Drafted {} sections ({}s)",
                content.sections.len(),
                content.total_duration_seconds()
            ),
            StepOutput::Links(report) => format!(
                "Verified {} links, {} broken",
                report.verified.len(),
                report.broken.len()
            ),
            StepOutput::Translation(set) => format!(
                "Mapped {} terms, preserved {}",
                set.hebrew_to_english.len() + set.english_to_hebrew.len(),
                set.preserved_terms.len()
            ),
        }
    }
}

/// The record threaded through every step of one task run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    pub task_id: TaskId,
    pub task_type: TaskType,
    pub user_input: String,
    pub status: RunState,
    #[serde(default)]
    pub completed_steps: Vec<StepKind>,
    #[serde(default)]
    pub sources: Option<Vec<SourceRecord>>,
    #[serde(default)]
    pub search_terms: Vec<String>,
    #[serde(default)]
    pub context: Option<ContextMapping>,
    #[serde(default)]
    pub content: Option<DraftedContent>,
    #[serde(default)]
    pub links: Option<LinkReport>,
    #[serde(default)]
    pub translations: Option<TranslationSet>,
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub final_output: Option<FinalResult>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TaskState {
    pub fn new(
        task_id: TaskId,
        task_type: TaskType,
        user_input: impl Into<String>,
        now: i64,
    ) -> Self {
        Self {
            task_id,
            task_type,
            user_input: user_input.into(),
            status: RunState::Queued,
            completed_steps: Vec::new(),
            sources: None,
            search_terms: Vec::new(),
            context: None,
            content: None,
            links: None,
            translations: None,
            messages: Vec::new(),
            errors: Vec::new(),
            final_output: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self, step: StepKind) -> bool {
        self.completed_steps.contains(&step)
    }

    pub fn has_output(&self, step: StepKind) -> bool {
        match step {
            StepKind::Research => self.sources.is_some(),
            StepKind::Context => self.context.is_some(),
            StepKind::Content => self.content.is_some(),
            StepKind::Links => self.links.is_some(),
            StepKind::Translation => self.translations.is_some(),
        }
    }

    /// Writes a step's output and marks the step complete in one move.
    pub fn apply(&mut self, output: StepOutput, now: i64) -> Result<(), OrchestratorError> {
        let step = output.kind();
        if self.is_completed(step) || self.has_output(step) {
            return Err(OrchestratorError::StepAlreadyCompleted { step });
        }
        match output {
            StepOutput::Research {
                sources,
                search_terms,
            } => {
                self.sources = Some(sources);
                self.search_terms = search_terms;
            }
            StepOutput::Context(mapping) => self.context = Some(mapping),
            StepOutput::Content(content) => self.content = Some(content),
            StepOutput::Links(report) => self.links = Some(report),
            StepOutput::Translation(set) => self.translations = Some(set),
        }
        self.completed_steps.push(step);
        self.updated_at = now;
        Ok(())
    }

    pub fn transition(&mut self, next: RunState, now: i64) -> Result<(), OrchestratorError> {
        if !self.status.can_transition_to(next) {
            return Err(OrchestratorError::InvalidRunTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_final_output(&mut self, result: FinalResult) -> Result<(), OrchestratorError> {
        if self.final_output.is_some() {
            return Err(OrchestratorError::FinalOutputAlreadySet {
                task_id: self.task_id.to_string(),
            });
        }
        self.final_output = Some(result);
        Ok(())
    }

    pub fn push_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Urls of every discovered source, in discovery order, without duplicates.
    pub fn source_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        for url in self
            .sources
            .iter()
            .flatten()
            .filter_map(|source| source.url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
        {
            if !urls.iter().any(|seen| seen == url) {
                urls.push(url.to_string());
            }
        }
        urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::records::SourceType;

    fn sample_state() -> TaskState {
        TaskState::new(
            TaskId::parse("citation_only_1_abcd").expect("id"),
            TaskType::CitationOnly,
            "Find the sicha on Shleimus HaAretz",
            10,
        )
    }

    fn research_output() -> StepOutput {
        StepOutput::Research {
            sources: vec![SourceRecord {
                source_type: SourceType::Sicha,
                citation: "Sichos Kodesh 5747, Behar-Bechukosai".to_string(),
                topic: "Shleimus HaAretz".to_string(),
                url: Some("https://www.chabad.org/therebbe/article_cdo/aid/4463154".to_string()),
                page: Some("478-482".to_string()),
            }],
            search_terms: vec!["shleimus haaretz".to_string()],
        }
    }

    #[test]
    fn apply_sets_output_and_marks_step_together() {
        let mut state = sample_state();
        assert!(!state.is_completed(StepKind::Research));
        assert!(!state.has_output(StepKind::Research));

        state.apply(research_output(), 11).expect("apply");
        assert!(state.is_completed(StepKind::Research));
        assert!(state.has_output(StepKind::Research));
        assert_eq!(state.completed_steps, vec![StepKind::Research]);
        assert_eq!(state.updated_at, 11);
    }

    #[test]
    fn apply_rejects_second_output_for_completed_step() {
        let mut state = sample_state();
        state.apply(research_output(), 11).expect("apply");
        let err = state.apply(research_output(), 12).expect_err("second apply");
        assert!(matches!(
            err,
            OrchestratorError::StepAlreadyCompleted {
                step: StepKind::Research
            }
        ));
        assert_eq!(state.completed_steps.len(), 1);
    }

    #[test]
    fn run_state_transitions_follow_lifecycle() {
        let mut state = sample_state();
        assert!(state.transition(RunState::Succeeded, 11).is_err());
        state.transition(RunState::Running, 11).expect("running");
        state.transition(RunState::Failed, 12).expect("failed");
        state.transition(RunState::Running, 13).expect("resumed");
        state.transition(RunState::Succeeded, 14).expect("succeeded");
        assert!(state.status.is_terminal());
        assert!(state.transition(RunState::Running, 15).is_err());
    }

    #[test]
    fn source_urls_skip_missing_and_duplicate_urls() {
        let mut state = sample_state();
        let mut sources = match research_output() {
            StepOutput::Research { sources, .. } => sources,
            _ => unreachable!(),
        };
        sources.push(sources[0].clone());
        sources.push(SourceRecord {
            source_type: SourceType::Halacha,
            citation: "Rambam Hilchos Melachim 11:1".to_string(),
            topic: String::new(),
            url: None,
            page: None,
        });
        state.sources = Some(sources);
        assert_eq!(
            state.source_urls(),
            vec!["https://www.chabad.org/therebbe/article_cdo/aid/4463154".to_string()]
        );
    }
}
