use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[serde(alias = "farbrengen")]
    ContentWithContext,
    #[serde(alias = "source_lookup")]
    CitationOnly,
    #[serde(alias = "dvar_torah")]
    ContentWithTranslation,
}

impl TaskType {
    pub const ALL: [TaskType; 3] = [
        TaskType::ContentWithContext,
        TaskType::CitationOnly,
        TaskType::ContentWithTranslation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContentWithContext => "content_with_context",
            Self::CitationOnly => "citation_only",
            Self::ContentWithTranslation => "content_with_translation",
        }
    }

    /// Human name of the deliverable, used when prompting for drafted content.
    pub fn deliverable(self) -> &'static str {
        match self {
            Self::ContentWithContext => "farbrengen talk",
            Self::CitationOnly => "source lookup",
            Self::ContentWithTranslation => "dvar torah",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "content_with_context" | "farbrengen" => Ok(Self::ContentWithContext),
            "citation_only" | "source_lookup" => Ok(Self::CitationOnly),
            "content_with_translation" | "dvar_torah" => Ok(Self::ContentWithTranslation),
            _ => Err(
                "task type must be one of: content_with_context, citation_only, content_with_translation"
                    .to_string(),
            ),
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Research,
    Context,
    Content,
    Links,
    Translation,
}

impl StepKind {
    pub const ALL: [StepKind; 5] = [
        StepKind::Research,
        StepKind::Context,
        StepKind::Content,
        StepKind::Links,
        StepKind::Translation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Context => "context",
            Self::Content => "content",
            Self::Links => "links",
            Self::Translation => "translation",
        }
    }

    /// Prefix used for progress notes in `TaskState::messages`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Research => "[RESEARCH AGENT]",
            Self::Context => "[CONTEXT AGENT]",
            Self::Content => "[CONTENT AGENT]",
            Self::Links => "[LINK VERIFICATION AGENT]",
            Self::Translation => "[TRANSLATION AGENT]",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "research" => Ok(Self::Research),
            "context" => Ok(Self::Context),
            "content" => Ok(Self::Content),
            "links" => Ok(Self::Links),
            "translation" => Ok(Self::Translation),
            _ => Err("step must be one of: research, context, content, links, translation".to_string()),
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered step lists per task type. List position is the only dependency
/// ordering: a step runs after every step declared before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskChecklists {
    entries: BTreeMap<TaskType, Vec<StepKind>>,
}

impl Default for TaskChecklists {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            TaskType::ContentWithContext,
            vec![
                StepKind::Research,
                StepKind::Context,
                StepKind::Content,
                StepKind::Links,
            ],
        );
        entries.insert(
            TaskType::CitationOnly,
            vec![StepKind::Research, StepKind::Links],
        );
        entries.insert(
            TaskType::ContentWithTranslation,
            vec![
                StepKind::Research,
                StepKind::Content,
                StepKind::Translation,
            ],
        );
        Self { entries }
    }
}

impl TaskChecklists {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Defaults with `overrides` replacing whole entries.
    pub fn with_overrides(overrides: &BTreeMap<TaskType, Vec<StepKind>>) -> Self {
        let mut checklists = Self::default();
        for (task_type, steps) in overrides {
            checklists.entries.insert(*task_type, steps.clone());
        }
        checklists
    }

    pub fn remove(&mut self, task_type: TaskType) -> Option<Vec<StepKind>> {
        self.entries.remove(&task_type)
    }

    /// Task types without an entry have no required steps.
    pub fn required_steps(&self, task_type: TaskType) -> &[StepKind] {
        self.entries
            .get(&task_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, task_type: TaskType) -> bool {
        self.entries.contains_key(&task_type)
    }

    pub fn longest(&self) -> usize {
        self.entries.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskType, &[StepKind])> {
        self.entries
            .iter()
            .map(|(task_type, steps)| (*task_type, steps.as_slice()))
    }

    pub fn validate(&self) -> Result<(), String> {
        for (task_type, steps) in &self.entries {
            validate_step_list(steps)
                .map_err(|reason| format!("checklist for `{task_type}` {reason}"))?;
        }
        Ok(())
    }
}

pub fn validate_step_list(steps: &[StepKind]) -> Result<(), String> {
    if steps.is_empty() {
        return Err("must list at least one step".to_string());
    }
    for (idx, step) in steps.iter().enumerate() {
        if steps[..idx].contains(step) {
            return Err(format!("lists step `{step}` more than once"));
        }
    }
    Ok(())
}
