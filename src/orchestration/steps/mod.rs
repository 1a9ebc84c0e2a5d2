use crate::config::StepTokenBudgets;
use crate::orchestration::checklist::StepKind;
use crate::orchestration::error::OrchestratorError;
use crate::orchestration::state::{StepOutput, TaskState};
use crate::provider::{CompletionClient, LinkVerifier, ProviderError};

pub mod content;
pub mod context;
pub mod links;
pub mod research;
pub mod translation;

pub use content::ContentStep;
pub use context::ContextStep;
pub use links::LinkVerificationStep;
pub use research::ResearchStep;
pub use translation::TranslationStep;

/// Collaborators and per-attempt inputs shared by every executor.
pub struct StepContext<'a> {
    pub completion: &'a dyn CompletionClient,
    pub link_verifier: &'a dyn LinkVerifier,
    pub budgets: StepTokenBudgets,
    pub preserved_terms: &'a [String],
    pub step_timeout_seconds: u64,
    pub now: i64,
}

impl StepContext<'_> {
    /// Sends one prompt and maps collaborator failures onto the step.
    pub fn complete(&self, step: StepKind, prompt: &str) -> Result<String, OrchestratorError> {
        self.completion
            .complete(prompt, self.budgets.for_step(step))
            .map_err(|err| self.step_error(step, err))
    }

    pub fn step_error(&self, step: StepKind, err: ProviderError) -> OrchestratorError {
        match err {
            ProviderError::Timeout { .. } => OrchestratorError::StepTimeout {
                step,
                step_timeout_seconds: self.step_timeout_seconds,
            },
            err if err.is_transient() => OrchestratorError::StepExecution {
                step,
                reason: err.to_string(),
            },
            err => OrchestratorError::StepRejected {
                step,
                reason: err.to_string(),
            },
        }
    }
}

/// One unit of work. Executors read the state and return their output; they
/// never mark themselves complete.
pub trait StepExecutor: Send + Sync {
    fn kind(&self) -> StepKind;
    fn run(&self, ctx: &StepContext<'_>, state: &TaskState)
        -> Result<StepOutput, OrchestratorError>;
}

pub struct StepExecutors {
    research: Box<dyn StepExecutor>,
    context: Box<dyn StepExecutor>,
    content: Box<dyn StepExecutor>,
    links: Box<dyn StepExecutor>,
    translation: Box<dyn StepExecutor>,
}

impl Default for StepExecutors {
    fn default() -> Self {
        Self {
            research: Box::new(ResearchStep),
            context: Box::new(ContextStep),
            content: Box::new(ContentStep),
            links: Box::new(LinkVerificationStep),
            translation: Box::new(TranslationStep),
        }
    }
}

impl StepExecutors {
    pub fn get(&self, kind: StepKind) -> &dyn StepExecutor {
        match kind {
            StepKind::Research => self.research.as_ref(),
            StepKind::Context => self.context.as_ref(),
            StepKind::Content => self.content.as_ref(),
            StepKind::Links => self.links.as_ref(),
            StepKind::Translation => self.translation.as_ref(),
        }
    }

    /// Installs `executor` in the slot named by its `kind()`.
    pub fn replace(mut self, executor: Box<dyn StepExecutor>) -> Self {
        let slot = match executor.kind() {
            StepKind::Research => &mut self.research,
            StepKind::Context => &mut self.context,
            StepKind::Content => &mut self.content,
            StepKind::Links => &mut self.links,
            StepKind::Translation => &mut self.translation,
        };
        *slot = executor;
        self
    }
}
