use super::{default_state_root, ConfigError};
use crate::orchestration::checklist::{validate_step_list, StepKind, TaskChecklists, TaskType};
use crate::provider::model_map::resolve_anthropic_model;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub state_root: Option<PathBuf>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub anthropic_api_base: Option<String>,
    #[serde(default)]
    pub max_tokens: StepTokenBudgets,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub checklists: BTreeMap<TaskType, Vec<StepKind>>,
    #[serde(default = "default_preserved_terms")]
    pub preserved_terms: Vec<String>,
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub strict_task_types: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_root: None,
            model: default_model(),
            anthropic_api_base: None,
            max_tokens: StepTokenBudgets::default(),
            limits: LimitsConfig::default(),
            checklists: BTreeMap::new(),
            preserved_terms: default_preserved_terms(),
            supabase: SupabaseConfig::default(),
            strict_task_types: false,
        }
    }
}

/// `max_tokens` sent with each step's completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct StepTokenBudgets {
    #[serde(default = "default_small_budget")]
    pub research: u32,
    #[serde(default = "default_small_budget")]
    pub context: u32,
    #[serde(default = "default_content_budget")]
    pub content: u32,
    #[serde(default = "default_small_budget")]
    pub translation: u32,
}

impl Default for StepTokenBudgets {
    fn default() -> Self {
        Self {
            research: default_small_budget(),
            context: default_small_budget(),
            content: default_content_budget(),
            translation: default_small_budget(),
        }
    }
}

impl StepTokenBudgets {
    /// Link verification makes no completion call and has no budget.
    pub fn for_step(&self, step: StepKind) -> u32 {
        match step {
            StepKind::Research => self.research,
            StepKind::Context => self.context,
            StepKind::Content => self.content,
            StepKind::Translation => self.translation,
            StepKind::Links => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LimitsConfig {
    #[serde(default)]
    pub max_total_iterations: Option<u32>,
    #[serde(default)]
    pub step_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub retry_backoff_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SupabaseConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: Option<String>,
}

impl SupabaseConfig {
    /// `SUPABASE_URL` wins over the configured url.
    pub fn resolved_url(&self) -> Option<String> {
        std::env::var(SUPABASE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.url.clone())
            .filter(|v| !v.trim().is_empty())
    }
}

fn default_model() -> String {
    "sonnet".to_string()
}

fn default_small_budget() -> u32 {
    2000
}

fn default_content_budget() -> u32 {
    4000
}

fn default_preserved_terms() -> Vec<String> {
    ["shleimus", "farbrengen", "sicha", "igros kodesh"]
        .iter()
        .map(|term| term.to_string())
        .collect()
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn resolve_state_root(&self) -> Result<PathBuf, ConfigError> {
        match &self.state_root {
            Some(path) => Ok(path.clone()),
            None => default_state_root(),
        }
    }

    pub fn task_checklists(&self) -> TaskChecklists {
        TaskChecklists::with_overrides(&self.checklists)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(root) = &self.state_root {
            if !root.is_absolute() {
                return Err(ConfigError::Settings(
                    "`state_root` must be an absolute path".to_string(),
                ));
            }
        }

        resolve_anthropic_model(&self.model)
            .map_err(|err| ConfigError::Settings(format!("`model`: {err}")))?;

        for (task_type, steps) in &self.checklists {
            validate_step_list(steps).map_err(|reason| ConfigError::Checklist {
                task_type: *task_type,
                reason,
            })?;
        }

        let budgets = self.max_tokens;
        for (name, budget) in [
            ("research", budgets.research),
            ("context", budgets.context),
            ("content", budgets.content),
            ("translation", budgets.translation),
        ] {
            if budget == 0 {
                return Err(ConfigError::Settings(format!(
                    "`max_tokens.{name}` must be greater than zero"
                )));
            }
        }

        if let Some(max) = self.limits.max_total_iterations {
            let longest = self.task_checklists().longest() as u32;
            if max < longest.saturating_add(1) {
                return Err(ConfigError::Settings(format!(
                    "`limits.max_total_iterations` ({max}) must be at least the longest checklist length plus one ({})",
                    longest + 1
                )));
            }
        }
        if self.limits.step_timeout_seconds == Some(0) {
            return Err(ConfigError::Settings(
                "`limits.step_timeout_seconds` must be greater than zero".to_string(),
            ));
        }

        if self.preserved_terms.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::Settings(
                "`preserved_terms` entries must be non-empty".to_string(),
            ));
        }

        if self.supabase.enabled && self.supabase.resolved_url().is_none() {
            return Err(ConfigError::Settings(format!(
                "`supabase.url` or `{SUPABASE_URL_ENV}` is required when supabase is enabled"
            )));
        }
        Ok(())
    }
}
