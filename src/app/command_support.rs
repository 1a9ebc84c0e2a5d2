use crate::config::{
    default_global_config_path, ensure_state_root, load_settings_or_default, ConfigError,
    Settings, CHECKPOINT_DB_FILE_NAME,
};
use crate::orchestration::{CheckpointStore, TaskContext};
use crate::persistence::{RecordSink, SupabaseClient};
use crate::provider::{AnthropicClient, CompletionClient, HttpLinkVerifier};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub fn map_config_err(err: ConfigError) -> String {
    err.to_string()
}

pub fn config_path() -> Result<PathBuf, String> {
    default_global_config_path().map_err(map_config_err)
}

pub fn load_settings() -> Result<Settings, String> {
    load_settings_or_default(&config_path()?).map_err(map_config_err)
}

pub fn state_root(settings: &Settings) -> Result<PathBuf, String> {
    let root = settings.resolve_state_root().map_err(map_config_err)?;
    ensure_state_root(&root).map_err(map_config_err)?;
    Ok(root)
}

pub fn open_checkpoints(settings: &Settings) -> Result<CheckpointStore, String> {
    let root = state_root(settings)?;
    CheckpointStore::open(&root.join(CHECKPOINT_DB_FILE_NAME)).map_err(|e| e.to_string())
}

pub fn step_timeout(settings: &Settings) -> Duration {
    Duration::from_secs(
        crate::orchestration::resolve_execution_safety_limits(settings).step_timeout_seconds,
    )
}

/// Process-wide collaborators behind a `TaskContext`.
pub struct Collaborators {
    pub completion: AnthropicClient,
    pub link_verifier: HttpLinkVerifier,
    pub record_sink: Option<SupabaseClient>,
}

impl Collaborators {
    pub fn from_settings(settings: &Settings) -> Result<Self, String> {
        let timeout = step_timeout(settings);
        let mut completion =
            AnthropicClient::from_env(&settings.model, timeout).map_err(|e| e.to_string())?;
        if let Some(api_base) = &settings.anthropic_api_base {
            completion = completion.with_api_base(api_base.clone());
        }
        Ok(Self {
            completion,
            link_verifier: HttpLinkVerifier::new(timeout),
            record_sink: record_sink(settings)?,
        })
    }

    pub fn context(&self, settings: &Settings) -> Result<TaskContext<'_>, String> {
        Ok(TaskContext {
            state_root: state_root(settings)?,
            checkpoints: open_checkpoints(settings)?,
            completion: &self.completion as &dyn CompletionClient,
            link_verifier: &self.link_verifier,
            record_sink: self
                .record_sink
                .as_ref()
                .map(|sink| sink as &dyn RecordSink),
        })
    }
}

pub fn record_sink(settings: &Settings) -> Result<Option<SupabaseClient>, String> {
    if !settings.supabase.enabled {
        return Ok(None);
    }
    let url = settings.supabase.resolved_url().ok_or_else(|| {
        "supabase is enabled but no url is configured".to_string()
    })?;
    SupabaseClient::from_env(&url, step_timeout(settings))
        .map(Some)
        .map_err(|e| e.to_string())
}

/// Splits `--flag value` pairs and bare switches out of positional args.
pub fn take_option(args: &mut Vec<String>, name: &str) -> Result<Option<String>, String> {
    let Some(index) = args.iter().position(|arg| arg == name) else {
        return Ok(None);
    };
    if index + 1 >= args.len() {
        return Err(format!("`{name}` requires a value"));
    }
    let value = args.remove(index + 1);
    args.remove(index);
    Ok(Some(value))
}

pub fn take_switch(args: &mut Vec<String>, name: &str) -> bool {
    match args.iter().position(|arg| arg == name) {
        Some(index) => {
            args.remove(index);
            true
        }
        None => false,
    }
}
