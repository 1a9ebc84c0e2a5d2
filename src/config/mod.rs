pub mod error;
pub mod load;
pub mod paths;
pub mod save;
pub mod settings;

pub use error::ConfigError;
pub use load::load_settings_or_default;
pub use paths::{
    default_global_config_path, default_state_root, ensure_state_root, CHECKPOINT_DB_FILE_NAME,
    GLOBAL_STATE_DIR,
};
pub use save::save_settings;
pub use settings::{
    LimitsConfig, Settings, StepTokenBudgets, SupabaseConfig, SUPABASE_KEY_ENV, SUPABASE_URL_ENV,
};
