use crate::app::command_support::{config_path, load_settings, map_config_err, state_root};
use crate::config::save_settings;

pub fn cmd_init() -> Result<String, String> {
    let path = config_path()?;
    let settings = load_settings()?;
    let existed = path.exists();
    if !existed {
        save_settings(&path, &settings).map_err(map_config_err)?;
    }
    let root = state_root(&settings)?;
    Ok(format!(
        "config={} ({})\nstate_root={}",
        path.display(),
        if existed { "existing" } else { "created" },
        root.display()
    ))
}
