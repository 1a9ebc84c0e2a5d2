pub mod fs_atomic;
pub mod ids;
pub mod logging;

pub use fs_atomic::atomic_write_file;
pub use ids::{generate_task_id, TaskId};
pub use logging::{append_engine_log_line, engine_log_path};
