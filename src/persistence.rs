use serde_json::Value;

pub mod conversation;
pub mod publish;
pub mod supabase;

pub use conversation::{upload_conversation_file, ConversationRecord, ConversationUploadReport};
pub use publish::{publish_task_result, PublishReport};
pub use supabase::SupabaseClient;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("missing supabase credentials; set `{env_var}`")]
    MissingCredentials { env_var: String },
    #[error("{operation} into `{table}` failed: {reason}")]
    Request {
        operation: &'static str,
        table: String,
        reason: String,
    },
    #[error("{operation} into `{table}` returned http {status}: {body}")]
    Http {
        operation: &'static str,
        table: String,
        status: u16,
        body: String,
    },
    #[error("failed to read conversation file {path}: {source}")]
    ReadConversation {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("conversation file {path} is invalid: {reason}")]
    InvalidConversation { path: String, reason: String },
}

/// Persistence collaborator: the hosted table store behind published results.
pub trait RecordSink {
    fn upsert(&self, table: &str, rows: &[Value]) -> Result<(), PersistenceError>;
    fn insert(&self, table: &str, row: &Value) -> Result<(), PersistenceError>;
}
