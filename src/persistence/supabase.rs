use crate::config::SUPABASE_KEY_ENV;
use crate::persistence::{PersistenceError, RecordSink};
use serde_json::Value;
use std::time::Duration;

/// PostgREST client for a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    agent: ureq::Agent,
    url: String,
    service_role_key: String,
}

impl SupabaseClient {
    pub fn new(url: &str, service_role_key: &str, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            url: url.trim_end_matches('/').to_string(),
            service_role_key: service_role_key.to_string(),
        }
    }

    pub fn from_env(url: &str, timeout: Duration) -> Result<Self, PersistenceError> {
        let key = std::env::var(SUPABASE_KEY_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| PersistenceError::MissingCredentials {
                env_var: SUPABASE_KEY_ENV.to_string(),
            })?;
        Ok(Self::new(url, &key, timeout))
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, urlencoding::encode(table))
    }

    fn post(
        &self,
        operation: &'static str,
        table: &str,
        prefer: &str,
        body: &Value,
    ) -> Result<(), PersistenceError> {
        let result = self
            .agent
            .post(&self.table_url(table))
            .set("apikey", &self.service_role_key)
            .set("Authorization", &format!("Bearer {}", self.service_role_key))
            .set("Content-Type", "application/json")
            .set("Prefer", prefer)
            .send_json(body);
        match result {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(status, response)) => Err(PersistenceError::Http {
                operation,
                table: table.to_string(),
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(err)) => Err(PersistenceError::Request {
                operation,
                table: table.to_string(),
                reason: err.to_string(),
            }),
        }
    }
}

impl RecordSink for SupabaseClient {
    fn upsert(&self, table: &str, rows: &[Value]) -> Result<(), PersistenceError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.post(
            "upsert",
            table,
            "resolution=merge-duplicates,return=minimal",
            &Value::Array(rows.to_vec()),
        )
    }

    fn insert(&self, table: &str, row: &Value) -> Result<(), PersistenceError> {
        self.post("insert", table, "return=minimal", row)
    }
}
