use crate::orchestration::assembler::rfc3339;
use crate::persistence::{PersistenceError, RecordSink};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;
use std::time::Instant;

const HALACHIC_SOURCE_TURN: &str = "halachic_source_compilation";

/// A recorded multi-speaker planning conversation, as exported to disk.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationRecord {
    pub conversation_id: String,
    pub created_at: String,
    pub topic: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub conversation_flow: Vec<ConversationTurn>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub final_deliverables: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationTurn {
    pub speaker: String,
    #[serde(default, rename = "type")]
    pub turn_type: Option<String>,
    #[serde(default)]
    pub sources_provided: Vec<ProvidedSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidedSource {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub page_reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationUploadReport {
    pub conversation_id: String,
    pub topic: String,
    pub turns: usize,
    pub sources_uploaded: usize,
    pub generated_content: bool,
    pub insight: bool,
}

impl ConversationRecord {
    pub fn agents_used(&self) -> Vec<String> {
        self.conversation_flow
            .iter()
            .map(|turn| turn.speaker.clone())
            .collect()
    }

    pub fn source_rows(&self, verified_at: &str) -> Vec<Value> {
        self.conversation_flow
            .iter()
            .filter(|turn| turn.turn_type.as_deref() == Some(HALACHIC_SOURCE_TURN))
            .flat_map(|turn| turn.sources_provided.iter())
            .map(|source| {
                json!({
                    "source_type": source_type_of(&source.source),
                    "citation": source.source,
                    "content": source.quote,
                    "url": source.url,
                    "page_reference": source.page_reference,
                    "verified_at": verified_at,
                    "conversation_id": self.conversation_id,
                })
            })
            .collect()
    }

    pub fn generated_content_row(&self) -> Option<Value> {
        let structure = self.final_deliverables.get("farbrengen_structure")?;
        let english_text =
            serde_json::to_string_pretty(structure).unwrap_or_else(|_| structure.to_string());
        Some(json!({
            "content_type": "farbrengen",
            "hebrew_text": "",
            "english_text": english_text,
            "sources": self
                .final_deliverables
                .get("sources_compiled")
                .cloned()
                .unwrap_or_else(|| json!({})),
            "created_at": self.created_at,
            "conversation_id": self.conversation_id,
            "metadata": {
                "duration": "2x5 minutes",
                "audience": "young bochurim",
                "location": self.location,
            },
        }))
    }
}

/// First word of a citation, lowercased: "Rambam Hilchos ..." -> "rambam".
fn source_type_of(citation: &str) -> String {
    citation
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

pub fn read_conversation(path: &Path) -> Result<(ConversationRecord, Value), PersistenceError> {
    let raw = fs::read_to_string(path).map_err(|source| PersistenceError::ReadConversation {
        path: path.display().to_string(),
        source,
    })?;
    let invalid = |reason: String| PersistenceError::InvalidConversation {
        path: path.display().to_string(),
        reason,
    };
    let chat_content: Value = serde_json::from_str(&raw).map_err(|err| invalid(err.to_string()))?;
    let record: ConversationRecord =
        serde_json::from_value(chat_content.clone()).map_err(|err| invalid(err.to_string()))?;
    if record.conversation_id.trim().is_empty() {
        return Err(invalid("`conversation_id` must be non-empty".to_string()));
    }
    Ok((record, chat_content))
}

/// Uploads one conversation export: the conversation itself, its compiled
/// sources, the farbrengen deliverable when present, and a sync log row.
pub fn upload_conversation_file(
    sink: &dyn RecordSink,
    path: &Path,
    record_insight: bool,
    now: i64,
) -> Result<ConversationUploadReport, PersistenceError> {
    let started = Instant::now();
    let (record, chat_content) = read_conversation(path)?;
    let timestamp = rfc3339(now);

    sink.upsert(
        "conversations",
        &[json!({
            "id": record.conversation_id,
            "created_at": record.created_at,
            "topic": record.topic,
            "chat_content": chat_content,
            "agents_used": record.agents_used(),
            "metadata": record.metadata,
        })],
    )?;

    let sources = record.source_rows(&timestamp);
    sink.upsert("sources", &sources)?;

    let generated = record.generated_content_row();
    if let Some(row) = &generated {
        sink.insert("generated_content", row)?;
    }

    sink.insert(
        "agent_logs",
        &json!({
            "agent_name": "supabase_sync",
            "task_description": format!("Upload conversation: {}", record.topic),
            "status": "COMPLETED",
            "execution_time": format!("{:.1} seconds", started.elapsed().as_secs_f64()),
            "timestamp": timestamp,
        }),
    )?;

    if record_insight {
        sink.insert(
            "insights",
            &json!({
                "category": "rebbe_and_me",
                "title": format!("Conversation uploaded: {}", record.topic),
                "content": format!(
                    "{} turns across {} speakers, {} sources compiled.",
                    record.conversation_flow.len(),
                    distinct_count(&record.agents_used()),
                    sources.len()
                ),
                "metadata": {
                    "conversation_id": record.conversation_id,
                    "sources_count": sources.len(),
                },
                "created_at": timestamp,
            }),
        )?;
    }

    Ok(ConversationUploadReport {
        conversation_id: record.conversation_id.clone(),
        topic: record.topic.clone(),
        turns: record.conversation_flow.len(),
        sources_uploaded: sources.len(),
        generated_content: generated.is_some(),
        insight: record_insight,
    })
}

fn distinct_count(values: &[String]) -> usize {
    let mut seen: Vec<&str> = Vec::new();
    for value in values {
        if !seen.contains(&value.as_str()) {
            seen.push(value);
        }
    }
    seen.len()
}
