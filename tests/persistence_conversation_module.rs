use rebbeandme::persistence::{upload_conversation_file, PersistenceError, RecordSink};
use serde_json::{json, Value};
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

#[derive(Default)]
struct CapturingSink {
    rows: Mutex<Vec<(String, Value)>>,
}

impl CapturingSink {
    fn tables(&self) -> Vec<String> {
        self.rows
            .lock()
            .expect("rows")
            .iter()
            .map(|(table, _)| table.clone())
            .collect()
    }

    fn rows_for(&self, table: &str) -> Vec<Value> {
        self.rows
            .lock()
            .expect("rows")
            .iter()
            .filter(|(name, _)| name == table)
            .map(|(_, row)| row.clone())
            .collect()
    }
}

impl RecordSink for CapturingSink {
    fn upsert(&self, table: &str, rows: &[Value]) -> Result<(), PersistenceError> {
        let mut captured = self.rows.lock().expect("rows");
        for row in rows {
            captured.push((table.to_string(), row.clone()));
        }
        Ok(())
    }

    fn insert(&self, table: &str, row: &Value) -> Result<(), PersistenceError> {
        self.rows
            .lock()
            .expect("rows")
            .push((table.to_string(), row.clone()));
        Ok(())
    }
}

fn conversation() -> Value {
    json!({
        "conversation_id": "chanukah_farbrengen_2024_12_19",
        "created_at": "2024-12-19T18:00:00Z",
        "topic": "Chanukah farbrengen: the Hermon and Shleimus HaAretz",
        "location": "Crown Heights",
        "conversation_flow": [
            {"speaker": "user", "type": "request"},
            {"speaker": "research_agent", "type": "halachic_source_compilation",
             "sources_provided": [
                {"source": "Sichos Kodesh 5747, Behar-Bechukosai", "quote": "The land is whole",
                 "url": "https://www.chabad.org/therebbe/article_cdo/aid/4463154", "page_reference": "478"},
                {"source": "Rambam Hilchos Chanukah 3:1", "quote": "In the days of the Second Temple"}
             ]},
            {"speaker": "content_agent", "type": "draft"}
        ],
        "metadata": {"total_turns": 3},
        "final_deliverables": {
            "farbrengen_structure": {"opening": "The Hermon", "closing": "L'chaim"},
            "sources_compiled": {"sichos": 1}
        }
    })
}

#[test]
fn conversation_upload_writes_every_table_in_order() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("conversation.json");
    fs::write(&path, serde_json::to_string_pretty(&conversation()).expect("json")).expect("write");
    let sink = CapturingSink::default();

    let report = upload_conversation_file(&sink, &path, true, 1_734_566_400).expect("upload");
    assert_eq!(report.conversation_id, "chanukah_farbrengen_2024_12_19");
    assert_eq!(report.turns, 3);
    assert_eq!(report.sources_uploaded, 2);
    assert!(report.generated_content);
    assert!(report.insight);

    assert_eq!(
        sink.tables(),
        vec![
            "conversations",
            "sources",
            "sources",
            "generated_content",
            "agent_logs",
            "insights"
        ]
    );

    let conversation_row = &sink.rows_for("conversations")[0];
    assert_eq!(conversation_row["id"], "chanukah_farbrengen_2024_12_19");
    assert_eq!(
        conversation_row["agents_used"],
        json!(["user", "research_agent", "content_agent"])
    );
    assert_eq!(conversation_row["chat_content"], conversation());
    assert_eq!(conversation_row["metadata"]["total_turns"], 3);

    let sources = sink.rows_for("sources");
    assert_eq!(sources[0]["source_type"], "sichos");
    assert_eq!(sources[1]["source_type"], "rambam");
    assert_eq!(sources[1]["url"], "");
    assert_eq!(sources[0]["verified_at"], "2024-12-19T00:00:00Z");

    let generated = &sink.rows_for("generated_content")[0];
    assert_eq!(generated["content_type"], "farbrengen");
    assert_eq!(generated["metadata"]["location"], "Crown Heights");
    assert!(generated["english_text"]
        .as_str()
        .is_some_and(|text| text.contains("The Hermon")));

    let log = &sink.rows_for("agent_logs")[0];
    assert_eq!(log["agent_name"], "supabase_sync");
    assert_eq!(log["status"], "COMPLETED");
}

#[test]
fn conversation_without_deliverable_skips_generated_content() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("conversation.json");
    let mut value = conversation();
    value["final_deliverables"] = json!({});
    fs::write(&path, value.to_string()).expect("write");
    let sink = CapturingSink::default();

    let report = upload_conversation_file(&sink, &path, false, 0).expect("upload");
    assert!(!report.generated_content);
    assert!(!sink.tables().contains(&"generated_content".to_string()));
    assert!(!sink.tables().contains(&"insights".to_string()));
}

#[test]
fn unreadable_or_invalid_files_are_typed_errors() {
    let dir = tempdir().expect("tempdir");
    let sink = CapturingSink::default();

    let missing = upload_conversation_file(&sink, &dir.path().join("missing.json"), false, 0);
    assert!(matches!(missing, Err(PersistenceError::ReadConversation { .. })));

    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"topic": "no id"}"#).expect("write");
    let invalid = upload_conversation_file(&sink, &path, false, 0);
    assert!(matches!(invalid, Err(PersistenceError::InvalidConversation { .. })));
    assert!(sink.tables().is_empty());
}
