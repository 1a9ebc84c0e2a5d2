use crate::app::command_support::{load_settings, now_secs, record_sink, take_switch};
use crate::persistence::upload_conversation_file;
use std::path::Path;

pub fn cmd_upload(args: &[String]) -> Result<String, String> {
    let mut args = args.to_vec();
    let insight = take_switch(&mut args, "--insight");
    let [file] = args.as_slice() else {
        return Err("usage: upload <file> [--insight]".to_string());
    };

    let settings = load_settings()?;
    let sink = record_sink(&settings)?
        .ok_or_else(|| "supabase is disabled; set `supabase.enabled: true`".to_string())?;
    let report = upload_conversation_file(&sink, Path::new(file), insight, now_secs())
        .map_err(|e| e.to_string())?;

    Ok(format!(
        "conversation={}\ntopic={}\nturns={}\nsources={}\ngenerated_content={}\ninsight={}",
        report.conversation_id,
        report.topic,
        report.turns,
        report.sources_uploaded,
        report.generated_content,
        report.insight
    ))
}
