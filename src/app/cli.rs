#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Init,
    Run,
    Resume,
    Status,
    Show,
    Checklist,
    Upload,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "init" => CliVerb::Init,
        "run" => CliVerb::Run,
        "resume" => CliVerb::Resume,
        "status" => CliVerb::Status,
        "show" => CliVerb::Show,
        "checklist" => CliVerb::Checklist,
        "upload" => CliVerb::Upload,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  init                                 Write default settings and create the state root"
            .to_string(),
        "  run <task-type> <request...>         Run a task through its checklist".to_string(),
        "  resume <task-id>                     Continue a checkpointed task".to_string(),
        "  status [task-id]                     Show task progress, or list recent tasks"
            .to_string(),
        "  show <task-id> [--out <path>]        Print or export a task's final result".to_string(),
        "  checklist [task-type]                Show the configured step checklists".to_string(),
        "  upload <file> [--insight]            Upload a conversation export to Supabase"
            .to_string(),
        "  help                                 Show this help".to_string(),
        String::new(),
        "Task types: content_with_context (farbrengen), citation_only (source_lookup),"
            .to_string(),
        "            content_with_translation (dvar_torah)".to_string(),
    ]
}

pub(crate) fn help_text() -> String {
    cli_help_lines().join("\n")
}
