use crate::app::command_support::{
    load_settings, now_secs, open_checkpoints, take_option, Collaborators,
};
use crate::orchestration::{
    OrchestratorError, ProgressSnapshot, TaskChecklists, TaskEngine, TaskState, TaskType,
};
use crate::shared::atomic_write_file;
use std::path::Path;

pub fn cmd_run(args: &[String]) -> Result<String, String> {
    if args.len() < 2 {
        return Err("usage: run <task-type> <request...>".to_string());
    }
    let task_type = TaskType::parse(&args[0])?;
    let user_input = args[1..].join(" ");
    if user_input.trim().is_empty() {
        return Err("request text must be non-empty".to_string());
    }

    let settings = load_settings()?;
    let collaborators = Collaborators::from_settings(&settings)?;
    let context = collaborators.context(&settings)?;
    let engine = TaskEngine::new(&context, &settings);

    let now = now_secs();
    let mut state = engine
        .create(task_type, &user_input, now)
        .map_err(|e| e.to_string())?;
    let outcome = engine.run(&mut state, now);
    render_outcome(&state, outcome)
}

pub fn cmd_resume(args: &[String]) -> Result<String, String> {
    let [task_id] = args else {
        return Err("usage: resume <task-id>".to_string());
    };
    let settings = load_settings()?;
    let collaborators = Collaborators::from_settings(&settings)?;
    let context = collaborators.context(&settings)?;
    let engine = TaskEngine::new(&context, &settings);

    match engine.resume(task_id, now_secs()) {
        Ok(state) => render_outcome(&state, Ok(())),
        Err(err @ OrchestratorError::UnknownTaskId { .. }) => Err(err.to_string()),
        Err(err) => {
            let state = context
                .checkpoints
                .load(task_id)
                .map_err(|e| e.to_string())?;
            render_outcome(&state, Err(err))
        }
    }
}

fn render_outcome(state: &TaskState, outcome: Result<(), OrchestratorError>) -> Result<String, String> {
    let mut lines = vec![
        format!("task_id={}", state.task_id),
        format!("state={}", state.status),
    ];
    lines.extend(state.messages.iter().map(|message| format!("  {message}")));
    match outcome {
        Ok(()) => {
            if let Some(result) = &state.final_output {
                lines.push(result.to_json_pretty().map_err(|e| e.to_string())?);
            }
            Ok(lines.join("\n"))
        }
        Err(err) => Err(format!(
            "{}\ntask {} failed: {err}\nresume with `rebbeandme resume {}`",
            lines.join("\n"),
            state.task_id,
            state.task_id
        )),
    }
}

pub fn cmd_status(args: &[String]) -> Result<String, String> {
    let settings = load_settings()?;
    let store = open_checkpoints(&settings)?;
    match args {
        [] => {
            let recent = store.list_recent(20).map_err(|e| e.to_string())?;
            if recent.is_empty() {
                return Ok("no tasks".to_string());
            }
            Ok(recent
                .iter()
                .map(|task| {
                    format!(
                        "{} {} {} updated_at={}",
                        task.task_id, task.task_type, task.status, task.updated_at
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        [task_id] => {
            let state = store.load(task_id).map_err(|e| e.to_string())?;
            Ok(ProgressSnapshot::from_state(&state, &settings.task_checklists()).render())
        }
        _ => Err("usage: status [task-id]".to_string()),
    }
}

pub fn cmd_show(args: &[String]) -> Result<String, String> {
    let mut args = args.to_vec();
    let out = take_option(&mut args, "--out")?;
    let [task_id] = args.as_slice() else {
        return Err("usage: show <task-id> [--out <path>]".to_string());
    };
    let settings = load_settings()?;
    let store = open_checkpoints(&settings)?;
    let state = store.load(task_id).map_err(|e| e.to_string())?;
    let result = state
        .final_output
        .as_ref()
        .ok_or_else(|| format!("task {task_id} has no final output (state={})", state.status))?;
    let json = result.to_json_pretty().map_err(|e| e.to_string())?;

    match out {
        Some(path) => {
            atomic_write_file(Path::new(&path), json.as_bytes())
                .map_err(|e| format!("failed to write {path}: {e}"))?;
            Ok(format!("wrote {path}"))
        }
        None => Ok(json),
    }
}

pub fn cmd_checklist(args: &[String]) -> Result<String, String> {
    let settings = load_settings()?;
    let checklists = settings.task_checklists();
    match args {
        [] => Ok(TaskType::ALL
            .iter()
            .map(|task_type| render_checklist(&checklists, *task_type))
            .collect::<Vec<_>>()
            .join("\n")),
        [raw] => Ok(render_checklist(&checklists, TaskType::parse(raw)?)),
        _ => Err("usage: checklist [task-type]".to_string()),
    }
}

fn render_checklist(checklists: &TaskChecklists, task_type: TaskType) -> String {
    let steps = checklists
        .required_steps(task_type)
        .iter()
        .map(|step| step.as_str())
        .collect::<Vec<_>>();
    format!(
        "{task_type} ({}): {}",
        task_type.deliverable(),
        if steps.is_empty() {
            "-".to_string()
        } else {
            steps.join(" -> ")
        }
    )
}
