use crate::app::cli::{help_text, parse_cli_verb, CliVerb};

pub mod init;
pub mod tasks;
pub mod upload;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Init => init::cmd_init(),
        CliVerb::Run => tasks::cmd_run(&args[1..]),
        CliVerb::Resume => tasks::cmd_resume(&args[1..]),
        CliVerb::Status => tasks::cmd_status(&args[1..]),
        CliVerb::Show => tasks::cmd_show(&args[1..]),
        CliVerb::Checklist => tasks::cmd_checklist(&args[1..]),
        CliVerb::Upload => upload::cmd_upload(&args[1..]),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}
