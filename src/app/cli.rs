#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Watch,
    Timeline,
    Cancel,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "watch" => CliVerb::Watch,
        "timeline" => CliVerb::Timeline,
        "cancel" => CliVerb::Cancel,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  watch <run-id> [--no-stream] [--expand-all]  Follow a run until it finishes".to_string(),
        "  timeline <run-id> [--expand-all]             Print the run's execution outline"
            .to_string(),
        "  cancel <run-id>                              Request cancellation of an active run"
            .to_string(),
        "  help                                         Show this help".to_string(),
    ]
}

pub(crate) fn help_text() -> String {
    let mut lines = cli_help_lines();
    lines.push(String::new());
    lines.push("Configuration: ~/.runscope/config.yaml (override with RUNSCOPE_CONFIG)".to_string());
    lines.push("API key: `api_key` in the config file or RUNSCOPE_API_KEY".to_string());
    lines.join("\n")
}

/// Flags shared by the run-scoped commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    pub run_id: String,
    pub expand_all: bool,
    pub no_stream: bool,
}

pub fn parse_run_args(command: &str, args: &[String]) -> Result<RunArgs, String> {
    let mut parsed = RunArgs::default();
    for arg in args {
        match arg.as_str() {
            "--expand-all" => parsed.expand_all = true,
            "--no-stream" => parsed.no_stream = true,
            flag if flag.starts_with("--") => {
                return Err(format!("unknown flag `{flag}` for `{command}`"))
            }
            value if parsed.run_id.is_empty() => parsed.run_id = value.to_string(),
            extra => return Err(format!("unexpected argument `{extra}` for `{command}`")),
        }
    }
    if parsed.run_id.is_empty() {
        return Err(format!("usage: runscope {command} <run-id>"));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn parses_verbs() {
        assert_eq!(parse_cli_verb("watch"), CliVerb::Watch);
        assert_eq!(parse_cli_verb("--help"), CliVerb::Help);
        assert_eq!(parse_cli_verb("status"), CliVerb::Unknown);
    }

    #[test]
    fn parses_run_args_and_flags() {
        let parsed =
            parse_run_args("watch", &args(&["wr_1", "--no-stream", "--expand-all"])).expect("args");
        assert_eq!(parsed.run_id, "wr_1");
        assert!(parsed.no_stream);
        assert!(parsed.expand_all);
    }

    #[test]
    fn rejects_missing_id_unknown_flag_and_extra_args() {
        assert!(parse_run_args("cancel", &[]).is_err());
        assert!(parse_run_args("watch", &args(&["wr_1", "--fast"])).is_err());
        assert!(parse_run_args("watch", &args(&["wr_1", "wr_2"])).is_err());
    }
}
