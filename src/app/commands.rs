use super::cli::{help_text, parse_cli_verb, parse_run_args, CliVerb, RunArgs};
use crate::api::{HttpRunBackend, RunBackend};
use crate::config::{load_global_settings, Settings};
use crate::render::{count_label, render_outline, OutlineOptions};
use crate::session::{RunSession, RunView, SessionError, SessionOptions};
use crate::shared::{EventLog, RunId};
use crate::stream::WebSocketTransport;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

const WATCH_PUMP_INTERVAL: Duration = Duration::from_millis(200);

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Watch => cmd_watch(&args[1..]),
        CliVerb::Timeline => cmd_timeline(&args[1..]),
        CliVerb::Cancel => cmd_cancel(&args[1..]),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}

fn load_settings() -> Result<Settings, String> {
    load_global_settings().map_err(|err| SessionError::from(err).to_string())
}

fn event_log(settings: &Settings) -> EventLog {
    match settings.resolve_log_path() {
        Some(path) => EventLog::to_file(path),
        None => EventLog::disabled(),
    }
}

fn parse_run_id(raw: &str) -> Result<RunId, String> {
    RunId::parse(raw).map_err(|reason| SessionError::InvalidRunId(reason).to_string())
}

fn outline_options(args: &RunArgs) -> OutlineOptions {
    if args.expand_all {
        OutlineOptions::expanded_all()
    } else {
        OutlineOptions::default()
    }
}

pub fn cmd_timeline(args: &[String]) -> Result<String, String> {
    let args = parse_run_args("timeline", args)?;
    let run_id = parse_run_id(&args.run_id)?;
    let settings = load_settings()?;
    let backend = HttpRunBackend::from_settings(&settings);
    timeline_text(&backend, &run_id, &outline_options(&args))
}

pub fn timeline_text(
    backend: &dyn RunBackend,
    run_id: &RunId,
    options: &OutlineOptions,
) -> Result<String, String> {
    let timeline = backend
        .fetch_timeline(run_id)
        .map_err(|err| SessionError::from(err).to_string())?;
    if timeline.is_empty() {
        return Ok(format!("run {run_id} has no timeline entries yet"));
    }
    let mut text = render_outline(&timeline, options);
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(&count_label(timeline.count_actions(), "action"));
    Ok(text)
}

pub fn cmd_cancel(args: &[String]) -> Result<String, String> {
    let args = parse_run_args("cancel", args)?;
    let run_id = parse_run_id(&args.run_id)?;
    let settings = load_settings()?;
    let backend = HttpRunBackend::from_settings(&settings);
    let log = event_log(&settings);
    let result = cancel_run(&backend, &run_id).map_err(|err| err.to_string());
    match &result {
        Ok(_) => log.info("cli.cancel", run_id.as_str()),
        Err(err) => log.warn("cli.cancel_failed", err),
    }
    result
}

/// Cancels `run_id` if its current status allows it.
pub fn cancel_run(backend: &dyn RunBackend, run_id: &RunId) -> Result<String, SessionError> {
    let run = backend.fetch_run(run_id)?;
    if !run.phase().is_active() {
        return Err(SessionError::NotCancellable {
            run_id: run_id.to_string(),
            status: run.status.unwrap_or_else(|| "unknown".to_string()),
        });
    }
    backend.cancel_run(run_id)?;
    Ok(format!("cancel requested for {run_id}"))
}

pub fn cmd_watch(args: &[String]) -> Result<String, String> {
    let args = parse_run_args("watch", args)?;
    let run_id = parse_run_id(&args.run_id)?;
    let settings = load_settings()?;
    let log = event_log(&settings);
    let mut options = SessionOptions::from_settings(&settings);
    if args.no_stream {
        options.stream_enabled = false;
    }

    let backend: Arc<dyn RunBackend> = Arc::new(HttpRunBackend::from_settings(&settings));
    let mut session = RunSession::new(
        run_id,
        backend,
        Arc::new(WebSocketTransport),
        options,
        log.clone(),
    );
    log.info("cli.watch", session.run_id().as_str());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let last = watch_until_finished(&mut session, &outline_options(&args), &mut out)
        .map_err(|err| format!("failed to write output: {err}"))?;
    session.close();
    Ok(watch_summary(&last))
}

/// Drives `session` until the run is over, writing a fresh render to `out`
/// whenever the view changes. Returns the final view.
pub fn watch_until_finished(
    session: &mut RunSession,
    outline: &OutlineOptions,
    out: &mut impl Write,
) -> std::io::Result<RunView> {
    let mut last: Option<RunView> = None;
    loop {
        session.tick(Instant::now());
        session.pump(WATCH_PUMP_INTERVAL);
        let view = session.view();
        if last.as_ref() != Some(&view) {
            writeln!(out, "{}", view.render_text(outline))?;
            out.flush()?;
        }
        let done = session.is_finished();
        last = Some(view);
        if done {
            break;
        }
    }
    Ok(last.unwrap_or_else(|| session.view()))
}

fn watch_summary(view: &RunView) -> String {
    if view.not_found {
        return format!("run {} was not found", view.run_id);
    }
    let status = view
        .run
        .as_ref()
        .and_then(|run| run.status.as_deref())
        .unwrap_or("unknown");
    format!("run {} finished with status {status}", view.run_id)
}
