use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::tempdir;

struct MockRunServer {
    base_url: String,
    requests: Arc<Mutex<Vec<(String, String, String)>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl MockRunServer {
    fn start<F>(expected_requests: usize, responder: F) -> Self
    where
        F: Fn(&str, &str) -> (u16, String) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let requests_for_thread = Arc::clone(&requests);

        let handle = thread::spawn(move || {
            for _ in 0..expected_requests {
                let (mut stream, _) = listener.accept().expect("accept");
                let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
                let mut request_line = String::new();
                reader
                    .read_line(&mut request_line)
                    .expect("read request line");
                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or("GET").to_string();
                let path = parts.next().unwrap_or("/").to_string();

                let mut api_key = String::new();
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).expect("read header");
                    if line == "\r\n" || line.is_empty() {
                        break;
                    }
                    let lower = line.to_ascii_lowercase();
                    if lower.starts_with("x-api-key:") {
                        api_key = line
                            .split_once(':')
                            .map(|(_, v)| v.trim().to_string())
                            .unwrap_or_default();
                    }
                    if lower.starts_with("content-length:") {
                        content_length = line
                            .split_once(':')
                            .map(|(_, v)| v.trim().parse::<usize>().unwrap_or(0))
                            .unwrap_or(0);
                    }
                }
                if content_length > 0 {
                    let mut body = vec![0_u8; content_length];
                    std::io::Read::read_exact(&mut reader, &mut body).expect("read body");
                }

                let (status, body) = responder(&method, &path);
                requests_for_thread
                    .lock()
                    .expect("lock requests")
                    .push((method, path, api_key));
                let response = format!(
                    "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                stream
                    .write_all(response.as_bytes())
                    .expect("write response");
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
            handle: Some(handle),
        }
    }

    fn finish(mut self) -> Vec<(String, String, String)> {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("join mock server");
        }
        self.requests.lock().expect("lock requests").clone()
    }
}

fn write_config(home: &Path, api_url: &str) {
    fs::create_dir_all(home.join(".runscope")).expect("create config dir");
    fs::write(
        home.join(".runscope/config.yaml"),
        format!(
            r#"
api_url: {api_url}
api_key: file-key
polling:
  run_interval_ms: 20
  timeline_interval_ms: 20
  artifacts_interval_ms: 20
  block_artifacts_interval_ms: 20
http:
  timeout_ms: 5000
"#
        ),
    )
    .expect("write config");
}

fn run(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_runscope"))
        .args(args)
        .env("HOME", home)
        .env_remove("RUNSCOPE_CONFIG")
        .env_remove("RUNSCOPE_API_KEY")
        .output()
        .expect("run runscope")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn assert_ok(output: &Output) {
    assert!(
        output.status.success(),
        "stdout:\n{}\nstderr:\n{}",
        stdout(output),
        stderr(output)
    );
}

#[test]
fn help_lists_every_command() {
    let dir = tempdir().expect("tempdir");
    let output = run(dir.path(), &["help"]);
    assert_ok(&output);
    let text = stdout(&output);
    for verb in ["watch <run-id>", "timeline <run-id>", "cancel <run-id>"] {
        assert!(text.contains(verb), "missing {verb} in:\n{text}");
    }

    let bare = run(dir.path(), &[]);
    assert_ok(&bare);
    assert_eq!(stdout(&bare), text);
}

#[test]
fn unknown_command_and_bad_run_id_fail() {
    let dir = tempdir().expect("tempdir");
    let unknown = run(dir.path(), &["status", "tsk_1"]);
    assert!(!unknown.status.success());
    assert!(stderr(&unknown).contains("unknown command `status`"));

    let bad_id = run(dir.path(), &["timeline", "../etc"]);
    assert!(!bad_id.status.success());
    assert!(stderr(&bad_id).contains("invalid run id"));

    let missing = run(dir.path(), &["cancel"]);
    assert!(!missing.status.success());
    assert!(stderr(&missing).contains("usage: runscope cancel <run-id>"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempdir().expect("tempdir");
    write_config(dir.path(), "ftp://nowhere");
    let output = run(dir.path(), &["timeline", "tsk_1"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("api_url"));
}

#[test]
fn timeline_prints_outline_from_backend() {
    let dir = tempdir().expect("tempdir");
    let server = MockRunServer::start(1, |_, _| {
        (
            200,
            r#"[{"type":"block","block":{"workflow_run_block_id":"wrb_1","block_type":"navigation","label":"open_portal","status":"completed",
                "actions":[{"action_type":"click","status":"completed"},{"action_type":"input_text","status":"completed"}]}}]"#
                .to_string(),
        )
    });
    write_config(dir.path(), &server.base_url);

    let output = run(dir.path(), &["timeline", "wr_42"]);
    let requests = server.finish();
    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.contains("open_portal"), "{text}");
    assert!(text.contains("2 actions"), "{text}");
    assert_eq!(requests[0].1, "/api/v1/workflows/runs/wr_42/timeline");
    assert_eq!(requests[0].2, "file-key");
}

#[test]
fn cancel_refuses_finished_runs() {
    let dir = tempdir().expect("tempdir");
    let server = MockRunServer::start(1, |_, _| {
        (200, r#"{"run_id":"tsk_1","status":"completed"}"#.to_string())
    });
    write_config(dir.path(), &server.base_url);

    let output = run(dir.path(), &["cancel", "tsk_1"]);
    let requests = server.finish();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("cannot be cancelled in status `completed`"));
    assert_eq!(requests.len(), 1);
}

#[test]
fn cancel_posts_for_active_runs() {
    let dir = tempdir().expect("tempdir");
    let server = MockRunServer::start(2, |method, _| match method {
        "POST" => (200, "{}".to_string()),
        _ => (200, r#"{"run_id":"tsk_1","status":"queued"}"#.to_string()),
    });
    write_config(dir.path(), &server.base_url);

    let output = run(dir.path(), &["cancel", "tsk_1"]);
    let requests = server.finish();
    assert_ok(&output);
    assert!(stdout(&output).contains("cancel requested for tsk_1"));
    assert_eq!(requests[1].0, "POST");
    assert_eq!(requests[1].1, "/api/v1/runs/tsk_1/cancel");
    assert!(dir.path().join(".runscope/logs/runscope.log").is_file());
}

#[test]
fn watch_exits_once_a_finished_run_is_fully_loaded() {
    let dir = tempdir().expect("tempdir");
    let server = MockRunServer::start(3, |_, path| {
        let body = if path.ends_with("/timeline") {
            "[]"
        } else if path.ends_with("/artifacts") {
            r#"[{"artifact_id":"a1","artifact_type":"screenshot_final","uri":"https://files.local/final.png","created_at":"2025-01-01T00:00:00Z"}]"#
        } else {
            r#"{"run_id":"tsk_9","status":"completed","step_count":4}"#
        };
        (200, body.to_string())
    });
    write_config(dir.path(), &server.base_url);

    let output = run(dir.path(), &["watch", "tsk_9", "--no-stream"]);
    let requests = server.finish();
    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.contains("https://files.local/final.png"), "{text}");
    assert!(text.contains("run tsk_9 finished with status completed"), "{text}");
    assert_eq!(requests.len(), 3);
}
