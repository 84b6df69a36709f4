use super::frame::{parse_frame, StreamFrame};
use super::{ConnectionId, StreamError, TransportEvent};
use crate::shared::RunId;

/// Error recorded when the connection drops without an explicit signal.
pub const DISCONNECTED: &str = "disconnected";
/// Error recorded when no stream transport can be constructed.
pub const STREAM_UNAVAILABLE: &str = "stream_unavailable";

/// What a consumer renders from the live stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSnapshot {
    pub current_image: Option<String>,
    pub is_connected: bool,
    pub last_error: Option<String>,
}

/// Side effects the observer asks its owner to perform on the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverCommand {
    Open {
        connection: ConnectionId,
        stream_id: RunId,
    },
    Close {
        connection: ConnectionId,
    },
}

/// Live-stream state for one run view.
///
/// Pure state machine: it never touches the network. Every connection it
/// asks for gets a fresh [`ConnectionId`], and events tagged with any other
/// id are ignored, so late messages from a closed connection cannot change
/// the snapshot.
#[derive(Debug, Default)]
pub struct StreamObserver {
    next_connection: ConnectionId,
    target: Option<RunId>,
    open: Option<ConnectionId>,
    snapshot: StreamSnapshot,
}

impl StreamObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &StreamSnapshot {
        &self.snapshot
    }

    pub fn open_connection(&self) -> Option<ConnectionId> {
        self.open
    }

    /// Enables or disables observation of `stream_id`. One connection is
    /// opened per enabled period; once it ends it is not reopened until the
    /// observer is disabled and enabled again or the stream id changes.
    pub fn observe(&mut self, stream_id: &RunId, enabled: bool) -> Vec<ObserverCommand> {
        let mut commands = Vec::new();
        if !enabled {
            if let Some(connection) = self.open.take() {
                commands.push(ObserverCommand::Close { connection });
            }
            self.target = None;
            self.snapshot = StreamSnapshot::default();
            return commands;
        }

        if self.target.as_ref() == Some(stream_id) {
            return commands;
        }
        if let Some(connection) = self.open.take() {
            commands.push(ObserverCommand::Close { connection });
        }
        self.snapshot = StreamSnapshot::default();
        self.target = Some(stream_id.clone());
        self.next_connection += 1;
        let connection = self.next_connection;
        self.open = Some(connection);
        commands.push(ObserverCommand::Open {
            connection,
            stream_id: stream_id.clone(),
        });
        commands
    }

    /// Opens a fresh connection for the current target after the previous
    /// one dropped. The last frame stays on screen until a new one arrives.
    pub fn reopen(&mut self) -> Vec<ObserverCommand> {
        let Some(stream_id) = self.target.clone() else {
            return Vec::new();
        };
        if self.open.is_some() {
            return Vec::new();
        }
        self.snapshot.last_error = None;
        self.next_connection += 1;
        let connection = self.next_connection;
        self.open = Some(connection);
        vec![ObserverCommand::Open {
            connection,
            stream_id,
        }]
    }

    pub fn handle(&mut self, connection: ConnectionId, event: TransportEvent) -> Vec<ObserverCommand> {
        if self.open != Some(connection) {
            return Vec::new();
        }
        match event {
            TransportEvent::Opened => Vec::new(),
            TransportEvent::Text(text) => self.apply_text(connection, &text),
            TransportEvent::Closed => self.fail(connection, DISCONNECTED.to_string()),
            TransportEvent::Failed(StreamError::Unavailable(_)) => {
                self.fail(connection, STREAM_UNAVAILABLE.to_string())
            }
            TransportEvent::Failed(_) => self.fail(connection, DISCONNECTED.to_string()),
        }
    }

    fn apply_text(&mut self, connection: ConnectionId, text: &str) -> Vec<ObserverCommand> {
        let Some(frame) = parse_frame(text) else {
            return Vec::new();
        };
        match frame {
            StreamFrame::Connected => {
                self.snapshot.is_connected = true;
                Vec::new()
            }
            StreamFrame::Image { screenshot, .. } => {
                self.snapshot.current_image = Some(screenshot);
                self.snapshot.is_connected = true;
                Vec::new()
            }
            StreamFrame::Error(message) => self.fail(connection, message),
            StreamFrame::End(_) => {
                self.open = None;
                vec![ObserverCommand::Close { connection }]
            }
            StreamFrame::Ignored => Vec::new(),
        }
    }

    fn fail(&mut self, connection: ConnectionId, message: String) -> Vec<ObserverCommand> {
        self.snapshot.is_connected = false;
        self.snapshot.last_error = Some(message);
        self.open = None;
        vec![ObserverCommand::Close { connection }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(raw: &str) -> RunId {
        RunId::parse(raw).expect("run id")
    }

    fn opened(observer: &mut StreamObserver, id: &str) -> ConnectionId {
        match observer.observe(&run(id), true).as_slice() {
            [ObserverCommand::Open { connection, .. }] => *connection,
            other => panic!("expected a single open, got {other:?}"),
        }
    }

    fn text(body: &str) -> TransportEvent {
        TransportEvent::Text(body.to_string())
    }

    #[test]
    fn disabled_observer_opens_nothing_and_resets() {
        let mut observer = StreamObserver::new();
        assert!(observer.observe(&run("tsk_1"), false).is_empty());
        assert_eq!(observer.snapshot(), &StreamSnapshot::default());
    }

    #[test]
    fn enabling_twice_keeps_one_connection() {
        let mut observer = StreamObserver::new();
        opened(&mut observer, "tsk_1");
        assert!(observer.observe(&run("tsk_1"), true).is_empty());
    }

    #[test]
    fn acknowledgement_keeps_image_and_frame_sets_both() {
        let mut observer = StreamObserver::new();
        let conn = opened(&mut observer, "tsk_1");
        observer.handle(conn, text(r#"{"screenshot":"QQ==","status":"running"}"#));
        observer.handle(conn, text(r#"{"connected":true}"#));
        assert_eq!(observer.snapshot().current_image.as_deref(), Some("QQ=="));
        assert!(observer.snapshot().is_connected);
    }

    #[test]
    fn error_frame_disconnects_and_closes() {
        let mut observer = StreamObserver::new();
        let conn = opened(&mut observer, "tsk_1");
        observer.handle(conn, text(r#"{"connected":true}"#));
        let commands = observer.handle(conn, text(r#"{"error":"upstream gone"}"#));
        assert_eq!(commands, vec![ObserverCommand::Close { connection: conn }]);
        assert!(!observer.snapshot().is_connected);
        assert_eq!(observer.snapshot().last_error.as_deref(), Some("upstream gone"));
        assert!(observer.open_connection().is_none());
        assert!(observer.observe(&run("tsk_1"), true).is_empty());
    }

    #[test]
    fn malformed_frame_is_dropped_without_closing() {
        let mut observer = StreamObserver::new();
        let conn = opened(&mut observer, "tsk_1");
        assert!(observer.handle(conn, text("{{garbage")).is_empty());
        assert_eq!(observer.open_connection(), Some(conn));
        observer.handle(conn, text(r#"{"screenshot":"AAA"}"#));
        assert_eq!(observer.snapshot().current_image.as_deref(), Some("AAA"));
    }

    #[test]
    fn events_from_stale_connection_are_ignored() {
        let mut observer = StreamObserver::new();
        let first = opened(&mut observer, "tsk_1");
        let commands = observer.observe(&run("tsk_1"), false);
        assert_eq!(commands, vec![ObserverCommand::Close { connection: first }]);
        let second = opened(&mut observer, "tsk_1");
        assert_ne!(first, second);

        observer.handle(first, text(r#"{"screenshot":"OLD"}"#));
        observer.handle(first, TransportEvent::Closed);
        assert_eq!(observer.snapshot(), &StreamSnapshot::default());
    }

    #[test]
    fn switching_stream_id_closes_previous_connection() {
        let mut observer = StreamObserver::new();
        let first = opened(&mut observer, "tsk_1");
        let commands = observer.observe(&run("tsk_2"), true);
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0], ObserverCommand::Close { connection: first });
        assert!(matches!(commands[1], ObserverCommand::Open { .. }));
    }

    #[test]
    fn unexpected_close_records_disconnected() {
        let mut observer = StreamObserver::new();
        let conn = opened(&mut observer, "tsk_1");
        observer.handle(conn, text(r#"{"connected":true}"#));
        observer.handle(conn, TransportEvent::Closed);
        assert!(!observer.snapshot().is_connected);
        assert_eq!(observer.snapshot().last_error.as_deref(), Some(DISCONNECTED));
    }

    #[test]
    fn reopen_after_a_drop_keeps_the_last_frame() {
        let mut observer = StreamObserver::new();
        let first = opened(&mut observer, "tsk_1");
        observer.handle(first, text(r#"{"screenshot":"QUJD","status":"running"}"#));
        observer.handle(first, TransportEvent::Closed);

        let commands = observer.reopen();
        let second = match commands.as_slice() {
            [ObserverCommand::Open { connection, .. }] => *connection,
            other => panic!("expected a single open, got {other:?}"),
        };
        assert_ne!(first, second);
        assert_eq!(observer.snapshot().current_image.as_deref(), Some("QUJD"));
        assert!(!observer.snapshot().is_connected);
        assert_eq!(observer.snapshot().last_error, None);
        assert!(observer.reopen().is_empty());

        observer.handle(first, text(r#"{"screenshot":"OLD"}"#));
        assert_eq!(observer.snapshot().current_image.as_deref(), Some("QUJD"));
    }

    #[test]
    fn reopen_without_a_target_does_nothing() {
        let mut observer = StreamObserver::new();
        assert!(observer.reopen().is_empty());
    }

    #[test]
    fn unavailable_transport_is_reported_once() {
        let mut observer = StreamObserver::new();
        let conn = opened(&mut observer, "tsk_1");
        let commands = observer.handle(
            conn,
            TransportEvent::Failed(StreamError::Unavailable("no tls".to_string())),
        );
        assert_eq!(commands.len(), 1);
        assert_eq!(
            observer.snapshot().last_error.as_deref(),
            Some(STREAM_UNAVAILABLE)
        );
        assert!(observer
            .handle(conn, TransportEvent::Failed(StreamError::Unavailable("again".into())))
            .is_empty());
    }
}
