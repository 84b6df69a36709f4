use super::transport::{ReadOutcome, StreamConnection, StreamTransport};
use super::{ConnectionId, StreamError, TransportEvent};
use crate::config::StreamConfig;
use crate::shared::EventLog;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const READ_IDLE_SLEEP: Duration = Duration::from_millis(40);
const MAX_JITTER: Duration = Duration::from_millis(500);

/// An event from one registered connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    pub connection: ConnectionId,
    pub event: TransportEvent,
}

/// Exponential reopen schedule for a dropped stream:
/// `min(base * 2^attempt, max)`, plus up to half a second of jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    /// Never reconnect; a dropped connection stays dropped.
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &StreamConfig) -> Self {
        Self {
            max_attempts: config.max_reconnect_attempts,
            base_delay: Duration::from_millis(config.base_backoff_ms),
            max_delay: Duration::from_millis(config.max_backoff_ms),
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub fn jittered_delay_for(&self, attempt: u32) -> Duration {
        let delay = self.delay_for(attempt);
        delay + reconnect_jitter(delay)
    }
}

fn reconnect_jitter(delay: Duration) -> Duration {
    let ceiling = delay.min(MAX_JITTER).as_millis() as u64;
    if ceiling == 0 {
        return Duration::ZERO;
    }
    let mut bytes = [0u8; 8];
    let seed = match getrandom::getrandom(&mut bytes) {
        Ok(()) => u64::from_le_bytes(bytes),
        Err(_) => SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|value| value.as_nanos() as u64)
            .unwrap_or(0),
    };
    Duration::from_millis(seed % (ceiling + 1))
}

struct Registration {
    url: String,
    stop: Arc<AtomicBool>,
}

/// Owns every live stream connection of the process.
///
/// At most one connection exists per URL; registering a URL again replaces
/// the previous connection. A connection is attempted once and never
/// reopened here. Each connection is read on its own thread and
/// its events are delivered on the caller's channel tagged with the
/// connection id, so the consumer can ignore ids it has already dropped.
pub struct ConnectionRegistry {
    transport: Arc<dyn StreamTransport>,
    log: EventLog,
    connections: BTreeMap<ConnectionId, Registration>,
}

impl ConnectionRegistry {
    pub fn new(transport: Arc<dyn StreamTransport>, log: EventLog) -> Self {
        Self {
            transport,
            log,
            connections: BTreeMap::new(),
        }
    }

    pub fn is_open(&self, connection: ConnectionId) -> bool {
        self.connections.contains_key(&connection)
    }

    pub fn open_count(&self) -> usize {
        self.connections.len()
    }

    pub fn open<E>(
        &mut self,
        connection: ConnectionId,
        url: &str,
        events: &Sender<E>,
    ) where
        E: From<StreamEvent> + Send + 'static,
    {
        let duplicates: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|(_, registration)| registration.url == url)
            .map(|(id, _)| *id)
            .collect();
        for id in duplicates {
            self.close(id);
        }

        let stop = Arc::new(AtomicBool::new(false));
        self.connections.insert(
            connection,
            Registration {
                url: url.to_string(),
                stop: Arc::clone(&stop),
            },
        );
        self.log
            .info("stream.open", &format!("connection {connection} to {}", redact(url)));

        let reader = ConnectionReader {
            connection,
            url: url.to_string(),
            transport: Arc::clone(&self.transport),
            stop,
            log: self.log.clone(),
        };
        let tx = events.clone();
        let _ = thread::spawn(move || {
            reader.run(|event| {
                let _ = tx.send(E::from(event));
            })
        });
    }

    /// Stops a connection. Returns immediately; the reader thread exits at
    /// its next stop check and sends nothing further.
    pub fn close(&mut self, connection: ConnectionId) {
        if let Some(registration) = self.connections.remove(&connection) {
            registration.stop.store(true, Ordering::Relaxed);
            self.log
                .info("stream.close", &format!("connection {connection} closed"));
        }
    }

    pub fn close_all(&mut self) {
        let ids: Vec<ConnectionId> = self.connections.keys().copied().collect();
        for id in ids {
            self.close(id);
        }
    }
}

impl Drop for ConnectionRegistry {
    fn drop(&mut self) {
        self.close_all();
    }
}

fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

enum SessionEnd {
    Stopped,
    Closed,
    Failed(StreamError),
}

struct ConnectionReader {
    connection: ConnectionId,
    url: String,
    transport: Arc<dyn StreamTransport>,
    stop: Arc<AtomicBool>,
    log: EventLog,
}

impl ConnectionReader {
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    fn run(self, emit: impl Fn(StreamEvent)) {
        let send = |event: TransportEvent| {
            if !self.stopped() {
                emit(StreamEvent {
                    connection: self.connection,
                    event,
                });
            }
        };

        if self.stopped() {
            return;
        }
        let end = match self.transport.connect(&self.url) {
            Ok(mut connection) => {
                send(TransportEvent::Opened);
                let end = self.pump(connection.as_mut(), &send);
                connection.close();
                end
            }
            Err(err @ StreamError::Unavailable(_)) => {
                self.log.error("stream.unavailable", &err.to_string());
                send(TransportEvent::Failed(err));
                return;
            }
            Err(err) => SessionEnd::Failed(err),
        };

        match end {
            SessionEnd::Stopped => {}
            SessionEnd::Closed => send(TransportEvent::Closed),
            SessionEnd::Failed(err) => {
                self.log.warn(
                    "stream.error",
                    &format!("connection {}: {err}", self.connection),
                );
                send(TransportEvent::Failed(err));
            }
        }
    }

    fn pump(&self, connection: &mut dyn StreamConnection, send: &impl Fn(TransportEvent)) -> SessionEnd {
        loop {
            if self.stopped() {
                return SessionEnd::Stopped;
            }
            match connection.read() {
                Ok(ReadOutcome::Text(text)) => send(TransportEvent::Text(text)),
                Ok(ReadOutcome::Idle) => thread::sleep(READ_IDLE_SLEEP),
                Ok(ReadOutcome::Closed) => return SessionEnd::Closed,
                Err(err) => return SessionEnd::Failed(err),
            }
        }
    }
}
