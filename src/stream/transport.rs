use super::StreamError;
use std::io::ErrorKind;
use std::net::TcpStream;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{connect, Message, WebSocket};

/// Result of one non-blocking read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Text(String),
    /// Nothing available yet.
    Idle,
    Closed,
}

pub trait StreamConnection: Send {
    fn read(&mut self) -> Result<ReadOutcome, StreamError>;

    fn close(&mut self);
}

/// Opens push connections. Implementations must not block forever in
/// [`StreamConnection::read`]; the reader loop checks its stop flag between
/// reads.
pub trait StreamTransport: Send + Sync {
    fn connect(&self, url: &str) -> Result<Box<dyn StreamConnection>, StreamError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl StreamTransport for WebSocketTransport {
    fn connect(&self, url: &str) -> Result<Box<dyn StreamConnection>, StreamError> {
        let (mut socket, _) = connect(url).map_err(|err| match err {
            tungstenite::Error::Url(detail) => StreamError::Unavailable(detail.to_string()),
            tungstenite::Error::HttpFormat(detail) => StreamError::Unavailable(detail.to_string()),
            tungstenite::Error::Http(response) => {
                StreamError::Unavailable(format!("stream endpoint answered {}", response.status()))
            }
            other => StreamError::Connect(other.to_string()),
        })?;
        set_socket_nonblocking(&mut socket)?;
        Ok(Box::new(WebSocketConnection { socket }))
    }
}

struct WebSocketConnection {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl StreamConnection for WebSocketConnection {
    fn read(&mut self) -> Result<ReadOutcome, StreamError> {
        match self.socket.read() {
            Ok(Message::Text(text)) => Ok(ReadOutcome::Text(text)),
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => Ok(ReadOutcome::Text(text)),
                Err(_) => Ok(ReadOutcome::Idle),
            },
            Ok(Message::Ping(payload)) => {
                let _ = self.socket.send(Message::Pong(payload));
                Ok(ReadOutcome::Idle)
            }
            Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => Ok(ReadOutcome::Idle),
            Ok(Message::Close(_)) => Ok(ReadOutcome::Closed),
            Err(tungstenite::Error::Io(err))
                if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
            {
                Ok(ReadOutcome::Idle)
            }
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                Ok(ReadOutcome::Closed)
            }
            Err(err) => Err(StreamError::Read(err.to_string())),
        }
    }

    fn close(&mut self) {
        let _ = self.socket.close(None);
        let _ = self.socket.flush();
    }
}

fn set_socket_nonblocking(
    socket: &mut WebSocket<MaybeTlsStream<TcpStream>>,
) -> Result<(), StreamError> {
    match socket.get_mut() {
        MaybeTlsStream::Plain(stream) => stream.set_nonblocking(true),
        MaybeTlsStream::Rustls(stream) => stream.sock.set_nonblocking(true),
        _ => Ok(()),
    }
    .map_err(|err| StreamError::Connect(format!("failed to configure stream socket: {err}")))
}
