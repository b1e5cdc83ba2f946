use crate::events::AppEvent;
use async_channel::Sender;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

pub const SOCKET_PATH: &str = "/tmp/rondo.sock";

/// One line of the control protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    Open(usize),
    Close,
    Status,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let command = match words.next()?.to_ascii_lowercase().as_str() {
            "next" => Self::Next,
            "prev" => Self::Prev,
            "open" => Self::Open(words.next()?.parse().ok()?),
            "close" => Self::Close,
            "status" => Self::Status,
            _ => return None,
        };
        words.next().is_none().then_some(command)
    }

    fn event(self) -> Option<AppEvent> {
        match self {
            Self::Next => Some(AppEvent::Next),
            Self::Prev => Some(AppEvent::Prev),
            Self::Open(i) => Some(AppEvent::Open(i)),
            Self::Close => Some(AppEvent::Close),
            Self::Status => None,
        }
    }
}

/// What the UI last published about the ring, for `status` replies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Status {
    pub mode: String,
    pub central: Option<usize>,
    pub cards: usize,
    pub detail: Option<usize>,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opt = |v: Option<usize>| v.map_or_else(|| "-".to_string(), |i| i.to_string());
        write!(
            f,
            "mode={} central={} cards={} detail={}",
            self.mode,
            opt(self.central),
            self.cards,
            opt(self.detail)
        )
    }
}

pub type SharedStatus = Arc<RwLock<Status>>;

pub async fn run_server(tx: Sender<AppEvent>, status: SharedStatus) {
    if std::fs::metadata(SOCKET_PATH).is_ok() {
        let _ = std::fs::remove_file(SOCKET_PATH);
    }

    let listener = match UnixListener::bind(SOCKET_PATH) {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind unix socket: {}", e);
            return;
        }
    };
    log::debug!("control socket listening on {}", SOCKET_PATH);

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let tx = tx.clone();
                let status = status.clone();
                tokio::spawn(async move {
                    let (read, mut write) = stream.into_split();
                    let mut lines = BufReader::new(read).lines();

                    while let Ok(Some(line)) = lines.next_line().await {
                        let Some(command) = Command::parse(&line) else {
                            log::warn!("Unknown control command: {:?}", line.trim());
                            continue;
                        };
                        match command.event() {
                            Some(event) => {
                                if tx.send(event).await.is_err() {
                                    return;
                                }
                            }
                            None => {
                                let reply = format!("{}\n", status.read());
                                if write.write_all(reply.as_bytes()).await.is_err() {
                                    return;
                                }
                            }
                        }
                    }
                });
            }
            Err(e) => {
                log::error!("Failed to accept connection: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("next"), Some(Command::Next));
        assert_eq!(Command::parse("  PREV \n"), Some(Command::Prev));
        assert_eq!(Command::parse("open 3"), Some(Command::Open(3)));
        assert_eq!(Command::parse("close"), Some(Command::Close));
        assert_eq!(Command::parse("status"), Some(Command::Status));
        assert_eq!(Command::parse("open"), None);
        assert_eq!(Command::parse("open -1"), None);
        assert_eq!(Command::parse("next please"), None);
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("show"), None);
    }

    #[test]
    fn test_status_line() {
        let status = Status {
            mode: "Open".into(),
            central: Some(2),
            cards: 8,
            detail: Some(2),
        };
        assert_eq!(status.to_string(), "mode=Open central=2 cards=8 detail=2");
        assert_eq!(
            Status::default().to_string(),
            "mode= central=- cards=0 detail=-"
        );
    }

    #[test]
    fn test_only_status_stays_local() {
        assert_eq!(Command::Status.event(), None);
        assert_eq!(Command::Open(1).event(), Some(AppEvent::Open(1)));
    }
}
