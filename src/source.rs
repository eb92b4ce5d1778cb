use crate::error::SourceError;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Somewhere a chat page's HTML can be (re)read from.
pub trait PageSource: Send {
    /// Human readable location, used in logs and the popup title.
    fn location(&self) -> String;

    fn fetch(&mut self) -> Result<String, SourceError>;
}

/// A saved page on disk. Re-read on every fetch so edits show up.
pub struct FileSource {
    pub path: PathBuf,
}

impl PageSource for FileSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&mut self) -> Result<String, SourceError> {
        std::fs::read_to_string(&self.path).map_err(|source| SourceError::Read {
            path: self.path.clone(),
            source,
        })
    }
}

pub struct UrlSource {
    pub url: String,
    client: reqwest::blocking::Client,
}

impl UrlSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl PageSource for UrlSource {
    fn location(&self) -> String {
        self.url.clone()
    }

    fn fetch(&mut self) -> Result<String, SourceError> {
        self.client
            .get(&self.url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(|source| SourceError::Fetch {
                url: self.url.clone(),
                source,
            })
    }
}

/// Page held in memory, e.g. restored from storage or built in tests.
pub struct StaticSource {
    pub label: String,
    pub html: String,
}

impl PageSource for StaticSource {
    fn location(&self) -> String {
        self.label.clone()
    }

    fn fetch(&mut self) -> Result<String, SourceError> {
        Ok(self.html.clone())
    }
}

/// Picks a source for a command line argument: http(s) URLs are fetched,
/// anything else is a file path.
pub fn open_source(arg: &str) -> Box<dyn PageSource> {
    if arg.starts_with("http://") || arg.starts_with("https://") {
        Box::new(UrlSource::new(arg))
    } else {
        Box::new(FileSource {
            path: PathBuf::from(arg),
        })
    }
}

pub enum PageUpdate {
    Fetched { html: String },
    Failed { error: String },
}

enum WatchCommand {
    Refresh,
    Stop,
}

/// Background thread that re-reads a page on an interval (or on demand) and
/// ships each result back to the owning thread.
pub struct PageWatcher {
    pub page_update_rx: mpsc::Receiver<PageUpdate>,
    command_tx: mpsc::Sender<WatchCommand>,
    location: String,
}

impl PageWatcher {
    pub fn spawn(mut source: Box<dyn PageSource>, interval: Duration) -> Self {
        let (page_tx, page_rx) = mpsc::channel();
        let (command_tx, command_rx) = mpsc::channel();
        let location = source.location();

        thread::spawn(move || loop {
            let update = match source.fetch() {
                Ok(html) => PageUpdate::Fetched { html },
                Err(err) => {
                    log::warn!("{}", err);
                    PageUpdate::Failed {
                        error: err.to_string(),
                    }
                }
            };
            if page_tx.send(update).is_err() {
                break;
            }
            match command_rx.recv_timeout(interval) {
                Ok(WatchCommand::Refresh) | Err(mpsc::RecvTimeoutError::Timeout) => {}
                Ok(WatchCommand::Stop) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        });

        Self {
            page_update_rx: page_rx,
            command_tx,
            location,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Asks for an immediate re-read instead of waiting for the interval.
    pub fn refresh(&self) {
        let _ = self.command_tx.send(WatchCommand::Refresh);
    }
}

impl Drop for PageWatcher {
    fn drop(&mut self) {
        let _ = self.command_tx.send(WatchCommand::Stop);
    }
}
