//! Destination chat services and the chat hosts we know how to read.

use crate::error::PlatformError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use once_cell::sync::Lazy;
use url::Url;

/// Hosts whose pages the extractor is tuned for.
const CHAT_HOST_PATTERNS: [&str; 2] = ["*chat.openai.com*", "*chatgpt.com*"];

static CHAT_HOSTS: Lazy<GlobSet> = Lazy::new(|| {
    let mut builder = GlobSetBuilder::new();
    for pattern in CHAT_HOST_PATTERNS {
        builder.add(Glob::new(pattern).expect("host pattern is a valid glob"));
    }
    builder.build().expect("host patterns build")
});

/// True for locations on a recognised chat host.
pub fn is_chat_page(location: &str) -> bool {
    CHAT_HOSTS.is_match(location)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    Claude,
    Gemini,
    ChatGpt,
    Custom(Url),
}

impl Platform {
    pub const BUILT_IN: [Platform; 3] = [Platform::Claude, Platform::Gemini, Platform::ChatGpt];

    pub fn name(&self) -> &str {
        match self {
            Platform::Claude => "Claude",
            Platform::Gemini => "Gemini",
            Platform::ChatGpt => "ChatGPT",
            Platform::Custom(url) => url.host_str().unwrap_or("Custom"),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Platform::Claude => "https://claude.ai",
            Platform::Gemini => "https://gemini.google.com",
            Platform::ChatGpt => "https://chat.openai.com",
            Platform::Custom(url) => url.as_str(),
        }
    }

    /// Only checks that `input` is a well-formed absolute URL.
    pub fn custom(input: &str) -> Result<Self, PlatformError> {
        Url::parse(input.trim())
            .map(Platform::Custom)
            .map_err(|source| PlatformError::InvalidUrl {
                input: input.to_string(),
                source,
            })
    }

    /// A built-in name (case-insensitive) or a custom URL.
    pub fn parse(input: &str) -> Result<Self, PlatformError> {
        match input.trim().to_lowercase().as_str() {
            "claude" => Ok(Platform::Claude),
            "gemini" => Ok(Platform::Gemini),
            "chatgpt" => Ok(Platform::ChatGpt),
            _ => Platform::custom(input),
        }
    }
}

/// Opens URLs for the user.
pub trait Navigator {
    fn open(&mut self, url: &str) -> Result<(), PlatformError>;
}

/// The OS default browser.
pub struct SystemBrowser;

impl Navigator for SystemBrowser {
    fn open(&mut self, url: &str) -> Result<(), PlatformError> {
        log::info!("opening {}", url);
        open::that(url).map_err(|source| PlatformError::Launch {
            url: url.to_string(),
            source,
        })
    }
}
