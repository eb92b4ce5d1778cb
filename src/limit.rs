//! Detection of "you've hit the limit" banners in freshly inserted page content.

use std::time::{Duration, Instant};

/// How long the limit banner stays up unless dismissed.
pub const BANNER_TTL: Duration = Duration::from_secs(10);

const PHRASES: [&str; 3] = ["message limit", "rate limit", "too many requests"];

/// True when a node's text looks like a throttling banner.
pub fn is_limit_text(text: &str) -> bool {
    let text = text.to_lowercase();
    PHRASES.iter().any(|phrase| text.contains(phrase))
        || (text.contains("upgrade") && text.contains("continue"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitBanner {
    shown_at: Instant,
}

impl LimitBanner {
    pub fn is_visible(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) < BANNER_TTL
    }

    /// Fraction of the lifetime left, for fading the banner out.
    pub fn remaining(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.shown_at).as_secs_f32();
        (1.0 - elapsed / BANNER_TTL.as_secs_f32()).clamp(0.0, 1.0)
    }
}

/// Session-scoped limit state. The flag only ever goes from false to true.
#[derive(Debug, Default, Clone)]
pub struct LimitState {
    reached: bool,
    banner: Option<LimitBanner>,
}

impl LimitState {
    pub fn is_reached(&self) -> bool {
        self.reached
    }

    /// Records a detected banner. Returns true only on the first detection.
    pub fn trigger(&mut self, now: Instant) -> bool {
        let first = !self.reached;
        self.reached = true;
        self.banner = Some(LimitBanner { shown_at: now });
        if first {
            log::warn!("message limit detected on page");
        }
        first
    }

    /// The banner, if it is still within its display window.
    pub fn banner(&self, now: Instant) -> Option<LimitBanner> {
        self.banner.filter(|banner| banner.is_visible(now))
    }

    pub fn dismiss(&mut self) {
        self.banner = None;
    }
}
