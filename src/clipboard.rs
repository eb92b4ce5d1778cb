use crate::error::ClipboardError;
use base64::Engine;
use ::clipboard::{ClipboardContext, ClipboardProvider};
use std::io::Write;

/// A place text can be copied to.
pub trait ClipboardSink {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The OS clipboard.
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut ctx: ClipboardContext = ClipboardProvider::new()
            .map_err(|err| ClipboardError::Unavailable(err.to_string()))?;
        ctx.set_contents(text.to_owned())
            .map_err(|err| ClipboardError::Write(err.to_string()))
    }
}

/// OSC 52 escape sequence; most terminal emulators put the payload on the
/// clipboard, including over SSH.
pub struct TerminalClipboard<W: Write> {
    pub out: W,
}

impl<W: Write> ClipboardSink for TerminalClipboard<W> {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(text);
        write!(self.out, "\x1b]52;c;{}\x07", encoded)?;
        self.out.flush()?;
        Ok(())
    }
}

/// The egui output clipboard, handed to the platform at the end of a frame.
pub struct EguiClipboard<'a>(pub &'a egui::Context);

impl ClipboardSink for EguiClipboard<'_> {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.0.copy_text(text.to_owned());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Primary,
    Fallback,
    /// Both paths failed; the caller is not told why.
    Failed,
}

/// Tries `primary`, then `fallback`. Fallback errors are only logged.
pub fn copy_with_fallback(
    primary: &mut dyn ClipboardSink,
    fallback: &mut dyn ClipboardSink,
    text: &str,
) -> CopyOutcome {
    match primary.write_text(text) {
        Ok(()) => CopyOutcome::Primary,
        Err(err) => {
            log::debug!("primary clipboard failed, using fallback: {}", err);
            match fallback.write_text(text) {
                Ok(()) => CopyOutcome::Fallback,
                Err(err) => {
                    log::debug!("fallback clipboard failed: {}", err);
                    CopyOutcome::Failed
                }
            }
        }
    }
}
