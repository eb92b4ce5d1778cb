use crate::store::default_store_path;
use crate::summary::SummaryStyle;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON file holding saved and stashed conversations.
    #[arg(long, global = true, env = "CHAT_TRANSFER_STORE", default_value_os_t = default_store_path())]
    pub store: PathBuf,

    /// Summary layout (categorized, context, digest)
    #[arg(long, global = true, env = "CHAT_TRANSFER_STYLE", value_enum, default_value_t = SummaryStyle::Categorized)]
    pub style: SummaryStyle,

    /// Seconds between page re-reads while watching.
    #[arg(long, global = true, env = "CHAT_TRANSFER_INTERVAL", default_value = "2")]
    pub interval: u64,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Open the transfer popup (the default). Without a source, shows the
    /// last stashed conversation.
    Popup { source: Option<String> },

    /// Print the transcript of a saved page or URL.
    Extract {
        source: String,
        /// Print JSON instead of labelled text.
        #[arg(long)]
        json: bool,
    },

    /// Print the summary of a page, URL or transcript `.json` file.
    Summarize { source: String },

    /// Save a page's transcript to the store.
    Save { source: String },

    /// List saved conversations, newest first.
    List,

    /// Follow a page, logging changes and stashing it when the limit shows up.
    Watch { source: String },

    /// Copy the summary and open a destination (claude, gemini, chatgpt or a URL).
    Open { target: String, source: String },

    /// Speak the native messaging protocol on stdin/stdout.
    Host,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_popup_with_categorized_summaries() {
        let args = Args::try_parse_from(["chat-transfer"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.style, SummaryStyle::Categorized);
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let args = Args::try_parse_from([
            "chat-transfer",
            "open",
            "claude",
            "page.html",
            "--style",
            "digest",
            "--store",
            "/tmp/s.json",
        ])
        .unwrap();
        assert_eq!(args.style, SummaryStyle::Digest);
        assert_eq!(args.store, PathBuf::from("/tmp/s.json"));
        assert!(matches!(
            args.command,
            Some(Command::Open { ref target, .. }) if target == "claude"
        ));
    }

    #[test]
    fn extract_takes_a_json_switch() {
        let args = Args::try_parse_from(["chat-transfer", "extract", "p.html", "--json"]).unwrap();
        assert!(matches!(args.command, Some(Command::Extract { json: true, .. })));
    }
}
