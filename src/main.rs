mod app;
mod cli;
mod clipboard;
mod coordinator;
mod error;
mod extractor;
mod limit;
mod message;
mod messaging;
mod native_host;
mod observer;
mod platform;
mod source;
mod store;
mod summary;
mod token_count;

use clap::Parser;
use cli::{Args, Command};
use clipboard::{SystemClipboard, TerminalClipboard};
use coordinator::{Coordinator, Stats};
use log::info;
use message::{PageStatus, Transcript};
use messaging::{Background, LocalRuntime, PageContext};
use platform::{Platform, SystemBrowser};
use source::{open_source, PageSource, PageUpdate, PageWatcher};
use std::error::Error;
use std::io;
use std::time::{Duration, Instant};
use store::ConversationStore;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(err) = run(args) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let store = ConversationStore::open(&args.store)?;
    if let Some(path) = store.path() {
        info!("Store: {}", path.display());
    }
    let background = Background::new(store, args.style);
    let interval = Duration::from_secs(args.interval.max(1));

    match args.command.unwrap_or(Command::Popup { source: None }) {
        Command::Popup { source } => {
            let source = source.as_deref().map(page_source);
            app::run(app::TransferApp::new(background, source, interval))?;
        }
        Command::Extract { source, json } => {
            let snapshot = page_coordinator(background, &source).load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot.conversation)?);
            } else {
                for message in &snapshot.conversation {
                    println!("{}: {}\n", message.role.shout(), message.content);
                }
            }
        }
        Command::Summarize { source } => {
            let summary = if source.ends_with(".json") {
                let transcript: Transcript = serde_json::from_str(&std::fs::read_to_string(&source)?)?;
                Coordinator::new(LocalRuntime::new(background, None)).summarize(transcript)
            } else {
                let snapshot = page_coordinator(background, &source).load()?;
                let stats = Stats::of(&snapshot);
                info!(
                    "{} messages, {} chars, ~{} tokens",
                    stats.messages, stats.summary_chars, stats.summary_tokens
                );
                snapshot.summary
            };
            println!("{}", summary);
        }
        Command::Save { source } => {
            let mut coordinator = page_coordinator(background, &source);
            let snapshot = coordinator.load()?;
            let id = coordinator
                .save(snapshot.conversation)
                .ok_or("could not save conversation")?;
            println!("{}", id);
        }
        Command::List => {
            let mut coordinator = Coordinator::new(LocalRuntime::new(background, None));
            for saved in coordinator.stored() {
                println!(
                    "{}  {}  {:>3} messages  {}",
                    saved.id, saved.timestamp, saved.message_count, saved.preview
                );
            }
        }
        Command::Watch { source } => watch(background, page_source(&source), interval),
        Command::Open { target, source } => {
            let platform = Platform::parse(&target)?;
            let snapshot = page_coordinator(background, &source).load()?;
            let outcome = coordinator::open_platform(
                &mut SystemClipboard,
                &mut TerminalClipboard { out: io::stdout() },
                &mut SystemBrowser,
                &snapshot.summary,
                &platform,
            )?;
            info!("Summary copied ({:?}); opened {}", outcome, platform.name());
        }
        Command::Host => {
            let mut runtime = LocalRuntime::new(background, None);
            native_host::serve(&mut runtime, &mut io::stdin().lock(), &mut io::stdout().lock())?;
        }
    }
    Ok(())
}

fn page_source(arg: &str) -> Box<dyn PageSource> {
    let source = open_source(arg);
    let location = source.location();
    if location.starts_with("http") && !platform::is_chat_page(&location) {
        log::warn!("{} is not a recognised chat page; extraction may find nothing", location);
    }
    source
}

fn page_coordinator(background: Background, arg: &str) -> Coordinator<LocalRuntime> {
    let style = background.style();
    let page = PageContext::with_source(page_source(arg), style);
    if let Some(location) = page.location() {
        info!("Reading {}", location);
    }
    Coordinator::new(LocalRuntime::new(background, Some(page)))
}

/// Follows a page until interrupted. The first limit sighting stashes the
/// conversation for a later `popup`.
fn watch(background: Background, source: Box<dyn PageSource>, interval: Duration) {
    let style = background.style();
    let mut coordinator = Coordinator::new(LocalRuntime::new(
        background,
        Some(PageContext::detached(style)),
    ));
    let watcher = PageWatcher::spawn(source, interval);
    info!("Watching {} every {:?}", watcher.location(), interval);

    while let Ok(update) = watcher.page_update_rx.recv() {
        let html = match update {
            PageUpdate::Fetched { html } => html,
            PageUpdate::Failed { error } => {
                log::warn!("{}", error);
                continue;
            }
        };
        let Some(page) = coordinator.messenger_mut().page.as_mut() else {
            break;
        };
        let Some(change) = page.observer_mut().ingest(&html, Instant::now()) else {
            continue;
        };
        let snapshot = page.snapshot();
        info!(
            "{} messages, {} new elements, status: {}",
            snapshot.conversation.len(),
            change.inserted,
            PageStatus::of(&snapshot).label()
        );
        if change.limit_reached_now && coordinator.stash(&snapshot) {
            info!("Message limit reached; conversation stashed for transfer");
        }
    }
}
