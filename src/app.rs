use crate::{
    clipboard::{EguiClipboard, SystemClipboard},
    coordinator::{self, Coordinator, Stats, Toast, LOAD_ERROR},
    message::{ConversationSnapshot, PageStatus},
    messaging::{Background, LocalRuntime, PageContext},
    platform::{self, Platform, SystemBrowser},
    source::{open_source, PageSource, PageUpdate, PageWatcher},
    store::SavedConversation,
    summary::SummaryStyle,
};
use eframe::egui;
use num_format::{Locale, ToFormattedString};
use std::time::{Duration, Instant};

const COPIED: &str = "Summary copied to clipboard!";

/// Button presses collected while drawing, applied once the frame is built.
enum Action {
    Copy,
    Refresh,
    Save,
    Open(Platform),
    OpenCustom,
    PickFile,
    CopySaved(usize),
    TransferNow,
    DismissBanner,
    Close,
}

pub struct TransferApp {
    pub coordinator: Coordinator<LocalRuntime>,
    pub watcher: Option<PageWatcher>,
    pub snapshot: Option<ConversationSnapshot>,
    pub load_error: Option<String>,
    pub loading: bool,
    pub notification: Option<Toast>,
    pub custom_url: String,
    pub saved: Vec<SavedConversation>,
    pub style: SummaryStyle,
    pub poll_interval: Duration,
}

impl TransferApp {
    pub fn new(
        background: Background,
        source: Option<Box<dyn PageSource>>,
        poll_interval: Duration,
    ) -> Self {
        let style = background.style();
        let mut app = Self {
            coordinator: Coordinator::new(LocalRuntime::new(background, None)),
            watcher: None,
            snapshot: None,
            load_error: None,
            loading: false,
            notification: None,
            custom_url: String::new(),
            saved: Vec::new(),
            style,
            poll_interval,
        };
        match source {
            Some(source) => app.watch(source),
            None => app.restore_stashed(),
        }
        app.saved = app.coordinator.stored();
        app
    }

    /// Starts following a page, replacing whatever was followed before.
    pub fn watch(&mut self, source: Box<dyn PageSource>) {
        let location = source.location();
        if location.starts_with("http") && !platform::is_chat_page(&location) {
            log::warn!("{} is not a recognised chat page; extraction may find nothing", location);
        }
        self.coordinator.messenger_mut().page = Some(PageContext::detached(self.style));
        self.watcher = Some(PageWatcher::spawn(source, self.poll_interval));
        self.snapshot = None;
        self.load_error = None;
        self.loading = true;
    }

    /// Shows the conversation stashed by an earlier transfer, if any.
    fn restore_stashed(&mut self) {
        let area = self.coordinator.messenger().background.store().area().clone();
        let conversation = area.current_conversation.unwrap_or_default();
        let summary = self.coordinator.summarize(conversation.clone());
        self.snapshot = Some(ConversationSnapshot {
            conversation,
            summary,
            is_limit_reached: area.is_limit_reached,
        });
    }

    fn drain_page_updates(&mut self) {
        let Some(watcher) = &self.watcher else {
            return;
        };
        let updates: Vec<PageUpdate> = watcher.page_update_rx.try_iter().collect();
        for update in updates {
            match update {
                PageUpdate::Fetched { html } => self.ingest(&html),
                PageUpdate::Failed { error } => {
                    self.loading = false;
                    if self.snapshot.is_none() {
                        log::error!("Error loading conversation: {}", error);
                        self.load_error = Some(LOAD_ERROR.to_string());
                    }
                }
            }
        }
    }

    fn ingest(&mut self, html: &str) {
        let was_loading = std::mem::replace(&mut self.loading, false);
        let change = match self.coordinator.messenger_mut().page.as_mut() {
            Some(page) => page.observer_mut().ingest(html, Instant::now()),
            None => return,
        };
        if change.is_none() && !was_loading {
            return;
        }
        match self.coordinator.load() {
            Ok(snapshot) => {
                if change.is_some_and(|c| c.limit_reached_now) {
                    self.coordinator.stash(&snapshot);
                }
                self.snapshot = Some(snapshot);
                self.load_error = None;
            }
            Err(_) => self.load_error = Some(LOAD_ERROR.to_string()),
        }
    }

    fn summary(&self) -> &str {
        self.snapshot
            .as_ref()
            .map(|s| s.summary.as_str())
            .unwrap_or_default()
    }

    fn notify(&mut self, message: impl Into<String>) {
        self.notification = Some(Toast::new(message, Instant::now()));
    }

    fn copy(&mut self, ctx: &egui::Context, text: &str) {
        coordinator::copy_summary(&mut SystemClipboard, &mut EguiClipboard(ctx), text);
        self.notify(COPIED);
    }

    fn apply(&mut self, ctx: &egui::Context, action: Action) {
        match action {
            Action::Copy => {
                let summary = self.summary().to_owned();
                self.copy(ctx, &summary);
            }
            Action::Refresh => {
                if let Some(watcher) = &self.watcher {
                    self.loading = true;
                    watcher.refresh();
                } else {
                    self.restore_stashed();
                }
                self.saved = self.coordinator.stored();
            }
            Action::Save => {
                let conversation = self
                    .snapshot
                    .as_ref()
                    .map(|s| s.conversation.clone())
                    .unwrap_or_default();
                match self.coordinator.save(conversation) {
                    Some(_) => self.notify("Conversation saved"),
                    None => self.notify("Could not save conversation"),
                }
                self.saved = self.coordinator.stored();
            }
            Action::Open(platform) => self.open_platform(ctx, &platform),
            Action::OpenCustom => {
                if self.custom_url.trim().is_empty() {
                    return;
                }
                match Platform::custom(&self.custom_url) {
                    Ok(platform) => self.open_platform(ctx, &platform),
                    Err(err) => {
                        log::warn!("{}", err);
                        rfd::MessageDialog::new()
                            .set_title("Invalid URL")
                            .set_description("Please enter a valid URL")
                            .set_level(rfd::MessageLevel::Warning)
                            .show();
                    }
                }
            }
            Action::PickFile => {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("HTML", &["html", "htm"])
                    .pick_file()
                {
                    self.watch(open_source(&path.to_string_lossy()));
                }
            }
            Action::CopySaved(index) => {
                if let Some(saved) = self.saved.get(index) {
                    let summary = self.coordinator.summarize(saved.conversation.clone());
                    self.copy(ctx, &summary);
                }
            }
            Action::TransferNow => {
                if let Some(snapshot) = self.snapshot.clone() {
                    self.coordinator.stash(&snapshot);
                }
                self.apply(ctx, Action::Copy);
                self.apply(ctx, Action::DismissBanner);
            }
            Action::DismissBanner => {
                if let Some(page) = self.coordinator.messenger_mut().page.as_mut() {
                    page.observer_mut().limit_mut().dismiss();
                }
            }
            Action::Close => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
        }
    }

    /// Copy, navigate, close; in that order and without rollback.
    fn open_platform(&mut self, ctx: &egui::Context, platform: &Platform) {
        let summary = self.summary().to_owned();
        match coordinator::open_platform(
            &mut SystemClipboard,
            &mut EguiClipboard(ctx),
            &mut SystemBrowser,
            &summary,
            platform,
        ) {
            Ok(_) => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
            Err(err) => {
                log::error!("{}", err);
                self.notify(format!("Could not open {}", platform.name()));
            }
        }
    }

    fn status_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("status_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Chat Transfer");
                if let Some(watcher) = &self.watcher {
                    ui.label(watcher.location());
                }
            });
            if let Some(snapshot) = &self.snapshot {
                let status = PageStatus::of(snapshot);
                let color = match status {
                    PageStatus::LimitReached => egui::Color32::from_rgb(239, 68, 68),
                    PageStatus::Live => egui::Color32::from_rgb(52, 211, 153),
                    PageStatus::Absent => egui::Color32::from_rgb(245, 158, 11),
                };
                ui.horizontal(|ui| {
                    ui.colored_label(color, "●");
                    ui.label(status.label());
                });
            }
        });
    }

    fn bottom_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("bottom_panel")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.set_height(24.0);
                    if let Some(snapshot) = &self.snapshot {
                        let stats = Stats::of(snapshot);
                        ui.label(format!(
                            "{} messages",
                            stats.messages.to_formatted_string(&Locale::en)
                        ));
                        ui.separator();
                        ui.label(format!(
                            "{} chars",
                            stats.summary_chars.to_formatted_string(&Locale::en)
                        ));
                        ui.separator();
                        ui.label(format!(
                            "~{} tokens",
                            stats.summary_tokens.to_formatted_string(&Locale::en)
                        ));
                        ui.separator();
                    }
                    let fading = self
                        .notification
                        .as_ref()
                        .and_then(|toast| Some((toast.message.clone(), toast.alpha(Instant::now())?)));
                    match fading {
                        Some((message, alpha)) => {
                            let text = egui::RichText::new(message).color(
                                egui::Color32::from_rgba_unmultiplied(
                                    52,
                                    211,
                                    153,
                                    (alpha * 255.0) as u8,
                                ),
                            );
                            ui.label(text);
                            ctx.request_repaint();
                        }
                        None => self.notification = None,
                    }
                });
            });
    }

    fn limit_banner(&self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        let Some(page) = self.coordinator.messenger().page.as_ref() else {
            return;
        };
        let Some(banner) = page.observer().limit().banner(Instant::now()) else {
            return;
        };
        egui::Window::new("Message limit reached!")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::RIGHT_TOP, [-10.0, 40.0])
            .show(ctx, |ui| {
                ui.label("Transfer your conversation to continue elsewhere.");
                ui.add(egui::ProgressBar::new(banner.remaining(Instant::now())));
                ui.horizontal(|ui| {
                    if ui.button("Transfer Now").clicked() {
                        actions.push(Action::TransferNow);
                    }
                    if ui.button("Dismiss").clicked() {
                        actions.push(Action::DismissBanner);
                    }
                });
            });
        ctx.request_repaint_after(Duration::from_millis(500));
    }

    fn central_panel(&mut self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.loading && self.snapshot.is_none() {
                ui.spinner();
                ui.label("Reading conversation...");
                return;
            }
            if let (Some(message), None) = (&self.load_error, &self.snapshot) {
                ui.heading("❌ Error");
                ui.label(message.as_str());
                if ui.button("Close").clicked() {
                    actions.push(Action::Close);
                }
                return;
            }

            ui.horizontal(|ui| {
                if ui.button("Copy Summary").clicked() {
                    actions.push(Action::Copy);
                }
                if ui.button("Refresh").clicked() {
                    actions.push(Action::Refresh);
                }
                if ui.button("Save").clicked() {
                    actions.push(Action::Save);
                }
                if ui.button("Open Page File").clicked() {
                    actions.push(Action::PickFile);
                }
            });
            ui.separator();

            ui.label("Summary:");
            egui::ScrollArea::vertical()
                .max_height(320.0)
                .id_salt("summary_scroll_area")
                .show(ui, |ui| {
                    let mut preview = match self.summary() {
                        "" => "No summary available",
                        summary => summary,
                    };
                    ui.add(
                        egui::TextEdit::multiline(&mut preview)
                            .desired_width(f32::INFINITY)
                            .desired_rows(14),
                    );
                });
            ui.separator();

            ui.label("Continue on:");
            ui.horizontal(|ui| {
                for platform in Platform::BUILT_IN {
                    if ui.button(platform.name()).clicked() {
                        actions.push(Action::Open(platform));
                    }
                }
            });
            ui.horizontal(|ui| {
                ui.label("Custom URL:");
                ui.text_edit_singleline(&mut self.custom_url);
                if ui.button("Open").clicked() {
                    actions.push(Action::OpenCustom);
                }
            });
            ui.separator();

            egui::CollapsingHeader::new(format!("Saved conversations ({})", self.saved.len()))
                .default_open(false)
                .show(ui, |ui| {
                    egui::ScrollArea::vertical()
                        .max_height(200.0)
                        .id_salt("saved_scroll_area")
                        .show(ui, |ui| {
                            for (i, saved) in self.saved.iter().enumerate() {
                                ui.horizontal(|ui| {
                                    if ui.small_button("Copy").clicked() {
                                        actions.push(Action::CopySaved(i));
                                    }
                                    ui.label(format!(
                                        "{} · {} messages · {}",
                                        saved.timestamp, saved.message_count, saved.preview
                                    ));
                                });
                            }
                        });
                });
        });
    }
}

impl eframe::App for TransferApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_page_updates();

        let mut actions = Vec::new();
        self.status_panel(ctx);
        self.bottom_panel(ctx);
        self.limit_banner(ctx, &mut actions);
        self.central_panel(ctx, &mut actions);

        for action in actions {
            self.apply(ctx, action);
        }
        if self.watcher.is_some() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}

pub fn run(app: TransferApp) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([520.0, 720.0]),
        ..Default::default()
    };
    eframe::run_native("Chat Transfer", options, Box::new(|_cc| Ok(Box::new(app))))
}
