use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use crate::destination::{Destination, DestinationRegistry, SocialNetwork};
use crate::models::{
    ChooserOutcome, ClipboardValue, LibraryOutcome, MailOutcome, ShareCompletion, ShareId,
    ShareRequest, ShareResult, SocialOutcome,
};
use crate::provider::{Appearance, MailCompose, PresentationProvider, SharingStyle};
use crate::reporter::ResultReporter;

/// Per-owner sharing configuration and completion slot.
#[derive(Default)]
pub struct ShareContext {
    style: Mutex<SharingStyle>,
    unify_cancellation: AtomicBool,
    reporter: ResultReporter,
}

impl ShareContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(style: SharingStyle) -> Self {
        Self {
            style: Mutex::new(style),
            ..Self::default()
        }
    }

    pub fn style(&self) -> SharingStyle {
        match self.style.lock() {
            Ok(style) => style.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_style(&self, style: SharingStyle) {
        match self.style.lock() {
            Ok(mut current) => *current = style,
            Err(poisoned) => *poisoned.into_inner() = style,
        }
    }

    pub fn unify_cancellation(&self) -> bool {
        self.unify_cancellation.load(Ordering::SeqCst)
    }

    /// When set, mail and social cancellations report the cancellation
    /// sentinel the same way a dismissed chooser does.
    pub fn set_unify_cancellation(&self, unify: bool) {
        self.unify_cancellation.store(unify, Ordering::SeqCst);
    }

    pub fn on_completed<F>(&self, on_completed: F)
    where
        F: Fn(ShareCompletion) + Send + Sync + 'static,
    {
        self.reporter.register(on_completed);
    }

    pub fn reporter(&self) -> &ResultReporter {
        &self.reporter
    }
}

/// Restores the ambient appearance captured before a compose sheet was styled.
pub(crate) struct AppearanceGuard {
    provider: Arc<dyn PresentationProvider>,
    saved: Option<Appearance>,
}

impl AppearanceGuard {
    pub(crate) fn restore(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.provider.set_appearance(&saved);
        }
    }
}

impl Drop for AppearanceGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Routes share requests to the host and normalizes what comes back.
#[derive(Clone)]
pub struct ShareDispatcher {
    registry: DestinationRegistry,
    provider: Arc<dyn PresentationProvider>,
}

impl ShareDispatcher {
    pub fn new(registry: DestinationRegistry, provider: Arc<dyn PresentationProvider>) -> Self {
        Self { registry, provider }
    }

    pub fn registry(&self) -> &DestinationRegistry {
        &self.registry
    }

    pub fn capability(&self, destination: Destination) -> bool {
        self.registry.capability(destination)
    }

    /// Starts a share and returns immediately.
    ///
    /// The outcome reaches `context`'s completion slot exactly once: right away
    /// when the destination is unavailable, otherwise when the host reports back.
    pub fn dispatch(&self, context: &ShareContext, request: &ShareRequest) -> ShareId {
        let destination = request.destination();
        let mut completion = context.reporter().begin(destination.id());
        let id = completion.id();

        if !self.registry.capability(destination) {
            debug!("{} is unavailable, share {:?} not presented", destination, id);
            completion.finish(ShareResult::new(false, destination));
            return id;
        }

        debug!("Presenting share {:?} to {}", id, destination);
        let unify = context.unify_cancellation();
        match request {
            ShareRequest::Text {
                message,
                attachments,
            } => {
                completion.hold_appearance(self.apply_style(&context.style(), false));
                self.provider.present_text_compose(
                    message.as_deref().unwrap_or_default(),
                    attachments.as_deref().unwrap_or_default(),
                    Box::new(move |completed| {
                        completion.finish(ShareResult::new(completed, Destination::Text))
                    }),
                );
            }
            ShareRequest::Email {
                subject,
                message,
                is_html,
                to,
                cc,
                bcc,
                attachments,
            } => {
                completion.hold_appearance(self.apply_style(&context.style(), true));
                let mail = MailCompose {
                    subject: subject.as_deref().unwrap_or_default(),
                    body: message.as_deref().unwrap_or_default(),
                    is_html: *is_html,
                    to: to.as_deref().unwrap_or_default(),
                    cc: cc.as_deref().unwrap_or_default(),
                    bcc: bcc.as_deref().unwrap_or_default(),
                    attachments: attachments.as_deref().unwrap_or_default(),
                };
                self.provider.present_mail_compose(
                    mail,
                    Box::new(move |outcome| completion.finish(mail_result(outcome, unify))),
                );
            }
            ShareRequest::Chooser {
                items,
                excluded,
                anchor,
            } => {
                self.provider.present_generic_chooser(
                    items,
                    excluded.as_deref().unwrap_or_default(),
                    anchor.as_ref(),
                    Box::new(move |outcome| completion.finish(chooser_result(outcome))),
                );
            }
            ShareRequest::Pasteboard { value } => {
                let (string, image, url) = match value {
                    ClipboardValue::Text(text) => (Some(text.as_str()), None, None),
                    ClipboardValue::Image(image) => (None, Some(image), None),
                    ClipboardValue::Url(url) => (None, None, Some(url.as_str())),
                };
                self.provider.write_clipboard(string, image, url);
                completion.finish(ShareResult::new(true, Destination::Pasteboard));
            }
            ShareRequest::PhotoLibrary { image, created_at } => {
                self.provider.save_to_library(
                    image,
                    created_at.unwrap_or_else(now_millis),
                    Box::new(move |outcome| completion.finish(library_result(outcome))),
                );
            }
            ShareRequest::Social {
                network,
                message,
                images,
                urls,
            } => {
                let network = *network;
                self.provider.present_social_compose(
                    network,
                    message.as_deref().unwrap_or_default(),
                    images.as_deref().unwrap_or_default(),
                    urls.as_deref().unwrap_or_default(),
                    Box::new(move |outcome| {
                        completion.finish(social_result(network, outcome, unify))
                    }),
                );
            }
        }
        id
    }

    fn apply_style(&self, style: &SharingStyle, mail: bool) -> AppearanceGuard {
        let saved = self.provider.appearance();
        let mut styled = saved.clone();
        styled.bar_button_title = style.bar_button_title.clone();
        if let Some(color) = style.background_color {
            styled.navigation_background = Some(color);
        }
        if mail {
            styled.navigation_title = style.title_text.clone();
        }
        self.provider.set_appearance(&styled);
        AppearanceGuard {
            provider: self.provider.clone(),
            saved: Some(saved),
        }
    }
}

fn mail_result(outcome: MailOutcome, unify: bool) -> ShareResult {
    match outcome {
        MailOutcome::Sent | MailOutcome::Saved => ShareResult::new(true, Destination::Email),
        MailOutcome::Cancelled if unify => ShareResult::cancelled(),
        MailOutcome::Cancelled | MailOutcome::Failed => ShareResult::new(false, Destination::Email),
    }
}

fn chooser_result(outcome: ChooserOutcome) -> ShareResult {
    match outcome.chosen {
        None => ShareResult::cancelled(),
        Some(chosen) => ShareResult::new(outcome.completed && !outcome.error, chosen),
    }
}

fn social_result(network: SocialNetwork, outcome: SocialOutcome, unify: bool) -> ShareResult {
    match outcome {
        SocialOutcome::Done => ShareResult::new(true, Destination::Social(network)),
        SocialOutcome::Cancelled if unify => ShareResult::cancelled(),
        SocialOutcome::Cancelled => ShareResult::new(false, Destination::Social(network)),
    }
}

fn library_result(outcome: LibraryOutcome) -> ShareResult {
    ShareResult::new(outcome.saved && !outcome.error, Destination::PhotoLibrary)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
