use std::sync::{Arc, Mutex};

use clipboard_rs::{common::RustImage, Clipboard, ClipboardContext, RustImageData};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use tauri::{plugin::PluginApi, AppHandle, Manager, Runtime, WebviewWindow};

use crate::destination::{CapabilityProbe, Destination, DestinationId, SocialNetwork};
use crate::models::*;
use crate::platform;
use crate::provider::{Callback, MailCompose, PresentationProvider};
use crate::state::PluginTempFileManager;

pub fn init<R: Runtime, C: DeserializeOwned>(
    app: &AppHandle<R>,
    _api: PluginApi<R, C>,
    temp_files: PluginTempFileManager,
) -> crate::Result<Arc<DesktopProvider<R>>> {
    Ok(Arc::new(DesktopProvider {
        app: app.clone(),
        temp_files,
        pasteboard: Pasteboard::open(),
    }))
}

/// Desktop host: the system share sheet and the clipboard.
///
/// Desktops have no message, mail, social or photo library sheets, so those
/// destinations always report unavailable.
pub struct DesktopProvider<R: Runtime> {
    app: AppHandle<R>,
    temp_files: PluginTempFileManager,
    pasteboard: Pasteboard,
}

/// The part of the system clipboard a pasteboard share writes to.
trait PasteboardWriter: Send {
    fn write_text(&self, text: &str) -> Result<(), String>;
    fn write_image(&self, bytes: &[u8]) -> Result<(), String>;
}

impl PasteboardWriter for ClipboardContext {
    fn write_text(&self, text: &str) -> Result<(), String> {
        self.set_text(text.to_string()).map_err(|e| e.to_string())
    }

    fn write_image(&self, bytes: &[u8]) -> Result<(), String> {
        RustImageData::from_bytes(bytes)
            .and_then(|data| self.set_image(data))
            .map_err(|e| e.to_string())
    }
}

/// One clipboard context for the lifetime of the plugin.
///
/// On X11 each context starts a server thread that lives as long as the process.
struct Pasteboard<W = ClipboardContext> {
    writer: Mutex<Option<W>>,
}

impl Pasteboard {
    fn open() -> Self {
        let writer = match ClipboardContext::new() {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                warn!("Clipboard unavailable: {}", e);
                None
            }
        };
        Self::new(writer)
    }
}

impl<W: PasteboardWriter> Pasteboard<W> {
    fn new(writer: Option<W>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    fn write(&self, string: Option<&str>, image: Option<&Image>, url: Option<&str>) {
        let guard = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(writer) = guard.as_ref() else {
            warn!("Clipboard unavailable, nothing written");
            return;
        };
        if let Some(text) = string.or(url) {
            if let Err(e) = writer.write_text(text) {
                warn!("Failed to write text to clipboard: {}", e);
            }
        }
        if let Some(image) = image {
            if let Err(e) = writer.write_image(&image.data) {
                warn!("Failed to write image to clipboard: {}", e);
            }
        }
    }
}

impl<R: Runtime> DesktopProvider<R> {
    fn resolve_window(&self, anchor: Option<&SourceAnchor>) -> Option<WebviewWindow<R>> {
        match anchor.and_then(|a| a.window.as_deref()) {
            Some(label) => self.app.get_webview_window(label),
            None => self.app.webview_windows().into_values().next(),
        }
    }
}

impl<R: Runtime> CapabilityProbe for DesktopProvider<R> {
    fn is_available(&self, destination: Destination) -> bool {
        match destination {
            Destination::Chooser => platform::can_share(),
            Destination::Pasteboard => true,
            _ => false,
        }
    }
}

impl<R: Runtime> PresentationProvider for DesktopProvider<R> {
    fn present_text_compose(&self, _message: &str, _attachments: &[Attachment], done: Callback<bool>) {
        warn!("Text compose is not available on desktop");
        done(false);
    }

    fn present_mail_compose(&self, _mail: MailCompose<'_>, done: Callback<MailOutcome>) {
        warn!("Mail compose is not available on desktop");
        done(MailOutcome::Failed);
    }

    fn present_generic_chooser(
        &self,
        items: &[ShareItem],
        _excluded: &[DestinationId],
        anchor: Option<&SourceAnchor>,
        done: Callback<ChooserOutcome>,
    ) {
        let failed = ChooserOutcome {
            chosen: Some(Destination::Chooser.as_str().to_string()),
            completed: false,
            error: true,
        };
        let Some(window) = self.resolve_window(anchor) else {
            warn!("No window to present the share sheet from");
            done(failed);
            return;
        };

        let items = items.to_vec();
        let rect = anchor.and_then(|a| a.rect);
        let temp_files = self.temp_files.clone();
        // Presenting waits on the main thread and then on the sheet being
        // dismissed, neither of which may block the caller.
        std::thread::spawn(move || {
            match platform::present_chooser(&window, items, rect, &temp_files) {
                Ok(session) => {
                    let files = session.wait();
                    debug!("Share sheet dismissed, releasing {} file(s)", files.len());
                    temp_files.release_all(&files);
                    // Desktop share sheets do not say what was picked.
                    done(ChooserOutcome::default());
                }
                Err(e) => {
                    warn!("Failed to present share sheet: {}", e);
                    done(failed);
                }
            }
        });
    }

    fn present_social_compose(
        &self,
        network: SocialNetwork,
        _message: &str,
        _images: &[Image],
        _urls: &[String],
        done: Callback<SocialOutcome>,
    ) {
        warn!("{} compose is not available on desktop", network.as_str());
        done(SocialOutcome::Cancelled);
    }

    fn write_clipboard(&self, string: Option<&str>, image: Option<&Image>, url: Option<&str>) {
        self.pasteboard.write(string, image, url);
    }

    fn save_to_library(&self, _image: &Image, _created_at: u64, done: Callback<LibraryOutcome>) {
        warn!("Photo library is not available on desktop");
        done(LibraryOutcome {
            saved: false,
            error: true,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Written {
        Text(String),
        Image(usize),
    }

    #[derive(Default)]
    struct RecordingWriter {
        written: Arc<Mutex<Vec<Written>>>,
    }

    impl PasteboardWriter for RecordingWriter {
        fn write_text(&self, text: &str) -> Result<(), String> {
            self.written.lock().unwrap().push(Written::Text(text.to_string()));
            Ok(())
        }

        fn write_image(&self, bytes: &[u8]) -> Result<(), String> {
            self.written.lock().unwrap().push(Written::Image(bytes.len()));
            Ok(())
        }
    }

    #[test]
    fn pasteboard_writes_reuse_one_context() {
        let writer = RecordingWriter::default();
        let written = writer.written.clone();
        let pasteboard = Pasteboard::new(Some(writer));

        pasteboard.write(Some("hello"), None, None);
        pasteboard.write(None, Some(&Image::png(vec![1, 2, 3])), None);
        pasteboard.write(None, None, Some("https://tauri.app"));

        assert_eq!(
            *written.lock().unwrap(),
            vec![
                Written::Text("hello".to_string()),
                Written::Image(3),
                Written::Text("https://tauri.app".to_string()),
            ]
        );
    }

    #[test]
    fn missing_clipboard_is_skipped() {
        let pasteboard: Pasteboard<RecordingWriter> = Pasteboard::new(None);
        pasteboard.write(Some("hello"), None, None);
        assert!(pasteboard.writer.lock().unwrap().is_none());
    }
}
