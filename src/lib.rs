//! # tauri-plugin-sharekit
//!
//! A Tauri plugin that shares content to native destinations (messages, mail, the
//! pasteboard, the photo library, social composers and the system share sheet)
//! through one call, and reports one result per share no matter which destination
//! handled it.
//!
//! Every share is checked against the destination's current availability first. An
//! unavailable destination fails immediately without showing anything; otherwise the
//! host presents its native flow and the outcome is reported once it is dismissed.
//!
//! ## Usage
//!
//! ### Rust
//!
//! ```rust,ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(tauri_plugin_sharekit::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! ### Frontend (JavaScript/TypeScript)
//!
//! ```js
//! import { invoke } from '@tauri-apps/api/core';
//! import { listen } from '@tauri-apps/api/event';
//!
//! await listen('sharekit://share-completed', ({ payload }) => {
//!   // { window, id, success, destination }
//!   console.log(payload.success, payload.destination);
//! });
//!
//! const { id } = await invoke('plugin:sharekit|share', {
//!   request: { destination: 'pasteboard', value: { kind: 'text', value: 'hello' } },
//! });
//! ```
//!
//! A chooser dismissed without picking anything reports the `cancelled` destination.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::{debug, error};
use serde::{Deserialize, Serialize};
use tauri::{
    plugin::{Builder, TauriPlugin},
    AppHandle, Emitter, Manager, RunEvent, Runtime, WindowEvent,
};

pub use config::Config;
pub use destination::{
    CapabilityProbe, Destination, DestinationId, DestinationRegistry, DestinationStatus,
    SocialNetwork, CANCELLED,
};
pub use dispatcher::{ShareContext, ShareDispatcher};
pub use models::*;
pub use provider::{
    Appearance, Callback, MailCompose, PresentationProvider, Rgba, SharingStyle, TextStyle,
};
pub use reporter::{Completion, ResultReporter};

#[cfg(desktop)]
mod desktop;
#[cfg(mobile)]
mod mobile;
#[cfg(desktop)]
mod platform;

mod commands;
mod config;
mod destination;
mod dispatcher;
mod error;
mod models;
mod provider;
mod reporter;
mod state;

pub use error::{Error, Result};

/// Event emitted once per share with a [`ShareCompletedEvent`] payload.
pub const SHARE_COMPLETED_EVENT: &str = "sharekit://share-completed";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareCompletedEvent {
    /// Label of the window that started the share.
    pub window: String,
    #[serde(flatten)]
    pub completion: ShareCompletion,
}

/// Access to the share APIs.
///
/// Each window gets its own [`ShareContext`], created on first use with the
/// configured style, whose results are emitted as [`SHARE_COMPLETED_EVENT`].
pub struct Sharekit<R: Runtime> {
    app: AppHandle<R>,
    dispatcher: ShareDispatcher,
    contexts: WindowContexts,
    config: Config,
}

/// Share contexts keyed by window label.
#[derive(Default)]
struct WindowContexts {
    contexts: Mutex<HashMap<String, Arc<ShareContext>>>,
}

impl WindowContexts {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<ShareContext>>> {
        match self.contexts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn get_or_create(
        &self,
        window: &str,
        create: impl FnOnce() -> ShareContext,
    ) -> Arc<ShareContext> {
        self.lock()
            .entry(window.to_string())
            .or_insert_with(|| Arc::new(create()))
            .clone()
    }

    fn remove(&self, window: &str) -> bool {
        self.lock().remove(window).is_some()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().len()
    }
}

impl<R: Runtime> Sharekit<R> {
    pub(crate) fn new<P>(app: AppHandle<R>, provider: Arc<P>, config: Config) -> Self
    where
        P: PresentationProvider + CapabilityProbe + 'static,
    {
        let registry = DestinationRegistry::new(provider.clone());
        Self {
            app,
            dispatcher: ShareDispatcher::new(registry, provider),
            contexts: WindowContexts::default(),
            config,
        }
    }

    pub fn context(&self, window: &str) -> Arc<ShareContext> {
        self.contexts.get_or_create(window, || self.new_context(window))
    }

    /// Drops the context of a closed window. Shares it started that are still
    /// on screen keep reporting through their own completion.
    pub fn forget_window(&self, window: &str) {
        if self.contexts.remove(window) {
            debug!("Dropped share context of {}", window);
        }
    }

    fn new_context(&self, window: &str) -> ShareContext {
        let context = ShareContext::with_style(self.config.style.clone());
        context.set_unify_cancellation(self.config.unify_cancellation);

        let app = self.app.clone();
        let window = window.to_string();
        context.on_completed(move |completion| {
            debug!("Share {:?} completed in {}: {:?}", completion.id, window, completion.result);
            let event = ShareCompletedEvent {
                window: window.clone(),
                completion,
            };
            if let Err(e) = app.emit(SHARE_COMPLETED_EVENT, event) {
                error!("Failed to emit share result: {}", e);
            }
        });
        context
    }

    /// Starts a share from `window`; the result follows as an event.
    pub fn share(&self, window: &str, mut request: ShareRequest) -> ShareTicket {
        if let ShareRequest::Chooser { anchor, .. } = &mut request {
            let anchor = anchor.get_or_insert_with(SourceAnchor::default);
            if anchor.window.is_none() {
                anchor.window = Some(window.to_string());
            }
        }
        let context = self.context(window);
        let id = self.dispatcher.dispatch(&context, &request);
        ShareTicket { id }
    }

    pub fn can_share(&self, destination: Destination) -> bool {
        self.dispatcher.capability(destination)
    }

    pub fn destinations(&self) -> Vec<DestinationStatus> {
        self.dispatcher.registry().statuses()
    }

    pub fn set_style(&self, window: &str, style: SharingStyle) {
        self.context(window).set_style(style);
    }

    pub fn cleanup(&self) -> Result<()> {
        self.app
            .state::<state::PluginTempFileManager>()
            .cleanup_all_managed_files();
        Ok(())
    }
}

/// Extensions to [`tauri::App`], [`tauri::AppHandle`] and [`tauri::Window`] to access the share APIs.
pub trait SharekitExt<R: Runtime> {
    fn sharekit(&self) -> &Sharekit<R>;
}

impl<R: Runtime, T: Manager<R>> crate::SharekitExt<R> for T {
    fn sharekit(&self) -> &Sharekit<R> {
        self.state::<Sharekit<R>>().inner()
    }
}

/// Initializes the plugin.
///
/// Reads `plugins.sharekit` from the app config, picks the desktop or mobile
/// presentation provider and registers the commands. Temporary files handed to
/// a native share UI are removed when the app exits.
pub fn init<R: Runtime>() -> TauriPlugin<R, Option<Config>> {
    Builder::<R, Option<Config>>::new("sharekit")
        .invoke_handler(tauri::generate_handler![
            commands::share,
            commands::can_share,
            commands::destinations,
            commands::set_style,
            commands::cleanup,
        ])
        .setup(|app, api| {
            let config = api.config().clone().unwrap_or_default();
            let temp_files = state::PluginTempFileManager::new();
            #[cfg(mobile)]
            let provider = mobile::init(app, api)?;
            #[cfg(desktop)]
            let provider = desktop::init(app, api, temp_files.clone())?;
            app.manage(Sharekit::new(app.clone(), provider, config));
            app.manage(temp_files);
            Ok(())
        })
        .on_event(|app, event| {
            if let RunEvent::WindowEvent {
                label,
                event: WindowEvent::Destroyed,
                ..
            } = event
            {
                if let Some(sharekit) = app.try_state::<Sharekit<R>>() {
                    sharekit.forget_window(label);
                }
            }
        })
        .on_drop(|app| {
            app.state::<state::PluginTempFileManager>()
                .cleanup_all_managed_files();
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_windows_release_their_context() {
        let contexts = WindowContexts::default();
        let main = contexts.get_or_create("main", ShareContext::new);
        let again = contexts.get_or_create("main", ShareContext::new);
        assert!(Arc::ptr_eq(&main, &again));
        contexts.get_or_create("settings", ShareContext::new);
        assert_eq!(contexts.len(), 2);

        assert!(contexts.remove("main"));
        assert!(!contexts.remove("main"));
        assert_eq!(contexts.len(), 1);

        let reopened = contexts.get_or_create("main", ShareContext::new);
        assert!(!Arc::ptr_eq(&main, &reopened));
    }
}
