use std::sync::{Arc, Mutex, MutexGuard};

use log::warn;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tauri::{
    plugin::{PluginApi, PluginHandle},
    AppHandle, Runtime,
};

use crate::destination::{CapabilityProbe, Destination, DestinationId, SocialNetwork};
use crate::models::*;
use crate::provider::{Appearance, Callback, MailCompose, PresentationProvider};

#[cfg(target_os = "android")]
const PLUGIN_IDENTIFIER: &str = "plugin.sharekit";

#[cfg(target_os = "ios")]
tauri::ios_plugin_binding!(init_plugin_sharekit);

// initializes the Kotlin or Swift plugin classes
pub fn init<R: Runtime, C: DeserializeOwned>(
    _app: &AppHandle<R>,
    api: PluginApi<R, C>,
) -> crate::Result<Arc<MobileProvider<R>>> {
    #[cfg(target_os = "android")]
    let handle = api.register_android_plugin(PLUGIN_IDENTIFIER, "SharekitPlugin")?;
    #[cfg(target_os = "ios")]
    let handle = api.register_ios_plugin(init_plugin_sharekit)?;
    Ok(Arc::new(MobileProvider {
        handle,
        appearance: Mutex::new(Appearance::default()),
    }))
}

/// Presents the native sheets of the Kotlin or Swift plugin.
///
/// Each presentation runs on a blocking task that waits for the native side
/// to resolve once its sheet is dismissed.
pub struct MobileProvider<R: Runtime> {
    handle: PluginHandle<R>,
    appearance: Mutex<Appearance>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanShareArgs {
    destination: &'static str,
}

#[derive(Deserialize)]
struct CanShareResponse {
    value: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TextComposeArgs {
    message: String,
    attachments: Vec<Attachment>,
    appearance: Appearance,
}

#[derive(Deserialize)]
struct TextComposeResponse {
    completed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MailComposeArgs {
    subject: String,
    body: String,
    is_html: bool,
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    attachments: Vec<Attachment>,
    appearance: Appearance,
}

#[derive(Deserialize)]
struct MailComposeResponse {
    result: MailOutcome,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChooserArgs {
    items: Vec<ShareItem>,
    excluded: Vec<DestinationId>,
    anchor: Option<SourceAnchor>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SocialComposeArgs {
    network: SocialNetwork,
    message: String,
    images: Vec<Image>,
    urls: Vec<String>,
}

#[derive(Deserialize)]
struct SocialComposeResponse {
    result: SocialOutcome,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClipboardArgs {
    string: Option<String>,
    image: Option<Image>,
    url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveImageArgs {
    image: Image,
    created_at: u64,
}

impl<R: Runtime> MobileProvider<R> {
    fn current_appearance(&self) -> MutexGuard<'_, Appearance> {
        match self.appearance.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Runs `command` off the caller's thread and hands its outcome to `done`.
    /// A failed invoke is reported as `fallback`.
    fn present<P, T, O>(
        &self,
        command: &'static str,
        payload: P,
        map: fn(T) -> O,
        fallback: O,
        done: Callback<O>,
    ) where
        P: Serialize + Send + 'static,
        T: DeserializeOwned + 'static,
        O: Send + 'static,
    {
        let handle = self.handle.clone();
        tauri::async_runtime::spawn_blocking(move || {
            let outcome = match handle.run_mobile_plugin::<T>(command, payload) {
                Ok(response) => map(response),
                Err(e) => {
                    warn!("{} failed: {}", command, e);
                    fallback
                }
            };
            done(outcome);
        });
    }
}

impl<R: Runtime> CapabilityProbe for MobileProvider<R> {
    fn is_available(&self, destination: Destination) -> bool {
        let args = CanShareArgs {
            destination: destination.as_str(),
        };
        match self
            .handle
            .run_mobile_plugin::<CanShareResponse>("canShare", args)
        {
            Ok(response) => response.value,
            Err(e) => {
                warn!("Failed to query {} availability: {}", destination, e);
                false
            }
        }
    }
}

impl<R: Runtime> PresentationProvider for MobileProvider<R> {
    fn present_text_compose(&self, message: &str, attachments: &[Attachment], done: Callback<bool>) {
        let args = TextComposeArgs {
            message: message.to_string(),
            attachments: attachments.to_vec(),
            appearance: self.current_appearance().clone(),
        };
        self.present(
            "presentTextCompose",
            args,
            |response: TextComposeResponse| response.completed,
            false,
            done,
        );
    }

    fn present_mail_compose(&self, mail: MailCompose<'_>, done: Callback<MailOutcome>) {
        let args = MailComposeArgs {
            subject: mail.subject.to_string(),
            body: mail.body.to_string(),
            is_html: mail.is_html,
            to: mail.to.to_vec(),
            cc: mail.cc.to_vec(),
            bcc: mail.bcc.to_vec(),
            attachments: mail.attachments.to_vec(),
            appearance: self.current_appearance().clone(),
        };
        self.present(
            "presentMailCompose",
            args,
            |response: MailComposeResponse| response.result,
            MailOutcome::Failed,
            done,
        );
    }

    fn present_generic_chooser(
        &self,
        items: &[ShareItem],
        excluded: &[DestinationId],
        anchor: Option<&SourceAnchor>,
        done: Callback<ChooserOutcome>,
    ) {
        let args = ChooserArgs {
            items: items.to_vec(),
            excluded: excluded.to_vec(),
            anchor: anchor.cloned(),
        };
        let failed = ChooserOutcome {
            chosen: Some(Destination::Chooser.as_str().to_string()),
            completed: false,
            error: true,
        };
        self.present("presentChooser", args, |outcome: ChooserOutcome| outcome, failed, done);
    }

    fn present_social_compose(
        &self,
        network: SocialNetwork,
        message: &str,
        images: &[Image],
        urls: &[String],
        done: Callback<SocialOutcome>,
    ) {
        let args = SocialComposeArgs {
            network,
            message: message.to_string(),
            images: images.to_vec(),
            urls: urls.to_vec(),
        };
        self.present(
            "presentSocialCompose",
            args,
            |response: SocialComposeResponse| response.result,
            SocialOutcome::Cancelled,
            done,
        );
    }

    fn write_clipboard(&self, string: Option<&str>, image: Option<&Image>, url: Option<&str>) {
        let args = ClipboardArgs {
            string: string.map(str::to_string),
            image: image.cloned(),
            url: url.map(str::to_string),
        };
        if let Err(e) = self
            .handle
            .run_mobile_plugin::<serde_json::Value>("writeClipboard", args)
        {
            warn!("Failed to write to the pasteboard: {}", e);
        }
    }

    fn save_to_library(&self, image: &Image, created_at: u64, done: Callback<LibraryOutcome>) {
        let args = SaveImageArgs {
            image: image.clone(),
            created_at,
        };
        let failed = LibraryOutcome {
            saved: false,
            error: true,
        };
        self.present("saveToLibrary", args, |outcome: LibraryOutcome| outcome, failed, done);
    }

    fn appearance(&self) -> Appearance {
        self.current_appearance().clone()
    }

    fn set_appearance(&self, appearance: &Appearance) {
        *self.current_appearance() = appearance.clone();
    }
}
