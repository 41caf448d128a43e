use serde::{Deserialize, Serialize};

use crate::destination::{DestinationId, SocialNetwork};
use crate::models::{
    Attachment, ChooserOutcome, Image, LibraryOutcome, MailOutcome, ShareItem, SocialOutcome,
    SourceAnchor,
};

/// One-shot completion handed to the host along with a presentation.
pub type Callback<T> = Box<dyn FnOnce(T) + Send + 'static>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    #[serde(default = "Rgba::opaque")]
    pub alpha: u8,
}

impl Rgba {
    fn opaque() -> u8 {
        u8::MAX
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub color: Option<Rgba>,
}

/// How compose sheets should look while they are on screen.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharingStyle {
    pub bar_button_title: Option<TextStyle>,
    /// Only honoured by mail compose.
    pub title_text: Option<TextStyle>,
    pub background_color: Option<Rgba>,
}

/// The host's process-wide styling, as seen by every presented sheet.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appearance {
    pub bar_button_title: Option<TextStyle>,
    pub navigation_title: Option<TextStyle>,
    pub navigation_background: Option<Rgba>,
}

/// Fields of a mail compose sheet, with absent values already defaulted.
#[derive(Debug, Clone, Copy)]
pub struct MailCompose<'a> {
    pub subject: &'a str,
    pub body: &'a str,
    pub is_html: bool,
    pub to: &'a [String],
    pub cc: &'a [String],
    pub bcc: &'a [String],
    pub attachments: &'a [Attachment],
}

/// The host side of sharing: presents native flows and reports how they ended.
///
/// Every `present_*` method must eventually call its callback at most once.
/// Dropping the callback without calling it is reported as a failure.
pub trait PresentationProvider: Send + Sync {
    fn present_text_compose(
        &self,
        message: &str,
        attachments: &[Attachment],
        done: Callback<bool>,
    );

    fn present_mail_compose(&self, mail: MailCompose<'_>, done: Callback<MailOutcome>);

    fn present_generic_chooser(
        &self,
        items: &[ShareItem],
        excluded: &[DestinationId],
        anchor: Option<&SourceAnchor>,
        done: Callback<ChooserOutcome>,
    );

    fn present_social_compose(
        &self,
        network: SocialNetwork,
        message: &str,
        images: &[Image],
        urls: &[String],
        done: Callback<SocialOutcome>,
    );

    /// Synchronous and infallible from the caller's point of view.
    fn write_clipboard(&self, string: Option<&str>, image: Option<&Image>, url: Option<&str>);

    fn save_to_library(&self, image: &Image, created_at: u64, done: Callback<LibraryOutcome>);

    fn appearance(&self) -> Appearance {
        Appearance::default()
    }

    fn set_appearance(&self, _appearance: &Appearance) {}
}
