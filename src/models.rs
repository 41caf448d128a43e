use serde::{Deserialize, Serialize};

use crate::destination::{Destination, DestinationId, SocialNetwork};

/// Commonly shared MIME types, with an escape hatch for anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttachmentType {
    Aiff,
    Avi,
    Gif,
    Html,
    Jpg,
    Mov,
    Mp3,
    Mp4,
    Pdf,
    PlainText,
    Png,
    Psd,
    Rtf,
    Tiff,
    Zip,
    Custom(String),
}

impl AttachmentType {
    const KNOWN: [AttachmentType; 15] = [
        AttachmentType::Aiff,
        AttachmentType::Avi,
        AttachmentType::Gif,
        AttachmentType::Html,
        AttachmentType::Jpg,
        AttachmentType::Mov,
        AttachmentType::Mp3,
        AttachmentType::Mp4,
        AttachmentType::Pdf,
        AttachmentType::PlainText,
        AttachmentType::Png,
        AttachmentType::Psd,
        AttachmentType::Rtf,
        AttachmentType::Tiff,
        AttachmentType::Zip,
    ];

    /// The MIME type handed to the host.
    pub fn mime_type(&self) -> &str {
        match self {
            AttachmentType::Aiff => "audio/aiff",
            AttachmentType::Avi => "video/avi",
            AttachmentType::Gif => "image/gif",
            AttachmentType::Html => "text/html",
            AttachmentType::Jpg => "image/jpeg",
            AttachmentType::Mov => "video/quicktime",
            AttachmentType::Mp3 => "audio/mp3",
            AttachmentType::Mp4 => "video/mp4",
            AttachmentType::Pdf => "application/pdf",
            AttachmentType::PlainText => "text/plain",
            AttachmentType::Png => "image/png",
            AttachmentType::Psd => "image/psd",
            AttachmentType::Rtf => "text/rtf",
            AttachmentType::Tiff => "image/tiff",
            AttachmentType::Zip => "application/zip",
            AttachmentType::Custom(value) => value,
        }
    }
}

impl From<String> for AttachmentType {
    fn from(value: String) -> Self {
        AttachmentType::KNOWN
            .into_iter()
            .find(|known| known.mime_type() == value)
            .unwrap_or(AttachmentType::Custom(value))
    }
}

impl From<AttachmentType> for String {
    fn from(value: AttachmentType) -> Self {
        match value {
            AttachmentType::Custom(value) => value,
            known => known.mime_type().to_string(),
        }
    }
}

/// A file attached to a message or handed to a chooser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(rename = "mimeType")]
    pub attachment_type: AttachmentType,
    pub filename: String,
    /// Base64 encoded on the wire.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(attachment_type: AttachmentType, filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            attachment_type,
            filename: filename.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    #[serde(default = "Image::default_mime_type")]
    pub mime_type: AttachmentType,
}

impl Image {
    pub fn png(data: Vec<u8>) -> Self {
        Self {
            data,
            mime_type: AttachmentType::Png,
        }
    }

    fn default_mime_type() -> AttachmentType {
        AttachmentType::Png
    }
}

/// One entry of a chooser's item list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ShareItem {
    Text(String),
    Url(String),
    Image(Image),
    File(Attachment),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ClipboardValue {
    Text(String),
    Image(Image),
    Url(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Where a chooser is presented from.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceAnchor {
    /// Label of the window presenting the chooser.
    pub window: Option<String>,
    /// Popover origin in window coordinates; the window centre when absent.
    pub rect: Option<Rect>,
}

/// A request to share to one destination.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(
    tag = "destination",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ShareRequest {
    Text {
        message: Option<String>,
        attachments: Option<Vec<Attachment>>,
    },
    Email {
        subject: Option<String>,
        message: Option<String>,
        #[serde(default)]
        is_html: bool,
        to: Option<Vec<String>>,
        cc: Option<Vec<String>>,
        bcc: Option<Vec<String>>,
        attachments: Option<Vec<Attachment>>,
    },
    Chooser {
        items: Vec<ShareItem>,
        excluded: Option<Vec<DestinationId>>,
        anchor: Option<SourceAnchor>,
    },
    Pasteboard {
        value: ClipboardValue,
    },
    PhotoLibrary {
        image: Image,
        /// Milliseconds since the Unix epoch.
        created_at: Option<u64>,
    },
    Social {
        network: SocialNetwork,
        message: Option<String>,
        images: Option<Vec<Image>>,
        urls: Option<Vec<String>>,
    },
}

impl ShareRequest {
    pub fn destination(&self) -> Destination {
        match self {
            ShareRequest::Text { .. } => Destination::Text,
            ShareRequest::Email { .. } => Destination::Email,
            ShareRequest::Chooser { .. } => Destination::Chooser,
            ShareRequest::Pasteboard { .. } => Destination::Pasteboard,
            ShareRequest::PhotoLibrary { .. } => Destination::PhotoLibrary,
            ShareRequest::Social { network, .. } => Destination::Social(*network),
        }
    }
}

/// Identifies one dispatch so concurrent results can be told apart.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ShareId(uuid::Uuid);

impl ShareId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ShareId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResult {
    pub success: bool,
    pub destination: DestinationId,
}

impl ShareResult {
    pub fn new(success: bool, destination: impl Into<DestinationId>) -> Self {
        Self {
            success,
            destination: destination.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(false, DestinationId::cancelled())
    }
}

/// What the completion slot receives: a result tagged with its dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareCompletion {
    pub id: ShareId,
    #[serde(flatten)]
    pub result: ShareResult,
}

/// Returned by the `share` command; the result follows as an event.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareTicket {
    pub id: ShareId,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MailOutcome {
    Sent,
    Saved,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChooserOutcome {
    /// Activity the user picked; `None` when they backed out.
    pub chosen: Option<String>,
    pub completed: bool,
    #[serde(default)]
    pub error: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SocialOutcome {
    Done,
    Cancelled,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryOutcome {
    pub saved: bool,
    #[serde(default)]
    pub error: bool,
}

mod base64_bytes {
    use base64::{engine::general_purpose, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| serde::de::Error::custom("Invalid Base64 data."))
    }
}
