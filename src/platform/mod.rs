// Linux has no share sheet, so the helpers below only serve macOS and Windows.
#![cfg_attr(
    not(any(target_os = "windows", target_os = "macos")),
    allow(dead_code)
)]

use std::path::PathBuf;

use crate::models::{Image, ShareItem};
use crate::state::PluginTempFileManager;
use crate::Error;

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
pub use self::windows::*;

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
mod linux;
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub use self::linux::*;

mod dismiss;

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
pub use self::macos::*;

/// A share sheet that is on screen.
pub struct ChooserSession {
    files: Vec<PathBuf>,
    #[cfg(any(target_os = "windows", target_os = "macos"))]
    dismissal: dismiss::DismissWatch,
}

impl ChooserSession {
    /// Blocks until the sheet is dismissed and hands back the files it used.
    pub fn wait(self) -> Vec<PathBuf> {
        #[cfg(any(target_os = "windows", target_os = "macos"))]
        self.dismissal.wait();
        self.files
    }
}

/// Text lines and on-disk files a native share sheet understands.
struct PreparedItems {
    text: String,
    files: Vec<PathBuf>,
}

fn prepare_items(
    items: Vec<ShareItem>,
    temp_files: &PluginTempFileManager,
) -> Result<PreparedItems, Error> {
    let mut lines = Vec::new();
    let mut files = Vec::new();
    for item in items {
        match item {
            ShareItem::Text(text) | ShareItem::Url(text) => lines.push(text),
            ShareItem::Image(image) => {
                files.push(temp_files.materialize(&image_file_name(&image), &image.data)?)
            }
            ShareItem::File(attachment) => {
                files.push(temp_files.materialize(&attachment.filename, &attachment.data)?)
            }
        }
    }
    if lines.is_empty() && files.is_empty() {
        return Err(Error::InvalidArgs("No content provided to share.".to_string()));
    }
    Ok(PreparedItems {
        text: lines.join("\n"),
        files,
    })
}

fn image_file_name(image: &Image) -> String {
    let extension = image
        .mime_type
        .mime_type()
        .rsplit('/')
        .next()
        .filter(|ext| !ext.is_empty())
        .unwrap_or("img");
    format!("image.{}", extension)
}
