use tauri::{Runtime, WebviewWindow};

use super::ChooserSession;
use crate::models::{Rect, ShareItem};
use crate::state::PluginTempFileManager;
use crate::Error;

pub fn can_share() -> bool {
    false
}

pub fn present_chooser<R: Runtime>(
    _window: &WebviewWindow<R>,
    _items: Vec<ShareItem>,
    _rect: Option<Rect>,
    _temp_files: &PluginTempFileManager,
) -> Result<ChooserSession, Error> {
    Err(Error::Unsupported(
        "There is no system share sheet on this platform.".to_string(),
    ))
}
