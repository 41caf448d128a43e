use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

// Errors returned to the frontend from commands. Share outcomes never travel
// through here; they are reported as a `ShareResult` on the completion event.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("Failed to interact with native sharing API: {0}")]
    NativeApi(String),
    #[error("Temporary file operation failed: {0}")]
    TempFile(String),
    #[error("Not supported on this platform: {0}")]
    Unsupported(String),
    #[error("Tauri API error: {0}")]
    Tauri(#[from] tauri::Error),
    #[cfg(mobile)]
    #[error("Plugin invoke error: {0}")]
    PluginInvoke(#[from] tauri::plugin::mobile::PluginInvokeError),
}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}
