use tauri::{command, AppHandle, Runtime, Window};

use crate::{
    Destination, DestinationStatus, Result, ShareRequest, ShareTicket, SharekitExt, SharingStyle,
};

#[command]
pub(crate) async fn share<R: Runtime>(
    app: AppHandle<R>,
    window: Window<R>,
    request: ShareRequest,
) -> Result<ShareTicket> {
    Ok(app.sharekit().share(window.label(), request))
}

#[command]
pub(crate) async fn can_share<R: Runtime>(
    app: AppHandle<R>,
    destination: Destination,
) -> Result<bool> {
    Ok(app.sharekit().can_share(destination))
}

#[command]
pub(crate) async fn destinations<R: Runtime>(app: AppHandle<R>) -> Result<Vec<DestinationStatus>> {
    Ok(app.sharekit().destinations())
}

#[command]
pub(crate) async fn set_style<R: Runtime>(
    app: AppHandle<R>,
    window: Window<R>,
    style: SharingStyle,
) -> Result<()> {
    app.sharekit().set_style(window.label(), style);
    Ok(())
}

#[command]
pub(crate) async fn cleanup<R: Runtime>(app: AppHandle<R>) -> Result<()> {
    app.sharekit().cleanup()
}
