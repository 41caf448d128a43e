use std::cell::RefCell;
use std::sync::{mpsc, Arc};

use log::warn;
use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use tauri::{Runtime, WebviewWindow};
use windows::{
    core::{Interface, HSTRING},
    ApplicationModel::DataTransfer::{DataRequestedEventArgs, DataTransferManager},
    Foundation::TypedEventHandler,
    Storage::{IStorageItem, StorageFile},
    Win32::{
        Foundation::HWND,
        System::WinRT::{RoInitialize, RO_INIT_SINGLETHREADED},
        UI::Shell::IDataTransferManagerInterop,
    },
};
use windows_collections::IIterable;

use super::{dismiss, prepare_items, ChooserSession, PreparedItems};
use crate::models::{Rect, ShareItem};
use crate::state::PluginTempFileManager;
use crate::Error;

const DEFAULT_TITLE: &str = "Shared content";

thread_local! {
    // Keeps the manager and its DataRequested token alive until the sheet
    // asks for data. Main thread only.
    static SHARE_STATE: RefCell<Option<(DataTransferManager, i64)>> = RefCell::new(None);
}

impl From<windows::core::Error> for Error {
    fn from(err: windows::core::Error) -> Self {
        Error::NativeApi(err.message().to_string())
    }
}

pub fn can_share() -> bool {
    true
}

/// Shows the Windows share UI for `window`.
///
/// The share UI has no anchor, so `rect` is ignored.
pub fn present_chooser<R: Runtime>(
    window: &WebviewWindow<R>,
    items: Vec<ShareItem>,
    _rect: Option<Rect>,
    temp_files: &PluginTempFileManager,
) -> Result<ChooserSession, Error> {
    let prepared = prepare_items(items, temp_files)?;
    let files = prepared.files.clone();
    let dismissal = match dismiss::watch_dismissal(window) {
        Ok(dismissal) => dismissal,
        Err(e) => {
            temp_files.release_all(&files);
            return Err(e);
        }
    };

    let (tx, rx) = mpsc::channel();
    let window_clone = window.clone();
    let shown = window
        .run_on_main_thread(move || {
            let _ = tx.send(show_share_ui(&window_clone, prepared));
        })
        .map_err(Error::from)
        .and_then(|()| {
            rx.recv()
                .map_err(|_| Error::NativeApi("Failed to receive result from main thread".to_string()))
                .and_then(|result| result)
        });

    if let Err(e) = shown {
        temp_files.release_all(&files);
        return Err(e);
    }
    Ok(ChooserSession { files, dismissal })
}

fn show_share_ui<R: Runtime>(window: &WebviewWindow<R>, prepared: PreparedItems) -> Result<(), Error> {
    initialize_winrt_thread()?;
    let hwnd = get_hwnd(window)?;
    let (dtm, interop) = get_data_transfer_manager(hwnd)?;
    let prepared = Arc::new(prepared);

    let handler = TypedEventHandler::new(
        move |_, args: windows::core::Ref<'_, DataRequestedEventArgs>| -> windows::core::Result<()> {
            if let Some(request_args) = (*args).as_ref() {
                let request = request_args.Request()?;
                let data = request.Data()?;
                data.Properties()?
                    .SetTitle(&HSTRING::from(share_title(&prepared.text)))?;
                if !prepared.text.is_empty() {
                    data.SetText(&HSTRING::from(prepared.text.as_str()))?;
                }

                if !prepared.files.is_empty() {
                    let deferral = request.GetDeferral()?;
                    let files = prepared.files.clone();
                    tauri::async_runtime::spawn(async move {
                        let mut storage_items: Vec<Option<IStorageItem>> = Vec::new();
                        for path in files {
                            let opened = StorageFile::GetFileFromPathAsync(&HSTRING::from(
                                path.to_string_lossy().as_ref(),
                            ))
                            .and_then(|op| op.get())
                            .and_then(|file| file.cast::<IStorageItem>());
                            match opened {
                                Ok(item) => storage_items.push(Some(item)),
                                Err(e) => warn!("Failed to open {} for sharing: {}", path.display(), e),
                            }
                        }

                        if !storage_items.is_empty() {
                            let iterable: Result<IIterable<IStorageItem>, _> = storage_items.try_into();
                            match iterable {
                                Ok(items) => {
                                    if let Err(e) = data.SetStorageItemsReadOnly(&items) {
                                        warn!("Failed to attach files to the share: {}", e);
                                    }
                                }
                                Err(e) => warn!("Failed to collect files for the share: {}", e),
                            }
                        }
                        if let Err(e) = deferral.Complete() {
                            warn!("Failed to complete share deferral: {}", e);
                        }
                    });
                }

                SHARE_STATE.with(|state| {
                    if let Some((manager, token)) = state.borrow_mut().take() {
                        let _ = manager.RemoveDataRequested(token);
                    }
                });
            }
            Ok(())
        },
    );

    let token = dtm.DataRequested(&handler)?;
    SHARE_STATE.with(|state| {
        *state.borrow_mut() = Some((dtm, token));
    });

    unsafe { interop.ShowShareUIForWindow(hwnd) }?;
    Ok(())
}

/// The share UI requires a title; use the first line of text when there is one.
fn share_title(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or(DEFAULT_TITLE)
}

fn initialize_winrt_thread() -> Result<(), Error> {
    // S_FALSE on an already initialized thread is not an error.
    unsafe { RoInitialize(RO_INIT_SINGLETHREADED) }
        .map_err(|e| Error::NativeApi(format!("Failed to initialize WinRT: {}", e)))
}

fn get_hwnd<R: Runtime>(window: &WebviewWindow<R>) -> Result<HWND, Error> {
    let handle = window
        .window_handle()
        .map_err(|e| Error::NativeApi(e.to_string()))?;

    match handle.as_raw() {
        RawWindowHandle::Win32(handle) => Ok(HWND(handle.hwnd.get() as *mut std::ffi::c_void)),
        _ => Err(Error::NativeApi(
            "Unsupported window handle type on Windows.".to_string(),
        )),
    }
}

/// Desktop apps reach the DataTransferManager through the interop factory.
fn get_data_transfer_manager(
    hwnd: HWND,
) -> Result<(DataTransferManager, IDataTransferManagerInterop), Error> {
    let interop = windows::core::factory::<DataTransferManager, IDataTransferManagerInterop>()?;
    let dtm = unsafe { interop.GetForWindow(hwnd) }?;
    Ok((dtm, interop))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_comes_from_the_first_non_empty_line() {
        assert_eq!(share_title("\n  Hello \nworld"), "Hello");
        assert_eq!(share_title(""), DEFAULT_TITLE);
    }
}
