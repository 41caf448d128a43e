use std::cell::RefCell;
use std::sync::mpsc;

use objc2::{
    rc::{autoreleasepool, Retained},
    runtime::AnyObject,
    AnyThread,
};
use objc2_app_kit::{NSSharingServicePicker, NSView};
use objc2_core_foundation::{CGPoint, CGRect, CGSize};
use objc2_foundation::{NSArray, NSRectEdge, NSString, NSURL};
use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use tauri::{Runtime, WebviewWindow};

use super::{dismiss, prepare_items, ChooserSession, PreparedItems};
use crate::models::{Rect, ShareItem};
use crate::state::PluginTempFileManager;
use crate::Error;

thread_local! {
    // The picker has to outlive the call that shows it. Main thread only.
    static ACTIVE_PICKER: RefCell<Option<Retained<NSSharingServicePicker>>> = RefCell::new(None);
}

pub fn can_share() -> bool {
    // NSSharingServicePicker ships with every supported macOS.
    true
}

/// Shows `NSSharingServicePicker` over `window`.
pub fn present_chooser<R: Runtime>(
    window: &WebviewWindow<R>,
    items: Vec<ShareItem>,
    rect: Option<Rect>,
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
            let _ = tx.send(show_picker(&window_clone, &prepared, rect));
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

fn show_picker<R: Runtime>(
    window: &WebviewWindow<R>,
    prepared: &PreparedItems,
    rect: Option<Rect>,
) -> Result<(), Error> {
    let ns_view = get_ns_view(window)?;
    autoreleasepool(|_pool| {
        let mut objects: Vec<Retained<AnyObject>> = Vec::new();
        if !prepared.text.is_empty() {
            let text = NSString::from_str(&prepared.text);
            objects.push(Retained::into_super(Retained::into_super(text)));
        }
        for path in &prepared.files {
            let path = NSString::from_str(&path.to_string_lossy());
            let url = unsafe { NSURL::fileURLWithPath(&path) };
            objects.push(Retained::into_super(Retained::into_super(url)));
        }

        let items = NSArray::from_retained_slice(&objects);
        let picker = unsafe {
            NSSharingServicePicker::initWithItems(NSSharingServicePicker::alloc(), &items)
        };

        let anchor = match rect {
            Some(rect) => CGRect {
                origin: CGPoint {
                    x: rect.x,
                    y: rect.y,
                },
                size: CGSize {
                    width: rect.width,
                    height: rect.height,
                },
            },
            None => {
                let bounds = ns_view.bounds();
                CGRect {
                    origin: CGPoint {
                        x: bounds.size.width / 2.0,
                        y: bounds.size.height / 2.0,
                    },
                    size: CGSize {
                        width: 0.0,
                        height: 0.0,
                    },
                }
            }
        };
        unsafe {
            picker.showRelativeToRect_ofView_preferredEdge(anchor, &ns_view, NSRectEdge::NSMinYEdge);
        }
        ACTIVE_PICKER.with(|active| *active.borrow_mut() = Some(picker));
    });
    Ok(())
}

/// Retrieves the native `NSView` of the window through `raw-window-handle`.
fn get_ns_view<R: Runtime>(window: &WebviewWindow<R>) -> Result<Retained<NSView>, Error> {
    let handle = window
        .window_handle()
        .map_err(|e| Error::NativeApi(e.to_string()))?;
    match handle.as_raw() {
        RawWindowHandle::AppKit(handle) => {
            let ns_view_ptr = handle.ns_view.as_ptr();
            unsafe { Retained::retain(ns_view_ptr.cast::<NSView>()) }
                .ok_or_else(|| Error::NativeApi("Window has no NSView.".to_string()))
        }
        _ => Err(Error::NativeApi(
            "Unsupported window handle type on macOS.".to_string(),
        )),
    }
}
