use std::collections::HashMap;
use std::sync::{atomic::AtomicBool, mpsc, Arc, Mutex, MutexGuard, OnceLock};
use std::time::Duration;

#[cfg(any(target_os = "windows", target_os = "macos"))]
use tauri::{Runtime, WebviewWindow, WindowEvent};

use crate::Error;

// Some sheets never take focus from the window; treat those as dismissed
// once this has passed without a focus loss.
const DISMISS_GRACE: Duration = Duration::from_millis(250);
const DISMISS_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    Presenting,
    Covered,
    Dismissed,
}

/// Infers when a share sheet closes from the window losing and regaining focus.
#[derive(Debug)]
struct Tracker {
    phase: Phase,
}

impl Tracker {
    fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    fn start(&mut self) {
        self.phase = Phase::Presenting;
    }

    fn settle(&mut self) {
        self.phase = Phase::Idle;
    }

    fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Presenting | Phase::Covered)
    }

    /// Returns `true` when this change means the sheet went away.
    fn focus_changed(&mut self, focused: bool) -> bool {
        match (self.phase, focused) {
            (Phase::Presenting, false) => {
                self.phase = Phase::Covered;
                false
            }
            (Phase::Covered, true) => {
                self.phase = Phase::Dismissed;
                true
            }
            _ => false,
        }
    }

    fn window_closed(&mut self) -> bool {
        let was_active = self.is_active();
        self.phase = Phase::Dismissed;
        was_active
    }

    fn grace_elapsed(&mut self) -> bool {
        if self.phase == Phase::Presenting {
            self.phase = Phase::Dismissed;
            return true;
        }
        false
    }
}

struct WatchState {
    tracker: Tracker,
    waiter: Option<mpsc::Sender<()>>,
}

/// Dismissal state of one window, shared with its event listener.
struct WindowWatch {
    label: String,
    state: Mutex<WatchState>,
    listening: AtomicBool,
}

impl WindowWatch {
    fn new(label: String) -> Self {
        Self {
            label,
            state: Mutex::new(WatchState {
                tracker: Tracker::new(),
                waiter: None,
            }),
            listening: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WatchState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Feeds one observation to the tracker and wakes the waiter if the
    /// sheet is now gone.
    fn observe(&self, observation: impl FnOnce(&mut Tracker) -> bool) {
        let waiter = {
            let mut state = self.lock();
            if observation(&mut state.tracker) {
                state.waiter.take()
            } else {
                None
            }
        };
        if let Some(tx) = waiter {
            let _ = tx.send(());
        }
    }

    fn settle(&self) {
        let mut state = self.lock();
        state.waiter = None;
        state.tracker.settle();
    }
}

/// Pending dismissal of a share sheet. Dropping it stops watching.
pub struct DismissWatch {
    watch: Arc<WindowWatch>,
    rx: mpsc::Receiver<()>,
}

impl DismissWatch {
    /// Blocks until the sheet is dismissed, or gives up after a minute.
    pub fn wait(self) {
        if self.rx.recv_timeout(DISMISS_TIMEOUT).is_err() {
            log::debug!("Stopped waiting for the share sheet in {}", self.watch.label);
        }
    }
}

impl Drop for DismissWatch {
    fn drop(&mut self) {
        self.watch.settle();
    }
}

fn arm(watch: Arc<WindowWatch>) -> Result<DismissWatch, Error> {
    let (tx, rx) = mpsc::channel();
    {
        let mut state = watch.lock();
        if state.waiter.is_some() {
            return Err(Error::NativeApi(
                "A share is already in progress for this window.".to_string(),
            ));
        }
        state.waiter = Some(tx);
        state.tracker.start();
    }

    let timer = watch.clone();
    std::thread::spawn(move || {
        std::thread::sleep(DISMISS_GRACE);
        timer.observe(Tracker::grace_elapsed);
    });

    Ok(DismissWatch { watch, rx })
}

/// Starts watching `window` for the share sheet about to be shown over it.
#[cfg(any(target_os = "windows", target_os = "macos"))]
pub fn watch_dismissal<R: Runtime>(window: &WebviewWindow<R>) -> Result<DismissWatch, Error> {
    use std::sync::atomic::Ordering;

    let watch = watch_for(window.label());
    if !watch.listening.swap(true, Ordering::SeqCst) {
        let listener = watch.clone();
        window.on_window_event(move |event| match event {
            WindowEvent::Focused(focused) => {
                let focused = *focused;
                listener.observe(|tracker| tracker.focus_changed(focused));
            }
            WindowEvent::Destroyed => {
                listener.observe(Tracker::window_closed);
                forget(&listener.label);
            }
            _ => {}
        });
    }
    arm(watch)
}

fn watch_for(label: &str) -> Arc<WindowWatch> {
    let mut watches = match watches().lock() {
        Ok(map) => map,
        Err(poisoned) => poisoned.into_inner(),
    };
    watches
        .entry(label.to_string())
        .or_insert_with(|| Arc::new(WindowWatch::new(label.to_string())))
        .clone()
}

fn forget(label: &str) {
    if let Ok(mut watches) = watches().lock() {
        watches.remove(label);
    }
}

fn watches() -> &'static Mutex<HashMap<String, Arc<WindowWatch>>> {
    static WATCHES: OnceLock<Mutex<HashMap<String, Arc<WindowWatch>>>> = OnceLock::new();
    WATCHES.get_or_init(|| Mutex::new(HashMap::new()))
}
