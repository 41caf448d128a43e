use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};

use crate::destination::DestinationId;
use crate::dispatcher::AppearanceGuard;
use crate::models::{ShareCompletion, ShareId, ShareResult};

type Slot = Arc<dyn Fn(ShareCompletion) + Send + Sync>;

/// Single-slot completion channel.
///
/// Registering replaces whatever was there before. The slot is read when a
/// result is delivered, not when the share was dispatched.
#[derive(Clone, Default)]
pub struct ResultReporter {
    slot: Arc<Mutex<Option<Slot>>>,
}

impl ResultReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, on_completed: F)
    where
        F: Fn(ShareCompletion) + Send + Sync + 'static,
    {
        *self.lock_slot() = Some(Arc::new(on_completed));
    }

    pub fn clear(&self) {
        *self.lock_slot() = None;
    }

    pub fn is_registered(&self) -> bool {
        self.lock_slot().is_some()
    }

    /// Opens the completion for one dispatch.
    pub(crate) fn begin(&self, destination: DestinationId) -> Completion {
        Completion {
            id: ShareId::new(),
            destination,
            reporter: self.clone(),
            appearance: None,
            finished: false,
        }
    }

    fn deliver(&self, completion: ShareCompletion) {
        // Call outside the lock so the slot may re-register itself.
        let slot = self.lock_slot().clone();
        match slot {
            Some(slot) => slot(completion),
            None => debug!(
                "Share {:?} finished with no completion handler registered",
                completion.id
            ),
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<Slot>> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// The outstanding result of one dispatch.
///
/// Consumed by [`Completion::finish`]. Dropping it unfinished reports a failure
/// for the original destination, so every dispatch yields exactly one result.
pub struct Completion {
    id: ShareId,
    destination: DestinationId,
    reporter: ResultReporter,
    appearance: Option<AppearanceGuard>,
    finished: bool,
}

impl Completion {
    pub fn id(&self) -> ShareId {
        self.id
    }

    pub fn destination(&self) -> &DestinationId {
        &self.destination
    }

    /// Keeps transient styling alive until the result is delivered.
    pub(crate) fn hold_appearance(&mut self, guard: AppearanceGuard) {
        self.appearance = Some(guard);
    }

    pub fn finish(mut self, result: ShareResult) {
        self.complete(result);
    }

    fn complete(&mut self, result: ShareResult) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Some(mut guard) = self.appearance.take() {
            guard.restore();
        }
        self.reporter.deliver(ShareCompletion {
            id: self.id,
            result,
        });
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                "Host dropped share {:?} to {} without reporting an outcome",
                self.id, self.destination
            );
            let result = ShareResult::new(false, self.destination.clone());
            self.complete(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn collecting(reporter: &ResultReporter) -> Arc<Mutex<Vec<ShareCompletion>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        reporter.register(move |completion| sink.lock().unwrap().push(completion));
        seen
    }

    #[test]
    fn finish_delivers_once_with_the_dispatch_id() {
        let reporter = ResultReporter::new();
        let seen = collecting(&reporter);

        let completion = reporter.begin(DestinationId::from("email"));
        let id = completion.id();
        completion.finish(ShareResult::new(true, "email"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, id);
        assert!(seen[0].result.success);
    }

    #[test]
    fn dropped_completion_reports_failure_for_its_destination() {
        let reporter = ResultReporter::new();
        let seen = collecting(&reporter);

        drop(reporter.begin(DestinationId::from("text")));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].result, ShareResult::new(false, "text"));
    }

    #[test]
    fn re_registering_replaces_the_slot() {
        let reporter = ResultReporter::new();
        let first = collecting(&reporter);
        let completion = reporter.begin(DestinationId::from("pasteboard"));
        let second = collecting(&reporter);

        completion.finish(ShareResult::new(true, "pasteboard"));

        assert!(first.lock().unwrap().is_empty());
        assert_eq!(second.lock().unwrap().len(), 1);
    }

    #[test]
    fn delivering_without_a_slot_is_harmless() {
        let reporter = ResultReporter::new();
        assert!(!reporter.is_registered());
        reporter
            .begin(DestinationId::from("chooser"))
            .finish(ShareResult::cancelled());

        let seen = collecting(&reporter);
        reporter.clear();
        reporter
            .begin(DestinationId::from("chooser"))
            .finish(ShareResult::cancelled());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn slot_may_re_register_from_inside_the_callback() {
        let reporter = ResultReporter::new();
        let inner = reporter.clone();
        reporter.register(move |_| inner.clear());

        reporter
            .begin(DestinationId::from("text"))
            .finish(ShareResult::new(true, "text"));
        assert!(!reporter.is_registered());
    }

    #[test]
    fn each_dispatch_gets_its_own_identity() {
        let reporter = ResultReporter::new();
        let seen = collecting(&reporter);

        let a = reporter.begin(DestinationId::from("email"));
        let b = reporter.begin(DestinationId::from("text"));
        let (a_id, b_id) = (a.id(), b.id());
        assert_ne!(a_id, b_id);

        b.finish(ShareResult::new(false, "text"));
        a.finish(ShareResult::new(true, "email"));

        let ids: Vec<_> = seen.lock().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![b_id, a_id]);
    }
}
