//! Event dispatch to registered callbacks.
//!
//! For each classified event the dispatcher looks up the callback registered
//! for the event's exact path, checks the owning root's filter, invokes the
//! callback on the calling thread, and then appends a log line.
//!
//! The registry lock is released before the callback runs, so callbacks may
//! call back into the watcher (for example to remove themselves).

use camino::Utf8Path;
use parking_lot::RwLock;

use crate::control::ControlPlane;
use crate::events::FileEvent;
use crate::registry::{Registry, Route};

/// What happened to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// No callback registered for the path.
    Unrouted,
    /// The root's filter rejected the kind.
    Filtered,
    /// The callback ran.
    Delivered,
}

pub(crate) fn dispatch(
    registry: &RwLock<Registry>,
    control: &ControlPlane,
    root: &Utf8Path,
    event: &FileEvent,
) -> Outcome {
    let route = registry.read().route(root, &event.path, event.kind);
    match route {
        Route::Unrouted => Outcome::Unrouted,
        Route::Filtered => {
            tracing::trace!(path = %event.path, kind = %event.kind, "Event suppressed by filter");
            Outcome::Filtered
        }
        Route::Deliver(callback) => {
            callback(event);
            control.log_event(event);
            Outcome::Delivered
        }
    }
}
