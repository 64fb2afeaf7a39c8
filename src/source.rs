//! Event source interface
//!
//! Detectors never touch `document` or `window` directly. A source turns
//! browser callbacks into [`Signal`]s and hands them to subscribed
//! handlers; the browser implementation lives in `web::DomEventSource`,
//! and [`FakeEventSource`] drives the guard in tests. Timer wake-ups are
//! not signals; they go through the guard's `TimerHost`.

use crate::data_guard::{ElementInfo, ProtectionKind};
use crate::detectors::KeyPress;
use crate::engine::CaptureGuard;
use std::cell::RefCell;
use std::rc::Rc;

/// A browser observation.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    KeyDown(KeyPress),
    KeyUp(KeyPress),
    VisibilityChange,
    FocusLost,
    FocusGained,
    /// Animation-frame timestamp in milliseconds
    AnimationFrame(f64),
    ProtectedAction(ProtectionKind, ElementInfo),
}

/// Subscription key for a [`Signal`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    KeyDown,
    KeyUp,
    VisibilityChange,
    FocusLost,
    FocusGained,
    AnimationFrame,
    ProtectedAction(ProtectionKind),
}

impl SignalKind {
    /// Every kind the guard listens to.
    pub fn all() -> Vec<SignalKind> {
        let mut kinds = vec![
            SignalKind::KeyDown,
            SignalKind::KeyUp,
            SignalKind::VisibilityChange,
            SignalKind::FocusLost,
            SignalKind::FocusGained,
            SignalKind::AnimationFrame,
        ];
        kinds.extend(ProtectionKind::ALL.iter().map(|k| SignalKind::ProtectedAction(*k)));
        kinds
    }
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::KeyDown(_) => SignalKind::KeyDown,
            Signal::KeyUp(_) => SignalKind::KeyUp,
            Signal::VisibilityChange => SignalKind::VisibilityChange,
            Signal::FocusLost => SignalKind::FocusLost,
            Signal::FocusGained => SignalKind::FocusGained,
            Signal::AnimationFrame(_) => SignalKind::AnimationFrame,
            Signal::ProtectedAction(kind, _) => SignalKind::ProtectedAction(*kind),
        }
    }
}

/// What the source should do with the originating browser event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalOutcome {
    /// Call `preventDefault` and `stopPropagation`
    pub prevent_default: bool,
    /// Clipboard payload to write instead of the selection
    pub clipboard: Option<&'static str>,
}

impl SignalOutcome {
    pub fn merge(self, other: SignalOutcome) -> SignalOutcome {
        SignalOutcome {
            prevent_default: self.prevent_default || other.prevent_default,
            clipboard: self.clipboard.or(other.clipboard),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

pub type SignalHandler = Box<dyn FnMut(&Signal) -> SignalOutcome>;

/// Subscribe/unsubscribe for browser observations.
pub trait EventSource {
    fn subscribe(&mut self, kind: SignalKind, handler: SignalHandler) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// Wire every signal kind to `guard`.
pub fn attach<S: EventSource + ?Sized>(
    guard: &Rc<RefCell<CaptureGuard>>,
    source: &mut S,
) -> Vec<SubscriptionId> {
    SignalKind::all()
        .into_iter()
        .map(|kind| {
            let guard = Rc::clone(guard);
            source.subscribe(
                kind,
                Box::new(move |signal: &Signal| match guard.try_borrow_mut() {
                    Ok(mut guard) => guard.handle_signal(signal),
                    Err(_) => {
                        log::debug!("Guard busy, dropping re-entrant {:?}", signal.kind());
                        SignalOutcome::default()
                    }
                }),
            )
        })
        .collect()
}

/// Undo [`attach`].
pub fn detach<S: EventSource + ?Sized>(source: &mut S, ids: &[SubscriptionId]) -> usize {
    ids.iter().filter(|id| source.unsubscribe(**id)).count()
}

/// In-memory source for driving a guard without a browser.
#[derive(Default)]
pub struct FakeEventSource {
    next_id: u64,
    handlers: Vec<(SubscriptionId, SignalKind, SignalHandler)>,
}

impl std::fmt::Debug for FakeEventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeEventSource")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}

impl FakeEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a signal to every matching subscriber.
    pub fn emit(&mut self, signal: Signal) -> SignalOutcome {
        let kind = signal.kind();
        self.handlers
            .iter_mut()
            .filter(|(_, k, _)| *k == kind)
            .fold(SignalOutcome::default(), |acc, (_, _, handler)| {
                acc.merge(handler(&signal))
            })
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}

impl EventSource for FakeEventSource {
    fn subscribe(&mut self, kind: SignalKind, handler: SignalHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, kind, handler));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sid, _, _)| *sid != id);
        self.handlers.len() != before
    }
}
