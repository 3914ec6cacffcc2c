//! Panic-site backtraces for task runners.
//!
//! By the time `catch_unwind` hands back a panic the panicking frames are
//! gone, so a backtrace taken there only shows the runner. Instead a chained
//! panic hook captures one while the panicking frames are still on the
//! stack, but only on a thread that is currently polling a [`TracePanics`]
//! future. The runner picks it up with [`take_backtrace`] on the same thread
//! right after the unwind is caught.

use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::sync::Once;
use std::task::{Context, Poll};

thread_local! {
    static ARMED: Cell<bool> = const { Cell::new(false) };
    static CAPTURED: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

/// Chain the capturing hook in front of whatever hook is installed. Runs once
/// per process; the previous hook still prints the usual panic message.
pub fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if ARMED.with(Cell::get) {
                CAPTURED.with(|slot| *slot.borrow_mut() = Some(Backtrace::force_capture()));
            }
            previous(info);
        }));
    });
}

/// Backtrace of the last panic captured on this thread, if any.
pub fn take_backtrace() -> Option<Backtrace> {
    CAPTURED.with(|slot| slot.borrow_mut().take())
}

/// Polls the inner future with capture armed on the polling thread.
pub struct TracePanics<F> {
    inner: Pin<Box<F>>,
}

impl<F: Future> TracePanics<F> {
    pub fn new(inner: F) -> Self {
        Self { inner: Box::pin(inner) }
    }
}

impl<F: Future> Future for TracePanics<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let _armed = Armed::set();
        self.inner.as_mut().poll(cx)
    }
}

/// Restores the previous flag on drop, unwinding included.
struct Armed {
    previous: bool,
}

impl Armed {
    fn set() -> Self {
        Self {
            previous: ARMED.with(|armed| armed.replace(true)),
        }
    }
}

impl Drop for Armed {
    fn drop(&mut self) {
        ARMED.with(|armed| armed.set(self.previous));
    }
}
