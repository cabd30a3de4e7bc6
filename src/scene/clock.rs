//! Per-frame tick source for transition fades.
//!
//! The app publishes one tick per rendered frame; futures produced by
//! [`FrameClock::next_frame`] resolve with that frame's delta time. This
//! is what lets a fade ramp sample opacity once per render frame while
//! the rest of the transition awaits scene lifecycle hooks.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

#[derive(Default)]
struct ClockInner {
    /// Monotonic frame counter; a [`NextFrame`] resolves once this
    /// advances past the value observed at creation.
    frame: u64,
    /// Delta time of the most recent tick, in seconds.
    dt: f32,
    wakers: Vec<Waker>,
}

/// Shared handle to the host's frame ticks.
///
/// Cloning is cheap; all clones observe the same ticks. The clock is
/// single-threaded — ticks and waiters live on the render thread.
#[derive(Clone, Default)]
pub struct FrameClock {
    inner: Rc<RefCell<ClockInner>>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a frame tick with the frame's delta time in seconds.
    ///
    /// Wakes every future currently waiting in [`next_frame`](Self::next_frame).
    pub fn tick(&self, dt: f32) {
        let wakers = {
            let mut inner = self.inner.borrow_mut();
            inner.frame += 1;
            inner.dt = dt;
            std::mem::take(&mut inner.wakers)
        };
        for waker in wakers {
            waker.wake();
        }
    }

    /// Number of ticks published so far.
    pub fn frame(&self) -> u64 {
        self.inner.borrow().frame
    }

    /// Resolves at the next published tick with its delta time.
    pub fn next_frame(&self) -> NextFrame {
        NextFrame {
            inner: self.inner.clone(),
            seen: self.inner.borrow().frame,
        }
    }
}

/// Future returned by [`FrameClock::next_frame`].
pub struct NextFrame {
    inner: Rc<RefCell<ClockInner>>,
    seen: u64,
}

impl Future for NextFrame {
    type Output = f32;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<f32> {
        let mut inner = self.inner.borrow_mut();
        if inner.frame > self.seen {
            Poll::Ready(inner.dt)
        } else {
            if !inner.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                inner.wakers.push(cx.waker().clone());
            }
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use futures::task::noop_waker;

    fn poll_once<F: Future + Unpin>(fut: &mut F) -> Poll<F::Output> {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        fut.poll_unpin(&mut cx)
    }

    #[test]
    fn next_frame_pends_until_tick() {
        let clock = FrameClock::new();
        let mut fut = clock.next_frame();
        assert!(poll_once(&mut fut).is_pending());

        clock.tick(0.016);
        assert_eq!(poll_once(&mut fut), Poll::Ready(0.016));
    }

    #[test]
    fn tick_before_creation_does_not_satisfy_waiter() {
        let clock = FrameClock::new();
        clock.tick(0.016);

        // Created after the tick; must wait for a fresh one.
        let mut fut = clock.next_frame();
        assert!(poll_once(&mut fut).is_pending());
        clock.tick(0.032);
        assert_eq!(poll_once(&mut fut), Poll::Ready(0.032));
    }

    #[test]
    fn repeated_polls_do_not_pile_up_wakers() {
        let clock = FrameClock::new();
        let mut fut = clock.next_frame();
        for _ in 0..8 {
            assert!(poll_once(&mut fut).is_pending());
        }
        assert_eq!(clock.inner.borrow().wakers.len(), 1);
    }

    #[test]
    fn frame_counter_advances() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        clock.tick(0.01);
        clock.tick(0.01);
        assert_eq!(clock.frame(), 2);
    }
}
