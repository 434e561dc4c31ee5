//! Bounded, thread-safe FIFO queue of video frames.
//!
//! The producer (hardware callback thread) pushes, the consumer (render
//! thread) locks/unlocks/dequeues, and a control thread polls depth. The
//! queue never blocks the producer: at capacity it evicts the oldest
//! unlocked frame, and when even that is impossible it drops the incoming
//! frame. Both losses are counted and observable via [`FrameQueue::dropped`].
//!
//! Lock/unlock is split from dequeue because the host's texture-update
//! protocol issues a "begin" (needs a pointer that stays valid until "end")
//! and a separate "end" on a different call sequence than consumption
//! bookkeeping. The returned `Arc` keeps the pixel block alive for the GPU
//! copy without holding the queue mutex across it.

use crate::frame::{FrameBuffer, SharedFrameBuffer};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// A bounded FIFO of frames, safe to use from any thread.
pub struct FrameQueue {
    inner: Mutex<Inner>,
    max_depth: usize,
}

struct Inner {
    frames: VecDeque<SharedFrameBuffer>,
    /// The oldest entry is locked for a consumer read. Only the front can
    /// ever be locked, and a locked front is never evicted.
    front_locked: bool,
    /// Frames lost to overflow, evicted or rejected.
    dropped: u64,
}

impl FrameQueue {
    /// Default queue depth, sized for roughly a quarter second at 30 fps.
    pub const DEFAULT_DEPTH: usize = 8;

    /// Create a queue holding at most `max_depth` frames (minimum 1).
    pub fn new(max_depth: usize) -> Self {
        let max_depth = max_depth.max(1);
        Self {
            inner: Mutex::new(Inner {
                frames: VecDeque::with_capacity(max_depth),
                front_locked: false,
                dropped: 0,
            }),
            max_depth,
        }
    }

    /// Push a frame, evicting the oldest unlocked frame when at capacity.
    ///
    /// Never blocks and never fails. Returns `false` when the incoming frame
    /// had to be dropped because every queued frame was locked; the dropped
    /// counter is incremented for evictions and rejections alike.
    pub fn push(&self, frame: FrameBuffer) -> bool {
        let frame = Arc::new(frame);
        let mut q = self.inner.lock();
        if q.frames.len() >= self.max_depth {
            if !q.front_locked {
                q.frames.pop_front();
            } else if q.frames.len() >= 2 {
                // Front is protected; evict the second-oldest instead.
                q.frames.remove(1);
            } else {
                q.dropped += 1;
                return false;
            }
            q.dropped += 1;
        }
        q.frames.push_back(frame);
        true
    }

    /// Mark the oldest frame locked and return it.
    ///
    /// The `Arc` keeps the pixel pointer stable while the caller copies;
    /// calling again before [`unlock_oldest`](Self::unlock_oldest) returns
    /// the same frame. Returns `None` on an empty queue.
    pub fn lock_oldest(&self) -> Option<SharedFrameBuffer> {
        let mut q = self.inner.lock();
        let front = q.frames.front().cloned()?;
        q.front_locked = true;
        Some(front)
    }

    /// Clear the lock flag on the oldest frame. No-op if nothing is locked.
    pub fn unlock_oldest(&self) {
        self.inner.lock().front_locked = false;
    }

    /// Remove and return the oldest frame.
    ///
    /// Refuses (returns `None`) while the oldest frame is still locked;
    /// callers must unlock first. No-op on an empty queue.
    pub fn dequeue_oldest(&self) -> Option<SharedFrameBuffer> {
        let mut q = self.inner.lock();
        if q.front_locked {
            return None;
        }
        q.frames.pop_front()
    }

    /// Current number of queued frames. Advisory: may be stale by the time
    /// the caller acts on it.
    pub fn depth(&self) -> usize {
        self.inner.lock().frames.len()
    }

    /// Cumulative count of frames lost to overflow.
    pub fn dropped(&self) -> u64 {
        self.inner.lock().dropped
    }

    /// Drop all queued frames and clear any lock flag.
    pub fn clear(&self) {
        let mut q = self.inner.lock();
        q.front_locked = false;
        q.frames.clear();
    }
}
