//! Bounded undo/redo edit history over the timeline's frame list.

use std::collections::VecDeque;

use super::{
    position_for_time, Frame, TimeNs, Timeline, DEFAULT_SAMPLING_NS, HISTORY_DEPTH,
};

/// Notification emitted after an edit-history operation completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditEvent {
    UndoDone,
    RedoDone,
}

fn push_capped(stack: &mut VecDeque<Vec<Frame>>, frames: Vec<Frame>) {
    if stack.len() == HISTORY_DEPTH {
        stack.pop_front();
    }
    stack.push_back(frames);
}

/// Extent of a lone frame, queried from its device when still referenced.
fn single_frame_span(frame: &Frame) -> Option<TimeNs> {
    let device = frame.device.as_ref()?;
    let slot = device.lock();
    Some(slot.pos_to_time(frame.pos + 1) - slot.pos_to_time(frame.pos))
}

/// Re-close the timeline after an excision: rebase every remaining file run
/// to relative time, infer a new sampling interval from the surviving
/// frames, and chain the runs back together without the removed hole.
fn rechain(frames: &mut [Frame]) {
    if frames.is_empty() {
        return;
    }

    // Contiguous runs sharing one source path.
    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut start = 0;
    for i in 1..frames.len() {
        if frames[i].path != frames[start].path {
            runs.push((start, i));
            start = i;
        }
    }
    runs.push((start, frames.len()));

    // Minimum positive inter-frame interval within the surviving runs.
    let mut sampling = TimeNs::MAX;
    for &(a, b) in &runs {
        for w in frames[a..b].windows(2) {
            let delta = w[1].time - w[0].time;
            if delta > 0 {
                sampling = sampling.min(delta);
            }
        }
    }
    if sampling == TimeNs::MAX || sampling <= 0 {
        sampling = DEFAULT_SAMPLING_NS;
    }

    let mut offset: TimeNs = 0;
    let mut prev_span: Option<TimeNs> = None;
    for &(a, b) in &runs {
        let base = frames[a].time;
        let span = if b - a == 1 {
            single_frame_span(&frames[a]).unwrap_or(0)
        } else {
            frames[b - 1].time - base
        };
        if let Some(prev) = prev_span {
            offset += prev + sampling;
        }
        for frame in &mut frames[a..b] {
            frame.time = frame.time - base + offset;
        }
        prev_span = Some(span);
    }
}

impl Timeline {
    /// Register a callback fired after undo/redo operations.
    pub fn set_notify(&self, callback: impl Fn(EditEvent) + Send + 'static) {
        *self.notify.lock().expect("notify slot is not poisoned") = Some(Box::new(callback));
    }

    pub fn clear_notify(&self) {
        *self.notify.lock().expect("notify slot is not poisoned") = None;
    }

    fn emit(&self, event: EditEvent) {
        if let Some(callback) = &*self.notify.lock().expect("notify slot is not poisoned") {
            callback(event);
        }
    }

    pub fn undo_count(&self) -> usize {
        self.lock_shared().undo.len()
    }

    pub fn redo_count(&self) -> usize {
        self.lock_shared().redo.len()
    }

    /// Drop the undo/redo stacks.
    pub fn reset_state(&self) {
        let mut shared = self.lock_shared();
        shared.undo.clear();
        shared.redo.clear();
    }

    /// Remove the source file containing the frame closest to `time`.
    pub fn remove_device_at_time(&self, time: TimeNs) -> bool {
        let pos = {
            let shared = self.lock_shared();
            if shared.frames.is_empty() {
                return false;
            }
            position_for_time(&shared.frames, time) as i64
        };
        self.remove_device_at_pos(pos)
    }

    /// Remove the whole source file containing the frame at `pos`.
    ///
    /// The contiguous run of frames sharing that frame's path is excised and
    /// the remaining frames are re-chained so the timeline looks as if the
    /// file had never been concatenated. The pre-edit frame list is pushed
    /// onto the undo stack and the redo stack is cleared.
    pub fn remove_device_at_pos(&self, pos: i64) -> bool {
        let mut shared = self.lock_shared();
        if pos < 0 || pos as usize >= shared.frames.len() {
            return false;
        }
        let pos = pos as usize;
        let path = shared.frames[pos].path.clone();

        let mut a = pos;
        while a > 0 && shared.frames[a - 1].path == path {
            a -= 1;
        }
        let mut b = pos + 1;
        while b < shared.frames.len() && shared.frames[b].path == path {
            b += 1;
        }

        let snapshot = shared.frames.clone();
        push_capped(&mut shared.undo, snapshot);
        shared.redo.clear();

        shared.frames.drain(a..b);
        rechain(&mut shared.frames);
        tracing::debug!(path = %path, removed = b - a, "removed device from timeline");
        true
    }

    pub fn undo(&self) -> bool {
        {
            let mut shared = self.lock_shared();
            let Some(previous) = shared.undo.pop_back() else {
                return false;
            };
            let current = std::mem::replace(&mut shared.frames, previous);
            push_capped(&mut shared.redo, current);
        }
        self.emit(EditEvent::UndoDone);
        true
    }

    pub fn redo(&self) -> bool {
        {
            let mut shared = self.lock_shared();
            let Some(next) = shared.redo.pop_back() else {
                return false;
            };
            let current = std::mem::replace(&mut shared.frames, next);
            push_capped(&mut shared.undo, current);
        }
        self.emit(EditEvent::RedoDone);
        true
    }
}
