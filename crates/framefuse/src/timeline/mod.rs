//! Frame concatenation: splice frames from multiple source devices into one
//! logical timeline.
//!
//! `open()` discovers a reader for every input file, selects each file's
//! frame window, records file-relative times, then chains the files into one
//! absolute time axis with an inferred sampling interval filling the gaps
//! between files. Frames either buffer their payload eagerly (`bufferize`)
//! or keep a shared reference to their open device for lazy reads.

mod device;
mod discover;
mod fs;
mod history;
mod progress;

pub use device::{
    DeviceFactory, DeviceRegistry, DeviceSlot, FrameData, FrameDevice, FrameValue, OpenMode,
    SharedDevice, TimeNs,
};
pub use discover::{list_files, SortMode};
pub use fs::{FileSystem, FsEntry, PhysicalFileSystem};
pub use history::EditEvent;
pub use progress::{CancelFlag, NullProgress, Progress};

use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Sampling interval used when no file reports a usable one (20 ms).
pub const DEFAULT_SAMPLING_NS: TimeNs = 20_000_000;

/// Files are opened in parallel batches of this size, with a cancellation
/// check between batches.
const OPEN_BATCH_SIZE: usize = 4;

/// Bounded depth of the undo/redo stacks.
pub(crate) const HISTORY_DEPTH: usize = 50;

// ── Data model ─────────────────────────────────────────────────────────────

/// One sampled instant of a concatenated timeline.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Shared source device; `None` once the payload is buffered.
    pub device: Option<SharedDevice>,
    /// Identifying path of the source file.
    pub path: String,
    /// Index into the source device's own frame sequence.
    pub pos: i64,
    /// Buffered payload, present only when the timeline was bufferized.
    pub any: Option<FrameData>,
    /// Absolute time on the concatenated timeline, in nanoseconds.
    pub time: TimeNs,
}

/// Timeline configuration; persisted by the surrounding property layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Start time for each sub-file, in seconds relative to the file start.
    /// Can lead to ignored files.
    pub start_time_s: f64,
    /// End time for each sub-file, in seconds relative to the file start.
    pub end_time_s: f64,
    /// Keep one frame out of every N for each sub-file.
    pub frame_stride: i64,
    /// Eagerly buffer every payload at open time. Costs memory, makes later
    /// reads trivially thread-safe.
    pub bufferize: bool,
    /// Input files, `;`-separated.
    pub paths: String,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            start_time_s: 0.0,
            end_time_s: f64::INFINITY,
            frame_stride: 1,
            bufferize: true,
            paths: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineState {
    Closed,
    Opening,
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// Configured start time is after the end time.
    InvalidTimeRange,
    /// The path property holds no usable entry.
    NoInputFiles,
    /// Every input file was skipped or empty.
    NoFramesAccepted,
}

impl fmt::Display for TimelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimeRange => write!(f, "invalid start/end times"),
            Self::NoInputFiles => write!(f, "no input files"),
            Self::NoFramesAccepted => write!(f, "no frames accepted from any file"),
        }
    }
}

impl std::error::Error for TimelineError {}

pub(crate) struct Shared {
    pub(crate) frames: Vec<Frame>,
    pub(crate) undo: VecDeque<Vec<Frame>>,
    pub(crate) redo: VecDeque<Vec<Frame>>,
}

/// Frames produced from one accepted file, in file-relative time.
struct FileFrames {
    frames: Vec<Frame>,
    /// File span used to chain the next file's start.
    span: TimeNs,
}

// ── Timeline ───────────────────────────────────────────────────────────────

/// A concatenated multi-file timeline.
pub struct Timeline {
    registry: Arc<DeviceRegistry>,
    fs: Option<Arc<dyn FileSystem>>,
    config: TimelineConfig,
    name: String,
    state: TimelineState,
    pub(crate) shared: Mutex<Shared>,
    pub(crate) notify: Mutex<Option<Box<dyn Fn(EditEvent) + Send>>>,
}

impl Timeline {
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self::with_config(registry, TimelineConfig::default())
    }

    pub fn with_config(registry: Arc<DeviceRegistry>, config: TimelineConfig) -> Self {
        Self {
            registry,
            fs: None,
            config,
            name: String::new(),
            state: TimelineState::Closed,
            shared: Mutex::new(Shared {
                frames: Vec::new(),
                undo: VecDeque::new(),
                redo: VecDeque::new(),
            }),
            notify: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TimelineConfig {
        &mut self.config
    }

    pub fn set_file_system(&mut self, fs: Arc<dyn FileSystem>) {
        self.fs = Some(fs);
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    /// Display name, derived from the parent directory of the first input.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A path list is acceptable when at least one of its files exists.
    pub fn probe(paths: &str) -> bool {
        paths
            .split(';')
            .filter(|p| !p.is_empty())
            .any(|p| Path::new(p).exists())
    }

    /// Total timeline duration: the last frame's absolute time.
    pub fn duration(&self) -> TimeNs {
        let shared = self.lock_shared();
        shared.frames.last().map(|f| f.time).unwrap_or(0)
    }

    pub fn frame_count(&self) -> usize {
        self.lock_shared().frames.len()
    }

    /// Snapshot of the frame list.
    pub fn frames(&self) -> Vec<Frame> {
        self.lock_shared().frames.clone()
    }

    /// Replace the frame list wholesale (no history entry is recorded).
    pub fn set_frames(&self, frames: Vec<Frame>) {
        self.lock_shared().frames = frames;
    }

    /// Number of source files currently spliced into the timeline.
    pub fn device_count(&self) -> usize {
        let shared = self.lock_shared();
        let mut count = 0;
        let mut last_path: Option<&str> = None;
        for frame in &shared.frames {
            if last_path != Some(frame.path.as_str()) {
                count += 1;
                last_path = Some(frame.path.as_str());
            }
        }
        count
    }

    pub fn close(&mut self) {
        self.state = TimelineState::Closed;
        let mut shared = self.lock_shared();
        shared.frames.clear();
        shared.undo.clear();
        shared.redo.clear();
    }

    /// Open the concatenated timeline.
    ///
    /// Files are processed in parallel batches; a cancellation between
    /// batches stops enqueueing further files but keeps the frames already
    /// accepted. Unreadable files and files with an empty frame window are
    /// skipped. Fails when the configured time range is inverted, the path
    /// list is empty, or no file contributed a single frame.
    pub fn open(&mut self, progress: &dyn Progress) -> Result<(), TimelineError> {
        self.close();
        self.state = TimelineState::Opening;

        let start_ns = self.config.start_time_s * 1e9;
        let end_ns = self.config.end_time_s * 1e9;
        if start_ns > end_ns {
            self.state = TimelineState::Closed;
            return Err(TimelineError::InvalidTimeRange);
        }
        let stride = self.config.frame_stride.max(1);

        let paths: Vec<String> = self
            .config
            .paths
            .split(';')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if paths.is_empty() {
            self.state = TimelineState::Closed;
            return Err(TimelineError::NoInputFiles);
        }

        progress.set_range(0, paths.len() as i64);
        progress.set_cancelable(true);
        progress.set_modal(true);

        let bufferize = self.config.bufferize;
        let min_sampling = AtomicI64::new(i64::MAX);

        let mut results: Vec<Option<FileFrames>> = Vec::with_capacity(paths.len());
        for (batch_index, batch) in paths.chunks(OPEN_BATCH_SIZE).enumerate() {
            if progress.canceled() {
                tracing::info!(
                    processed = batch_index * OPEN_BATCH_SIZE,
                    total = paths.len(),
                    "timeline open canceled"
                );
                break;
            }
            progress.set_value((batch_index * OPEN_BATCH_SIZE) as i64);
            progress.set_text(&file_name(&batch[0]));

            let batch_results: Vec<Option<FileFrames>> = batch
                .par_iter()
                .map(|p| self.open_one(p, start_ns, end_ns, stride, bufferize, &min_sampling))
                .collect();
            results.extend(batch_results);
        }

        let sampling = match min_sampling.load(Ordering::Relaxed) {
            i64::MAX => DEFAULT_SAMPLING_NS,
            s if s <= 0 => DEFAULT_SAMPLING_NS,
            s => s,
        };

        // Second, sequential pass: chain files on the absolute time axis.
        // Each accepted file starts one sampling interval after the end of
        // the previous one.
        let mut frames: Vec<Frame> = Vec::new();
        let mut offset: TimeNs = 0;
        let mut prev_span: Option<TimeNs> = None;
        for file in results.into_iter().flatten() {
            if let Some(span) = prev_span {
                offset += span + sampling;
            }
            for mut frame in file.frames {
                frame.time += offset;
                frames.push(frame);
            }
            prev_span = Some(file.span);
        }

        if frames.is_empty() {
            self.state = TimelineState::Closed;
            return Err(TimelineError::NoFramesAccepted);
        }

        self.name = Path::new(&paths[0])
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::info!(
            frames = frames.len(),
            sampling_ns = sampling,
            name = %self.name,
            "timeline opened"
        );

        self.lock_shared().frames = frames;
        self.state = TimelineState::Open;
        Ok(())
    }

    /// Open one input file and produce its frames in file-relative time.
    fn open_one(
        &self,
        fname: &str,
        start_ns: f64,
        end_ns: f64,
        stride: i64,
        bufferize: bool,
        min_sampling: &AtomicI64,
    ) -> Option<FileFrames> {
        let mut device = match self.registry.create_for_path(fname) {
            Some(d) => d,
            None => {
                tracing::debug!(path = fname, "no device type accepts this file");
                return None;
            }
        };
        if let Some(fs) = &self.fs {
            device.set_file_system(fs.clone());
        }
        device.set_path(fname);
        if !device.open(OpenMode::ReadOnly) {
            tracing::debug!(path = fname, "device failed to open, skipping");
            return None;
        }

        let size = device.size();
        let mut start_pos = if start_ns == f64::NEG_INFINITY {
            0
        } else {
            device.time_to_pos(start_ns as TimeNs + device.first_time())
        };
        let mut end_pos = if end_ns == f64::INFINITY {
            size
        } else {
            device.time_to_pos(end_ns as TimeNs + device.first_time())
        };
        if start_pos >= size || end_pos <= 0 {
            tracing::debug!(path = fname, "empty frame window, skipping");
            return None;
        }
        start_pos = start_pos.max(0);
        end_pos = end_pos.min(size);

        // Race-safe reduce-min over the parallel batch.
        if let Some(sampling) = device.estimate_sampling() {
            if sampling > 0 {
                let mut current = min_sampling.load(Ordering::Relaxed);
                while sampling < current {
                    match min_sampling.compare_exchange_weak(
                        current,
                        sampling,
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => break,
                        Err(observed) => current = observed,
                    }
                }
            }
        }

        let shared = SharedDevice::new(device);
        let mut slot = shared.lock();
        let first_rel = slot.pos_to_time(start_pos);

        let mut frames = Vec::new();
        let mut pos = start_pos;
        let mut last_pos = start_pos;
        while pos < end_pos {
            let rel = slot.pos_to_time(pos) - first_rel;
            let any = if bufferize {
                let ftime = slot.pos_to_time(pos);
                slot.read(ftime)
            } else {
                None
            };
            frames.push(Frame {
                device: (!bufferize).then(|| shared.clone()),
                path: fname.to_string(),
                pos,
                any,
                time: rel,
            });
            last_pos = pos;
            pos += stride;
        }

        // Span of the selected window; a single-frame file falls back to
        // its one frame's extent so chaining still reflects the file
        // duration.
        let span = if last_pos == start_pos {
            slot.pos_to_time(start_pos + 1) - first_rel
        } else {
            slot.pos_to_time(last_pos) - first_rel
        };
        drop(slot);

        Some(FileFrames { frames, span })
    }

    /// Random access into the concatenated timeline.
    ///
    /// `time` is clamped into range and converted to the closest frame. The
    /// returned payload is decorated with attributes identifying the source
    /// sub-file, its internal frame index and its original device time, and
    /// stamped with the requested timeline time.
    pub fn read_data(&self, time: TimeNs) -> Option<FrameData> {
        let shared = self.lock_shared();
        if shared.frames.is_empty() {
            return None;
        }

        let pos = position_for_time(&shared.frames, time);
        let frame = &shared.frames[pos];

        let (mut data, ftime) = if let Some(any) = &frame.any {
            if any.is_empty() {
                return None;
            }
            (any.clone(), any.time)
        } else {
            let device = frame.device.as_ref()?;
            let mut slot = device.lock();
            let ftime = slot.pos_to_time(frame.pos);
            let data = slot.read(ftime)?;
            if data.is_empty() {
                return None;
            }
            (data, ftime)
        };

        data.set_attribute("source.file", file_name(&frame.path));
        data.set_attribute("source.frame", frame.pos);
        data.set_attribute("source.time_ns", ftime);
        data.time = time;
        Some(data)
    }

    pub(crate) fn lock_shared(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().expect("timeline state is not poisoned")
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Closest frame index for a timeline time, clamped into range.
pub(crate) fn position_for_time(frames: &[Frame], time: TimeNs) -> usize {
    let idx = frames.partition_point(|f| f.time < time);
    if idx == 0 {
        0
    } else if idx >= frames.len() {
        frames.len() - 1
    } else if frames[idx].time - time < time - frames[idx - 1].time {
        idx
    } else {
        idx - 1
    }
}
