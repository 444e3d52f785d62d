//! Device capability consumed by the concatenation engine, and the registry
//! used to instantiate readers for input files.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};

use image::GrayImage;

use super::fs::FileSystem;
use crate::series::SampleVector;

/// Absolute time coordinate in nanoseconds.
pub type TimeNs = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

// ── Frame payloads ─────────────────────────────────────────────────────────

/// Payload carried by one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FrameValue {
    #[default]
    Empty,
    Scalar(f64),
    Samples(SampleVector),
    Image(GrayImage),
    Raw(Vec<u8>),
}

/// A fully materialized frame payload: value, time stamp and free-form
/// attributes describing its provenance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameData {
    pub time: TimeNs,
    pub attributes: BTreeMap<String, String>,
    pub value: FrameValue,
}

impl FrameData {
    pub fn new(value: FrameValue, time: TimeNs) -> Self {
        Self {
            time,
            attributes: BTreeMap::new(),
            value,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value == FrameValue::Empty
    }

    pub fn set_attribute(&mut self, key: &str, value: impl ToString) {
        self.attributes.insert(key.to_string(), value.to_string());
    }
}

// ── Device trait ───────────────────────────────────────────────────────────

/// A readable frame source (one file of one device type).
///
/// Positions index the device's own frame sequence; `pos_to_time` must also
/// be defined at `pos == size()`, where it reports the end-of-stream time,
/// so a file's total span is queryable.
pub trait FrameDevice: Send {
    fn open(&mut self, mode: OpenMode) -> bool;
    fn close(&mut self);

    /// Read the frame closest to `time`, or `None` on failure.
    fn read(&mut self, time: TimeNs) -> Option<FrameData>;

    fn pos_to_time(&self, pos: i64) -> TimeNs;
    fn time_to_pos(&self, time: TimeNs) -> i64;
    fn size(&self) -> i64;
    fn first_time(&self) -> TimeNs;

    fn path(&self) -> &str;
    fn set_path(&mut self, path: &str);

    /// Instantiate a fresh, unconfigured device of the same concrete type.
    fn clone_empty(&self) -> Box<dyn FrameDevice>;

    /// Downcast support for [`FrameDevice::copy_parameters`] implementations.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;

    /// Copy configured parameters onto another device of the same type.
    fn copy_parameters(&self, _dst: &mut dyn FrameDevice) {}

    fn set_file_system(&mut self, _fs: Arc<dyn FileSystem>) {}

    /// Typical interval between consecutive frames, if the device knows it.
    fn estimate_sampling(&self) -> Option<TimeNs> {
        None
    }
}

/// Creates devices of one concrete type and answers whether a file looks
/// readable by that type.
pub trait DeviceFactory: Send + Sync {
    fn name(&self) -> &str;
    fn probe(&self, path: &str) -> bool;
    fn create(&self) -> Box<dyn FrameDevice>;
}

// ── Registry ───────────────────────────────────────────────────────────────

/// Ordered device-type registry with per-suffix template prototypes.
///
/// A template short-circuits probing: files with a registered suffix get a
/// fresh instance of the template's concrete type with the template's
/// parameters copied over, without re-probing every factory.
#[derive(Default)]
pub struct DeviceRegistry {
    factories: Vec<Arc<dyn DeviceFactory>>,
    templates: Mutex<HashMap<String, Box<dyn FrameDevice>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Arc<dyn DeviceFactory>) {
        self.factories.push(factory);
    }

    /// Register a configured prototype for a file suffix (case-insensitive).
    pub fn set_suffix_template(&self, suffix: &str, template: Box<dyn FrameDevice>) {
        self.templates
            .lock()
            .expect("template registry is not poisoned")
            .insert(suffix.to_lowercase(), template);
    }

    /// Create an unopened device for `path`: template instantiation when the
    /// suffix is registered, first successful probe otherwise.
    pub fn create_for_path(&self, path: &str) -> Option<Box<dyn FrameDevice>> {
        let suffix = std::path::Path::new(path)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        if let Some(suffix) = suffix {
            let templates = self
                .templates
                .lock()
                .expect("template registry is not poisoned");
            if let Some(template) = templates.get(&suffix) {
                let mut device = template.clone_empty();
                template.copy_parameters(&mut *device);
                return Some(device);
            }
        }
        self.factories
            .iter()
            .find(|f| f.probe(path))
            .map(|f| f.create())
    }
}

// ── Shared ownership ───────────────────────────────────────────────────────

/// Guarded device slot; closing happens when the last reference drops.
pub struct DeviceSlot {
    device: Box<dyn FrameDevice>,
}

impl Deref for DeviceSlot {
    type Target = dyn FrameDevice;

    fn deref(&self) -> &Self::Target {
        &*self.device
    }
}

impl DerefMut for DeviceSlot {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.device
    }
}

impl Drop for DeviceSlot {
    fn drop(&mut self) {
        self.device.close();
    }
}

/// Shared ownership of one open device, referenced by every frame spliced
/// from the same source file.
#[derive(Clone)]
pub struct SharedDevice {
    slot: Arc<Mutex<DeviceSlot>>,
}

impl SharedDevice {
    pub fn new(device: Box<dyn FrameDevice>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(DeviceSlot { device })),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, DeviceSlot> {
        self.slot.lock().expect("device slot is not poisoned")
    }
}

impl fmt::Debug for SharedDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedDevice({})", self.lock().path())
    }
}
