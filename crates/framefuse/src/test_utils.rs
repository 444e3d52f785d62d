//! Synthetic frame devices for exercising the concatenation engine.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::timeline::{
    DeviceFactory, DeviceRegistry, FrameData, FrameDevice, FrameValue, OpenMode, TimeNs,
};

/// Shape of one synthetic source file: `frames` frames spaced
/// `frame_period` apart, optionally advertising a sampling interval.
#[derive(Debug, Clone)]
pub struct SyntheticSpec {
    pub frames: i64,
    pub frame_period: TimeNs,
    pub sampling: Option<TimeNs>,
    pub first_time: TimeNs,
}

/// In-memory device resolving its spec from the configured path. Payloads
/// are the frame position as a scalar, which makes read assertions trivial.
pub struct SyntheticDevice {
    specs: Arc<HashMap<String, SyntheticSpec>>,
    path: String,
    current: Option<SyntheticSpec>,
    template_parameter: Option<i64>,
}

impl SyntheticDevice {
    /// Mark this instance as a configured template prototype.
    pub fn mark_template_parameter(&mut self, value: i64) {
        self.template_parameter = Some(value);
    }
}

impl FrameDevice for SyntheticDevice {
    fn open(&mut self, _mode: OpenMode) -> bool {
        self.current = self.specs.get(&self.path).cloned();
        self.current.is_some()
    }

    fn close(&mut self) {
        self.current = None;
    }

    fn read(&mut self, time: TimeNs) -> Option<FrameData> {
        let spec = self.current.as_ref()?;
        let pos = ((time - spec.first_time) / spec.frame_period).clamp(0, spec.frames - 1);
        let mut data = FrameData::new(FrameValue::Scalar(pos as f64), time);
        if let Some(value) = self.template_parameter {
            data.set_attribute("template.parameter", value);
        }
        Some(data)
    }

    fn pos_to_time(&self, pos: i64) -> TimeNs {
        match &self.current {
            Some(spec) => spec.first_time + pos * spec.frame_period,
            None => 0,
        }
    }

    fn time_to_pos(&self, time: TimeNs) -> i64 {
        match &self.current {
            Some(spec) if spec.frame_period > 0 => (time - spec.first_time) / spec.frame_period,
            _ => 0,
        }
    }

    fn size(&self) -> i64 {
        self.current.as_ref().map(|s| s.frames).unwrap_or(0)
    }

    fn first_time(&self) -> TimeNs {
        self.current.as_ref().map(|s| s.first_time).unwrap_or(0)
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn set_path(&mut self, path: &str) {
        self.path = path.to_string();
    }

    fn clone_empty(&self) -> Box<dyn FrameDevice> {
        Box::new(SyntheticDevice {
            specs: self.specs.clone(),
            path: String::new(),
            current: None,
            template_parameter: None,
        })
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn copy_parameters(&self, dst: &mut dyn FrameDevice) {
        if let Some(other) = dst.as_any_mut().downcast_mut::<SyntheticDevice>() {
            other.template_parameter = self.template_parameter;
        }
    }

    fn estimate_sampling(&self) -> Option<TimeNs> {
        self.current.as_ref().and_then(|s| s.sampling)
    }
}

#[derive(Clone)]
pub struct SyntheticFactory {
    specs: Arc<HashMap<String, SyntheticSpec>>,
}

impl SyntheticFactory {
    pub fn new(specs: &[(&str, SyntheticSpec)]) -> Self {
        Self {
            specs: Arc::new(
                specs
                    .iter()
                    .map(|(name, spec)| (name.to_string(), spec.clone()))
                    .collect(),
            ),
        }
    }

    pub fn create_device(&self) -> SyntheticDevice {
        SyntheticDevice {
            specs: self.specs.clone(),
            path: String::new(),
            current: None,
            template_parameter: None,
        }
    }
}

impl DeviceFactory for SyntheticFactory {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn probe(&self, path: &str) -> bool {
        path.ends_with(".syn") && self.specs.contains_key(path)
    }

    fn create(&self) -> Box<dyn FrameDevice> {
        Box::new(self.create_device())
    }
}

pub fn registry_with(factory: SyntheticFactory) -> Arc<DeviceRegistry> {
    let mut registry = DeviceRegistry::new();
    registry.register(Arc::new(factory));
    Arc::new(registry)
}
