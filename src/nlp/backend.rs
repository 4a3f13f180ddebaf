use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use super::error::{BackendError, UnknownDevice};

/// Compute device a pipeline prefers to run on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Gpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Gpu => write!(f, "gpu"),
        }
    }
}

impl FromStr for Device {
    type Err = UnknownDevice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Device::Cpu),
            "gpu" => Ok(Device::Gpu),
            other => Err(UnknownDevice(other.to_string())),
        }
    }
}

// Process-wide active device. Pipelines are loaded sequentially, so a
// plain atomic is enough; 0 is cpu, 1 is gpu.
static ACTIVE: AtomicU8 = AtomicU8::new(0);

/// Switch the process-wide backend before loading a pipeline.
///
/// On failure the previously active device stays in effect. No GPU
/// runtime is linked into this build, so requesting `Device::Gpu`
/// always fails.
pub fn require(device: Device) -> Result<(), BackendError> {
    match device {
        Device::Cpu => {
            ACTIVE.store(0, Ordering::SeqCst);
            Ok(())
        }
        Device::Gpu => Err(BackendError::GpuUnavailable),
    }
}

/// The device the most recent successful `require` selected
pub fn active() -> Device {
    match ACTIVE.load(Ordering::SeqCst) {
        1 => Device::Gpu,
        _ => Device::Cpu,
    }
}
