use candle_core::Device;
use tracing::{info, warn};

use promptrec_core::config::DevicePreference;

/// Resolve the configured preference to a candle device. `Auto` tries
/// Metal first when compiled in; an unavailable `Metal` request drops to CPU.
pub fn select_device(preference: DevicePreference) -> Device {
    if preference != DevicePreference::Cpu {
        if let Some(dev) = metal_device() {
            info!("embedding device: Metal (MPS)");
            return dev;
        }
        if preference == DevicePreference::Metal {
            warn!("metal device requested but unavailable, using CPU");
        }
    }
    info!("embedding device: CPU");
    Device::Cpu
}

#[cfg(feature = "metal")]
fn metal_device() -> Option<Device> {
    Device::new_metal(0).ok()
}

#[cfg(not(feature = "metal"))]
fn metal_device() -> Option<Device> {
    None
}
