// crates/media-engine/src/audio_device.rs
// Output device discovery and lookup by name

use crate::error::{EngineError, EngineResult};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};
use serde::{Deserialize, Serialize};

/// Information about an output device as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDeviceInfo {
    /// Human-readable name, also used to select the device
    pub name: String,
    /// Whether this is the system default device
    pub is_default: bool,
    /// Sample rate the device prefers
    pub default_sample_rate: u32,
    /// Channel count the device prefers
    pub default_channels: u16,
}

/// Enumerates output devices on the default host
pub struct AudioDeviceManager {
    host: Host,
}

impl AudioDeviceManager {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// List output devices, default first, then alphabetically
    ///
    /// Devices that cannot report a name or a default configuration are
    /// skipped.
    pub fn list_devices(&self) -> EngineResult<Vec<AudioDeviceInfo>> {
        let default_name = self
            .host
            .default_output_device()
            .and_then(|d| d.name().ok());

        let devices = self
            .host
            .output_devices()
            .map_err(|e| EngineError::OutputError(format!("Failed to enumerate devices: {}", e)))?;

        let mut infos: Vec<AudioDeviceInfo> = devices
            .filter_map(|device| {
                let name = device.name().ok()?;
                let config = match device.default_output_config() {
                    Ok(config) => config,
                    Err(e) => {
                        log::debug!("Skipping device {}: {}", name, e);
                        return None;
                    }
                };
                Some(AudioDeviceInfo {
                    is_default: default_name.as_deref() == Some(name.as_str()),
                    name,
                    default_sample_rate: config.sample_rate().0,
                    default_channels: config.channels(),
                })
            })
            .collect();

        sort_default_first(&mut infos);
        Ok(infos)
    }

    /// Find a device by exact name, or the default device when `name` is None
    pub fn find_device(&self, name: Option<&str>) -> EngineResult<Device> {
        let Some(name) = name else {
            return self
                .host
                .default_output_device()
                .ok_or_else(|| EngineError::OutputError("No output device available".to_string()));
        };

        let mut devices = self
            .host
            .output_devices()
            .map_err(|e| EngineError::OutputError(format!("Failed to enumerate devices: {}", e)))?;

        devices
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| EngineError::OutputError(format!("Device not found: {}", name)))
    }
}

impl Default for AudioDeviceManager {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_default_first(devices: &mut [AudioDeviceInfo]) {
    devices.sort_by(|a, b| match (a.is_default, b.is_default) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.name.cmp(&b.name),
    });
}
