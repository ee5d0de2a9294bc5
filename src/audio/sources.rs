//! Capture source enumeration.
//!
//! Surfaces what the engine can listen to: the default system loopback,
//! other output devices as loopback targets, and plain input devices. The
//! ids here are what `AudioCaptureHandle::new` accepts.

use cpal::traits::{DeviceTrait, HostTrait};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Audio source information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSource {
    /// Unique identifier for the source
    pub id: String,

    /// Display name
    pub name: String,

    /// Source type
    pub source_type: SourceType,
}

/// Type of audio source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// System-wide audio (loopback)
    SystemAudio,

    /// Input device (microphone)
    InputDevice,
}

/// Audio source errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to enumerate devices: {0}")]
    EnumerationError(String),
}

/// List available capture sources
pub fn list_sources() -> Result<Vec<AudioSource>, SourceError> {
    let mut sources = Vec::new();

    let host = cpal::default_host();

    // Default output loopback comes first; it is what most users want
    let default_output_name = host
        .default_output_device()
        .and_then(|d| d.name().ok());

    if let Some(ref device_name) = default_output_name {
        sources.push(AudioSource {
            id: "system_audio".to_string(),
            name: format!("System Audio ({})", device_name),
            source_type: SourceType::SystemAudio,
        });
    }

    // Remaining output devices as explicit loopback targets
    if let Ok(devices) = host.output_devices() {
        for device in devices {
            if let Ok(name) = device.name() {
                if default_output_name.as_deref() == Some(name.as_str()) {
                    continue;
                }
                sources.push(AudioSource {
                    id: format!("output:{}", name),
                    name: format!("Loopback: {}", name),
                    source_type: SourceType::SystemAudio,
                });
            }
        }
    }

    // Input devices (microphones)
    if let Ok(devices) = host.input_devices() {
        for device in devices {
            if let Ok(name) = device.name() {
                sources.push(AudioSource {
                    id: format!("input:{}", name),
                    name: format!("Input: {}", name),
                    source_type: SourceType::InputDevice,
                });
            }
        }
    }

    Ok(sources)
}
