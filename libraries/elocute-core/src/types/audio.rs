/// Audio-related types
use serde::{Deserialize, Serialize};

/// Properties of the converted clip the engine received
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioInfo {
    /// Duration in seconds
    pub duration: f64,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels (1 = mono)
    pub channels: u16,

    /// Bits per sample
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bits_per_sample: Option<u16>,
}

impl AudioInfo {
    /// Build from a frame count and format
    pub fn from_frames(frames: u32, sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        let duration = if sample_rate == 0 {
            0.0
        } else {
            f64::from(frames) / f64::from(sample_rate)
        };

        Self {
            duration,
            sample_rate,
            channels,
            bits_per_sample: Some(bits_per_sample),
        }
    }
}
