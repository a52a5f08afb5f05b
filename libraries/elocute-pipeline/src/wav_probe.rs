//! Header inspection of converted clips
//!
//! Only used to annotate results. A clip that cannot be read here is still
//! handed to the engine.

use crate::transcoder::ConversionProfile;
use elocute_core::AudioInfo;
use std::path::Path;
use tracing::warn;

/// Read duration and format from a WAV header
pub fn inspect(path: &Path) -> Option<AudioInfo> {
    let reader = match hound::WavReader::open(path) {
        Ok(reader) => reader,
        Err(e) => {
            warn!("Could not inspect {}: {}", path.display(), e);
            return None;
        }
    };

    let spec = reader.spec();
    Some(AudioInfo::from_frames(
        reader.duration(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
    ))
}

/// Whether `info` describes the mono 16 kHz 16-bit format the engine expects
pub fn matches_profile(info: &AudioInfo) -> bool {
    info.sample_rate == ConversionProfile::SAMPLE_RATE
        && info.channels == ConversionProfile::CHANNELS
        && info.bits_per_sample == Some(ConversionProfile::BITS_PER_SAMPLE)
}
