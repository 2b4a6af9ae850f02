//! Audio stream properties, read with lofty.

use std::path::Path;
use std::time::Duration;

use lofty::file::AudioFile;
use lofty::probe::Probe;

use crate::error::{Error, Result};

/// Stream properties shown by the detailed listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioProperties {
    pub duration: Duration,
    pub bitrate_kbps: Option<u32>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u8>,
}

impl AudioProperties {
    /// Render as a single summary line, e.g. `3:25, 320 kbps, 44100 Hz, 2 channels`.
    pub fn summary(&self) -> String {
        let secs = self.duration.as_secs();
        let mut parts = vec![format!("{}:{:02}", secs / 60, secs % 60)];
        if let Some(bitrate) = self.bitrate_kbps {
            parts.push(format!("{} kbps", bitrate));
        }
        if let Some(rate) = self.sample_rate {
            parts.push(format!("{} Hz", rate));
        }
        if let Some(channels) = self.channels {
            parts.push(format!("{} channels", channels));
        }
        parts.join(", ")
    }
}

/// Probe `path` and read its stream properties.
pub fn read_properties(path: &Path) -> Result<AudioProperties> {
    let tagged_file = Probe::open(path)
        .and_then(|probe| probe.read())
        .map_err(|e| Error::tag_unreadable(path, e.to_string()))?;
    let properties = tagged_file.properties();
    Ok(AudioProperties {
        duration: properties.duration(),
        bitrate_kbps: properties.audio_bitrate(),
        sample_rate: properties.sample_rate(),
        channels: properties.channels(),
    })
}
