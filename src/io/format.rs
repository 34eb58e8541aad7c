//! Declared audio container formats

use serde::{Deserialize, Serialize};
use std::fmt;

/// Audio container formats accepted by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// RIFF/WAVE (PCM or IEEE float payload)
    Wav,
    /// MPEG-1/2 Layer III
    Mp3,
    /// Free Lossless Audio Codec
    Flac,
}

impl AudioFormat {
    /// Every accepted format
    pub const ALL: [AudioFormat; 3] = [AudioFormat::Wav, AudioFormat::Mp3, AudioFormat::Flac];

    /// Detect the format from a file extension (case-insensitive, leading dot allowed)
    ///
    /// # Example
    ///
    /// ```
    /// use stratum_melody::AudioFormat;
    ///
    /// assert_eq!(AudioFormat::from_extension("MP3"), Some(AudioFormat::Mp3));
    /// assert_eq!(AudioFormat::from_extension(".wav"), Some(AudioFormat::Wav));
    /// assert_eq!(AudioFormat::from_extension("pdf"), None);
    /// ```
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "wav" | "wave" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            "flac" => Some(Self::Flac),
            _ => None,
        }
    }

    /// Detect the format from a MIME type such as `audio/mpeg`
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => Some(Self::Wav),
            "audio/mpeg" | "audio/mp3" | "audio/mpeg3" => Some(Self::Mp3),
            "audio/flac" | "audio/x-flac" => Some(Self::Flac),
            _ => None,
        }
    }

    /// Canonical lowercase extension, also used as the Symphonia probe hint
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
        }
    }

    /// Whether the leading bytes carry this container's signature
    ///
    /// MP3 streams either start with an ID3v2 tag or directly with an MPEG
    /// frame sync (11 set bits).
    pub fn matches_header(&self, bytes: &[u8]) -> bool {
        match self {
            Self::Wav => bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE",
            Self::Mp3 => {
                (bytes.len() >= 3 && &bytes[0..3] == b"ID3")
                    || (bytes.len() >= 2 && bytes[0] == 0xFF && (bytes[1] & 0xE0) == 0xE0)
            }
            Self::Flac => bytes.len() >= 4 && &bytes[0..4] == b"fLaC",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
