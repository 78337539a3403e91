//! RIFF/WAVE header parsing
//!
//! Only the header is interpreted. Sample data is left in place and located by
//! [`WavInfo::data`], so an output can stream it straight from the asset.

use core::ops::Range;
use core::time::Duration;
use thiserror_no_std::Error;

const FORMAT_PCM: u16 = 1;
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WavError {
    #[error("not a RIFF/WAVE file")]
    NotWave,
    #[error("missing '{0}' chunk")]
    MissingChunk(&'static str),
    #[error("unsupported sample format {0:#06x}, expected PCM")]
    UnsupportedFormat(u16),
    #[error("'fmt ' chunk is truncated")]
    Truncated,
    #[error("{sample_rate} Hz x {channels} ch x {bits_per_sample} bit is not a playable byte rate")]
    ByteRateOverflow {
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
    },
}

/// Format and sample-data location of a PCM WAV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Byte range of the sample data within the file
    pub data: Range<usize>,
}

impl WavInfo {
    pub fn parse(bytes: &[u8]) -> Result<Self, WavError> {
        if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(WavError::NotWave);
        }

        let mut format = None;
        let mut data = None;
        let mut offset = 12;

        while offset + 8 <= bytes.len() {
            let id = &bytes[offset..offset + 4];
            let size = read_u32(bytes, offset + 4) as usize;
            let body_start = offset + 8;
            // Streaming writers leave the size at u32::MAX; clamp to what exists
            let body_end = body_start.saturating_add(size).min(bytes.len());

            match id {
                b"fmt " => format = Some(parse_format(&bytes[body_start..body_end])?),
                b"data" => data = Some(body_start..body_end),
                _ => {}
            }

            // Chunks are word aligned
            offset = body_start.saturating_add(size).saturating_add(size & 1);
        }

        let (channels, sample_rate, bits_per_sample) =
            format.ok_or(WavError::MissingChunk("fmt "))?;
        let data = data.ok_or(WavError::MissingChunk("data"))?;

        let info = Self {
            sample_rate,
            channels,
            bits_per_sample,
            data,
        };
        // Outputs are programmed with a 32-bit byte rate
        if u32::try_from(info.bytes_per_second()).is_err() {
            return Err(WavError::ByteRateOverflow {
                sample_rate,
                channels,
                bits_per_sample,
            });
        }
        Ok(info)
    }

    pub fn bytes_per_second(&self) -> u64 {
        self.sample_rate as u64
            * self.channels as u64
            * (self.bits_per_sample as u64).div_ceil(8)
    }

    /// Playback length of one pass through the sample data.
    pub fn duration(&self) -> Duration {
        match self.bytes_per_second() {
            0 => Duration::ZERO,
            rate => {
                let micros = self.data.len() as u128 * 1_000_000 / rate as u128;
                Duration::from_micros(u64::try_from(micros).unwrap_or(u64::MAX))
            }
        }
    }
}

fn parse_format(body: &[u8]) -> Result<(u16, u32, u16), WavError> {
    if body.len() < 16 {
        return Err(WavError::Truncated);
    }

    let format = read_u16(body, 0);
    if format != FORMAT_PCM && format != FORMAT_EXTENSIBLE {
        return Err(WavError::UnsupportedFormat(format));
    }

    Ok((read_u16(body, 2), read_u32(body, 4), read_u16(body, 14)))
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
