//! Whole-file decoding with symphonia
//!
//! Every supported format (MP3, FLAC, AAC/M4A, Vorbis/Ogg, WAV) is decoded up
//! front into interleaved stereo f32. The output device then only moves a frame
//! cursor to seek.

use crate::error::{Error, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Channels in every decoded buffer
pub const OUTPUT_CHANNELS: usize = 2;

/// A decoded track held in memory
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved stereo samples
    pub samples: Vec<f32>,
    /// Rate the file was encoded at
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.samples.len() / OUTPUT_CHANNELS
    }

    pub fn duration_seconds(&self) -> f64 {
        match self.sample_rate {
            0 => 0.0,
            rate => self.frames() as f64 / rate as f64,
        }
    }
}

/// Opened container plus the decoder for its first audio track
struct OpenedTrack {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
}

fn open_track(path: &Path) -> Result<OpenedTrack> {
    let file = File::open(path)
        .map_err(|e| Error::Decode(format!("cannot open {}: {}", path.display(), e)))?;
    let source = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let reader = symphonia::default::get_probe()
        .format(&hint, source, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::Decode(format!("unrecognised format: {}", e)))?
        .format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("no audio track".to_string()))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| Error::Decode("unknown sample rate".to_string()))?;

    let decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("unsupported codec: {}", e)))?;

    Ok(OpenedTrack {
        reader,
        decoder,
        track_id,
        sample_rate,
    })
}

/// Decode `path` completely
///
/// Corrupt packets are skipped; the first unrecoverable read or decode error
/// ends the stream with whatever was decoded so far. A file yielding no audio
/// at all is an error.
pub fn decode_file(path: &Path) -> Result<DecodedAudio> {
    let OpenedTrack {
        mut reader,
        mut decoder,
        track_id,
        sample_rate,
    } = open_track(path)?;

    let mut samples = Vec::new();
    let mut scratch: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => {
                warn!("Stopped reading {}: {}", path.display(), e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let buffer = match decoder.decode(&packet) {
            Ok(buffer) => buffer,
            Err(SymphoniaError::DecodeError(e)) => {
                debug!("Skipping corrupt packet in {}: {}", path.display(), e);
                continue;
            }
            Err(e) => {
                warn!("Stopped decoding {}: {}", path.display(), e);
                break;
            }
        };

        let spec = *buffer.spec();
        let needed = buffer.capacity() * spec.channels.count();
        if scratch.as_ref().map_or(true, |b| b.capacity() < needed) {
            scratch = Some(SampleBuffer::new(buffer.capacity() as u64, spec));
        }
        let Some(scratch) = scratch.as_mut() else {
            continue;
        };
        scratch.copy_interleaved_ref(buffer);

        append_as_stereo(scratch.samples(), spec.channels.count(), &mut samples);
    }

    if samples.is_empty() {
        return Err(Error::Decode(format!("{} contains no audio", path.display())));
    }

    let audio = DecodedAudio {
        samples,
        sample_rate,
    };
    debug!(
        "Decoded {}: {:.2}s at {}Hz",
        path.display(),
        audio.duration_seconds(),
        sample_rate
    );
    Ok(audio)
}

/// Mono is duplicated to both sides; channels past the front pair are dropped
fn append_as_stereo(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    match channels {
        0 => {}
        1 => out.extend(interleaved.iter().flat_map(|&s| [s, s])),
        2 => out.extend_from_slice(interleaved),
        n => out.extend(interleaved.chunks_exact(n).flat_map(|f| [f[0], f[1]])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_is_duplicated() {
        let mut out = Vec::new();
        append_as_stereo(&[0.1, 0.2], 1, &mut out);
        assert_eq!(out, vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn test_surround_keeps_front_pair() {
        let mut out = Vec::new();
        append_as_stereo(&[0.1, 0.2, 0.9, 0.3, 0.4, 0.9], 3, &mut out);
        assert_eq!(out, vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let result = decode_file(Path::new("/nonexistent/track.mp3"));
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_not_audio_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.mp3");
        std::fs::write(&path, b"definitely not an mp3").unwrap();

        assert!(matches!(decode_file(&path), Err(Error::Decode(_))));
    }

    #[test]
    fn test_duration() {
        let audio = DecodedAudio {
            samples: vec![0.0; 44100 * 2 * 3],
            sample_rate: 44100,
        };
        assert_eq!(audio.frames(), 44100 * 3);
        assert!((audio.duration_seconds() - 3.0).abs() < 1e-9);
    }
}
