//! Sample rate conversion with rubato

use crate::audio::decoder::OUTPUT_CHANNELS;
use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use tracing::debug;

/// Convert interleaved stereo from `from_rate` to `to_rate`
///
/// The whole track goes through one fixed-input pass. Matching rates return
/// the input unchanged.
pub fn resample_stereo(samples: Vec<f32>, from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate {
        return Ok(samples);
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(Error::Decode(format!(
            "invalid sample rate conversion {}Hz -> {}Hz",
            from_rate, to_rate
        )));
    }

    let [left, right] = split_channels(&samples);
    if left.is_empty() {
        return Ok(Vec::new());
    }

    let frames_in = left.len();
    let mut resampler = FastFixedIn::<f32>::new(
        to_rate as f64 / from_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        frames_in,
        OUTPUT_CHANNELS,
    )
    .map_err(|e| Error::Decode(format!("resampler setup failed: {}", e)))?;

    let planar = resampler
        .process(&[left, right], None)
        .map_err(|e| Error::Decode(format!("resampling failed: {}", e)))?;

    let output = join_channels(&planar);
    debug!(
        "Resampled {}Hz -> {}Hz: {} -> {} frames",
        from_rate,
        to_rate,
        frames_in,
        output.len() / OUTPUT_CHANNELS
    );
    Ok(output)
}

fn split_channels(interleaved: &[f32]) -> [Vec<f32>; 2] {
    let (left, right) = interleaved
        .chunks_exact(OUTPUT_CHANNELS)
        .map(|frame| (frame[0], frame[1]))
        .unzip();
    [left, right]
}

fn join_channels(planar: &[Vec<f32>]) -> Vec<f32> {
    match planar {
        [left, right, ..] => left.iter().zip(right).flat_map(|(&l, &r)| [l, r]).collect(),
        _ => Vec::new(),
    }
}
