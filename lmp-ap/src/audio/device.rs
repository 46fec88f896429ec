//! Audio output using cpal
//!
//! [`DeviceOutput`] implements [`AudioOutput`] on a real output device. The
//! cpal stream lives on its own thread (streams are not `Send` on every
//! platform); the stream callback and the controller share one
//! [`PlaybackBuffer`] behind a mutex. Loading decodes and resamples the whole
//! file on the blocking pool before swapping it in.

use crate::audio::decoder;
use crate::audio::output::{AudioOutput, PlaybackStatus};
use crate::audio::resampler;
use crate::error::{Error, Result};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

/// PCM shared between the stream callback and the controller
#[derive(Debug, Default)]
struct PlaybackBuffer {
    /// Interleaved stereo samples at the device rate; None when nothing is loaded
    samples: Option<Arc<Vec<f32>>>,
    /// Next frame to render
    cursor: usize,
    /// Render audio (false = silence)
    playing: bool,
}

impl PlaybackBuffer {
    fn frames(&self) -> usize {
        self.samples.as_ref().map(|s| s.len() / 2).unwrap_or(0)
    }

    /// Next stereo frame, or silence; stops at the end of the resource
    fn next_frame(&mut self) -> (f32, f32) {
        if !self.playing {
            return (0.0, 0.0);
        }

        let Some(samples) = self.samples.as_ref() else {
            return (0.0, 0.0);
        };

        let idx = self.cursor * 2;
        if idx + 1 >= samples.len() {
            self.playing = false;
            return (0.0, 0.0);
        }

        self.cursor += 1;
        (samples[idx], samples[idx + 1])
    }
}

/// Output device backed by cpal, symphonia and rubato
pub struct DeviceOutput {
    buffer: Arc<Mutex<PlaybackBuffer>>,
    sample_rate: u32,
    shutdown_tx: Option<std_mpsc::Sender<()>>,
    stream_thread: Option<JoinHandle<()>>,
}

impl DeviceOutput {
    /// List available output device names
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    /// Open the named device (or the default one) and start its stream
    ///
    /// Falls back to the default device when the named one is missing.
    pub fn open(device_name: Option<&str>) -> Result<Self> {
        let buffer = Arc::new(Mutex::new(PlaybackBuffer::default()));
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<u32>>();
        let (shutdown_tx, shutdown_rx) = std_mpsc::channel::<()>();

        let thread_buffer = Arc::clone(&buffer);
        let requested = device_name.map(str::to_string);

        let stream_thread = std::thread::Builder::new()
            .name("lmp-audio-out".to_string())
            .spawn(move || {
                let stream = match build_stream(requested.as_deref(), thread_buffer) {
                    Ok((stream, rate)) => {
                        let _ = ready_tx.send(Ok(rate));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                // Keep the stream alive until shutdown (or the sender is dropped)
                let _ = shutdown_rx.recv();
                drop(stream);
                debug!("Audio output thread exiting");
            })
            .map_err(|e| Error::AudioOutput(format!("Failed to spawn audio thread: {}", e)))?;

        let sample_rate = ready_rx
            .recv()
            .map_err(|_| Error::AudioOutput("Audio thread exited during startup".to_string()))??;

        info!("Audio output started at {}Hz", sample_rate);

        Ok(Self {
            buffer,
            sample_rate,
            shutdown_tx: Some(shutdown_tx),
            stream_thread: Some(stream_thread),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, PlaybackBuffer>> {
        self.buffer
            .lock()
            .map_err(|_| Error::AudioOutput("Playback buffer lock poisoned".to_string()))
    }
}

impl Drop for DeviceOutput {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.stream_thread.take() {
            let _ = handle.join();
        }
    }
}

/// Resolve a URI to a local file path (`file://` prefix optional)
pub fn uri_to_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

#[async_trait]
impl AudioOutput for DeviceOutput {
    async fn load(&mut self, uri: &str) -> Result<()> {
        let path = uri_to_path(uri);
        let device_rate = self.sample_rate;

        let samples = tokio::task::spawn_blocking(move || -> Result<Vec<f32>> {
            let decoded = decoder::decode_file(&path)?;
            resampler::resample_stereo(decoded.samples, decoded.sample_rate, device_rate)
        })
        .await
        .map_err(|e| Error::Internal(format!("Decode task failed: {}", e)))?
        .map_err(|e| Error::Resource(format!("{}: {}", uri, e)))?;

        let mut buffer = self.lock()?;
        buffer.samples = Some(Arc::new(samples));
        buffer.cursor = 0;
        buffer.playing = false;

        debug!("Loaded {} ({} frames)", uri, buffer.frames());
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let mut buffer = self.lock()?;
        if buffer.samples.is_none() {
            return Err(Error::AudioOutput("Nothing loaded".to_string()));
        }
        buffer.playing = buffer.cursor < buffer.frames();
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.lock()?.playing = false;
        Ok(())
    }

    async fn seek(&mut self, seconds: f64) -> Result<()> {
        let rate = self.sample_rate as f64;
        let mut buffer = self.lock()?;
        let frames = buffer.frames();
        let target = (seconds.max(0.0) * rate) as usize;
        buffer.cursor = target.min(frames);
        if buffer.cursor >= frames {
            buffer.playing = false;
        }
        Ok(())
    }

    fn status(&self) -> Option<PlaybackStatus> {
        let buffer = self.buffer.lock().ok()?;
        buffer.samples.as_ref()?;

        let rate = self.sample_rate as f64;
        Some(PlaybackStatus::new(
            buffer.cursor as f64 / rate,
            buffer.frames() as f64 / rate,
            buffer.playing,
        ))
    }
}

/// Open a device and start a stream rendering from `buffer`
fn build_stream(
    device_name: Option<&str>,
    buffer: Arc<Mutex<PlaybackBuffer>>,
) -> Result<(Stream, u32)> {
    let host = cpal::default_host();
    let device = select_device(&host, device_name)?;

    let supported = device
        .default_output_config()
        .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;

    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.config();
    let sample_rate = config.sample_rate.0;

    debug!(
        "Audio config: sample_rate={}, channels={}, format={:?}",
        sample_rate, config.channels, sample_format
    );

    let stream = match sample_format {
        SampleFormat::F32 => build_typed_stream::<f32>(&device, &config, buffer)?,
        SampleFormat::I16 => build_typed_stream::<i16>(&device, &config, buffer)?,
        SampleFormat::U16 => build_typed_stream::<u16>(&device, &config, buffer)?,
        other => {
            return Err(Error::AudioOutput(format!(
                "Unsupported sample format: {:?}",
                other
            )))
        }
    };

    stream
        .play()
        .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

    Ok((stream, sample_rate))
}

fn select_device(host: &cpal::Host, device_name: Option<&str>) -> Result<Device> {
    if let Some(name) = device_name {
        let mut devices = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?;

        if let Some(device) = devices.find(|d| d.name().ok().as_deref() == Some(name)) {
            info!("Using audio device: {}", name);
            return Ok(device);
        }

        warn!("Requested device '{}' not found, falling back to default device", name);
    }

    let device = host
        .default_output_device()
        .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?;

    info!(
        "Using default audio device: {}",
        device.name().unwrap_or_else(|_| "Unknown".to_string())
    );
    Ok(device)
}

fn build_typed_stream<T>(
    device: &Device,
    config: &StreamConfig,
    buffer: Arc<Mutex<PlaybackBuffer>>,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut buffer = match buffer.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };

                for frame in data.chunks_mut(channels) {
                    let (left, right) = buffer.next_frame();
                    let left = left.clamp(-1.0, 1.0);
                    let right = right.clamp(-1.0, 1.0);

                    match frame.len() {
                        1 => frame[0] = T::from_sample((left + right) * 0.5),
                        _ => {
                            frame[0] = T::from_sample(left);
                            frame[1] = T::from_sample(right);
                            for extra in frame.iter_mut().skip(2) {
                                *extra = T::from_sample(0.0f32);
                            }
                        }
                    }
                }
            },
            |err| {
                error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
}
