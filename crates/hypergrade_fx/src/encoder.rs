// SPDX-License-Identifier: MIT OR Apache-2.0
//! `ffmpeg` front end for turning rendered frames into video.
//!
//! Argument lists are built by pure functions so they can be inspected and
//! tested without `ffmpeg` installed; only [`FfmpegEncoder::encode`] and
//! [`FfmpegEncoder::create_proxy`] spawn a process.

use crate::{variant_key, UnknownVariant};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Timeout for the `-version` availability check
pub const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for an encode or proxy job
pub const ENCODE_TIMEOUT: Duration = Duration::from_secs(3600);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Output video codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoCodec {
    /// H.264 via libx264
    #[default]
    H264,
    /// H.265 via libx265
    H265,
    /// Apple `ProRes` via `prores_ks`
    ProRes,
    /// Avid `DNxHD`
    DnxHd,
}

impl VideoCodec {
    /// `ffmpeg` encoder name
    pub fn encoder(&self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::H265 => "libx265",
            Self::ProRes => "prores_ks",
            Self::DnxHd => "dnxhd",
        }
    }

    /// Base constant rate factor, for CRF codecs
    pub fn base_crf(&self) -> Option<i32> {
        match self {
            Self::H264 => Some(18),
            Self::H265 => Some(22),
            Self::ProRes | Self::DnxHd => None,
        }
    }
}

impl FromStr for VideoCodec {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match variant_key(s).as_str() {
            "H264" | "H.264" => Ok(Self::H264),
            "H265" | "H.265" | "HEVC" => Ok(Self::H265),
            "PRORES" => Ok(Self::ProRes),
            "DNXHD" => Ok(Self::DnxHd),
            _ => Err(UnknownVariant::new("codec", s)),
        }
    }
}

/// Quality tier; shifts the CRF of CRF codecs by 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    /// CRF - 2
    #[default]
    High,
    /// Base CRF
    Medium,
    /// CRF + 2
    Low,
}

impl Quality {
    fn crf_offset(&self) -> i32 {
        match self {
            Self::High => -2,
            Self::Medium => 0,
            Self::Low => 2,
        }
    }
}

impl FromStr for Quality {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match variant_key(s).as_str() {
            "HIGH" => Ok(Self::High),
            "MEDIUM" => Ok(Self::Medium),
            "LOW" => Ok(Self::Low),
            _ => Err(UnknownVariant::new("quality", s)),
        }
    }
}

/// Proxy frame size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProxyResolution {
    /// 640x360
    P360,
    /// 854x480
    P480,
    /// 1280x720
    #[default]
    P720,
    /// 1920x1080
    P1080,
}

impl ProxyResolution {
    /// `scale` filter argument
    pub fn scale(&self) -> &'static str {
        match self {
            Self::P360 => "640:360",
            Self::P480 => "854:480",
            Self::P720 => "1280:720",
            Self::P1080 => "1920:1080",
        }
    }
}

impl FromStr for ProxyResolution {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match variant_key(s).as_str() {
            "360P" | "360" => Ok(Self::P360),
            "480P" | "480" => Ok(Self::P480),
            "720P" | "720" => Ok(Self::P720),
            "1080P" | "1080" => Ok(Self::P1080),
            _ => Err(UnknownVariant::new("proxy resolution", s)),
        }
    }
}

/// One image-sequence encode
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeJob {
    /// Input pattern such as `frames/frame_%04d.png`
    pub input_pattern: String,
    /// Output video file
    pub output: PathBuf,
    /// Codec
    pub codec: VideoCodec,
    /// Frames per second
    pub framerate: u32,
    /// Number of the first frame
    pub start_number: u32,
    /// Quality tier
    pub quality: Quality,
}

impl EncodeJob {
    /// Create a job with 24 fps, frame 1 start, H.264 at high quality
    pub fn new(input_pattern: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            input_pattern: input_pattern.into(),
            output: output.into(),
            codec: VideoCodec::default(),
            framerate: 24,
            start_number: 1,
            quality: Quality::default(),
        }
    }
}

/// Errors from the encoder
#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    /// The `ffmpeg` binary could not be run
    #[error("FFmpeg is not available at {0}")]
    Unavailable(PathBuf),
}

/// Runs `ffmpeg`
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    /// Path or name of the `ffmpeg` binary
    pub ffmpeg_path: PathBuf,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegEncoder {
    /// Create an encoder for the given binary
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Whether `ffmpeg -version` runs and exits successfully
    pub fn is_available(&self) -> bool {
        let args = ["-version".to_string()];
        run_with_timeout(&self.ffmpeg_path, &args, VERSION_CHECK_TIMEOUT).success
    }

    /// Arguments for an image-sequence encode
    pub fn encode_args(job: &EncodeJob) -> Vec<String> {
        let mut args = vec![
            "-framerate".to_string(),
            job.framerate.to_string(),
            "-start_number".to_string(),
            job.start_number.to_string(),
            "-i".to_string(),
            job.input_pattern.clone(),
            "-c:v".to_string(),
            job.codec.encoder().to_string(),
        ];

        match job.codec {
            VideoCodec::ProRes => args.extend(["-profile:v".to_string(), "hq".to_string()]),
            VideoCodec::DnxHd => args.extend(["-b:v".to_string(), "185M".to_string()]),
            VideoCodec::H264 | VideoCodec::H265 => {
                let crf = job.codec.base_crf().unwrap_or_default() + job.quality.crf_offset();
                args.extend(["-crf".to_string(), crf.to_string()]);
            }
        }

        args.extend([
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-y".to_string(),
            job.output.display().to_string(),
        ]);
        args
    }

    /// Arguments for a downscaled H.264 preview copy
    pub fn proxy_args(input: &Path, output: &Path, resolution: ProxyResolution) -> Vec<String> {
        vec![
            "-i".to_string(),
            input.display().to_string(),
            "-vf".to_string(),
            format!("scale={}", resolution.scale()),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-crf".to_string(),
            "23".to_string(),
            "-preset".to_string(),
            "fast".to_string(),
            "-y".to_string(),
            output.display().to_string(),
        ]
    }

    /// Encode an image sequence. Returns whether `ffmpeg` succeeded.
    pub fn encode(&self, job: &EncodeJob) -> Result<bool, EncoderError> {
        self.ensure_available()?;
        let args = Self::encode_args(job);
        tracing::info!("Running FFmpeg: {} {}", self.ffmpeg_path.display(), args.join(" "));

        let ok = run_with_timeout(&self.ffmpeg_path, &args, ENCODE_TIMEOUT).success;
        if ok {
            tracing::info!("Video encoded successfully: {}", job.output.display());
        }
        Ok(ok)
    }

    /// Create a proxy video. Returns whether `ffmpeg` succeeded.
    pub fn create_proxy(&self, input: &Path, output: &Path, resolution: ProxyResolution) -> Result<bool, EncoderError> {
        self.ensure_available()?;
        let args = Self::proxy_args(input, output, resolution);
        Ok(run_with_timeout(&self.ffmpeg_path, &args, ENCODE_TIMEOUT).success)
    }

    fn ensure_available(&self) -> Result<(), EncoderError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(EncoderError::Unavailable(self.ffmpeg_path.clone()))
        }
    }
}

/// Exit state and captured error output of one `ffmpeg` run
#[derive(Debug, Default)]
struct RunOutcome {
    success: bool,
    stderr: String,
}

fn join_stderr(reader: Option<JoinHandle<String>>) -> String {
    reader.and_then(|handle| handle.join().ok()).unwrap_or_default()
}

/// Run a program to completion, killing it once `timeout` elapses.
///
/// Standard error is drained on a helper thread while the child is polled,
/// so a chatty process cannot stall on a full pipe.
fn run_with_timeout(program: &Path, args: &[String], timeout: Duration) -> RunOutcome {
    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!("Failed to run {}: {}", program.display(), e);
            return RunOutcome::default();
        }
    };

    let reader = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    });
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let stderr = join_stderr(reader);
                if !status.success() {
                    tracing::warn!("{} exited with {}: {}", program.display(), status, stderr.trim());
                }
                return RunOutcome {
                    success: status.success(),
                    stderr,
                };
            }
            Ok(None) if started.elapsed() >= timeout => {
                tracing::warn!("{} timed out after {:?}", program.display(), timeout);
                let _ = child.kill();
                let _ = child.wait();
                return RunOutcome {
                    success: false,
                    stderr: join_stderr(reader),
                };
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                tracing::warn!("Error waiting for {}: {}", program.display(), e);
                let _ = child.kill();
                let _ = child.wait();
                return RunOutcome {
                    success: false,
                    stderr: join_stderr(reader),
                };
            }
        }
    }
}
