//! MP4 ingestion.
//!
//! Migrated from mp4_converter.c (`get_video_info` line 15,
//! `extract_frames_to_temp` line 103, `convert_mp4_to_repo` line 155);
//! the popen/system pipelines become `std::process::Command` invocations
//! and the `rm -rf` cleanup becomes a drop guard.
//!
//! Decoding the container is delegated to the external `ffmpeg` / `ffprobe`
//! tools: frames are extracted as raw RGB files into a staging directory
//! (scaled and padded to the stream geometry), then fed through the normal
//! encode sequence. The staging directory is removed on every exit path.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::FrameGeometry;
use crate::encoder::source::DirSource;
use crate::encoder::{encode_sequence, EncodeOptions, EncodeStats};
use crate::error::{GvcError, Result};
use crate::notify;
use crate::store::GitStore;

/// Probed properties of the input video stream.
#[derive(Debug, Clone, Copy)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// `None` when the container does not carry a frame count.
    pub frame_count: Option<u64>,
}

// ---------------------------------------------------------------------------
// ffmpeg / ffprobe plumbing
// ---------------------------------------------------------------------------

fn check_ffmpeg_available() -> Result<()> {
    let ok = Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    if ok {
        Ok(())
    } else {
        Err(GvcError::Io(std::io::Error::other(
            "ffmpeg is not available; install it and make sure it is on PATH",
        )))
    }
}

fn ffprobe_entries(input: &Path, entries: &str) -> Result<String> {
    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-select_streams", "v:0", "-show_entries", entries])
        .args(["-of", "csv=p=0"])
        .arg(input)
        .output()
        .map_err(|e| GvcError::Io(std::io::Error::other(format!("running ffprobe: {e}"))))?;
    if !output.status.success() {
        return Err(GvcError::Io(std::io::Error::other(format!(
            "ffprobe failed on {}",
            input.display()
        ))));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

/// Reads dimensions, frame rate and (when present) frame count.
pub fn probe(input: &Path) -> Result<VideoInfo> {
    let line = ffprobe_entries(input, "stream=width,height,r_frame_rate")?;
    let mut fields = line.split(',');
    let malformed = || {
        GvcError::Malformed(format!("unexpected ffprobe output for {}", input.display()))
    };

    let width: u32 = fields.next().and_then(|f| f.trim().parse().ok()).ok_or_else(malformed)?;
    let height: u32 = fields.next().and_then(|f| f.trim().parse().ok()).ok_or_else(malformed)?;
    let rate = fields.next().ok_or_else(malformed)?;
    let (num, den) = rate.split_once('/').ok_or_else(malformed)?;
    let num: f64 = num.trim().parse().map_err(|_| malformed())?;
    let den: f64 = den.trim().parse().map_err(|_| malformed())?;
    if den == 0.0 {
        return Err(malformed());
    }

    let frame_count = ffprobe_entries(input, "stream=nb_frames")
        .ok()
        .and_then(|s| s.parse().ok());

    Ok(VideoInfo { width, height, fps: num / den, frame_count })
}

fn extract_frames(input: &Path, staging: &Path, geometry: FrameGeometry) -> Result<()> {
    fs::create_dir_all(staging)?;

    let (w, h) = (geometry.width, geometry.height);
    let filter = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:black"
    );
    let pattern = staging.join("frame_%06d.rgb");

    notify!(2, "extracting frames from {}...\n", input.display());
    let status = Command::new("ffmpeg")
        .arg("-i")
        .arg(input)
        .args(["-vf", &filter])
        .args(["-f", "image2", "-vcodec", "rawvideo", "-pix_fmt", "rgb24"])
        .arg(&pattern)
        .arg("-y")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| GvcError::Io(std::io::Error::other(format!("running ffmpeg: {e}"))))?;
    if !status.success() {
        return Err(GvcError::Io(std::io::Error::other(format!(
            "ffmpeg frame extraction failed on {}",
            input.display()
        ))));
    }
    Ok(())
}

/// Removes the staging directory when the conversion ends, whichever way.
struct StagingDir(PathBuf);

impl Drop for StagingDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

// ---------------------------------------------------------------------------
// convert_mp4_to_repo
// ---------------------------------------------------------------------------

/// Converts an MP4 file into a frame repository at `repo_path`.
pub fn convert_mp4_to_repo(
    input: &Path,
    repo_path: &Path,
    options: &EncodeOptions,
) -> Result<EncodeStats> {
    if !input.exists() {
        return Err(GvcError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input file does not exist: {}", input.display()),
        )));
    }
    check_ffmpeg_available()?;

    let info = probe(input)?;
    match info.frame_count {
        Some(count) => notify!(
            2,
            "video: {}x{}, {:.2} fps, {count} frames\n",
            info.width, info.height, info.fps
        ),
        None => notify!(
            2,
            "video: {}x{}, {:.2} fps, frame count unknown\n",
            info.width, info.height, info.fps
        ),
    }
    let geometry = options.geometry;
    if info.width != geometry.width || info.height != geometry.height {
        notify!(
            2,
            "note: video will be scaled and padded to {}x{}\n",
            geometry.width, geometry.height
        );
    }

    let staging = StagingDir(
        std::env::temp_dir().join(format!("gitvid-frames-{}", std::process::id())),
    );
    extract_frames(input, &staging.0, geometry)?;

    let store = GitStore::init(repo_path)?;
    let mut frames = DirSource::open(&staging.0, geometry)?;
    encode_sequence(&mut frames, &store, options)
}
