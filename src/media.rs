use std::collections::VecDeque;
use std::io::Read;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{debug, info, warn};

use crate::constants::*;
use crate::error::{SliderError, SliderResult};
use crate::loads::{LoadStatus, PendingLoad};

#[derive(Clone, Debug, PartialEq)]
pub struct VideoInfo {
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub fps: f32,
    pub duration_sec: f32,
}

impl VideoInfo {
    pub fn frame_time(&self) -> f32 {
        1.0 / self.fps.max(1.0)
    }

    /// Output size when decoding no wider than `max_width`, kept even for the scaler.
    pub fn fitted(&self, max_width: u32) -> (u32, u32) {
        if self.width <= max_width || max_width == 0 {
            return (self.width, self.height);
        }
        let height = (self.height as f64 * max_width as f64 / self.width as f64).round() as u32;
        (max_width & !1, (height & !1).max(2))
    }
}

pub fn probe(source: &str) -> SliderResult<VideoInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_streams", "-show_format"])
        .arg(source)
        .output()
        .map_err(|e| SliderError::media_load(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(SliderError::media_load(format!(
            "ffprobe failed for '{source}': {}",
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| SliderError::decode(format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| SliderError::media_load(format!("no video stream in '{source}'")))?;
    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(SliderError::media_load(format!("missing video dimensions for '{source}'"))),
    };
    let fps = parse_ratio(stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .filter(|fps| *fps > 0.0)
        .ok_or_else(|| SliderError::media_load(format!("invalid frame rate for '{source}'")))?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|s| s.parse::<f32>().ok())
        .unwrap_or(0.0);

    Ok(VideoInfo { source: source.to_string(), width, height, fps, duration_sec })
}

fn parse_ratio(s: &str) -> Option<f32> {
    let (num, den) = s.trim().split_once('/').unwrap_or((s.trim(), "1"));
    let num: f32 = num.parse().ok()?;
    let den: f32 = den.parse().ok()?;
    if den == 0.0 { None } else { Some(num / den) }
}

/// Arguments for a looping, muted, raw RGBA decode to stdout.
pub fn decode_args(info: &VideoInfo, width: u32, height: u32) -> Vec<String> {
    let mut args: Vec<String> = ["-v", "error", "-nostdin", "-stream_loop", "-1", "-i"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.push(info.source.clone());
    args.push("-an".to_string());
    if (width, height) != (info.width, info.height) {
        args.push("-vf".to_string());
        args.push(format!("scale={width}:{height}"));
    }
    for arg in ["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"] {
        args.push(arg.to_string());
    }
    args
}

/// Bytes in one RGBA frame.
pub fn frame_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// Percentage of the prebuffer filled.
pub fn buffered_percent(frames: usize, target: usize) -> f32 {
    if target == 0 {
        return 100.0;
    }
    (frames.min(target) as f32 / target as f32) * 100.0
}

/// A running decoder: frames arrive from a reader thread over a bounded channel.
pub struct VideoStream {
    info: VideoInfo,
    width: u32,
    height: u32,
    frames: Option<Receiver<Vec<u8>>>,
    prebuffer: VecDeque<Vec<u8>>,
    child: Child,
    reader: Option<JoinHandle<()>>,
}

impl VideoStream {
    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Next decoded frame, if one is ready. Never blocks.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        if let Some(frame) = self.prebuffer.pop_front() {
            return Some(frame);
        }
        match self.frames.as_ref()?.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!(source = %self.info.source, "video decoder stopped");
                self.frames = None;
                None
            }
        }
    }
}

impl Drop for VideoStream {
    fn drop(&mut self) {
        // Receiver first so a reader blocked on send wakes up.
        self.frames = None;
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        debug!(source = %self.info.source, "video stream released");
    }
}

fn spawn_reader(mut stdout: ChildStdout, frame_len: usize, frames: Sender<Vec<u8>>) -> JoinHandle<()> {
    thread::spawn(move || {
        loop {
            let mut frame = vec![0u8; frame_len];
            if stdout.read_exact(&mut frame).is_err() {
                break;
            }
            if frames.send(frame).is_err() {
                break;
            }
        }
    })
}

fn open_stream(source: &str, max_width: u32, events: &Sender<LoadEvent>) -> SliderResult<VideoStream> {
    let info = probe(source)?;
    let (width, height) = info.fitted(max_width);
    let mut child = Command::new("ffmpeg")
        .args(decode_args(&info, width, height))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| SliderError::media_load(format!("failed to start ffmpeg for '{source}': {e}")))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| SliderError::media_load("ffmpeg stdout was not captured"))?;

    let bytes = frame_len(width, height);
    let (tx, rx) = crossbeam_channel::bounded(FRAME_QUEUE);
    let reader = spawn_reader(stdout, bytes, tx);

    let mut stream = VideoStream {
        info,
        width,
        height,
        frames: Some(rx.clone()),
        prebuffer: VecDeque::with_capacity(PREBUFFER_FRAMES),
        child,
        reader: Some(reader),
    };

    let deadline = Instant::now() + Duration::from_secs(LOAD_TIMEOUT_SECS);
    while stream.prebuffer.len() < PREBUFFER_FRAMES {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(frame) => {
                stream.prebuffer.push_back(frame);
                let _ = events.send(LoadEvent::Progress(buffered_percent(stream.prebuffer.len(), PREBUFFER_FRAMES)));
            }
            Err(RecvTimeoutError::Timeout) => {
                return Err(SliderError::media_load(format!("timed out buffering '{source}'")));
            }
            Err(RecvTimeoutError::Disconnected) if !stream.prebuffer.is_empty() => break,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(SliderError::decode(format!(
                    "decoder for '{source}' ended before playback could begin"
                )));
            }
        }
    }
    Ok(stream)
}

enum LoadEvent {
    Progress(f32),
    Ready(VideoStream),
    Failed(SliderError),
}

/// An in-flight media load, polled once per frame from the render loop.
pub struct LoadRequest {
    source: String,
    events: Receiver<LoadEvent>,
    progress: f32,
    started: Instant,
}

impl LoadRequest {
    pub fn start(source: &str, max_width: u32) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let owned = source.to_string();
        thread::spawn(move || {
            let event = match open_stream(&owned, max_width, &tx) {
                Ok(stream) => LoadEvent::Ready(stream),
                Err(e) => LoadEvent::Failed(e),
            };
            // The requester may be gone already; the stream then drops here.
            let _ = tx.send(event);
        });
        debug!(source, "media load started");
        Self { source: source.to_string(), events: rx, progress: 0.0, started: Instant::now() }
    }
}

impl PendingLoad for LoadRequest {
    type Stream = VideoStream;

    fn source(&self) -> &str {
        &self.source
    }

    fn poll(&mut self) -> LoadStatus<VideoStream> {
        loop {
            match self.events.try_recv() {
                Ok(LoadEvent::Progress(percent)) => self.progress = self.progress.max(percent),
                Ok(LoadEvent::Ready(stream)) => {
                    self.progress = 100.0;
                    info!(
                        source = %self.source,
                        width = stream.width,
                        height = stream.height,
                        duration_sec = stream.info.duration_sec,
                        elapsed_ms = self.started.elapsed().as_millis() as u64,
                        "media ready"
                    );
                    return LoadStatus::Ready(stream);
                }
                Ok(LoadEvent::Failed(e)) => return LoadStatus::Failed(e),
                Err(TryRecvError::Empty) => return LoadStatus::Pending(self.progress),
                Err(TryRecvError::Disconnected) => {
                    return LoadStatus::Failed(SliderError::media_load(format!(
                        "loader for '{}' exited without a result",
                        self.source
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(width: u32, height: u32) -> VideoInfo {
        VideoInfo { source: "clip.mp4".to_string(), width, height, fps: 25.0, duration_sec: 10.0 }
    }

    #[test]
    fn parses_frame_rate_ratios() {
        assert_eq!(parse_ratio("30000/1001").map(|f| (f * 100.0).round()), Some(2997.0));
        assert_eq!(parse_ratio("25"), Some(25.0));
        assert_eq!(parse_ratio("0/0"), None);
        assert_eq!(parse_ratio("abc"), None);
    }

    #[test]
    fn fits_wide_sources_to_even_dimensions() {
        assert_eq!(info(1280, 720).fitted(1920), (1280, 720));
        assert_eq!(info(3840, 2160).fitted(1920), (1920, 1080));
        assert_eq!(info(1921, 1081).fitted(1001), (1000, 562));
        assert_eq!(info(3840, 2160).fitted(0), (3840, 2160));
    }

    #[test]
    fn decode_args_loop_mute_and_scale() {
        let args = decode_args(&info(3840, 2160), 1920, 1080);
        let joined = args.join(" ");
        assert!(joined.contains("-stream_loop -1 -i clip.mp4 -an"));
        assert!(joined.contains("-vf scale=1920:1080"));
        assert!(joined.ends_with("-f rawvideo -pix_fmt rgba pipe:1"));

        let native = decode_args(&info(1280, 720), 1280, 720).join(" ");
        assert!(!native.contains("scale="));
    }

    #[test]
    fn buffered_percent_is_capped() {
        assert_eq!(buffered_percent(0, 8), 0.0);
        assert_eq!(buffered_percent(4, 8), 50.0);
        assert_eq!(buffered_percent(12, 8), 100.0);
        assert_eq!(buffered_percent(0, 0), 100.0);
    }

    #[test]
    fn frame_geometry() {
        let i = info(4, 2);
        assert_eq!(frame_len(i.width, i.height), 32);
        assert!((i.frame_time() - 0.04).abs() < 1e-6);
    }
}
