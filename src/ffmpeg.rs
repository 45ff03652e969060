use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

use raylib::prelude::*;
use tracing::{info, warn};

use crate::error::{SliderError, SliderResult};

/// Pipes rendered framebuffers into an H.264 encoder.
pub struct Ffmpeg {
    process: Child,
    stdin: Option<ChildStdin>,
    width: i32,
    height: i32,
    frames: u64,
}

pub fn encode_args(width: i32, height: i32, fps: u32, output: &Path) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-loglevel".into(), "error".into(),
        "-y".into(),
        "-f".into(), "rawvideo".into(),
        "-pixel_format".into(), "rgba".into(),
        "-video_size".into(), format!("{width}x{height}"),
        "-framerate".into(), fps.to_string(),
        "-i".into(), "-".into(),
        "-c:v".into(), "libx264".into(),
        "-pix_fmt".into(), "yuv420p".into(),
    ];
    args.push(output.to_string_lossy().into_owned());
    args
}

impl Ffmpeg {
    pub fn new(width: i32, height: i32, fps: u32, output: &Path) -> SliderResult<Ffmpeg> {
        let mut process = Command::new("ffmpeg")
            .stdin(Stdio::piped())
            .args(encode_args(width, height, fps, output))
            .spawn()
            .map_err(|e| SliderError::encode(format!("failed to start ffmpeg: {e}")))?;
        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| SliderError::encode("failed to open ffmpeg stdin"))?;
        info!(output = %output.display(), width, height, fps, "recording started");
        Ok(Ffmpeg { process, stdin: Some(stdin), width, height, frames: 0 })
    }

    pub fn write(&mut self, image: &Image) -> SliderResult<()> {
        if image.width() != self.width || image.height() != self.height {
            return Err(SliderError::encode(format!(
                "frame is {}x{}, encoder expects {}x{}",
                image.width(),
                image.height(),
                self.width,
                self.height
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| SliderError::encode("ffmpeg stdin already closed"))?;

        let row_len = (self.width * 4) as usize;
        let image_len = row_len * self.height as usize;
        // SAFETY: the framebuffer image is uncompressed RGBA8 of the checked size.
        let pixels = unsafe { std::slice::from_raw_parts(image.data() as *const u8, image_len) };

        // raylib reads render textures bottom-up; ffmpeg wants rows top-down.
        for row in pixels.chunks_exact(row_len).rev() {
            stdin.write_all(row)?;
        }
        self.frames += 1;
        Ok(())
    }
}

impl Drop for Ffmpeg {
    fn drop(&mut self) {
        // Close stdin pipe and wait for ffmpeg to finish
        self.stdin = None;
        match self.process.wait() {
            Ok(status) if status.success() => info!(frames = self.frames, "recording finished"),
            Ok(status) => warn!(%status, "ffmpeg exited with an error"),
            Err(e) => warn!(error = %e, "failed to wait for ffmpeg"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_args_describe_raw_rgba_input() {
        let args = encode_args(1920, 1080, 60, Path::new("tour.mp4")).join(" ");
        assert!(args.contains("-pixel_format rgba -video_size 1920x1080 -framerate 60 -i -"));
        assert!(args.ends_with("-c:v libx264 -pix_fmt yuv420p tour.mp4"));
    }
}
