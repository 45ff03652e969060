use std::path::PathBuf;

use clap::Parser;

use crate::constants::*;
use crate::ease::Ease;
use crate::error::{SliderError, SliderResult};
use crate::sequencer::TransitionConfig;
use crate::shader::WipeParams;
use crate::slider::SliderOptions;

#[derive(Parser, Debug)]
#[command(name = "tourslider", version, about = "Full-screen boat tour video slider")]
pub struct Args {
    /// Slide manifest (JSON). The built-in boat tours are used when omitted.
    #[arg(long, value_name = "PATH", env = "TOURSLIDER_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Transition duration in seconds.
    #[arg(long, default_value_t = TRANSITION_DURATION)]
    pub duration: f32,

    /// Transition easing: `linear`, `power2.in`, `power2.out`, `power2.inout` or `power3.out`.
    #[arg(long, default_value_t = Ease::Power2Out)]
    pub ease: Ease,

    /// Wipe angle in degrees.
    #[arg(long, default_value_t = 45.0, allow_negative_numbers = true)]
    pub angle: f32,

    /// Number of wipe columns.
    #[arg(long, default_value_t = 3)]
    pub columns: u32,

    /// Per-column delay of the wipe.
    #[arg(long, default_value_t = 3.0)]
    pub offset: f32,

    /// Zoom strength of the wipe.
    #[arg(long, default_value_t = 3.0)]
    pub scale: f32,

    /// Quiet time after the last wheel event before the slide changes, in milliseconds.
    #[arg(long, default_value_t = (WHEEL_DEBOUNCE * 1000.0) as u64)]
    pub debounce_ms: u64,

    /// Decode videos no wider than this many pixels.
    #[arg(long, default_value_t = MAX_VIDEO_WIDTH)]
    pub max_video_width: u32,

    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub window: Option<(i32, i32)>,

    /// Advance to the next slide after this many idle seconds.
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub autoplay: Option<f32>,

    /// Encode every rendered frame to this MP4 file.
    #[arg(long, value_name = "FILE")]
    pub record: Option<PathBuf>,

    /// Stop after rendering this many frames.
    #[arg(long, value_name = "N")]
    pub max_frames: Option<u64>,

    /// Brand shown in the header.
    #[arg(long, default_value = "RBD")]
    pub brand: String,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

pub fn parse() -> Args {
    Args::parse()
}

fn parse_size(value: &str) -> Result<(i32, i32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let w: i32 = w.parse().map_err(|_| format!("invalid width '{w}'"))?;
    let h: i32 = h.parse().map_err(|_| format!("invalid height '{h}'"))?;
    if w <= 0 || h <= 0 {
        return Err(format!("window size must be positive, got {w}x{h}"));
    }
    Ok((w, h))
}

impl Args {
    pub fn slider_options(&self) -> SliderResult<SliderOptions> {
        if let Some(interval) = self.autoplay {
            if !interval.is_finite() || interval <= 0.0 {
                return Err(SliderError::config(format!("autoplay interval must be positive, got {interval}")));
            }
        }
        Ok(SliderOptions {
            transition: TransitionConfig::new(self.duration, self.ease)?,
            wipe: WipeParams::new(self.angle, self.columns, self.offset, self.scale)?,
            debounce: self.debounce_ms as f32 / 1000.0,
            max_video_width: self.max_video_width,
            autoplay: self.autoplay,
            brand: self.brand.clone(),
        })
    }

    pub fn window_size(&self) -> (i32, i32) {
        self.window.unwrap_or((RENDER_WIDTH / 2, RENDER_HEIGHT / 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_produce_site_tuning() {
        let args = Args::try_parse_from(["tourslider"]).unwrap();
        let options = args.slider_options().unwrap();
        assert_eq!(options.transition, TransitionConfig::default());
        assert_eq!(options.wipe, WipeParams::default());
        assert!((options.debounce - 0.3).abs() < 1e-6);
        assert_eq!(args.window_size(), (960, 540));
        assert!(args.record.is_none());
    }

    #[test]
    fn parses_overrides() {
        let args = Args::try_parse_from([
            "tourslider",
            "--duration", "1.8",
            "--ease", "power3.out",
            "--angle", "-30",
            "--columns", "5",
            "--window", "1280x720",
            "--autoplay", "4",
        ])
        .unwrap();
        let options = args.slider_options().unwrap();
        assert_eq!(options.transition.ease, Ease::Power3Out);
        assert_eq!(options.wipe.columns, 5.0);
        assert_eq!(options.wipe.angle_degrees, -30.0);
        assert_eq!(options.autoplay, Some(4.0));
        assert_eq!(args.window_size(), (1280, 720));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(Args::try_parse_from(["tourslider", "--window", "big"]).is_err());
        assert!(Args::try_parse_from(["tourslider", "--ease", "bounce"]).is_err());
        let args = Args::try_parse_from(["tourslider", "--duration", "0"]).unwrap();
        assert!(args.slider_options().is_err());
        for interval in ["-1", "0"] {
            let args = Args::try_parse_from(["tourslider", "--autoplay", interval]).unwrap();
            assert!(args.slider_options().is_err());
        }
    }

    #[test]
    fn size_parser() {
        assert_eq!(parse_size("640X480"), Ok((640, 480)));
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("10").is_err());
    }
}
