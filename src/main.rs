use anyhow::Context;
use raylib::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod choreographer;
mod cli;
mod constants;
mod ease;
mod engine;
mod error;
mod ffmpeg;
mod input;
mod loads;
mod manifest;
mod media;
mod sequencer;
mod shader;
mod slider;
mod state;
mod texture_loader;

use crate::constants::*;
use crate::engine::Engine;
use crate::ffmpeg::Ffmpeg;
use crate::manifest::Manifest;
use crate::slider::VideoSlider;

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> anyhow::Result<()> {
    let args = cli::parse();
    init_tracing(&args.log_level);

    let options = args.slider_options().context("invalid options")?;
    let manifest = match &args.manifest {
        Some(path) => Manifest::load(path).with_context(|| format!("failed to load manifest {}", path.display()))?,
        None => Manifest::boat_tours(),
    };
    info!(slides = manifest.len(), "manifest ready");

    let (width, height) = args.window_size();
    let (mut rl, thread) = raylib::init()
        .size(width, height)
        .title("Boat Tours")
        .vsync()
        .resizable()
        .build();
    rl.set_target_fps(FPS);
    rl.set_trace_log(TraceLogLevel::LOG_ERROR);

    let mut framebuffer = rl
        .load_render_texture(&thread, RENDER_WIDTH as u32, RENDER_HEIGHT as u32)
        .context("failed to create render texture")?;
    let framebuffer_size = (framebuffer.width() as f32, framebuffer.height() as f32);

    let mut slider = VideoSlider::new(&mut rl, &thread, manifest, options)?;
    slider.initialize(&mut rl, &thread)?;

    // Recording renders at a fixed frame rate so the output plays back at real speed.
    let mut recorder = match &args.record {
        Some(path) => Some(Ffmpeg::new(RENDER_WIDTH, RENDER_HEIGHT, FPS, path)?),
        None => None,
    };

    let mut frames: u64 = 0;
    while !rl.window_should_close() {
        let dt = if recorder.is_some() { FRAME_TIME } else { rl.get_frame_time() };

        let events = input::collect(&rl, framebuffer_size);
        slider.handle_input(&events);

        let running = match slider.render_frame(dt, &mut rl, &thread, &mut framebuffer) {
            Ok(running) => running,
            Err(e) => {
                error!(error = %e, "frame failed");
                return Err(e.into());
            }
        };

        // Draw inverted copy of framebuffer to the screen
        {
            let mut d = rl.begin_drawing(&thread);
            d.clear_background(Color::BLACK);
            let sw = d.get_screen_width() as f32;
            let sh = d.get_screen_height() as f32;
            d.draw_texture_pro(
                &framebuffer,
                Rectangle::new(0.0, 0.0, framebuffer.width() as f32, -(framebuffer.height() as f32)),
                Rectangle::new(0.0, 0.0, sw, sh),
                Vector2::zero(),
                0.0,
                Color::WHITE,
            );
        }

        if let Some(ffmpeg) = recorder.as_mut() {
            let image = framebuffer.load_image().context("failed to read back framebuffer")?;
            ffmpeg.write(&image)?;
        }

        frames += 1;
        if !running || args.max_frames.is_some_and(|max| frames >= max) {
            break;
        }
    }

    info!(frames, "slider closed");
    Ok(())
}
