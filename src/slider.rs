use raylib::prelude::*;
use tracing::{debug, error, info, trace, warn};

use crate::choreographer::Choreographer;
use crate::constants::*;
use crate::engine::Engine;
use crate::error::SliderResult;
use crate::input::{digit_target, Autoplay, DelayedGoto, InputEvent, WheelDebouncer};
use crate::loads::MediaLoads;
use crate::manifest::Manifest;
use crate::media::{LoadRequest, VideoStream};
use crate::sequencer::{Completed, Rejected, Sequencer, TransitionConfig, Trigger};
use crate::shader::{TransitionShader, Uniforms, WipeParams};
use crate::texture_loader::{load_texture_with_exif_rotation, solid_texture, transparent_pixel, SlideTexture, VideoTexture};

const MARGIN: f32 = 60.0;
const HEADER_HEIGHT: f32 = 110.0;
const FOOTER_HEIGHT: f32 = 110.0;
const CAPTION_SIZE: i32 = 96;
const CAPTION_LINE: f32 = 110.0;
const MENU_WIDTH: f32 = 640.0;
const MENU_ITEM_HEIGHT: f32 = 150.0;
const MENU_TOP: f32 = 150.0;

#[derive(Debug, Clone)]
pub struct SliderOptions {
    pub transition: TransitionConfig,
    pub wipe: WipeParams,
    pub debounce: f32,
    pub max_video_width: u32,
    pub autoplay: Option<f32>,
    pub brand: String,
}

impl Default for SliderOptions {
    fn default() -> Self {
        Self {
            transition: TransitionConfig::default(),
            wipe: WipeParams::default(),
            debounce: WHEEL_DEBOUNCE,
            max_video_width: MAX_VIDEO_WIDTH,
            autoplay: None,
            brand: "RBD".to_string(),
        }
    }
}

fn fb_width() -> f32 {
    RENDER_WIDTH as f32
}

fn fb_height() -> f32 {
    RENDER_HEIGHT as f32
}

fn prev_control() -> Rectangle {
    Rectangle::new(fb_width() - MARGIN - 190.0, fb_height() - FOOTER_HEIGHT + 15.0, 80.0, 80.0)
}

fn next_control() -> Rectangle {
    Rectangle::new(fb_width() - MARGIN - 90.0, fb_height() - FOOTER_HEIGHT + 15.0, 80.0, 80.0)
}

fn menu_button() -> Rectangle {
    Rectangle::new(fb_width() - MARGIN - 260.0, 20.0, 260.0, 70.0)
}

fn menu_panel(fraction: f32) -> Rectangle {
    Rectangle::new(fb_width() - MENU_WIDTH * fraction, 0.0, MENU_WIDTH, fb_height())
}

fn menu_item(panel: Rectangle, index: usize) -> Rectangle {
    Rectangle::new(
        panel.x + 40.0,
        MENU_TOP + index as f32 * (MENU_ITEM_HEIGHT + 20.0),
        MENU_WIDTH - 80.0,
        MENU_ITEM_HEIGHT,
    )
}

/// Source rectangle that crops a texture to fill `dest` without distortion.
pub fn cover_source(tex_w: f32, tex_h: f32, dest_w: f32, dest_h: f32) -> Rectangle {
    if tex_w <= 0.0 || tex_h <= 0.0 || dest_w <= 0.0 || dest_h <= 0.0 {
        return Rectangle::new(0.0, 0.0, tex_w.max(0.0), tex_h.max(0.0));
    }
    let tex_ratio = tex_w / tex_h;
    let dest_ratio = dest_w / dest_h;
    if tex_ratio > dest_ratio {
        let w = tex_h * dest_ratio;
        Rectangle::new((tex_w - w) * 0.5, 0.0, w, tex_h)
    } else {
        let h = tex_w / dest_ratio;
        Rectangle::new(0.0, (tex_h - h) * 0.5, tex_w, h)
    }
}

/// Counter text for a 1-based slide number, e.g. `03`.
pub fn counter_label(value: usize) -> String {
    format!("{value:02}")
}

pub fn total_label(len: usize) -> String {
    format!("|{len:02}")
}

pub struct VideoSlider {
    manifest: Manifest,
    options: SliderOptions,

    sequencer: Sequencer<SlideTexture>,
    shader: TransitionShader,
    quad: Texture2D,
    posters: Vec<Option<Texture2D>>,

    choreographer: Choreographer,
    wheel: WheelDebouncer,
    goto: DelayedGoto,
    autoplay: Autoplay,

    loads: MediaLoads<LoadRequest>,
}

impl VideoSlider {
    pub fn new(rl: &mut RaylibHandle, thread: &RaylibThread, manifest: Manifest, options: SliderOptions) -> SliderResult<Self> {
        let shader = TransitionShader::load(rl, thread)?;
        let quad = solid_texture(rl, thread, 1, 1, Color::WHITE)?;
        let placeholder = SlideTexture::Still(transparent_pixel(rl, thread)?);

        let mut posters = Vec::with_capacity(manifest.len());
        for slide in &manifest.slides {
            let poster = match &slide.poster {
                Some(path) => match load_texture_with_exif_rotation(rl, thread, path) {
                    Ok(texture) => Some(texture),
                    Err(e) => {
                        warn!(slide = %slide.id, error = %e, "poster unavailable");
                        None
                    }
                },
                None => None,
            };
            posters.push(poster);
        }

        let line_counts = manifest.slides.iter().map(|s| s.title.len()).collect();

        Ok(Self {
            sequencer: Sequencer::new(options.transition, manifest.len(), placeholder),
            shader,
            quad,
            posters,
            choreographer: Choreographer::new(line_counts),
            wheel: WheelDebouncer::new(options.debounce),
            goto: DelayedGoto::default(),
            autoplay: Autoplay::new(options.autoplay),
            loads: MediaLoads::new(manifest.len()),
            manifest,
            options,
        })
    }

    fn start_load(&mut self, index: usize) {
        let source = &self.manifest.get(index).video;
        let max_width = self.options.max_video_width;
        self.loads.start(index, || LoadRequest::start(source, max_width));
    }

    fn trigger(&mut self, trigger: Trigger) {
        if self.choreographer.is_busy() {
            debug!(?trigger, "caption still animating, trigger ignored");
            return;
        }
        // Autoplay waits a full interval after any attempt, accepted or not.
        self.autoplay.reset();
        match self.sequencer.request(trigger) {
            Ok(target) => {
                self.wheel.cancel();
                debug!(?trigger, target, "transition requested");
                self.start_load(target);
            }
            Err(Rejected::Busy) => trace!(?trigger, "transition in flight"),
            Err(reason) => debug!(?trigger, ?reason, "trigger rejected"),
        }
    }

    fn poll_loads(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread) {
        self.loads.poll(&mut self.sequencer);

        if !self.sequencer.is_loaded() {
            if self.loads.initial_ready() {
                if let Some(stream) = self.loads.take(0) {
                    match VideoTexture::new(rl, thread, stream) {
                        Ok(video) => {
                            info!("initial media ready, starting intro");
                            if self.sequencer.intro(SlideTexture::Video(video)).is_err() {
                                warn!("intro already started");
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "could not create the first video texture");
                            self.loads.stall();
                        }
                    }
                }
            }
            return;
        }

        if let Some(target) = self.sequencer.awaiting_target() {
            match self.loads.take(target) {
                Some(stream) => self.start_blend(rl, thread, target, stream),
                None => self.start_load(target),
            }
        }
    }

    fn start_blend(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread, target: usize, stream: VideoStream) {
        let from = self.sequencer.current_index();
        match VideoTexture::new(rl, thread, stream) {
            Ok(video) => {
                if self.sequencer.begin(SlideTexture::Video(video)).is_ok() {
                    self.choreographer.on_transition_start(from, target);
                    info!(from, to = target, slide = %self.manifest.get(target).id, "transition started");
                }
            }
            Err(e) => {
                warn!(error = %e, "could not create video texture, transition skipped");
                self.sequencer.fail();
            }
        }
    }

    fn on_completed(&mut self, done: Completed) {
        if done.intro {
            self.choreographer.reveal_first(done.to);
        } else {
            info!(from = done.from, to = done.to, "transition finished");
        }

        for index in self.loads.keep_neighbours(done.to, self.manifest.len()) {
            self.start_load(index);
        }
    }

    fn handle_click(&mut self, pos: Vector2) {
        let chrome = &self.choreographer.chrome;
        if chrome.menu_open() {
            let panel = menu_panel(1.0);
            for index in 0..self.manifest.len() {
                if menu_item(panel, index).check_collision_point_rec(pos) {
                    self.choreographer.chrome.set_menu(false);
                    self.goto.schedule(index, MENU_CLOSE_DELAY);
                    return;
                }
            }
            if !panel.check_collision_point_rec(pos) || menu_button().check_collision_point_rec(pos) {
                self.choreographer.chrome.set_menu(false);
            }
            return;
        }
        if !chrome.is_revealed() {
            return;
        }
        if menu_button().check_collision_point_rec(pos) {
            self.choreographer.chrome.set_menu(true);
        } else if prev_control().check_collision_point_rec(pos) {
            self.trigger(Trigger::Step(-1));
        } else if next_control().check_collision_point_rec(pos) {
            self.trigger(Trigger::Step(1));
        }
    }

    /// Nothing is moving and no user trigger is queued.
    fn is_settled(&self) -> bool {
        self.sequencer.is_loaded()
            && self.sequencer.is_idle()
            && !self.choreographer.is_busy()
            && !self.wheel.is_armed()
            && !self.goto.is_pending()
    }
}

/// What is drawn over the wipe: captions, chrome, menu or the loading screen.
struct Overlay<'a> {
    manifest: &'a Manifest,
    options: &'a SliderOptions,
    choreographer: &'a Choreographer,
    posters: &'a [Option<Texture2D>],
    loaded: bool,
    loading_percent: f32,
    stalled: bool,
}

impl Overlay<'_> {
    fn draw(&self, d: &mut RaylibDrawHandle) {
        if self.loaded {
            self.draw_captions(d);
            self.draw_chrome(d);
            self.draw_menu(d);
        } else {
            self.draw_loading(d);
        }
    }

    fn draw_captions(&self, d: &mut RaylibDrawHandle) {
        let Some((index, offsets)) = self.choreographer.offsets() else {
            return;
        };
        let slide = self.manifest.get(index);
        let base_y = fb_height() - FOOTER_HEIGHT - MARGIN - CAPTION_LINE * offsets.len() as f32;
        for (line, (text, offset)) in slide.title.iter().zip(&offsets).enumerate() {
            let top = base_y + line as f32 * CAPTION_LINE;
            let mut s = d.begin_scissor_mode(MARGIN as i32, top as i32, (fb_width() * 0.6) as i32, CAPTION_LINE as i32);
            let y = top + offset / 100.0 * CAPTION_LINE;
            s.draw_text(text, MARGIN as i32, y as i32, CAPTION_SIZE, Color::WHITE);
        }
    }

    fn draw_chrome(&self, d: &mut RaylibDrawHandle) {
        let hidden = self.choreographer.chrome.hidden_fraction();
        if hidden >= 1.0 {
            return;
        }

        let header_y = -HEADER_HEIGHT * hidden;
        d.draw_text(&self.options.brand, MARGIN as i32, (header_y + 30.0) as i32, 50, Color::WHITE);
        let button = menu_button();
        let label = if self.choreographer.chrome.menu_open() { "Close" } else { "Our tours" };
        d.draw_rectangle_lines_ex(
            Rectangle::new(button.x, button.y + header_y, button.width, button.height),
            2.0,
            Color::WHITE,
        );
        d.draw_text(label, (button.x + 30.0) as i32, (button.y + header_y + 20.0) as i32, 32, Color::WHITE);

        let footer_shift = FOOTER_HEIGHT * hidden;
        let footer_y = fb_height() - FOOTER_HEIGHT + footer_shift;
        let counter = &self.choreographer.counter;
        let text_y = footer_y + 35.0;
        let value = counter_label(counter.value());
        let value_width = d.measure_text(&value, 40).max(d.measure_text("00", 40));
        {
            let mut s = d.begin_scissor_mode(MARGIN as i32, text_y as i32, value_width, 40);
            s.draw_text(&value, MARGIN as i32, (text_y + counter.offset()) as i32, 40, Color::WHITE);
        }
        let total = total_label(self.manifest.len());
        d.draw_text(&total, MARGIN as i32 + value_width + 6, text_y as i32, 40, Color::WHITE);

        for (rect, label) in [(prev_control(), "<"), (next_control(), ">")] {
            let rect = Rectangle::new(rect.x, rect.y + footer_shift, rect.width, rect.height);
            d.draw_rectangle_lines_ex(rect, 2.0, Color::WHITE);
            d.draw_text(label, (rect.x + 28.0) as i32, (rect.y + 20.0) as i32, 40, Color::WHITE);
        }
    }

    fn draw_menu(&self, d: &mut RaylibDrawHandle) {
        let fraction = self.choreographer.chrome.menu_fraction();
        if fraction <= 0.0 {
            return;
        }
        let shade = (fraction * 150.0) as u8;
        d.draw_rectangle(0, 0, RENDER_WIDTH, RENDER_HEIGHT, Color::new(0, 0, 0, shade));
        let panel = menu_panel(fraction);
        d.draw_rectangle_rec(panel, Color::new(8, 24, 40, 240));
        for (index, slide) in self.manifest.slides.iter().enumerate() {
            let item = menu_item(panel, index);
            if let Some(Some(poster)) = self.posters.get(index) {
                let source = cover_source(poster.width() as f32, poster.height() as f32, item.width, item.height);
                d.draw_texture_pro(poster, source, item, Vector2::new(0.0, 0.0), 0.0, Color::new(255, 255, 255, 170));
            } else {
                d.draw_rectangle_rec(item, Color::new(30, 60, 90, 255));
            }
            d.draw_text(&slide.caption, (item.x + 20.0) as i32, (item.y + item.height - 50.0) as i32, 32, Color::WHITE);
        }
    }

    fn draw_loading(&self, d: &mut RaylibDrawHandle) {
        let text = format!("Loading... {}%", self.loading_percent.round() as i32);
        let width = d.measure_text(&text, 40);
        // A failed initial load leaves the indicator where it stalled.
        let color = if self.stalled { Color::GRAY } else { Color::WHITE };
        d.draw_text(&text, (RENDER_WIDTH - width) / 2, RENDER_HEIGHT / 2 - 20, 40, color);
    }
}

impl Engine for VideoSlider {
    fn initialize(&mut self, _rl: &mut RaylibHandle, _thread: &RaylibThread) -> SliderResult<()> {
        info!(slides = self.manifest.len(), "loading initial media");
        for index in self.loads.initial().to_vec() {
            self.start_load(index);
        }
        Ok(())
    }

    fn handle_input(&mut self, events: &[InputEvent]) {
        for event in events {
            match event {
                InputEvent::Wheel(delta) => {
                    if self.sequencer.is_loaded() && self.sequencer.is_idle() && !self.choreographer.chrome.menu_open() {
                        self.wheel.wheel(*delta);
                    }
                }
                InputEvent::Click(pos) => self.handle_click(*pos),
                InputEvent::Next => self.trigger(Trigger::Step(1)),
                InputEvent::Previous => self.trigger(Trigger::Step(-1)),
                InputEvent::ToggleMenu => {
                    let open = self.choreographer.chrome.menu_open();
                    self.choreographer.chrome.set_menu(!open);
                }
                InputEvent::CloseMenu => self.choreographer.chrome.set_menu(false),
                InputEvent::Digit(digit) => {
                    if let Some(index) = digit_target(*digit, self.manifest.len()) {
                        self.trigger(Trigger::Goto(index));
                    }
                }
            }
        }
    }

    fn render_frame(&mut self, dt: f32, rl: &mut RaylibHandle, thread: &RaylibThread, framebuffer: &mut RenderTexture2D) -> SliderResult<bool> {
        // Textures swapped out last frame are no longer referenced by any draw call.
        let released = self.sequencer.release_retired();
        if released > 0 {
            debug!(released, "released retired textures");
        }

        self.poll_loads(rl, thread);

        if let Some(trigger) = self.wheel.update(dt) {
            self.trigger(trigger);
        }
        if let Some(trigger) = self.goto.update(dt) {
            self.trigger(trigger);
        }
        if let Some(trigger) = self.autoplay.update(dt, self.is_settled()) {
            self.trigger(trigger);
        }

        if let Some(done) = self.sequencer.tick(dt) {
            self.on_completed(done);
        }
        for event in self.choreographer.update(dt) {
            trace!(?event, "caption");
        }

        for texture in self.sequencer.textures_mut() {
            if let Err(e) = texture.advance(dt) {
                warn!(error = %e, "video frame dropped");
            }
        }

        let frame = self.sequencer.frame();
        let uniforms = Uniforms::new(&self.options.wipe, frame.progress, frame.incoming.size(), (fb_width(), fb_height()));
        self.shader.set_uniforms(&uniforms);

        let overlay = Overlay {
            manifest: &self.manifest,
            options: &self.options,
            choreographer: &self.choreographer,
            posters: &self.posters,
            loaded: self.sequencer.is_loaded(),
            loading_percent: self.loads.percent(),
            stalled: self.loads.initial_failed(),
        };
        let shader = &mut self.shader;
        let quad = &self.quad;
        let frame = self.sequencer.frame();
        let dest = Rectangle::new(0.0, 0.0, fb_width(), fb_height());

        rl.draw_texture_mode(thread, framebuffer, |mut tmd| {
            let mut d = tmd.begin_drawing(thread);
            d.clear_background(Color::BLACK);

            shader.draw(&mut d, quad, frame.current.texture(), frame.incoming.texture(), dest);
            overlay.draw(&mut d);
        });

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_crops_the_long_axis() {
        let wide = cover_source(1920.0, 1080.0, 100.0, 100.0);
        assert_eq!(wide, Rectangle::new(420.0, 0.0, 1080.0, 1080.0));
        let tall = cover_source(1000.0, 2000.0, 200.0, 100.0);
        assert_eq!(tall, Rectangle::new(0.0, 750.0, 1000.0, 500.0));
        let degenerate = cover_source(64.0, 32.0, 0.0, 10.0);
        assert_eq!(degenerate, Rectangle::new(0.0, 0.0, 64.0, 32.0));
    }

    #[test]
    fn counter_pads_to_two_digits() {
        assert_eq!(counter_label(3), "03");
        assert_eq!(counter_label(12), "12");
        assert_eq!(total_label(3), "|03");
        assert_eq!(total_label(12), "|12");
    }

    #[test]
    fn controls_sit_inside_the_footer() {
        for rect in [prev_control(), next_control()] {
            assert!(rect.y >= fb_height() - FOOTER_HEIGHT);
            assert!(rect.y + rect.height <= fb_height());
            assert!(rect.x + rect.width <= fb_width());
        }
        assert!(prev_control().x + prev_control().width <= next_control().x);
    }

    #[test]
    fn menu_items_stack_inside_the_open_panel() {
        let panel = menu_panel(1.0);
        assert_eq!(panel.x, fb_width() - MENU_WIDTH);
        let first = menu_item(panel, 0);
        let second = menu_item(panel, 1);
        assert!(first.y + first.height < second.y);
        assert!(first.x >= panel.x && first.x + first.width <= panel.x + panel.width);
        assert!(!menu_panel(0.0).check_collision_point_rec(Vector2::new(fb_width() - 10.0, 10.0)));
    }
}
