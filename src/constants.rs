pub const RENDER_WIDTH: i32 = 1920;           // Width of the render texture
pub const RENDER_HEIGHT: i32 = 1080;          // Height of the render texture
pub const FPS: u32 = 60;                      // Frames per second
pub const FRAME_TIME: f32 = 1.0 / FPS as f32; // Time per frame when recording (seconds)

pub const TRANSITION_DURATION: f32 = 1.0;     // Default texture blend duration (seconds)
pub const MIN_TRANSITION_DURATION: f32 = 0.1;
pub const MAX_TRANSITION_DURATION: f32 = 10.0;

pub const WHEEL_DEBOUNCE: f32 = 0.3;          // Quiet time before a wheel gesture fires (seconds)
pub const MENU_CLOSE_DELAY: f32 = 0.6;        // Menu close animation before jumping (seconds)

pub const CAPTION_DURATION: f32 = 0.5;
pub const CAPTION_EXIT_STAGGER: f32 = 0.05;
pub const CAPTION_ENTER_STAGGER: f32 = 0.1;

pub const COUNTER_OUT_DURATION: f32 = 0.2;
pub const COUNTER_IN_DURATION: f32 = 0.3;
pub const COUNTER_TRAVEL: f32 = 20.0;         // Pixels the counter digit travels

pub const CHROME_DURATION: f32 = 0.5;
pub const CHROME_DELAY: f32 = 0.5;

pub const PREBUFFER_FRAMES: usize = 8;        // Frames decoded before a video counts as playable
pub const FRAME_QUEUE: usize = 4;             // Decoded frames kept ahead of playback
pub const LOAD_TIMEOUT_SECS: u64 = 15;
pub const MAX_VIDEO_WIDTH: u32 = 1920;
pub const INITIAL_LOADS: usize = 2;           // Slides decoded before the intro plays
