use raylib::prelude::*;

use crate::error::SliderResult;
use crate::input::InputEvent;

pub trait Engine {
    fn initialize(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread) -> SliderResult<()>;
    fn handle_input(&mut self, events: &[InputEvent]);
    /// Renders one frame into `framebuffer`. Returns `false` once the engine has nothing left to show.
    fn render_frame(&mut self, dt: f32, rl: &mut RaylibHandle, thread: &RaylibThread, framebuffer: &mut RenderTexture2D) -> SliderResult<bool>;
}
