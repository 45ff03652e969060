use raylib::prelude::*;
use tracing::warn;

use crate::error::{SliderError, SliderResult};

const VERTEX_SHADER: &str = include_str!("shaders/transition.vs");
const FRAGMENT_SHADER: &str = include_str!("shaders/transition.fs");

/// Geometry of the column wipe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WipeParams {
    pub angle_degrees: f32,
    pub columns: f32,
    pub offset: f32,
    pub scale: f32,
}

impl Default for WipeParams {
    fn default() -> Self {
        Self { angle_degrees: 45.0, columns: 3.0, offset: 3.0, scale: 3.0 }
    }
}

impl WipeParams {
    pub fn new(angle_degrees: f32, columns: u32, offset: f32, scale: f32) -> SliderResult<Self> {
        if !angle_degrees.is_finite() {
            return Err(SliderError::config("wipe angle must be finite"));
        }
        if columns == 0 {
            return Err(SliderError::config("wipe needs at least one column"));
        }
        if !offset.is_finite() || offset < 0.0 {
            return Err(SliderError::config(format!("wipe offset must be >= 0, got {offset}")));
        }
        if !scale.is_finite() || scale < 0.0 {
            return Err(SliderError::config(format!("wipe scale must be >= 0, got {scale}")));
        }
        Ok(Self { angle_degrees, columns: columns as f32, offset, scale })
    }
}

/// Values uploaded to the transition shader each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    pub progress: f32,
    pub angle: f32,
    pub columns: f32,
    pub offset: f32,
    pub scale: f32,
    pub input_resolution: Vector2,
    pub output_resolution: Vector2,
}

impl Uniforms {
    pub fn new(wipe: &WipeParams, progress: f32, input: (f32, f32), output: (f32, f32)) -> Self {
        Self {
            progress: progress.clamp(0.0, 1.0),
            angle: wipe.angle_degrees.to_radians(),
            columns: wipe.columns.max(1.0),
            offset: wipe.offset,
            scale: wipe.scale,
            input_resolution: non_degenerate(input),
            output_resolution: non_degenerate(output),
        }
    }
}

fn non_degenerate((w, h): (f32, f32)) -> Vector2 {
    Vector2::new(w.max(1.0), h.max(1.0))
}

struct Locations {
    texture1: i32,
    texture2: i32,
    progress: i32,
    angle: i32,
    columns: i32,
    offset: i32,
    scale: i32,
    input_resolution: i32,
    output_resolution: i32,
}

pub struct TransitionShader {
    shader: Shader,
    locations: Locations,
}

impl TransitionShader {
    pub fn load(rl: &mut RaylibHandle, thread: &RaylibThread) -> SliderResult<Self> {
        let shader = rl.load_shader_from_memory(thread, Some(VERTEX_SHADER), Some(FRAGMENT_SHADER));
        let locate = |name: &str| {
            let loc = shader.get_shader_location(name);
            if loc < 0 {
                warn!(uniform = name, "transition shader uniform not found");
            }
            loc
        };
        let locations = Locations {
            texture1: locate("uTexture1"),
            texture2: locate("uTexture2"),
            progress: locate("uTransitionProgress"),
            angle: locate("uAngle"),
            columns: locate("uColumnsCount"),
            offset: locate("uOffsetAmount"),
            scale: locate("uScale"),
            input_resolution: locate("uInputResolution"),
            output_resolution: locate("uOutputResolution"),
        };
        if locations.texture1 < 0 || locations.texture2 < 0 || locations.progress < 0 {
            return Err(SliderError::texture("transition shader failed to compile or link"));
        }
        Ok(Self { shader, locations })
    }

    pub fn set_uniforms(&mut self, uniforms: &Uniforms) {
        let loc = &self.locations;
        self.shader.set_shader_value(loc.progress, uniforms.progress);
        self.shader.set_shader_value(loc.angle, uniforms.angle);
        self.shader.set_shader_value(loc.columns, uniforms.columns);
        self.shader.set_shader_value(loc.offset, uniforms.offset);
        self.shader.set_shader_value(loc.scale, uniforms.scale);
        self.shader.set_shader_value(loc.input_resolution, uniforms.input_resolution);
        self.shader.set_shader_value(loc.output_resolution, uniforms.output_resolution);
    }

    /// Draws `quad` over `dest` with both slot textures bound to the wipe shader.
    pub fn draw(
        &mut self,
        d: &mut RaylibDrawHandle,
        quad: &Texture2D,
        outgoing: &Texture2D,
        incoming: &Texture2D,
        dest: Rectangle,
    ) {
        let raw_shader: raylib::ffi::Shader = *self.shader;
        let raw_outgoing: raylib::ffi::Texture2D = **outgoing;
        let raw_incoming: raylib::ffi::Texture2D = **incoming;

        let mut s = d.begin_shader_mode(&mut self.shader);
        // Samplers have to be bound inside shader mode; the batch flush on
        // mode change clears previously bound texture units.
        unsafe {
            raylib::ffi::SetShaderValueTexture(raw_shader, self.locations.texture1, raw_outgoing);
            raylib::ffi::SetShaderValueTexture(raw_shader, self.locations.texture2, raw_incoming);
        }
        s.draw_texture_pro(
            quad,
            Rectangle::new(0.0, 0.0, quad.width() as f32, quad.height() as f32),
            dest,
            Vector2::new(0.0, 0.0),
            0.0,
            Color::WHITE,
        );
    }
}
