use std::fs;
use std::io::Cursor;
use std::path::Path;
use raylib::prelude::*;
use exif::{Reader, Tag, Value, In};
use tracing::{debug, warn};

use crate::error::{SliderError, SliderResult};
use crate::media::VideoStream;

// --- Load Image, Apply EXIF Rotation, Create Texture ---
pub fn load_texture_with_exif_rotation(
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    image_path: &Path,
) -> SliderResult<Texture2D> {
    let file_bytes = fs::read(image_path)
        .map_err(|e| SliderError::texture(format!("failed to read {}: {e}", image_path.display())))?;

    let extension = image_path.extension().and_then(|s| s.to_str()).unwrap_or("").to_lowercase();
    let orientation = if extension == "jpg" || extension == "jpeg" {
        exif_orientation(&file_bytes, image_path)
    } else {
        1
    };

    let mut image = Image::load_image_from_mem(&format!(".{extension}"), &file_bytes)
        .map_err(|e| SliderError::texture(format!("failed to decode {}: {e}", image_path.display())))?;

    // 3 = 180 deg, 6 = 90 deg clockwise, 8 = 90 deg counter-clockwise.
    // Mirrored orientations are left as-is.
    match orientation {
        3 => {
            image.rotate_cw();
            image.rotate_cw();
        }
        6 => image.rotate_cw(),
        8 => image.rotate_ccw(),
        _ => {}
    }
    if orientation != 1 {
        debug!(path = %image_path.display(), orientation, "applied exif rotation");
    }

    rl.load_texture_from_image(thread, &image)
        .map_err(|e| SliderError::texture(format!("failed to upload {}: {e}", image_path.display())))
}

fn exif_orientation(file_bytes: &[u8], image_path: &Path) -> u16 {
    match Reader::new().read_from_container(&mut Cursor::new(file_bytes)) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| match &field.value {
                Value::Short(values) => values.first().copied(),
                _ => None,
            })
            .unwrap_or(1),
        Err(e) => {
            warn!(path = %image_path.display(), error = %e, "could not read exif data");
            1
        }
    }
}

/// A fully transparent 1x1 texture, shown before the first video is ready.
pub fn transparent_pixel(rl: &mut RaylibHandle, thread: &RaylibThread) -> SliderResult<Texture2D> {
    solid_texture(rl, thread, 1, 1, Color::BLANK)
}

pub fn solid_texture(
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    width: i32,
    height: i32,
    color: Color,
) -> SliderResult<Texture2D> {
    let image = Image::gen_image_color(width, height, color);
    rl.load_texture_from_image(thread, &image)
        .map_err(|e| SliderError::texture(format!("failed to create {width}x{height} texture: {e}")))
}

/// GPU texture fed by a decoder; frames are uploaded on the playback clock.
pub struct VideoTexture {
    texture: Texture2D,
    stream: VideoStream,
    clock: f32,
}

impl VideoTexture {
    pub fn new(rl: &mut RaylibHandle, thread: &RaylibThread, mut stream: VideoStream) -> SliderResult<Self> {
        let (width, height) = stream.size();
        let mut texture = solid_texture(rl, thread, width as i32, height as i32, Color::BLACK)?;
        if let Some(frame) = stream.next_frame() {
            upload(&mut texture, &frame)?;
        }
        Ok(Self { texture, stream, clock: 0.0 })
    }

    pub fn advance(&mut self, dt: f32) -> SliderResult<()> {
        let frame_time = self.stream.info().frame_time();
        self.clock += dt;
        let mut latest = None;
        while self.clock >= frame_time {
            match self.stream.next_frame() {
                Some(frame) => {
                    latest = Some(frame);
                    self.clock -= frame_time;
                }
                None => {
                    // Decoder is behind; hold the current frame instead of bursting later.
                    self.clock = frame_time;
                    break;
                }
            }
        }
        match latest {
            Some(frame) => upload(&mut self.texture, &frame),
            None => Ok(()),
        }
    }
}

fn upload(texture: &mut Texture2D, frame: &[u8]) -> SliderResult<()> {
    texture
        .update_texture(frame)
        .map_err(|e| SliderError::texture(format!("frame upload failed: {e}")))
}

/// What a sequencer slot can hold.
pub enum SlideTexture {
    Still(Texture2D),
    Video(VideoTexture),
}

impl SlideTexture {
    pub fn texture(&self) -> &Texture2D {
        match self {
            Self::Still(texture) => texture,
            Self::Video(video) => &video.texture,
        }
    }

    pub fn size(&self) -> (f32, f32) {
        let texture = self.texture();
        (texture.width() as f32, texture.height() as f32)
    }

    pub fn advance(&mut self, dt: f32) -> SliderResult<()> {
        match self {
            Self::Still(_) => Ok(()),
            Self::Video(video) => video.advance(dt),
        }
    }
}
