use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{SliderError, SliderResult};

const MAX_TITLE_LINES: usize = 3;

/// One caption/video/poster triple of the tour list.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Slide {
    pub id: String,
    pub video: String,
    pub caption: String,
    #[serde(default)]
    pub title: Vec<String>,
    #[serde(default)]
    pub poster: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Manifest {
    pub slides: Vec<Slide>,
}

impl Manifest {
    pub fn from_json(text: &str) -> SliderResult<Self> {
        let manifest: Manifest = serde_json::from_str(text)
            .map_err(|e| SliderError::manifest(format!("invalid manifest json: {e}")))?;
        manifest.validated()
    }

    /// Loads a manifest file; relative video and poster paths resolve against its directory.
    pub fn load(path: &Path) -> SliderResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| SliderError::manifest(format!("failed to read {}: {e}", path.display())))?;
        let mut manifest = Self::from_json(&text)?;
        if let Some(base) = path.parent() {
            manifest.resolve_relative(base);
        }
        Ok(manifest)
    }

    /// The three boat tours the site ships with.
    pub fn boat_tours() -> Self {
        let slide = |id: &str, video: &str, caption: &str, title: [&str; 3], poster: &str| Slide {
            id: id.to_string(),
            video: video.to_string(),
            caption: caption.to_string(),
            title: title.iter().map(|s| s.to_string()).collect(),
            poster: Some(PathBuf::from(poster)),
        };
        Self {
            slides: vec![
                slide(
                    "slide1",
                    "media/videos/1.mp4",
                    "Blue cave and 5 islands",
                    ["Blue cave", "and five", "islands"],
                    "media/img/cave.png",
                ),
                slide(
                    "slide2",
                    "media/videos/2.mp4",
                    "Blue lagoon and the shipwreck",
                    ["Blue lagoon", "and the", "shipwreck"],
                    "media/img/lagoon.png",
                ),
                slide(
                    "slide3",
                    "media/videos/3.mp4",
                    "Luxurious private boat tour",
                    ["Luxurious", "private", "boat tour"],
                    "media/img/private.png",
                ),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn get(&self, index: usize) -> &Slide {
        &self.slides[index % self.slides.len()]
    }

    fn validated(mut self) -> SliderResult<Self> {
        if self.slides.is_empty() {
            return Err(SliderError::manifest("manifest must list at least one slide"));
        }
        let mut seen = HashSet::new();
        for slide in &mut self.slides {
            if slide.id.trim().is_empty() {
                return Err(SliderError::manifest("slide id must be non-empty"));
            }
            if !seen.insert(slide.id.clone()) {
                return Err(SliderError::manifest(format!("duplicate slide id '{}'", slide.id)));
            }
            if slide.video.trim().is_empty() {
                return Err(SliderError::manifest(format!("slide '{}' has no video source", slide.id)));
            }
            if slide.title.is_empty() {
                slide.title = split_title(&slide.caption);
            }
        }
        Ok(self)
    }

    fn resolve_relative(&mut self, base: &Path) {
        for slide in &mut self.slides {
            if !is_url(&slide.video) && Path::new(&slide.video).is_relative() {
                slide.video = base.join(&slide.video).to_string_lossy().into_owned();
            }
            if let Some(poster) = slide.poster.as_mut() {
                if poster.is_relative() {
                    *poster = base.join(&*poster);
                }
            }
        }
    }
}

pub fn is_url(source: &str) -> bool {
    source.contains("://")
}

/// Wrap-around index arithmetic in both directions.
pub fn wrap_index(current: usize, direction: i32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let len = len as i64;
    ((current as i64 + direction as i64).rem_euclid(len)) as usize
}

// Spreads the caption words over at most three lines, keeping word order.
fn split_title(caption: &str) -> Vec<String> {
    let words: Vec<&str> = caption.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    let lines = words.len().min(MAX_TITLE_LINES);
    let per_line = words.len().div_ceil(lines);
    words.chunks(per_line).map(|chunk| chunk.join(" ")).collect()
}
