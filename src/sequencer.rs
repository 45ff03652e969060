use crate::constants::*;
use crate::ease::{Ease, Tween};
use crate::error::{SliderError, SliderResult};
use crate::manifest::wrap_index;
use crate::state::{Phase, SequencerState, Transition};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    Step(i32),    // +1 = next, -1 = previous
    Goto(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    Busy,
    NotLoaded,
    SameSlide,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completed {
    pub from: usize,
    pub to: usize,
    pub intro: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionConfig {
    pub duration: f32,
    pub ease: Ease,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self { duration: TRANSITION_DURATION, ease: Ease::Power2Out }
    }
}

impl TransitionConfig {
    pub fn new(duration: f32, ease: Ease) -> SliderResult<Self> {
        if !duration.is_finite() || !(MIN_TRANSITION_DURATION..=MAX_TRANSITION_DURATION).contains(&duration) {
            return Err(SliderError::config(format!(
                "transition duration must be within {MIN_TRANSITION_DURATION}..={MAX_TRANSITION_DURATION} seconds, got {duration}"
            )));
        }
        Ok(Self { duration, ease })
    }
}

/// Read-only view handed to the renderer for one frame.
pub struct FrameView<'a, T> {
    pub current: &'a T,
    pub incoming: &'a T,
    pub progress: f32,
}

/// Owns the two texture slots and the progress value that blends them.
///
/// In steady state `incoming` is empty and both slots resolve to `current`.
/// Superseded textures are parked in `retired` until the next
/// [`Sequencer::release_retired`] call, so nothing the renderer drew this
/// frame is dropped underneath it.
pub struct Sequencer<T> {
    config: TransitionConfig,
    slide_count: usize,
    current_index: usize,

    current: T,
    incoming: Option<T>,
    retired: Vec<T>,

    state: SequencerState,
    loaded: bool,
    progress: f32,
    tween: Option<Tween>,
    intro: bool,
}

impl<T> Sequencer<T> {
    pub fn new(config: TransitionConfig, slide_count: usize, placeholder: T) -> Self {
        Self {
            config,
            slide_count,
            current_index: 0,
            current: placeholder,
            incoming: None,
            retired: Vec::new(),
            state: SequencerState::Idle,
            loaded: false,
            progress: 0.0,
            tween: None,
            intro: false,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == SequencerState::Idle
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[cfg(test)]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Target of a transition that is still waiting for its texture.
    pub fn awaiting_target(&self) -> Option<usize> {
        match self.state {
            SequencerState::Transitioning(Transition { target, phase: Phase::Awaiting, .. }) => Some(target),
            _ => None,
        }
    }

    /// Blends the placeholder into the first slide once the initial load is done.
    pub fn intro(&mut self, first: T) -> Result<(), T> {
        if self.loaded || !self.is_idle() {
            return Err(first);
        }
        self.loaded = true;
        self.intro = true;
        self.state = SequencerState::Transitioning(Transition {
            from: self.current_index,
            target: self.current_index,
            phase: Phase::Awaiting,
        });
        self.begin(first)
    }

    /// Locks the sequencer for a transition and returns the slide to load.
    pub fn request(&mut self, trigger: Trigger) -> Result<usize, Rejected> {
        if !self.is_idle() {
            return Err(Rejected::Busy);
        }
        if !self.loaded || self.slide_count == 0 {
            return Err(Rejected::NotLoaded);
        }
        let target = match trigger {
            Trigger::Step(direction) => wrap_index(self.current_index, direction, self.slide_count),
            Trigger::Goto(index) => index % self.slide_count,
        };
        if target == self.current_index {
            return Err(Rejected::SameSlide);
        }
        self.state = SequencerState::Transitioning(Transition {
            from: self.current_index,
            target,
            phase: Phase::Awaiting,
        });
        Ok(target)
    }

    /// Puts the loaded texture in the incoming slot and starts the blend.
    /// Hands the texture back if no transition is waiting for one.
    pub fn begin(&mut self, incoming: T) -> Result<(), T> {
        let SequencerState::Transitioning(transition) = self.state else {
            return Err(incoming);
        };
        if transition.phase != Phase::Awaiting {
            return Err(incoming);
        }
        if let Some(previous) = self.incoming.replace(incoming) {
            self.retired.push(previous);
        }
        self.progress = 0.0;
        self.tween = Some(Tween::new(self.config.ease, 0.0, 1.0, self.config.duration));
        self.state = SequencerState::Transitioning(Transition { phase: Phase::Blending, ..transition });
        Ok(())
    }

    /// The incoming texture could not be loaded; unlock without moving.
    pub fn fail(&mut self) {
        if let SequencerState::Transitioning(Transition { phase: Phase::Awaiting, .. }) = self.state {
            self.state = SequencerState::Idle;
        }
    }

    pub fn tick(&mut self, dt: f32) -> Option<Completed> {
        let SequencerState::Transitioning(transition) = self.state else {
            return None;
        };
        if transition.phase != Phase::Blending {
            return None;
        }
        let tween = self.tween.as_mut()?;
        let value = tween.apply(dt).clamp(0.0, 1.0);
        self.progress = self.progress.max(value);
        if !tween.is_finished() {
            return None;
        }

        if let Some(next) = self.incoming.take() {
            let previous = std::mem::replace(&mut self.current, next);
            self.retired.push(previous);
        }
        self.tween = None;
        self.progress = 0.0;
        self.current_index = transition.target;
        self.state = SequencerState::Idle;

        let intro = std::mem::take(&mut self.intro);
        Some(Completed { from: transition.from, to: transition.target, intro })
    }

    pub fn frame(&self) -> FrameView<'_, T> {
        FrameView {
            current: &self.current,
            incoming: self.incoming.as_ref().unwrap_or(&self.current),
            progress: self.progress,
        }
    }

    /// Mutable access to the live textures, for uploading new video frames.
    pub fn textures_mut(&mut self) -> impl Iterator<Item = &mut T> {
        std::iter::once(&mut self.current).chain(self.incoming.as_mut())
    }

    #[cfg(test)]
    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    /// Drops textures superseded in earlier frames. Call before drawing.
    pub fn release_retired(&mut self) -> usize {
        let released = self.retired.len();
        self.retired.clear();
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TransitionConfig {
        TransitionConfig::new(1.0, Ease::Power2Out).unwrap()
    }

    fn loaded(slides: usize) -> Sequencer<&'static str> {
        let mut seq = Sequencer::new(config(), slides, "placeholder");
        seq.intro("video-0").unwrap();
        while seq.tick(0.1).is_none() {}
        seq.release_retired();
        seq
    }

    fn run_transition(seq: &mut Sequencer<&'static str>, trigger: Trigger, texture: &'static str) -> Completed {
        seq.request(trigger).unwrap();
        seq.begin(texture).unwrap();
        loop {
            if let Some(done) = seq.tick(1.0 / 60.0) {
                return done;
            }
        }
    }

    #[test]
    fn rejects_requests_before_initial_load() {
        let mut seq = Sequencer::new(config(), 3, "placeholder");
        assert_eq!(seq.request(Trigger::Step(1)), Err(Rejected::NotLoaded));
        assert!(seq.is_idle());
    }

    #[test]
    fn intro_blends_placeholder_into_first_slide() {
        let mut seq = Sequencer::new(config(), 3, "placeholder");
        seq.intro("video-0").unwrap();
        let view = seq.frame();
        assert_eq!(*view.current, "placeholder");
        assert_eq!(*view.incoming, "video-0");
        let mut done = None;
        while done.is_none() {
            done = seq.tick(0.25);
        }
        assert_eq!(done, Some(Completed { from: 0, to: 0, intro: true }));
        assert_eq!(*seq.frame().current, "video-0");
        assert_eq!(*seq.frame().incoming, "video-0");
        assert!(seq.intro("again").is_err());
    }

    #[test]
    fn steps_wrap_in_both_directions() {
        let mut seq = loaded(3);
        assert_eq!(run_transition(&mut seq, Trigger::Step(-1), "video-2").to, 2);
        assert_eq!(run_transition(&mut seq, Trigger::Step(1), "video-0").to, 0);
        assert_eq!(seq.current_index(), 0);
    }

    #[test]
    fn five_forward_steps_over_three_slides_land_on_two() {
        let mut seq = loaded(3);
        for _ in 0..5 {
            run_transition(&mut seq, Trigger::Step(1), "next");
        }
        assert_eq!(seq.current_index(), 2);
    }

    #[test]
    fn second_trigger_while_transitioning_is_a_no_op() {
        let mut seq = loaded(3);
        assert_eq!(seq.request(Trigger::Step(1)), Ok(1));
        assert_eq!(seq.request(Trigger::Step(1)), Err(Rejected::Busy));
        assert_eq!(seq.awaiting_target(), Some(1));
        seq.begin("video-1").unwrap();
        assert_eq!(seq.request(Trigger::Goto(2)), Err(Rejected::Busy));
        assert_eq!(seq.begin("stray"), Err("stray"));
    }

    #[test]
    fn goto_current_slide_is_rejected() {
        let mut seq = loaded(3);
        assert_eq!(seq.request(Trigger::Goto(0)), Err(Rejected::SameSlide));
        assert_eq!(seq.request(Trigger::Goto(4)), Ok(1));
    }

    #[test]
    fn progress_is_monotonic_and_resets_to_zero() {
        let mut seq = loaded(3);
        seq.request(Trigger::Step(1)).unwrap();
        assert_eq!(seq.progress(), 0.0);
        seq.begin("video-1").unwrap();
        let mut last = 0.0;
        loop {
            match seq.tick(0.05) {
                Some(_) => break,
                None => {
                    let p = seq.progress();
                    assert!(p >= last);
                    assert!((0.0..=1.0).contains(&p));
                    last = p;
                }
            }
        }
        assert!(last > 0.9);
        assert_eq!(seq.progress(), 0.0);
    }

    #[test]
    fn load_failure_releases_the_lock() {
        let mut seq = loaded(3);
        seq.request(Trigger::Step(1)).unwrap();
        seq.fail();
        assert!(seq.is_idle());
        assert_eq!(seq.current_index(), 0);
        assert_eq!(seq.request(Trigger::Step(1)), Ok(1));
    }

    #[test]
    fn retired_texture_outlives_the_swap_frame() {
        let mut seq = loaded(3);
        run_transition(&mut seq, Trigger::Step(1), "video-1");
        assert_eq!(seq.retired_count(), 1);
        assert_eq!(*seq.frame().current, "video-1");
        assert_eq!(seq.release_retired(), 1);
        assert_eq!(seq.retired_count(), 0);
    }

    #[test]
    fn textures_mut_covers_both_slots_only_while_blending() {
        let mut seq = loaded(2);
        assert_eq!(seq.textures_mut().count(), 1);
        seq.request(Trigger::Step(1)).unwrap();
        seq.begin("video-1").unwrap();
        assert_eq!(seq.textures_mut().count(), 2);
    }

    #[test]
    fn duration_is_validated() {
        assert!(TransitionConfig::new(0.0, Ease::Linear).is_err());
        assert!(TransitionConfig::new(f32::NAN, Ease::Linear).is_err());
        assert!(TransitionConfig::new(1.8, Ease::Linear).is_ok());
    }
}
