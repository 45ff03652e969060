//! Caption, counter and chrome animations that follow slide changes.
//!
//! Caption offsets are in percent of the line height: `100` is fully below
//! the line mask, `0` is in place and `-100` is fully above it.

use crate::constants::*;
use crate::ease::{Ease, Tween};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionEvent {
    ExitStarted(usize),
    ExitFinished(usize),
    EnterStarted(usize),
    EnterFinished(usize),
}

#[derive(Debug, Clone)]
enum CaptionPhase {
    Hidden,
    Exiting { slide: usize, lines: Vec<Tween>, next: usize },
    Entering { slide: usize, lines: Vec<Tween> },
    Shown { slide: usize },
}

fn exit_lines(count: usize, from: &[f32]) -> Vec<Tween> {
    (0..count)
        .map(|i| {
            let start = from.get(i).copied().unwrap_or(0.0);
            Tween::new(Ease::Power2Out, start, -100.0, CAPTION_DURATION)
                .with_delay(i as f32 * CAPTION_EXIT_STAGGER)
        })
        .collect()
}

fn enter_lines(count: usize, delay: f32) -> Vec<Tween> {
    (0..count)
        .map(|i| {
            Tween::new(Ease::Power2Out, 100.0, 0.0, CAPTION_DURATION)
                .with_delay(delay + i as f32 * CAPTION_ENTER_STAGGER)
        })
        .collect()
}

/// Slide counter digit: slides out, changes, slides back in.
#[derive(Debug, Clone)]
pub struct Counter {
    value: usize,
    out: Option<(Tween, usize)>,
    back: Option<Tween>,
}

impl Counter {
    pub fn new(value: usize) -> Self {
        Self { value, out: None, back: None }
    }

    pub fn set(&mut self, next: usize) {
        self.back = None;
        self.out = Some((Tween::new(Ease::Power2In, 0.0, -COUNTER_TRAVEL, COUNTER_OUT_DURATION), next));
    }

    pub fn value(&self) -> usize {
        self.value
    }

    pub fn offset(&self) -> f32 {
        match (&self.out, &self.back) {
            (Some((tween, _)), _) => tween.value(),
            (None, Some(tween)) => tween.value(),
            (None, None) => 0.0,
        }
    }

    pub fn update(&mut self, dt: f32) {
        if let Some((tween, next)) = self.out.as_mut() {
            tween.apply(dt);
            if tween.is_finished() {
                self.value = *next;
                self.out = None;
                self.back = Some(Tween::new(Ease::Power2Out, COUNTER_TRAVEL, 0.0, COUNTER_IN_DURATION));
            }
            return;
        }
        if let Some(tween) = self.back.as_mut() {
            tween.apply(dt);
            if tween.is_finished() {
                self.back = None;
            }
        }
    }
}

/// Header/footer slide-in and the menu panel.
#[derive(Debug, Clone)]
pub struct Chrome {
    reveal: Option<Tween>,
    revealed: bool,
    menu_open: bool,
    menu: Tween,
}

impl Chrome {
    pub fn new() -> Self {
        Self {
            reveal: None,
            revealed: false,
            menu_open: false,
            menu: Tween::new(Ease::Linear, 0.0, 0.0, 0.0),
        }
    }

    pub fn reveal(&mut self) {
        if self.reveal.is_none() && !self.revealed {
            self.reveal = Some(Tween::new(Ease::Power2Out, 1.0, 0.0, CHROME_DURATION).with_delay(CHROME_DELAY));
        }
    }

    /// 1.0 while the chrome is off-screen, 0.0 once it is in place.
    pub fn hidden_fraction(&self) -> f32 {
        match &self.reveal {
            Some(tween) => tween.value(),
            None if self.revealed => 0.0,
            None => 1.0,
        }
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn set_menu(&mut self, open: bool) {
        if open == self.menu_open {
            return;
        }
        self.menu_open = open;
        let from = self.menu.value();
        let to = if open { 1.0 } else { 0.0 };
        self.menu = Tween::new(Ease::Power2Out, from, to, MENU_CLOSE_DELAY);
    }

    /// 0.0 closed, 1.0 fully open.
    pub fn menu_fraction(&self) -> f32 {
        self.menu.value()
    }

    pub fn update(&mut self, dt: f32) {
        self.menu.apply(dt);
        if let Some(tween) = self.reveal.as_mut() {
            tween.apply(dt);
            if tween.is_finished() {
                self.reveal = None;
                self.revealed = true;
            }
        }
    }
}

impl Default for Chrome {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Choreographer {
    line_counts: Vec<usize>,
    phase: CaptionPhase,
    pub counter: Counter,
    pub chrome: Chrome,
}

impl Choreographer {
    pub fn new(line_counts: Vec<usize>) -> Self {
        Self {
            line_counts,
            phase: CaptionPhase::Hidden,
            counter: Counter::new(1),
            chrome: Chrome::new(),
        }
    }

    fn lines_of(&self, slide: usize) -> usize {
        self.line_counts.get(slide).copied().unwrap_or(0)
    }

    /// First caption and the chrome, once the intro blend has finished.
    pub fn reveal_first(&mut self, slide: usize) -> Vec<CaptionEvent> {
        self.chrome.reveal();
        self.counter = Counter::new(slide + 1);
        self.phase = CaptionPhase::Entering { slide, lines: enter_lines(self.lines_of(slide), 0.0) };
        vec![CaptionEvent::EnterStarted(slide)]
    }

    /// Starts the outgoing caption; the incoming one follows when it is gone.
    pub fn on_transition_start(&mut self, prev: usize, next: usize) -> Vec<CaptionEvent> {
        if prev == next {
            return Vec::new();
        }
        self.counter.set(next + 1);

        let offsets = self.offsets();
        let shown = match &self.phase {
            CaptionPhase::Shown { slide } | CaptionPhase::Entering { slide, .. } => Some(*slide),
            CaptionPhase::Exiting { slide, .. } => Some(*slide),
            CaptionPhase::Hidden => None,
        };
        match shown {
            Some(slide) => {
                let from = offsets.map(|(_, o)| o).unwrap_or_default();
                self.phase = CaptionPhase::Exiting {
                    slide,
                    lines: exit_lines(self.lines_of(slide), &from),
                    next,
                };
                vec![CaptionEvent::ExitStarted(slide)]
            }
            None => {
                self.phase = CaptionPhase::Entering { slide: next, lines: enter_lines(self.lines_of(next), 0.0) };
                vec![CaptionEvent::EnterStarted(next)]
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, CaptionPhase::Exiting { .. } | CaptionPhase::Entering { .. })
    }

    pub fn update(&mut self, dt: f32) -> Vec<CaptionEvent> {
        self.counter.update(dt);
        self.chrome.update(dt);

        let mut events = Vec::new();
        match &mut self.phase {
            CaptionPhase::Exiting { slide, lines, next } => {
                lines.iter_mut().for_each(|t| {
                    t.apply(dt);
                });
                if lines.iter().all(Tween::is_finished) {
                    let (done, next) = (*slide, *next);
                    events.push(CaptionEvent::ExitFinished(done));
                    events.push(CaptionEvent::EnterStarted(next));
                    self.phase = CaptionPhase::Entering { slide: next, lines: enter_lines(self.lines_of(next), 0.0) };
                }
            }
            CaptionPhase::Entering { slide, lines } => {
                lines.iter_mut().for_each(|t| {
                    t.apply(dt);
                });
                if lines.iter().all(Tween::is_finished) {
                    let done = *slide;
                    events.push(CaptionEvent::EnterFinished(done));
                    self.phase = CaptionPhase::Shown { slide: done };
                }
            }
            CaptionPhase::Hidden | CaptionPhase::Shown { .. } => {}
        }
        events
    }

    /// Visible caption and its per-line offsets, in percent of line height.
    pub fn offsets(&self) -> Option<(usize, Vec<f32>)> {
        match &self.phase {
            CaptionPhase::Hidden => None,
            CaptionPhase::Shown { slide } => Some((*slide, vec![0.0; self.lines_of(*slide)])),
            CaptionPhase::Exiting { slide, lines, .. } | CaptionPhase::Entering { slide, lines } => {
                Some((*slide, lines.iter().map(Tween::value).collect()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn settle(ch: &mut Choreographer) -> Vec<CaptionEvent> {
        let mut all = Vec::new();
        for _ in 0..600 {
            all.extend(ch.update(DT));
            if !ch.is_busy() {
                break;
            }
        }
        all
    }

    #[test]
    fn first_reveal_slides_lines_in_with_stagger() {
        let mut ch = Choreographer::new(vec![3, 3, 3]);
        assert_eq!(ch.offsets(), None);
        ch.reveal_first(0);
        ch.update(0.05);
        let (slide, offsets) = ch.offsets().unwrap();
        assert_eq!(slide, 0);
        assert!(offsets[0] < 100.0);
        assert_eq!(offsets[1], 100.0);
        assert_eq!(offsets[2], 100.0);
        let events = settle(&mut ch);
        assert_eq!(events.last(), Some(&CaptionEvent::EnterFinished(0)));
        assert_eq!(ch.offsets(), Some((0, vec![0.0; 3])));
    }

    #[test]
    fn reveal_waits_for_the_previous_exit() {
        let mut ch = Choreographer::new(vec![3, 2, 3]);
        ch.reveal_first(0);
        settle(&mut ch);

        let mut events = ch.on_transition_start(0, 1);
        events.extend(settle(&mut ch));
        assert_eq!(
            events,
            vec![
                CaptionEvent::ExitStarted(0),
                CaptionEvent::ExitFinished(0),
                CaptionEvent::EnterStarted(1),
                CaptionEvent::EnterFinished(1),
            ]
        );
        assert_eq!(ch.offsets(), Some((1, vec![0.0; 2])));
    }

    #[test]
    fn exit_runs_upwards_and_stays_busy() {
        let mut ch = Choreographer::new(vec![2, 2]);
        ch.reveal_first(0);
        settle(&mut ch);
        ch.on_transition_start(0, 1);
        assert!(ch.is_busy());
        ch.update(0.3);
        let (slide, offsets) = ch.offsets().unwrap();
        assert_eq!(slide, 0);
        assert!(offsets.iter().all(|o| *o < 0.0 && *o > -100.0));
    }

    #[test]
    fn same_slide_is_ignored() {
        let mut ch = Choreographer::new(vec![1, 1]);
        assert!(ch.on_transition_start(1, 1).is_empty());
        assert!(!ch.is_busy());
    }

    #[test]
    fn counter_changes_after_sliding_out() {
        let mut counter = Counter::new(1);
        counter.set(2);
        counter.update(0.1);
        assert_eq!(counter.value(), 1);
        assert!(counter.offset() < 0.0);
        counter.update(0.11);
        assert_eq!(counter.value(), 2);
        assert_eq!(counter.offset(), COUNTER_TRAVEL);
        counter.update(0.3);
        counter.update(0.01);
        assert_eq!(counter.offset(), 0.0);
    }

    #[test]
    fn chrome_reveals_after_delay_once() {
        let mut chrome = Chrome::new();
        assert_eq!(chrome.hidden_fraction(), 1.0);
        chrome.reveal();
        chrome.update(0.4);
        assert_eq!(chrome.hidden_fraction(), 1.0);
        chrome.update(0.7);
        assert!(chrome.is_revealed());
        assert_eq!(chrome.hidden_fraction(), 0.0);
        chrome.reveal();
        assert_eq!(chrome.hidden_fraction(), 0.0);
    }

    #[test]
    fn menu_opens_and_closes_smoothly() {
        let mut chrome = Chrome::new();
        chrome.set_menu(true);
        chrome.update(0.3);
        let mid = chrome.menu_fraction();
        assert!(mid > 0.0 && mid < 1.0);
        chrome.set_menu(false);
        assert!(!chrome.menu_open());
        chrome.update(1.0);
        assert_eq!(chrome.menu_fraction(), 0.0);
    }
}
