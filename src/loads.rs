use std::collections::HashMap;

use tracing::{error, warn};

use crate::constants::*;
use crate::error::SliderError;
use crate::manifest::wrap_index;
use crate::sequencer::Sequencer;

/// Result of polling an in-flight load once.
pub enum LoadStatus<S> {
    Pending(f32),
    Ready(S),
    Failed(SliderError),
}

/// A load that is polled from the render loop and never blocks it.
pub trait PendingLoad {
    type Stream;

    fn source(&self) -> &str;
    fn poll(&mut self) -> LoadStatus<Self::Stream>;
}

/// Slides whose media is worth keeping around while `current` is shown.
pub fn neighbours(current: usize, len: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(2);
    for direction in [1, -1] {
        let index = wrap_index(current, direction, len);
        if index != current && !out.contains(&index) {
            out.push(index);
        }
    }
    out
}

/// Per-slide media loads: running requests, finished streams waiting for the
/// sequencer, and the progress of the loads the intro waits for.
pub struct MediaLoads<L: PendingLoad> {
    pending: HashMap<usize, L>,
    ready: HashMap<usize, L::Stream>,
    initial: Vec<usize>,
    initial_progress: HashMap<usize, f32>,
    initial_failed: bool,
}

impl<L: PendingLoad> MediaLoads<L> {
    pub fn new(slide_count: usize) -> Self {
        let initial: Vec<usize> = (0..slide_count.min(INITIAL_LOADS)).collect();
        Self {
            pending: HashMap::new(),
            ready: HashMap::new(),
            initial_progress: initial.iter().map(|&index| (index, 0.0)).collect(),
            initial,
            initial_failed: false,
        }
    }

    pub fn initial(&self) -> &[usize] {
        &self.initial
    }

    pub fn is_tracked(&self, index: usize) -> bool {
        self.pending.contains_key(&index) || self.ready.contains_key(&index)
    }

    /// Starts a load for `index` unless one is already running or finished.
    pub fn start(&mut self, index: usize, load: impl FnOnce() -> L) {
        if !self.is_tracked(index) {
            self.pending.insert(index, load());
        }
    }

    /// Polls every running load. A failure of the slide the sequencer is
    /// waiting for releases its lock; a failed initial load stalls the intro.
    pub fn poll<T>(&mut self, sequencer: &mut Sequencer<T>) {
        let mut finished = Vec::new();
        for (&index, request) in self.pending.iter_mut() {
            match request.poll() {
                LoadStatus::Pending(percent) => {
                    if let Some(progress) = self.initial_progress.get_mut(&index) {
                        *progress = progress.max(percent);
                    }
                }
                status => finished.push((index, status)),
            }
        }

        for (index, status) in finished {
            let Some(request) = self.pending.remove(&index) else { continue };
            match status {
                LoadStatus::Ready(stream) => {
                    if let Some(progress) = self.initial_progress.get_mut(&index) {
                        *progress = 100.0;
                    }
                    self.ready.insert(index, stream);
                }
                LoadStatus::Failed(e) => {
                    if sequencer.awaiting_target() == Some(index) {
                        warn!(source = request.source(), error = %e, "media failed to load, transition skipped");
                        sequencer.fail();
                    } else if !sequencer.is_loaded() && self.initial.contains(&index) {
                        error!(source = request.source(), error = %e, "initial media failed to load");
                        self.initial_failed = true;
                    } else {
                        warn!(source = request.source(), error = %e, "prefetch failed");
                    }
                }
                LoadStatus::Pending(_) => {}
            }
        }
    }

    pub fn initial_ready(&self) -> bool {
        self.initial.iter().all(|index| self.ready.contains_key(index))
    }

    pub fn take(&mut self, index: usize) -> Option<L::Stream> {
        self.ready.remove(&index)
    }

    /// The intro cannot start; the loading indicator stays where it is.
    pub fn stall(&mut self) {
        self.initial_failed = true;
    }

    pub fn initial_failed(&self) -> bool {
        self.initial_failed
    }

    /// Mean progress of the initial loads, in percent. Never decreases.
    pub fn percent(&self) -> f32 {
        if self.initial.is_empty() {
            return 100.0;
        }
        let total: f32 = self
            .initial
            .iter()
            .map(|index| self.initial_progress.get(index).copied().unwrap_or(0.0))
            .sum();
        (total / self.initial.len() as f32).min(100.0)
    }

    /// Drops every load except the neighbours of `current` and returns them.
    pub fn keep_neighbours(&mut self, current: usize, len: usize) -> Vec<usize> {
        let keep = neighbours(current, len);
        self.ready.retain(|index, _| keep.contains(index));
        self.pending.retain(|index, _| keep.contains(index));
        keep
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::ease::Ease;
    use crate::sequencer::{TransitionConfig, Trigger};

    struct ScriptedLoad {
        source: &'static str,
        script: VecDeque<LoadStatus<&'static str>>,
        last: f32,
    }

    fn scripted(source: &'static str, script: Vec<LoadStatus<&'static str>>) -> ScriptedLoad {
        ScriptedLoad { source, script: script.into(), last: 0.0 }
    }

    impl PendingLoad for ScriptedLoad {
        type Stream = &'static str;

        fn source(&self) -> &str {
            self.source
        }

        fn poll(&mut self) -> LoadStatus<&'static str> {
            match self.script.pop_front() {
                Some(LoadStatus::Pending(percent)) => {
                    self.last = percent;
                    LoadStatus::Pending(percent)
                }
                Some(status) => status,
                None => LoadStatus::Pending(self.last),
            }
        }
    }

    fn failed() -> LoadStatus<&'static str> {
        LoadStatus::Failed(SliderError::media_load("decoder exited"))
    }

    fn sequencer(slides: usize) -> Sequencer<&'static str> {
        Sequencer::new(TransitionConfig::new(1.0, Ease::Power2Out).unwrap(), slides, "placeholder")
    }

    fn intro_done(loads: &mut MediaLoads<ScriptedLoad>, seq: &mut Sequencer<&'static str>) {
        loads.start(0, || scripted("0.mp4", vec![LoadStatus::Ready("video-0")]));
        loads.start(1, || scripted("1.mp4", vec![LoadStatus::Ready("video-1")]));
        loads.poll(seq);
        assert!(loads.initial_ready());
        seq.intro(loads.take(0).unwrap()).unwrap();
        while seq.tick(0.1).is_none() {}
    }

    #[test]
    fn failed_target_releases_the_sequencer() {
        let mut seq = sequencer(3);
        let mut loads = MediaLoads::new(3);
        intro_done(&mut loads, &mut seq);

        let target = seq.request(Trigger::Step(-1)).unwrap();
        assert_eq!(target, 2);
        loads.start(target, || scripted("2.mp4", vec![LoadStatus::Pending(30.0), failed()]));
        loads.poll(&mut seq);
        assert_eq!(seq.awaiting_target(), Some(2));

        loads.poll(&mut seq);
        assert!(seq.is_idle());
        assert_eq!(seq.awaiting_target(), None);
        assert_eq!(seq.current_index(), 0);
        assert!(!loads.is_tracked(2));
        assert!(seq.request(Trigger::Step(1)).is_ok());
    }

    #[test]
    fn failed_initial_load_stalls_the_indicator() {
        let mut seq = sequencer(3);
        let mut loads = MediaLoads::new(3);
        loads.start(0, || {
            scripted("0.mp4", vec![LoadStatus::Pending(40.0), LoadStatus::Pending(90.0), LoadStatus::Ready("video-0")])
        });
        loads.start(1, || scripted("1.mp4", vec![LoadStatus::Pending(60.0), failed()]));

        loads.poll(&mut seq);
        assert_eq!(loads.percent(), 50.0);
        assert!(!loads.initial_failed());

        loads.poll(&mut seq);
        assert_eq!(loads.percent(), 75.0);
        assert!(loads.initial_failed());

        loads.poll(&mut seq);
        assert_eq!(loads.percent(), 80.0);
        assert!(!loads.initial_ready());
        assert!(!seq.is_loaded());
    }

    #[test]
    fn percent_never_drops() {
        let mut seq = sequencer(2);
        let mut loads = MediaLoads::new(2);
        loads.start(0, || scripted("0.mp4", vec![LoadStatus::Pending(80.0), LoadStatus::Pending(20.0)]));
        loads.start(1, || scripted("1.mp4", vec![]));
        loads.poll(&mut seq);
        let first = loads.percent();
        loads.poll(&mut seq);
        assert_eq!(loads.percent(), first);
        assert_eq!(first, 40.0);
    }

    #[test]
    fn completion_keeps_only_neighbours() {
        let mut seq = sequencer(5);
        let mut loads = MediaLoads::new(5);
        for (index, name) in ["video-0", "video-1", "video-2", "video-3"].into_iter().enumerate() {
            loads.start(index, || scripted(name, vec![LoadStatus::Ready(name)]));
        }
        loads.start(4, || scripted("4.mp4", vec![]));
        loads.poll(&mut seq);

        let keep = loads.keep_neighbours(0, 5);
        assert_eq!(keep, vec![1, 4]);
        assert!(loads.is_tracked(1));
        assert!(loads.is_tracked(4));
        for evicted in [0, 2, 3] {
            assert!(!loads.is_tracked(evicted));
        }
    }

    #[test]
    fn start_skips_tracked_slides() {
        let mut loads: MediaLoads<ScriptedLoad> = MediaLoads::new(3);
        loads.start(1, || scripted("1.mp4", vec![]));
        loads.start(1, || panic!("second load for the same slide"));
        assert!(loads.is_tracked(1));
        assert_eq!(loads.initial(), &[0, 1]);
    }

    #[test]
    fn neighbours_wrap_and_dedupe() {
        assert_eq!(neighbours(0, 3), vec![1, 2]);
        assert_eq!(neighbours(2, 3), vec![0, 1]);
        assert_eq!(neighbours(0, 2), vec![1]);
        assert!(neighbours(0, 1).is_empty());
    }
}
