#[derive(Debug, PartialEq, Clone, Copy)]
pub enum SequencerState {
    Idle,                        // Only the current slot is occupied
    Transitioning(Transition),   // Locked until the blend completes or the load fails
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Transition {
    pub from: usize,
    pub target: usize,
    pub phase: Phase,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Phase {
    Awaiting, // Waiting for the incoming texture to load
    Blending, // Progress is running
}
