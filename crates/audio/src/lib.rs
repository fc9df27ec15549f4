//! Sound event queue.
//!
//! The simulation never plays audio itself. It enqueues positioned
//! [`SoundEvent`]s on a bounded FIFO that the host drains once per frame and
//! hands to whatever mixer it owns.

use std::collections::VecDeque;

use engine_core::Vec3;

/// Capacity of the sound FIFO.
pub const MAX_SOUND_EVENTS: usize = 64;

/// Which sample the host should play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundKind {
    Fire,
    CannonFire,
    Footstep,
    Impact,
    MetalImpact,
    Explosion,
    TriggerEnter,
    WaveStart,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundEvent {
    pub kind: SoundKind,
    pub position: Vec3,
    pub volume: f32,
    pub pitch: f32,
}

impl SoundEvent {
    pub fn new(kind: SoundKind, position: Vec3) -> Self {
        Self {
            kind,
            position,
            volume: 1.0,
            pitch: 1.0,
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }
}

/// Bounded FIFO of pending sounds. A full queue drops new events.
#[derive(Debug)]
pub struct SoundQueue {
    events: VecDeque<SoundEvent>,
    capacity: usize,
    dropped: u64,
}

impl Default for SoundQueue {
    fn default() -> Self {
        Self::new(MAX_SOUND_EVENTS)
    }
}

impl SoundQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Enqueue an event. Returns false when the queue is full.
    pub fn push(&mut self, event: SoundEvent) -> bool {
        if self.events.len() >= self.capacity {
            if self.dropped == 0 {
                log::warn!("sound queue full ({}), dropping events", self.capacity);
            }
            self.dropped += 1;
            return false;
        }
        self.events.push_back(event);
        true
    }

    pub fn pop(&mut self) -> Option<SoundEvent> {
        self.events.pop_front()
    }

    /// Take every pending event in FIFO order.
    pub fn drain(&mut self) -> impl Iterator<Item = SoundEvent> + '_ {
        self.events.drain(..)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SoundEvent> {
        self.events.iter()
    }

    /// Events rejected because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
