//! Simulation events recorded during a frame.
//!
//! The log is cleared at the start of every `Engine::update`, so after the call
//! it holds exactly what that frame did. Hosts use it for HUD and feedback;
//! tests use it to observe ordering.

use engine_core::{EntityKind, Handle, ProjectileKind, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    Fired {
        shooter: usize,
        projectile: usize,
        kind: ProjectileKind,
    },
    ProjectileExpired {
        projectile: usize,
    },
    TerrainImpact {
        projectile: usize,
        position: Vec3,
    },
    HitStatic {
        projectile: usize,
        target: usize,
        point: Vec3,
    },
    HitActor {
        projectile: usize,
        target: usize,
        point: Vec3,
    },
    Damaged {
        target: usize,
        amount: i32,
        remaining: i32,
    },
    Killed {
        handle: Handle,
        kind: EntityKind,
    },
    TriggerEnter {
        trigger: usize,
        other: usize,
    },
    TriggerExit {
        trigger: usize,
    },
    Footstep {
        actor: usize,
    },
    WaveStarted {
        wave: u32,
        size: u32,
    },
}

/// Per-frame event log.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
}

impl EventLog {
    pub fn push(&mut self, event: SimEvent) {
        log::trace!("{:?}", event);
        self.events.push(event);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn as_slice(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    pub fn count(&self, pred: impl Fn(&SimEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_filters_by_variant() {
        let mut log = EventLog::default();
        log.push(SimEvent::Footstep { actor: 1 });
        log.push(SimEvent::TriggerExit { trigger: 0 });
        log.push(SimEvent::Footstep { actor: 2 });
        assert_eq!(log.count(|e| matches!(e, SimEvent::Footstep { .. })), 2);
        log.clear();
        assert!(log.is_empty());
    }
}
