//! Entity handles and the closed set of entity, projectile and particle kinds.

/// Which table a handle indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Actor,
    Static,
    Projectile,
}

/// Tagged `(category, index)` pair. Indices are dense within their category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    pub category: Category,
    pub index: u32,
}

impl Handle {
    pub const fn actor(index: usize) -> Self {
        Self {
            category: Category::Actor,
            index: index as u32,
        }
    }

    pub const fn static_entity(index: usize) -> Self {
        Self {
            category: Category::Static,
            index: index as u32,
        }
    }

    pub const fn projectile(index: usize) -> Self {
        Self {
            category: Category::Projectile,
            index: index as u32,
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// Entity type, shared by actors and statics. Behaviour dispatch is keyed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityKind {
    Player,
    Mech,
    Turret,
    Tank,
    TankAlpha,
    Harasser,
    Wall,
    Rock,
    #[default]
    Environment,
    Destruct,
}

impl EntityKind {
    pub const COUNT: usize = 10;

    pub const ALL: [EntityKind; Self::COUNT] = [
        EntityKind::Player,
        EntityKind::Mech,
        EntityKind::Turret,
        EntityKind::Tank,
        EntityKind::TankAlpha,
        EntityKind::Harasser,
        EntityKind::Wall,
        EntityKind::Rock,
        EntityKind::Environment,
        EntityKind::Destruct,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Pooled enemies that count towards the live wave.
    pub fn is_tank_family(self) -> bool {
        matches!(
            self,
            EntityKind::Tank | EntityKind::TankAlpha | EntityKind::Harasser
        )
    }

    /// Kinds integrated by the actor step and pushed by collision resolution.
    pub fn is_mobile(self) -> bool {
        matches!(self, EntityKind::Player | EntityKind::Mech) || self.is_tank_family()
    }

    /// Kinds driven by the AI system.
    pub fn is_ai_driven(self) -> bool {
        matches!(self, EntityKind::Mech | EntityKind::Turret) || self.is_tank_family()
    }
}

/// Projectile flavour; selects radius and lifetime at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectileKind {
    #[default]
    Bullet,
    Cannon,
}

impl ProjectileKind {
    pub fn radius(self) -> f32 {
        match self {
            ProjectileKind::Bullet => 0.1,
            ProjectileKind::Cannon => 0.35,
        }
    }

    /// Seconds before the round expires in flight.
    pub fn lifetime(self) -> f32 {
        match self {
            ProjectileKind::Bullet => 3.0,
            ProjectileKind::Cannon => 5.0,
        }
    }
}

/// Visual-only particle flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticleKind {
    #[default]
    Dust,
    MetalDust,
    Smoke,
    MuzzleFlash,
    Explosion,
}

impl ParticleKind {
    pub fn start_lifetime(self) -> f32 {
        match self {
            ParticleKind::Dust => 0.6,
            ParticleKind::MetalDust => 0.4,
            ParticleKind::Smoke => 1.2,
            ParticleKind::MuzzleFlash => 0.08,
            ParticleKind::Explosion => 1.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_indices_are_dense() {
        for (i, kind) in EntityKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn tank_family_is_mobile_and_ai_driven() {
        for kind in [EntityKind::Tank, EntityKind::TankAlpha, EntityKind::Harasser] {
            assert!(kind.is_mobile());
            assert!(kind.is_ai_driven());
        }
        assert!(!EntityKind::Turret.is_mobile());
        assert!(EntityKind::Turret.is_ai_driven());
        assert!(!EntityKind::Wall.is_ai_driven());
    }
}
