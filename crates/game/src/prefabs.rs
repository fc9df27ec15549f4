//! Entity templates: model hierarchies, weapons, rays and stats for every
//! stock kind.

use engine_core::{
    Aabb, Axis, EngineError, EntityKind, Model, ModelCollection, ModelPart, MoveTarget, Raycast,
    Vec3, WeaponBank, C_COLLISION, C_GRAVITY, C_HITBOX, C_RAYCAST, C_TRIGGER,
};

use crate::config::SimTuning;
use crate::state::{ActorDesc, StaticDesc};

/// Footfall rate, radians per unit travelled.
const STEP_RATE: f32 = 1.6;

/// Mesh id the host loads for rock visuals.
pub const ROCK_MESH: u32 = 1;

/// Starting hit points per kind.
pub fn max_hit_points(kind: EntityKind) -> i32 {
    match kind {
        EntityKind::Player => 100,
        EntityKind::Mech => 60,
        EntityKind::Turret => 40,
        EntityKind::Tank => 30,
        EntityKind::TankAlpha => 50,
        EntityKind::Harasser => 20,
        EntityKind::Destruct => 30,
        EntityKind::Wall | EntityKind::Rock | EntityKind::Environment => 0,
    }
}

fn boxed(size: Vec3) -> ModelCollection {
    ModelCollection::single(Model::cube(size.x, size.y, size.z), Vec3::ZERO)
}

fn part(w: f32, h: f32, d: f32) -> ModelPart {
    ModelPart::new(Model::cube(w, h, d))
}

/// Body with a gun that follows the view pitch.
pub fn player(position: Vec3) -> Result<ActorDesc, EngineError> {
    let size = Vec3::new(1.0, 2.0, 1.0);
    let visual = ModelCollection::new()
        .with_part(part(1.0, 2.0, 1.0))?
        .with_part(
            part(0.2, 0.2, 0.9)
                .with_parent(0)
                .with_offset(Vec3::new(0.4, 0.5, -0.5))
                .locked(Axis::Yaw)
                .locked(Axis::Pitch),
        )?;
    let weapons = WeaponBank::default()
        .with_weapon(8.0, 120.0, 0.0, 4.0)
        .with_weapon(1.0, 60.0, 0.5, 30.0);
    Ok(ActorDesc {
        visual,
        collision: boxed(size),
        hitbox: boxed(size),
        weapons: Some(weapons),
        rays: vec![Raycast {
            part: 1,
            muzzle: Vec3::new(0.0, 0.0, -0.8),
            weapon: 0,
            range: 200.0,
            ..Default::default()
        }],
        step_rate: STEP_RATE,
        ..ActorDesc::new(EntityKind::Player, position)
            .with_hit_points(max_hit_points(EntityKind::Player))
            .with_tag(C_GRAVITY)
            .with_tag(C_COLLISION)
            .with_tag(C_HITBOX)
            .with_tag(C_RAYCAST)
    })
}

/// Legs, a torso turning with the legs, and an arm gun.
pub fn mech(position: Vec3, tuning: &SimTuning) -> Result<ActorDesc, EngineError> {
    let visual = ModelCollection::new()
        .with_part(part(2.0, 1.5, 2.0).with_offset(Vec3::new(0.0, -0.5, 0.0)))?
        .with_part(
            part(2.2, 1.5, 1.6)
                .with_parent(0)
                .with_offset(Vec3::new(0.0, 1.5, 0.0))
                .locked(Axis::Yaw),
        )?
        .with_part(
            part(0.4, 0.4, 1.4)
                .with_parent(1)
                .with_offset(Vec3::new(1.3, 0.0, -0.4))
                .locked(Axis::Yaw),
        )?;
    let hitbox = ModelCollection::new()
        .with_part(part(2.0, 1.5, 2.0).with_offset(Vec3::new(0.0, -0.5, 0.0)))?
        .with_part(
            part(2.2, 1.5, 1.6)
                .with_parent(0)
                .with_offset(Vec3::new(0.0, 1.5, 0.0))
                .locked(Axis::Yaw),
        )?;
    Ok(ActorDesc {
        visual,
        collision: boxed(Vec3::new(2.0, 3.0, 2.0)),
        hitbox,
        weapons: Some(WeaponBank::default().with_weapon(3.0, 90.0, 0.2, 8.0)),
        move_target: Some(MoveTarget::new(
            6.0,
            tuning.ai_retarget_radius,
            tuning.ai_retarget_interval,
        )),
        rays: vec![Raycast {
            part: 2,
            muzzle: Vec3::new(0.0, 0.0, -1.2),
            range: 80.0,
            ..Default::default()
        }],
        step_rate: STEP_RATE,
        ..ActorDesc::new(EntityKind::Mech, position)
            .with_hit_points(max_hit_points(EntityKind::Mech))
            .with_tag(C_GRAVITY)
            .with_tag(C_COLLISION)
            .with_tag(C_HITBOX)
            .with_tag(C_RAYCAST)
    })
}

/// Fixed base with a rotating head and barrel.
pub fn turret(position: Vec3) -> Result<ActorDesc, EngineError> {
    let visual = ModelCollection::new()
        .with_part(part(2.0, 1.0, 2.0).with_offset(Vec3::new(0.0, -0.5, 0.0)))?
        .with_part(
            part(1.4, 0.8, 1.4)
                .with_parent(0)
                .with_offset(Vec3::new(0.0, 0.9, 0.0))
                .locked(Axis::Yaw),
        )?
        .with_part(
            part(0.3, 0.3, 1.6)
                .with_parent(1)
                .with_offset(Vec3::new(0.0, 0.0, -1.0))
                .locked(Axis::Yaw),
        )?;
    let size = Vec3::splat(2.0);
    Ok(ActorDesc {
        visual,
        collision: boxed(size),
        hitbox: boxed(size),
        weapons: Some(WeaponBank::default().with_weapon(2.0, 100.0, 0.0, 10.0)),
        rays: vec![Raycast {
            part: 2,
            muzzle: Vec3::new(0.0, 0.0, -0.8),
            range: 90.0,
            ..Default::default()
        }],
        ..ActorDesc::new(EntityKind::Turret, position)
            .with_hit_points(max_hit_points(EntityKind::Turret))
            .with_tag(C_COLLISION)
            .with_tag(C_HITBOX)
            .with_tag(C_RAYCAST)
    })
}

/// Wave enemy: hull with a turret. `kind` must be a tank-family kind.
pub fn tank(kind: EntityKind, position: Vec3, tuning: &SimTuning) -> Result<ActorDesc, EngineError> {
    let (speed, weapon) = match kind {
        EntityKind::TankAlpha => (4.0, (0.4, 80.0, 0.3, 25.0)),
        EntityKind::Harasser => (8.0, (1.5, 60.0, 0.2, 10.0)),
        _ => (5.0, (0.5, 70.0, 0.3, 20.0)),
    };
    let visual = ModelCollection::new()
        .with_part(part(3.0, 1.2, 4.0).with_offset(Vec3::new(0.0, -0.4, 0.0)))?
        .with_part(
            part(1.6, 0.7, 1.6)
                .with_parent(0)
                .with_offset(Vec3::new(0.0, 0.9, 0.0))
                .locked(Axis::Yaw),
        )?;
    let size = Vec3::new(3.0, 1.6, 4.0);
    Ok(ActorDesc {
        visual,
        collision: boxed(size),
        hitbox: boxed(size),
        weapons: Some(WeaponBank::default().with_weapon(weapon.0, weapon.1, weapon.2, weapon.3)),
        move_target: Some(MoveTarget::new(
            speed,
            tuning.ai_retarget_radius,
            tuning.ai_retarget_interval,
        )),
        rays: vec![Raycast {
            part: 1,
            muzzle: Vec3::new(0.0, 0.0, -2.2),
            range: 70.0,
            ..Default::default()
        }],
        step_rate: STEP_RATE * 0.5,
        ..ActorDesc::new(kind, position)
            .with_hit_points(max_hit_points(kind))
            .with_tag(C_GRAVITY)
            .with_tag(C_COLLISION)
            .with_tag(C_HITBOX)
            .with_tag(C_RAYCAST)
    })
}

/// Crate with an intact shell (part 0) and a hidden wreck (part 1).
pub fn destructible(position: Vec3) -> Result<ActorDesc, EngineError> {
    let size = Vec3::splat(2.0);
    let visual = ModelCollection::new()
        .with_part(part(2.0, 2.0, 2.0))?
        .with_part(
            part(2.0, 0.6, 2.0)
                .with_offset(Vec3::new(0.0, -0.7, 0.0))
                .inactive(),
        )?;
    Ok(ActorDesc {
        visual,
        collision: boxed(size),
        hitbox: boxed(size),
        ..ActorDesc::new(EntityKind::Destruct, position)
            .with_hit_points(max_hit_points(EntityKind::Destruct))
            .with_tag(C_COLLISION)
            .with_tag(C_HITBOX)
    })
}

/// Invisible volume that reports actors passing through.
pub fn trigger_zone(position: Vec3, size: Vec3) -> ActorDesc {
    ActorDesc::new(EntityKind::Environment, position)
        .with_box(size)
        .with_tag(C_TRIGGER)
        .with_tag(C_COLLISION)
}

pub fn wall(position: Vec3, size: Vec3, yaw: f32) -> StaticDesc {
    StaticDesc::boxed(EntityKind::Wall, position, size).with_yaw(yaw)
}

/// Rocks draw a loaded mesh scaled into `size`; they collide as boxes.
pub fn rock(position: Vec3, size: Vec3, yaw: f32) -> StaticDesc {
    let bounds = Aabb::from_center_half_extents(Vec3::ZERO, size * 0.5);
    StaticDesc {
        visual: ModelCollection::single(Model::asset(ROCK_MESH, bounds), Vec3::ZERO),
        ..StaticDesc::boxed(EntityKind::Rock, position, size).with_yaw(yaw)
    }
}
