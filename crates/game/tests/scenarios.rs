//! End-to-end arena scenarios driven through the public `Engine` API.

use engine_core::{
    EntityKind, Handle, ParticleKind, ProjectileKind, ProjectileSpawn, Vec3, C_GRAVITY, C_HITBOX,
    C_COLLISION, C_TRIGGER,
};
use game::{ActorDesc, Engine, EngineConfig, SimEvent, StaticDesc};
use procgen::{ChunkKind, Map, MapChunk, SourceMesh};

const ARENA: f32 = 200.0;

fn flat_engine(config: EngineConfig) -> Engine {
    let config = EngineConfig {
        arena_size: ARENA,
        heightmap_resolution: 21,
        ..config
    };
    let mut engine = Engine::with_ground(config, &SourceMesh::flat_quad(ARENA, 0.0)).unwrap();
    engine.start().unwrap();
    engine
}

fn target(engine: &mut Engine, position: Vec3, hit_points: i32) -> usize {
    engine
        .spawn_actor(
            ActorDesc::new(EntityKind::Mech, position)
                .with_box(Vec3::splat(2.0))
                .with_tag(C_HITBOX)
                .with_hit_points(hit_points),
        )
        .unwrap()
        .index()
}

fn round_from(position: Vec3, owner: usize) -> ProjectileSpawn {
    ProjectileSpawn {
        kind: ProjectileKind::Bullet,
        position,
        velocity: Vec3::new(0.0, 0.0, -50.0),
        drop_rate: 0.0,
        owner: Some(owner),
    }
}

#[test]
fn fire_and_hit_static() {
    let mut engine = flat_engine(EngineConfig::default());
    let wall = engine
        .spawn_static(StaticDesc::boxed(EntityKind::Wall, Vec3::ZERO, Vec3::splat(10.0)))
        .unwrap();
    let shooter = target(&mut engine, Vec3::new(0.0, 5.0, 20.0), 100);
    let p = engine
        .fire_projectile(round_from(Vec3::new(0.0, 5.0, 20.0), shooter))
        .unwrap();

    // Reaches the near face at z = 5 within one step; dust outlives the step.
    engine.update(0.35).unwrap();

    assert!(!engine.world.projectiles.active[p]);
    assert_eq!(engine.world.particles.count_of(ParticleKind::MetalDust), 1);
    assert!(engine.world.statics.is_occupied(wall.index()));
    assert_eq!(engine.world.statics.position[wall.index()], Vec3::ZERO);
    assert_eq!(
        engine
            .events
            .count(|e| matches!(e, SimEvent::HitStatic { target, .. } if *target == wall.index())),
        1
    );
}

#[test]
fn fire_and_hit_actor() {
    let mut engine = flat_engine(EngineConfig::default());
    let attacker = target(&mut engine, Vec3::new(0.0, 5.0, 20.0), 100);
    let defender = target(&mut engine, Vec3::new(0.0, 5.0, 0.0), 100);
    let p = engine
        .fire_projectile(round_from(Vec3::new(0.0, 5.0, 20.0), attacker))
        .unwrap();

    engine.update(1.0).unwrap();

    assert_eq!(engine.world.actors.hit_points[defender], 90);
    assert_eq!(engine.world.actors.hit_points[attacker], 100);
    assert!(!engine.world.projectiles.active[p]);
    assert!(engine.world.actors.is_alive(defender));
    assert_eq!(engine.events.count(|e| matches!(e, SimEvent::Killed { .. })), 0);
    assert_eq!(engine.world.particles.count_of(ParticleKind::Smoke), 1);
}

#[test]
fn kill_by_repeated_hits() {
    let mut engine = flat_engine(EngineConfig::default());
    let attacker = target(&mut engine, Vec3::new(0.0, 5.0, 20.0), 100);
    let defender = target(&mut engine, Vec3::new(0.0, 5.0, 0.0), 10);
    engine
        .fire_projectile(round_from(Vec3::new(0.0, 5.0, 20.0), attacker))
        .unwrap();
    engine
        .fire_projectile(round_from(Vec3::new(0.2, 5.0, 20.0), attacker))
        .unwrap();

    engine.update(1.0).unwrap();

    assert!(!engine.world.actors.is_alive(defender));
    assert_eq!(engine.world.actors.hit_points[defender], 0);
    assert_eq!(engine.events.count(|e| matches!(e, SimEvent::Damaged { .. })), 1);
    assert_eq!(
        engine.events.count(
            |e| matches!(e, SimEvent::Killed { handle, .. } if *handle == Handle::actor(defender))
        ),
        1
    );
    assert_eq!(engine.grid.node_for(Handle::actor(defender)), None);
}

#[test]
fn gravity_clamp() {
    let mut config = EngineConfig::default();
    config.tuning.terminal_velocity = 1.0e6;
    let mut engine = flat_engine(config);
    let i = engine
        .spawn_actor(
            ActorDesc::new(EntityKind::Mech, Vec3::new(0.0, 1000.0, 0.0))
                .with_box(Vec3::ONE)
                .with_tag(C_GRAVITY),
        )
        .unwrap()
        .index();

    let dt = 1.0 / 60.0;
    let h = engine.ground_height(0.0, 0.0);
    let feet = engine.tuning().feet_offset;
    let gravity = engine.tuning().gravity;
    let bound = ((2.0 * (1000.0 - h) / gravity).sqrt() / dt).ceil() as usize;

    // Position integrates before velocity, so the first step from rest
    // holds height and landing can take one step past the free-fall time.
    let mut landed = None;
    for frame in 1..=bound + 1 {
        engine.update(dt).unwrap();
        let p = engine.world.actors.position(i).unwrap();
        assert!(p.y >= h + feet - 1e-4);
        if (p.y - (h + feet)).abs() < 1e-4 {
            assert_eq!(engine.world.actors.velocity(i).unwrap().y, 0.0);
            landed = Some(frame);
            break;
        }
    }

    assert!(landed.is_some());
    let p = engine.world.actors.position(i).unwrap();
    assert!(engine.grid.contains(Handle::actor(i), p));
}

#[test]
fn first_frame_from_rest_keeps_height() {
    let mut engine = flat_engine(EngineConfig::default());
    let i = engine
        .spawn_actor(
            ActorDesc::new(EntityKind::Mech, Vec3::new(0.0, 100.0, 0.0))
                .with_box(Vec3::ONE)
                .with_tag(C_GRAVITY),
        )
        .unwrap()
        .index();
    engine.update(0.1).unwrap();
    assert_eq!(engine.world.actors.position(i).unwrap().y, 100.0);
    engine.update(0.1).unwrap();
    let drop = engine.tuning().gravity * 0.1 * 0.1;
    assert!((engine.world.actors.position(i).unwrap().y - (100.0 - drop)).abs() < 1e-4);
}

#[test]
fn trigger_enter_and_exit() {
    let mut engine = flat_engine(EngineConfig::default());
    let trigger = engine
        .spawn_actor(
            ActorDesc::new(EntityKind::Environment, Vec3::ZERO)
                .with_box(Vec3::splat(10.0))
                .with_tag(C_TRIGGER)
                .with_tag(C_COLLISION),
        )
        .unwrap()
        .index();
    let flyer = engine
        .spawn_actor(
            ActorDesc::new(EntityKind::Mech, Vec3::new(0.0, 0.0, 40.0))
                .with_box(Vec3::ONE)
                .with_tag(C_COLLISION),
        )
        .unwrap()
        .index();

    let mut enters = 0;
    let mut exits = 0;
    let mut z = 40.0;
    while z >= -40.0 {
        engine.set_actor_position(flyer, Vec3::new(0.0, 0.0, z)).unwrap();
        engine.update(1.0 / 60.0).unwrap();
        enters += engine.events.count(|e| {
            matches!(e, SimEvent::TriggerEnter { trigger: t, other } if *t == trigger && *other == flyer)
        });
        exits += engine
            .events
            .count(|e| matches!(e, SimEvent::TriggerExit { trigger: t } if *t == trigger));
        z -= 2.5;
    }

    assert_eq!(enters, 1);
    assert_eq!(exits, 1);
}

#[test]
fn trigger_fires_for_a_moving_actor() {
    let mut config = EngineConfig::default();
    config.tuning.damping = 1.0;
    let mut engine = flat_engine(config);
    let trigger = engine
        .spawn_actor(
            ActorDesc::new(EntityKind::Environment, Vec3::ZERO)
                .with_box(Vec3::splat(10.0))
                .with_tag(C_TRIGGER)
                .with_tag(C_COLLISION),
        )
        .unwrap()
        .index();
    let flyer = engine
        .spawn_actor(
            ActorDesc::new(EntityKind::Mech, Vec3::new(0.0, 0.0, 40.0))
                .with_box(Vec3::ONE)
                .with_velocity(Vec3::new(0.0, 0.0, -20.0))
                .with_tag(C_COLLISION),
        )
        .unwrap()
        .index();

    // 300 frames at 20 u/s carry the flyer from z = 40 to z = -60.
    let mut enters = 0;
    let mut exits = 0;
    for _ in 0..300 {
        engine.update(1.0 / 60.0).unwrap();
        enters += engine.events.count(|e| {
            matches!(e, SimEvent::TriggerEnter { trigger: t, other } if *t == trigger && *other == flyer)
        });
        exits += engine
            .events
            .count(|e| matches!(e, SimEvent::TriggerExit { trigger: t } if *t == trigger));
    }

    let p = engine.world.actors.position(flyer).unwrap();
    assert!(p.z < -50.0);
    assert!(engine.grid.contains(Handle::actor(flyer), p));
    assert_eq!(enters, 1);
    assert_eq!(exits, 1);
}

#[test]
fn map_round_trip_through_file() {
    let mut map = Map::new(12, 10).unwrap();
    for z in 0..10 {
        for x in 0..12 {
            let kind = ChunkKind::from_raw(((x * 3 + z) % 8) as u8).unwrap();
            map.set(x, z, MapChunk::new(kind, (z - x) as i8, ((x + z) % 4) as u8));
        }
    }
    let path = std::env::temp_dir().join(format!("mech-arena-scenario-{}.bin", std::process::id()));
    map.save(&path).unwrap();
    let loaded = Map::load(&path);
    let _ = std::fs::remove_file(&path);
    assert_eq!(loaded.unwrap(), map);
}

#[test]
fn zero_velocity_round_expires() {
    let mut engine = flat_engine(EngineConfig::default());
    let p = engine
        .fire_projectile(ProjectileSpawn {
            kind: ProjectileKind::Bullet,
            position: Vec3::new(0.0, 1000.0, 0.0),
            velocity: Vec3::ZERO,
            drop_rate: 0.0,
            owner: None,
        })
        .unwrap();
    let dt = 1.0 / 60.0;
    let mut expired = false;
    for _ in 0..((ProjectileKind::Bullet.lifetime() / dt) as usize + 2) {
        engine.update(dt).unwrap();
        expired |= engine
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::ProjectileExpired { projectile } if *projectile == p));
    }
    assert!(expired);
    assert!(!engine.world.projectiles.active[p]);
}

#[test]
fn update_requires_running_engine() {
    let config = EngineConfig {
        arena_size: ARENA,
        heightmap_resolution: 21,
        ..Default::default()
    };
    let mut engine = Engine::with_ground(config, &SourceMesh::flat_quad(ARENA, 0.0)).unwrap();
    assert!(engine.update(0.016).is_err());
    engine.start().unwrap();
    assert!(engine.update(0.016).is_ok());
    engine.shutdown();
    assert!(engine.update(0.016).is_err());
}

#[test]
fn invariants_hold_in_a_generated_arena() {
    let config = EngineConfig {
        arena_size: 128.0,
        heightmap_resolution: 33,
        ..Default::default()
    };
    let mut engine = Engine::new(config).unwrap();
    engine
        .build_level(&Map::generate(16, 16, 3).unwrap())
        .unwrap();
    engine.start().unwrap();
    let feet = engine.tuning().feet_offset;

    for _ in 0..240 {
        engine.update(1.0 / 60.0).unwrap();

        let projectiles = &engine.world.projectiles;
        for p in 0..projectiles.capacity() {
            if projectiles.active[p] {
                assert!(projectiles.lifetime[p] > 0.0);
                assert!(engine
                    .grid
                    .contains(Handle::projectile(p), projectiles.position[p]));
            }
        }

        let actors = &engine.world.actors;
        for i in actors.iter_alive() {
            let p = actors.position(i).unwrap();
            assert!(engine.grid.contains(Handle::actor(i), p));
            if actors.has(i, C_GRAVITY) {
                assert!(p.y >= engine.ground_height(p.x, p.z) + feet - 1e-3);
            }
            for part in actors.visual[i].parts() {
                if let Some(parent) = part.parent {
                    if part.rot_locks[0] && !part.rot_inverts[0] {
                        let parent_yaw = actors.visual[i].parts()[parent].global_orientation.yaw;
                        let expected = parent_yaw + part.local_rotation_offset.yaw;
                        assert!((part.global_orientation.yaw - expected).abs() < 1e-5);
                    }
                }
            }
        }

        for s in engine.world.statics.iter_occupied() {
            assert!(engine
                .grid
                .contains(Handle::static_entity(s), engine.world.statics.position[s]));
        }
    }
}
