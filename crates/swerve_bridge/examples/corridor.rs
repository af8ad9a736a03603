//! Corridor demo
//!
//! Two agents walk toward each other down a corridor bounded by a static
//! polygon room and a dynamic circle obstacle drifting across the middle.
//! Uses the pass-through solver, so the interesting part is the data flow:
//! rebuild -> push -> step -> read-back, with pool stats logged at the end.

use anyhow::Result;
use glam::{Vec2, Vec3};
use swerve_bridge::{
    AgentProxy, Bundle, CircleShape, ObstacleSettings, ObstacleSource, OwnedProxy, Placement,
    PolygonShape, ShapeKind,
};
use swerve_core::obstacle::ObstaclePool;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("swerve v{}", swerve_core::VERSION);

    let mut pool = ObstaclePool::new();
    let mut bundle = Bundle::new();

    // Static room: a 20x6 rectangle.
    let mut room = ObstacleSource::new(
        ShapeKind::Polygon(PolygonShape::new(vec![
            Vec2::new(-10.0, -3.0),
            Vec2::new(10.0, -3.0),
            Vec2::new(10.0, 3.0),
            Vec2::new(-10.0, 3.0),
        ])),
        ObstacleSettings::default(),
    );
    room.enable(&mut pool, &mut bundle, &Placement::default());

    // Dynamic pillar drifting across the corridor.
    let mut pillar = ObstacleSource::new(
        ShapeKind::Circle(CircleShape::new(0.75)),
        ObstacleSettings {
            dynamic: true,
            always_update: true,
            samples: 16,
            ..Default::default()
        },
    );
    let mut pillar_placement = Placement::at(Vec3::new(0.0, -2.0, 0.0));
    pillar.enable(&mut pool, &mut bundle, &pillar_placement);

    // Two agents heading at each other.
    let mut left = OwnedProxy::spawn(&mut bundle, Vec3::new(-8.0, 0.0, 0.0));
    let mut right = OwnedProxy::spawn(&mut bundle, Vec3::new(8.0, 0.0, 0.0));
    let mut left_pos = Vec3::new(-8.0, 0.0, 0.0);
    let mut right_pos = Vec3::new(8.0, 0.0, 0.0);

    let delta = 1.0 / 60.0;
    for frame in 0..240 {
        pillar_placement.position.y += 0.5 * delta;
        pillar.update(&mut pool, &mut bundle, &pillar_placement);

        let mut left_vel = Vec3::new(1.0, 0.0, 0.0);
        let mut right_vel = Vec3::new(-1.0, 0.0, 0.0);
        let mut heading = Vec3::ZERO;
        left.exchange(&mut bundle, &mut left_pos, &mut left_vel, &mut heading);
        right.exchange(&mut bundle, &mut right_pos, &mut right_vel, &mut heading);

        bundle.step(&pool, delta);

        if frame % 60 == 0 {
            tracing::info!(frame, ?left_pos, ?right_pos, "corridor state");
        }
    }

    tracing::info!(
        agents = bundle.agent_count(),
        static_loops = bundle.static_obstacles().len(),
        dynamic_loops = bundle.dynamic_obstacles().len(),
        pool_live = pool.live(),
        "simulation finished"
    );

    left.destroy(&mut bundle);
    right.destroy(&mut bundle);
    pillar.destroy(&mut pool, &mut bundle);
    room.destroy(&mut pool, &mut bundle);
    bundle.clear(true);

    tracing::info!(
        rented = pool.rented_total(),
        released = pool.released_total(),
        "teardown complete"
    );

    Ok(())
}
