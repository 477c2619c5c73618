//! Motion integration
//!
//! Turns input, drag, gravity and thrusters into a velocity update, resolves
//! surface contact and integrates position. Behaviour blends between deep
//! space and the surface through the environment's transition factor.

use glam::Vec3;

use super::body::Body;
use super::collision::{CollisionResult, apply_ground_friction, resolve, settle_on_surface};
use super::environment::{EnvironmentResult, Zone};
use super::gravity::{acceleration_at, directional_gravity};
use super::state::{InputState, PlayerState};
use crate::tuning::Tuning;
use crate::{lerp, project_on_plane};

/// What happened during one integration step
#[derive(Debug, Clone)]
pub struct MotionReport {
    pub collision: CollisionResult,
    /// Local up after the step (surface normal when grounded)
    pub up: Vec3,
    /// Fraction of velocity removed by drag
    pub drag: f32,
    /// Gravity acceleration applied
    pub gravity: Vec3,
    pub sprinting: bool,
    /// Step length actually used
    pub dt: f32,
}

/// Integrates avatar motion one tick at a time
#[derive(Debug, Clone, Default)]
pub struct MotionIntegrator {
    pub tuning: Tuning,
}

impl MotionIntegrator {
    pub fn new(tuning: Tuning) -> Self {
        Self { tuning }
    }

    /// Guard against zero, negative, non-finite or oversized steps
    pub fn clamp_dt(&self, dt: f32) -> f32 {
        if !dt.is_finite() || dt < 0.0 {
            log::warn!("Invalid delta time {}, skipping motion", dt);
            return 0.0;
        }
        let max = self.tuning.motion.max_delta_time;
        if dt > max {
            log::debug!("Delta time {:.3}s clamped to {:.3}s", dt, max);
            return max;
        }
        dt
    }

    /// Advance the avatar by one tick
    pub fn step(
        &self,
        player: &mut PlayerState,
        input: &InputState,
        dt: f32,
        bodies: &[Body],
        env: &EnvironmentResult,
    ) -> MotionReport {
        let dt = self.clamp_dt(dt);
        if player.noclip {
            return self.step_noclip(player, input, dt, env);
        }

        let m = &self.tuning.motion;
        let grounded = player.on_ground;
        let up = local_up(player.position, env);

        // Stamina
        let mut sprinting = input.sprint && player.stamina > 0.0;
        if sprinting {
            player.stamina = (player.stamina - m.stamina_drain * dt).max(0.0);
            if player.stamina <= 0.0 {
                sprinting = false;
            }
        } else {
            player.stamina = (player.stamina + m.stamina_regen * dt).min(player.max_stamina);
        }

        // Drag
        let drag = (self.drag_coefficient(env, grounded) * dt * m.reference_rate)
            .clamp(0.0, m.max_drag_per_step);
        player.velocity *= 1.0 - drag;

        // Movement
        let wish = self.wish_direction(input, grounded, up);
        let mut speed_factor =
            lerp(m.ground_speed_factor, m.space_speed_factor, env.transition_factor);
        if sprinting && env.zone != Zone::DeepSpace {
            speed_factor *= m.sprint_multiplier;
        }
        player.velocity += wish * m.move_accel * speed_factor * dt;

        if grounded && input.jump {
            player.velocity += up * m.jump_speed;
        }

        // Gravity
        let gravity = if grounded {
            Vec3::ZERO
        } else {
            self.gravity(player.position, bodies, env)
        };
        player.velocity += gravity * dt;

        // Thrusters
        self.apply_thrusters(player, input, dt, env, up);

        // Contact, integration, friction
        let previous_position = player.position;
        let c = &self.tuning.collision;
        let mut collision = resolve(
            &mut player.position,
            &mut player.velocity,
            bodies,
            c.ground_radius,
            c,
        );
        player.position += player.velocity * dt;

        if let Some(normal) = collision.surface_normal {
            player.velocity = apply_ground_friction(player.velocity, normal, dt, c);

            // Stay on the curved surface unless leaving it (jump)
            let leaving = player.velocity.dot(normal) >= c.drift_threshold;
            if dt > 0.0 && !leaving {
                let settled = collision
                    .collided_body
                    .and_then(|index| bodies.get(index))
                    .and_then(|body| {
                        settle_on_surface(&mut player.position, body, c.ground_radius)
                    });
                if settled.is_some() {
                    collision.surface_normal = settled;
                }
            }
        }
        player.on_ground = collision.on_ground;

        if !player.velocity.is_finite() {
            log::warn!("Non-finite velocity {:?}, resetting", player.velocity);
            player.velocity = Vec3::ZERO;
        }
        if !player.position.is_finite() {
            log::warn!("Non-finite position, restoring previous");
            player.position = previous_position;
        }

        let up = collision
            .surface_normal
            .unwrap_or_else(|| local_up(player.position, env));

        log::trace!(
            "zone={} tf={:.2} drag={:.4} speed={:.3} ground={}",
            env.zone.as_str(),
            env.transition_factor,
            drag,
            player.speed(),
            player.on_ground
        );

        MotionReport {
            collision,
            up,
            drag,
            gravity,
            sprinting,
            dt,
        }
    }

    /// Kinematic movement along the camera axes
    fn step_noclip(
        &self,
        player: &mut PlayerState,
        input: &InputState,
        dt: f32,
        env: &EnvironmentResult,
    ) -> MotionReport {
        let m = &self.tuning.motion;
        let (forward, side) = input.move_axes();
        let camera_up = input.camera_right.cross(input.camera_forward).normalize_or_zero();
        let vertical = (input.jetpack as i32 - input.down_thrusters as i32) as f32;

        let direction = (input.camera_forward.normalize_or_zero() * forward
            + input.camera_right.normalize_or_zero() * side
            + camera_up * vertical)
            .normalize_or_zero();

        let mut speed = m.noclip_speed;
        if input.sprint {
            speed *= m.noclip_sprint_multiplier;
        }

        player.position += direction * speed * dt;
        player.velocity = Vec3::ZERO;
        player.on_ground = false;

        MotionReport {
            collision: CollisionResult::miss(),
            up: local_up(player.position, env),
            drag: 0.0,
            gravity: Vec3::ZERO,
            sprinting: input.sprint,
            dt,
        }
    }

    /// Per-step drag coefficient for the current zone
    pub fn drag_coefficient(&self, env: &EnvironmentResult, grounded: bool) -> f32 {
        let m = &self.tuning.motion;
        if grounded {
            return m.atmosphere_drag;
        }

        match env.zone {
            Zone::DeepSpace => m.space_drag,
            Zone::UpperAtmosphere => {
                lerp(m.high_altitude_drag, m.space_drag, env.transition_factor)
            }
            Zone::Atmosphere => {
                let Some(nearest) = env.nearest else {
                    return m.atmosphere_drag;
                };
                let depth = nearest.radius * (self.tuning.environment.atmosphere_ratio - 1.0);
                let altitude = if depth > 0.0 {
                    (nearest.surface_distance / depth).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                lerp(m.atmosphere_drag, m.high_altitude_drag, altitude)
            }
            Zone::Surface => m.atmosphere_drag,
        }
    }

    /// Gravity for the current zone (caller skips it while grounded)
    pub fn gravity(&self, position: Vec3, bodies: &[Body], env: &EnvironmentResult) -> Vec3 {
        let g = &self.tuning.gravity;
        let Some(nearest) = env.nearest else {
            return acceleration_at(position, bodies, 1.0, g);
        };

        match env.zone {
            Zone::DeepSpace => acceleration_at(position, bodies, 1.0, g),
            Zone::UpperAtmosphere => {
                let orbital = acceleration_at(position, bodies, 1.0, g);
                let directional = directional_gravity(position, &nearest, g);
                directional.lerp(orbital, env.transition_factor)
            }
            Zone::Atmosphere | Zone::Surface => directional_gravity(position, &nearest, g),
        }
    }

    /// Camera-relative movement direction, following the surface when grounded
    fn wish_direction(&self, input: &InputState, grounded: bool, up: Vec3) -> Vec3 {
        let (forward_axis, side_axis) = input.move_axes();
        if forward_axis == 0.0 && side_axis == 0.0 {
            return Vec3::ZERO;
        }

        let (forward, right) = if grounded {
            (
                project_on_plane(input.camera_forward, up).normalize_or_zero(),
                project_on_plane(input.camera_right, up).normalize_or_zero(),
            )
        } else {
            (
                input.camera_forward.normalize_or_zero(),
                input.camera_right.normalize_or_zero(),
            )
        };

        (forward * forward_axis + right * side_axis).normalize_or_zero()
    }

    /// Jetpack pushes up, down-thrusters push down; both burn fuel
    fn apply_thrusters(
        &self,
        player: &mut PlayerState,
        input: &InputState,
        dt: f32,
        env: &EnvironmentResult,
        up: Vec3,
    ) {
        let m = &self.tuning.motion;
        if !(input.jetpack || input.down_thrusters) || player.fuel <= 0.0 {
            return;
        }

        let in_range = env
            .nearest
            .is_some_and(|n| n.center_distance < n.radius * m.jetpack_range_ratio);
        let thrust_up = if in_range {
            up
        } else {
            input.camera_forward.normalize_or_zero()
        };

        if input.jetpack {
            player.velocity += thrust_up * m.jetpack_thrust * dt;
            player.fuel -= m.fuel_drain * dt;
        }
        if input.down_thrusters {
            player.velocity -= thrust_up * m.down_thrust * dt;
            player.fuel -= m.fuel_drain * dt;
        }
        player.fuel = player.fuel.max(0.0);
    }
}

/// Up at `position`: away from the nearest body, world up without one
pub fn local_up(position: Vec3, env: &EnvironmentResult) -> Vec3 {
    env.nearest.map(|n| n.up_at(position)).unwrap_or(Vec3::Y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::NOMINAL_DT;
    use crate::sim::environment::EnvironmentClassifier;

    fn planet() -> Vec<Body> {
        vec![Body::new(Vec3::ZERO, 10.0)]
    }

    fn grounded_player() -> PlayerState {
        let mut player = PlayerState::new(Vec3::new(0.0, 11.0, 0.0));
        player.on_ground = true;
        player
    }

    fn env_for(player: &PlayerState, bodies: &[Body]) -> EnvironmentResult {
        EnvironmentClassifier::default().classify(player.position, bodies)
    }

    #[test]
    fn test_noclip_moves_kinematically() {
        let integrator = MotionIntegrator::default();
        let mut player = PlayerState::new(Vec3::ZERO);
        player.noclip = true;
        player.velocity = Vec3::new(3.0, 0.0, 0.0);

        let input = InputState {
            forward: true,
            ..InputState::looking_from(&player)
        };
        let env = EnvironmentResult::deep_space();
        for _ in 0..10 {
            integrator.step(&mut player, &input, NOMINAL_DT, &[], &env);
            assert_eq!(player.velocity, Vec3::ZERO);
        }

        let expected = integrator.tuning.motion.noclip_speed * NOMINAL_DT * 10.0;
        assert!((player.position - Vec3::new(0.0, 0.0, -expected)).length() < 1e-4);
        assert!(!player.on_ground);
    }

    #[test]
    fn test_noclip_ignores_bodies() {
        let integrator = MotionIntegrator::default();
        let bodies = planet();
        let mut player = PlayerState::new(Vec3::new(0.0, 10.5, 0.0));
        player.noclip = true;

        let env = env_for(&player, &bodies);
        let input = InputState::looking_from(&player);
        integrator.step(&mut player, &input, NOMINAL_DT, &bodies, &env);
        assert_eq!(player.position, Vec3::new(0.0, 10.5, 0.0));
    }

    #[test]
    fn test_fuel_clamps_to_zero() {
        let mut tuning = Tuning::default();
        tuning.motion.fuel_drain = 20.0;
        let integrator = MotionIntegrator::new(tuning);

        let mut player = PlayerState::new(Vec3::new(0.0, 500.0, 0.0));
        player.fuel = 1.0;
        let input = InputState {
            jetpack: true,
            ..InputState::looking_from(&player)
        };
        let env = EnvironmentResult::deep_space();

        integrator.step(&mut player, &input, 0.1, &[], &env);
        assert_eq!(player.fuel, 0.0);

        // Empty tank: no more thrust
        let before = player.velocity;
        integrator.step(&mut player, &input, 0.1, &[], &env);
        assert_eq!(player.fuel, 0.0);
        assert!((player.velocity - before).length() < 0.01);
    }

    #[test]
    fn test_fuel_depletes_over_clamped_steps() {
        let mut tuning = Tuning::default();
        tuning.motion.fuel_drain = 4.0;
        let integrator = MotionIntegrator::new(tuning);

        let mut player = PlayerState::new(Vec3::new(0.0, 500.0, 0.0));
        player.fuel = 1.0;
        let input = InputState {
            jetpack: true,
            ..InputState::looking_from(&player)
        };
        let env = EnvironmentResult::deep_space();

        // 0.5 s is longer than 1/r but each step is clamped to max_delta_time
        integrator.step(&mut player, &input, 0.5, &[], &env);
        assert!((player.fuel - 0.6).abs() < 1e-5);

        integrator.step(&mut player, &input, 0.5, &[], &env);
        integrator.step(&mut player, &input, 0.5, &[], &env);
        assert_eq!(player.fuel, 0.0);
    }

    #[test]
    fn test_grounded_walk_settles_on_surface() {
        let integrator = MotionIntegrator::default();
        let bodies = vec![Body::new(Vec3::ZERO, 5.0)];
        let mut player = PlayerState::new(Vec3::new(0.0, 6.0, 0.0));
        player.on_ground = true;

        // Camera kept level with world Z: every step leaves the tangent plane
        let input = InputState {
            forward: true,
            camera_forward: Vec3::NEG_Z,
            camera_right: Vec3::X,
            ..Default::default()
        };
        let mut classifier = EnvironmentClassifier::default();
        for _ in 0..60 {
            let env = classifier.classify(player.position, &bodies);
            let report = integrator.step(&mut player, &input, NOMINAL_DT, &bodies, &env);
            assert!(player.on_ground);
            assert!((player.position.length() - 6.0).abs() < 1e-4);
            let normal = report.collision.surface_normal.unwrap();
            assert!((normal - player.position.normalize()).length() < 1e-4);
        }
    }

    #[test]
    fn test_jetpack_pushes_along_local_up_near_body() {
        let integrator = MotionIntegrator::default();
        let bodies = planet();
        let mut player = PlayerState::new(Vec3::new(12.0, 0.0, 0.0));
        let env = env_for(&player, &bodies);
        let input = InputState {
            jetpack: true,
            camera_forward: Vec3::NEG_Z,
            camera_right: Vec3::X,
            ..Default::default()
        };

        integrator.step(&mut player, &input, NOMINAL_DT, &bodies, &env);
        // Thrust outweighs directional gravity and nothing pushes along Z
        assert!(player.velocity.x > 0.0);
        assert!(player.velocity.z.abs() < 1e-6);
        assert!(player.fuel < player.max_fuel);
    }

    #[test]
    fn test_jetpack_uses_look_direction_in_deep_space() {
        let integrator = MotionIntegrator::default();
        let mut player = PlayerState::new(Vec3::ZERO);
        let input = InputState {
            jetpack: true,
            camera_forward: Vec3::X,
            camera_right: Vec3::Z,
            ..Default::default()
        };
        integrator.step(&mut player, &input, NOMINAL_DT, &[], &EnvironmentResult::deep_space());
        assert!(player.velocity.x > 0.0);

        let mut player = PlayerState::new(Vec3::ZERO);
        let input = InputState {
            down_thrusters: true,
            ..input
        };
        let input = InputState { jetpack: false, ..input };
        integrator.step(&mut player, &input, NOMINAL_DT, &[], &EnvironmentResult::deep_space());
        assert!(player.velocity.x < 0.0);
    }

    #[test]
    fn test_sprint_drains_and_regenerates_stamina() {
        let integrator = MotionIntegrator::default();
        let bodies = planet();
        let mut player = grounded_player();
        let env = env_for(&player, &bodies);

        let sprint = InputState {
            sprint: true,
            forward: true,
            ..InputState::looking_from(&player)
        };
        let report = integrator.step(&mut player, &sprint, NOMINAL_DT, &bodies, &env);
        assert!(report.sprinting);
        assert!(player.stamina < player.max_stamina);

        let drained = player.stamina;
        let idle = InputState::looking_from(&player);
        integrator.step(&mut player, &idle, NOMINAL_DT, &bodies, &env);
        assert!(player.stamina > drained);
    }

    #[test]
    fn test_sprint_disabled_at_zero_stamina() {
        let integrator = MotionIntegrator::default();
        let bodies = planet();
        let mut player = grounded_player();
        player.stamina = 0.1;
        let env = env_for(&player, &bodies);

        let sprint = InputState {
            sprint: true,
            ..InputState::looking_from(&player)
        };
        let report = integrator.step(&mut player, &sprint, NOMINAL_DT, &bodies, &env);
        assert_eq!(player.stamina, 0.0);
        assert!(!report.sprinting);
    }

    #[test]
    fn test_ground_movement_follows_tangent_plane() {
        let integrator = MotionIntegrator::default();
        let bodies = planet();
        let mut player = grounded_player();
        let env = env_for(&player, &bodies);

        // Camera pitched down into the planet
        let input = InputState {
            forward: true,
            camera_forward: Vec3::new(0.0, -1.0, -1.0).normalize(),
            camera_right: Vec3::X,
            ..Default::default()
        };
        integrator.step(&mut player, &input, NOMINAL_DT, &bodies, &env);
        assert!(player.on_ground);
        assert!(player.velocity.z < 0.0);
        assert!(player.velocity.y.abs() < 1e-4);
        assert!((player.position.length() - 11.0).abs() < 0.01);
    }

    #[test]
    fn test_jump_leaves_ground() {
        let integrator = MotionIntegrator::default();
        let bodies = planet();
        let mut player = grounded_player();
        let mut classifier = EnvironmentClassifier::default();

        let jump = InputState {
            jump: true,
            ..InputState::looking_from(&player)
        };
        let env = classifier.classify(player.position, &bodies);
        integrator.step(&mut player, &jump, NOMINAL_DT, &bodies, &env);
        assert!(player.position.y > 11.0);

        let idle = InputState::looking_from(&player);
        let env = classifier.classify(player.position, &bodies);
        integrator.step(&mut player, &idle, NOMINAL_DT, &bodies, &env);
        assert!(!player.on_ground);
    }

    #[test]
    fn test_grounded_skips_gravity() {
        let integrator = MotionIntegrator::default();
        let bodies = planet();
        let mut player = grounded_player();
        let env = env_for(&player, &bodies);

        let input = InputState::looking_from(&player);
        let report = integrator.step(&mut player, &input, NOMINAL_DT, &bodies, &env);
        assert_eq!(report.gravity, Vec3::ZERO);
        assert!(player.on_ground);
        assert!(player.velocity.length() < 1e-6);
    }

    #[test]
    fn test_drag_by_zone() {
        let integrator = MotionIntegrator::default();
        let m = &integrator.tuning.motion;
        let bodies = planet();
        let mut classifier = EnvironmentClassifier::default();

        let space = classifier.classify(Vec3::new(0.0, 100.0, 0.0), &bodies);
        assert_eq!(integrator.drag_coefficient(&space, false), m.space_drag);
        assert_eq!(integrator.drag_coefficient(&space, true), m.atmosphere_drag);

        // Atmosphere: thinner near the top than near the ground
        let mut classifier = EnvironmentClassifier::default();
        let high = classifier.classify(Vec3::new(0.0, 12.4, 0.0), &bodies);
        let mut classifier = EnvironmentClassifier::default();
        let low = classifier.classify(Vec3::new(0.0, 11.6, 0.0), &bodies);
        assert_eq!(high.zone, Zone::Atmosphere);
        assert_eq!(low.zone, Zone::Atmosphere);
        let high_drag = integrator.drag_coefficient(&high, false);
        let low_drag = integrator.drag_coefficient(&low, false);
        assert!(high_drag < low_drag);
    }

    #[test]
    fn test_drag_capped_at_large_dt() {
        let mut tuning = Tuning::default();
        tuning.motion.space_drag = 10.0;
        let integrator = MotionIntegrator::new(tuning);
        let mut player = PlayerState::new(Vec3::ZERO);
        player.velocity = Vec3::new(10.0, 0.0, 0.0);

        let input = InputState::looking_from(&player);
        let report = integrator.step(
            &mut player,
            &input,
            0.1,
            &[],
            &EnvironmentResult::deep_space(),
        );
        assert_eq!(report.drag, integrator.tuning.motion.max_drag_per_step);
        assert!((player.velocity.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_deep_space_uses_orbital_field() {
        let integrator = MotionIntegrator::default();
        let bodies = vec![
            Body::new(Vec3::new(-50.0, 0.0, 0.0), 8.0),
            Body::new(Vec3::new(50.0, 0.0, 0.0), 8.0),
        ];
        let mut classifier = EnvironmentClassifier::default();
        let env = classifier.classify(Vec3::ZERO, &bodies);
        assert_eq!(env.zone, Zone::DeepSpace);
        assert!(integrator.gravity(Vec3::ZERO, &bodies, &env).length() < 1e-5);
    }

    #[test]
    fn test_invalid_dt_is_noop() {
        let integrator = MotionIntegrator::default();
        let mut player = PlayerState::new(Vec3::ZERO);
        player.velocity = Vec3::X;
        let input = InputState::looking_from(&player);
        let env = EnvironmentResult::deep_space();

        let report = integrator.step(&mut player, &input, f32::NAN, &[], &env);
        assert_eq!(report.dt, 0.0);
        assert_eq!(player.position, Vec3::ZERO);
        assert_eq!(player.velocity, Vec3::X);

        assert_eq!(integrator.clamp_dt(5.0), integrator.tuning.motion.max_delta_time);
    }
}
