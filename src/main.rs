//! Orbitwalk headless demo
//!
//! Builds a seeded star system, drops an avatar onto a planet and drives it
//! through a scripted sequence (fall, walk, jump, jetpack, noclip), logging
//! the published tick reports.
//!
//! Usage: orbitwalk [--seed N] [--ticks N] [--tuning PATH] [--json]

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use orbitwalk::Tuning;
use orbitwalk::consts::NOMINAL_DT;
use orbitwalk::sim::{Body, InputState, PlayerState, SimEvent, Simulation};

/// A planet on a circular orbit around the star
struct Orbit {
    radius: f32,
    angular_speed: f32,
    phase: f32,
}

impl Orbit {
    fn position(&self, time: f32) -> Vec3 {
        let angle = self.phase + self.angular_speed * time;
        Vec3::new(angle.cos() * self.radius, 0.0, angle.sin() * self.radius)
    }
}

/// Star at the origin plus a handful of orbiting planets
fn demo_system(seed: u64) -> (Vec<Body>, Vec<Option<Orbit>>) {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut bodies = vec![Body::star(Vec3::ZERO, 30.0)];
    let mut orbits = vec![None];

    let count = rng.random_range(3..=6);
    let mut orbit_radius = 90.0;
    for _ in 0..count {
        let orbit = Orbit {
            radius: orbit_radius,
            angular_speed: rng.random_range(0.002..0.01),
            phase: rng.random_range(0.0..std::f32::consts::TAU),
        };
        bodies.push(Body::new(orbit.position(0.0), rng.random_range(4.0..14.0)));
        orbits.push(Some(orbit));
        orbit_radius += rng.random_range(50.0..90.0);
    }

    (bodies, orbits)
}

/// Scripted input for a given tick
fn scripted_input(tick: u64, player: &PlayerState) -> InputState {
    let mut input = InputState::looking_from(player);
    match tick {
        600..900 => input.forward = true,
        900..960 => {
            input.forward = true;
            input.sprint = true;
        }
        960 => input.jump = true,
        1000..1200 => input.jetpack = true,
        1300 | 1500 => input.noclip_toggle = true,
        1301..1500 => input.forward = true,
        _ => {}
    }
    input
}

struct Args {
    seed: u64,
    ticks: u64,
    tuning: Option<String>,
    json: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        seed: 7,
        ticks: 2400,
        tuning: None,
        json: false,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => args.json = true,
            "--seed" => match iter.next().and_then(|v| v.parse().ok()) {
                Some(seed) => args.seed = seed,
                None => log::warn!("--seed needs a number"),
            },
            "--ticks" => match iter.next().and_then(|v| v.parse().ok()) {
                Some(ticks) => args.ticks = ticks,
                None => log::warn!("--ticks needs a number"),
            },
            "--tuning" => args.tuning = iter.next(),
            other => log::warn!("Ignoring unknown argument {}", other),
        }
    }
    args
}

fn main() {
    env_logger::init();
    let args = parse_args();
    log::info!("Orbitwalk demo starting (seed {})", args.seed);

    let tuning = args.tuning.as_deref().map(Tuning::load).unwrap_or_default();
    let mut sim = Simulation::new(tuning);

    let (mut bodies, orbits) = demo_system(args.seed);
    let home = 1;
    let spawn_height = bodies[home].radius.unwrap_or(1.0) * 2.0;
    let mut player = PlayerState::new(bodies[home].center + Vec3::Y * spawn_height);
    log::info!("{} bodies, spawning {:.1} above body {}", bodies.len(), spawn_height, home);

    for tick in 0..args.ticks {
        // Orbital animation belongs to the world layer; carry the avatar with
        // the body it stands on
        let time = tick as f32 * NOMINAL_DT;
        let standing_on = sim.last_report().and_then(|r| r.collided_body);
        for (body, orbit) in bodies.iter_mut().zip(&orbits) {
            if let Some(orbit) = orbit {
                body.center = orbit.position(time);
            }
        }
        if let Some(index) = standing_on {
            if let Some(orbit) = &orbits[index] {
                player.position += orbit.position(time) - orbit.position(time - NOMINAL_DT);
            }
        }

        let input = scripted_input(tick, &player);
        let report = sim.tick(&mut player, &input, &bodies, NOMINAL_DT);

        if args.json {
            match serde_json::to_string(&report) {
                Ok(line) => println!("{}", line),
                Err(e) => log::error!("Could not serialize report: {}", e),
            }
        }

        for event in &report.events {
            match event {
                SimEvent::Landed { body } => log::info!("Tick {}: landed on body {}", tick, body),
                SimEvent::TookOff { body } => log::info!("Tick {}: left body {}", tick, body),
                other => log::info!("Tick {}: {:?}", tick, other),
            }
        }

        if tick % 60 == 0 {
            log::info!(
                "Tick {:5} | {:16} | alt {:7.2} | speed {:6.2} | fuel {:5.1} | stamina {:5.1} | align {:.2}",
                tick,
                report.zone.as_str(),
                report.altitude.unwrap_or(f32::INFINITY),
                report.speed,
                report.fuel,
                report.stamina,
                report.alignment_factor
            );
        }
    }

    log::info!("Demo finished after {} ticks", sim.ticks());
}
