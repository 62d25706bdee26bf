//! Swarm Demo
//!
//! Drives the collision system headlessly with a swarm of moving bodies:
//! - Circles, boxes and points wander inside a walled arena
//! - Every frame runs update, broad phase and narrow phase
//! - Overlapping agents are pushed apart along the separation vector
//! - Per-frame statistics are logged
//!
//! Usage: `swarm_demo [config.toml|config.ron]`

use collisions2d::config::ConfigError;
use collisions2d::foundation::logging;
use collisions2d::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

// Arena settings
const ARENA_SIZE: f64 = 400.0;
const WALL_ID: &str = "arena";

// Swarm settings
const NUM_AGENTS: usize = 300;
const MAX_SPEED: f64 = 60.0;
const FRAMES: usize = 600;
const DELTA_TIME: f64 = 1.0 / 60.0;
const STATS_EVERY: usize = 60;

/// Errors that stop the demo
#[derive(thiserror::Error, Debug)]
enum SwarmError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Collision error: {0}")]
    Collision(#[from] CollisionError),
}

struct Agent {
    handle: BodyHandle,
    velocity: Vec2,
}

#[derive(Debug, Default)]
struct FrameStats {
    reinserted: usize,
    candidates: usize,
    contacts: usize,
    wall_hits: usize,
}

struct SwarmApp {
    system: Collisions,
    agents: Vec<Agent>,
    rng: StdRng,
}

impl SwarmApp {
    fn new(config: CollisionsConfig, seed: u64) -> Result<Self, SwarmError> {
        let mut system = Collisions::with_config(config)?;
        let mut rng = StdRng::seed_from_u64(seed);

        system.create_absolute_lines(
            WALL_ID,
            &[
                Vec2::new(0.0, 0.0),
                Vec2::new(ARENA_SIZE, 0.0),
                Vec2::new(ARENA_SIZE, ARENA_SIZE),
                Vec2::new(0.0, ARENA_SIZE),
                Vec2::new(0.0, 0.0),
            ],
        )?;

        let mut agents = Vec::with_capacity(NUM_AGENTS);
        for i in 0..NUM_AGENTS {
            let position = Vec2::new(
                rng.gen_range(20.0..ARENA_SIZE - 20.0),
                rng.gen_range(20.0..ARENA_SIZE - 20.0),
            );
            let id = format!("agent-{i}");
            let handle = match i % 3 {
                0 => system.create_circle(id, position, rng.gen_range(2.0..6.0))?,
                1 => {
                    let half = rng.gen_range(2.0..5.0);
                    let angle = rng.gen_range(0.0..std::f64::consts::TAU);
                    system.create_polygon_with(
                        id,
                        position,
                        vec![
                            Vec2::new(-half, -half),
                            Vec2::new(half, -half),
                            Vec2::new(half, half),
                            Vec2::new(-half, half),
                        ],
                        BodyOptions::default().with_angle(angle),
                    )?
                }
                _ => system.create_point(id, position),
            };
            let velocity = Vec2::new(
                rng.gen_range(-MAX_SPEED..MAX_SPEED),
                rng.gen_range(-MAX_SPEED..MAX_SPEED),
            );
            agents.push(Agent { handle, velocity });
        }

        log::info!(
            "Created {} agents ({} bodies including walls)",
            agents.len(),
            system.len()
        );
        Ok(Self { system, agents, rng })
    }

    fn step(&mut self) -> Result<FrameStats, SwarmError> {
        let mut stats = FrameStats::default();

        for agent in &mut self.agents {
            if let Some(body) = self.system.body_mut(agent.handle) {
                body.translate(agent.velocity * DELTA_TIME);
                // Keep escaped agents inside the arena
                let position = body.position();
                if !(0.0..=ARENA_SIZE).contains(&position.x) || !(0.0..=ARENA_SIZE).contains(&position.y) {
                    body.set_position(Vec2::new(
                        position.x.clamp(1.0, ARENA_SIZE - 1.0),
                        position.y.clamp(1.0, ARENA_SIZE - 1.0),
                    ));
                    agent.velocity = -agent.velocity;
                }
            }
        }

        stats.reinserted = self.system.update();

        let mut result = CollisionResult::new();
        for agent in &mut self.agents {
            let candidates = self.system.potentials(agent.handle)?;
            stats.candidates += candidates.len();

            for other in candidates {
                if !self.system.collides(agent.handle, other, Some(&mut result), true)? {
                    continue;
                }
                let is_wall = self
                    .system
                    .body(other)
                    .and_then(Body::id)
                    .is_some_and(|id| id == WALL_ID);

                if is_wall {
                    stats.wall_hits += 1;
                    // Reflect off the wall along the contact normal
                    let normal = result.direction();
                    agent.velocity -= normal * (2.0 * agent.velocity.dot(&normal));
                    if let Some(body) = self.system.body_mut(agent.handle) {
                        body.translate(result.separation());
                    }
                } else {
                    stats.contacts += 1;
                    // Each side of the pair resolves half the overlap
                    if let Some(body) = self.system.body_mut(agent.handle) {
                        body.translate(result.separation() * 0.5);
                    }
                }
            }

            // A little wander keeps the swarm from settling
            agent.velocity += Vec2::new(self.rng.gen_range(-1.0..1.0), self.rng.gen_range(-1.0..1.0));
            let speed = agent.velocity.norm();
            if speed > MAX_SPEED {
                agent.velocity *= MAX_SPEED / speed;
            }
        }

        Ok(stats)
    }

    fn run(&mut self) -> Result<(), SwarmError> {
        let start = Instant::now();
        let mut total_contacts = 0;

        for frame in 1..=FRAMES {
            let stats = self.step()?;
            total_contacts += stats.contacts;

            if frame % STATS_EVERY == 0 {
                log::info!(
                    "frame {frame}: {} reinserted, {} candidates, {} contacts, {} wall hits, BVH depth {}",
                    stats.reinserted,
                    stats.candidates,
                    stats.contacts,
                    stats.wall_hits,
                    self.system.bvh().depth()
                );
            }
        }

        let elapsed = start.elapsed();
        println!(
            "Simulated {FRAMES} frames with {} bodies in {:.2?} ({:.1} us/frame), {total_contacts} contacts",
            self.system.len(),
            elapsed,
            elapsed.as_secs_f64() * 1e6 / FRAMES as f64
        );
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init(log::LevelFilter::Info);

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {path}");
            CollisionsConfig::load(&path)?
        }
        None => CollisionsConfig {
            default_padding: 4.0,
            initial_capacity: NUM_AGENTS + 8,
            ..CollisionsConfig::default()
        },
    };

    println!("=== Swarm Demo ===");
    println!("  {NUM_AGENTS} agents, {FRAMES} frames, padding {}", config.default_padding);
    println!();

    let mut app = SwarmApp::new(config, 0x5EED)?;
    app.run()?;
    Ok(())
}
