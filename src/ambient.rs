use crate::config::AmbientConfig;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Decorative drifting particles over the city. Purely visual: no collision,
/// no picking, advanced on render time. With a fixed seed the field is fully
/// deterministic, which is what the tests rely on.
pub struct ParticleField {
    particles: Vec<Particle>,
    half_extent: f32,
    max_height: f32,
    rng: StdRng,
}

impl ParticleField {
    pub fn new(config: &AmbientConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut particles = Vec::with_capacity(config.particle_count as usize);
        for _ in 0..config.particle_count {
            particles.push(Self::spawn(&mut rng, config.half_extent));
        }
        Self { particles, half_extent: config.half_extent, max_height: config.max_height, rng }
    }

    fn spawn(rng: &mut StdRng, half_extent: f32) -> Particle {
        let position = Vec3::new(
            rng.gen_range(-half_extent..half_extent),
            rng.gen_range(5.0..25.0),
            rng.gen_range(-half_extent..half_extent),
        );
        // Slow sideways drift with a gentle rise.
        let velocity = Vec3::new(
            rng.gen_range(-0.6..0.6),
            rng.gen_range(0.3..0.9),
            rng.gen_range(-0.6..0.6),
        );
        Particle { position, velocity }
    }

    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        for particle in &mut self.particles {
            particle.position += particle.velocity * dt;
            let p = particle.position;
            if p.y > self.max_height || p.x.abs() > self.half_extent || p.z.abs() > self.half_extent
            {
                *particle = Self::spawn(&mut self.rng, self.half_extent);
            }
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
