//! Celebrations - particle bursts and the success chime
//!
//! A burst is a fixed-size batch of randomly parameterized, short-lived
//! particles. The chime is a fixed ascending three-note phrase.

use std::time::Duration;

use rand::Rng;

/// Particles per burst
pub const DEFAULT_PARTICLE_COUNT: usize = 50;

/// How long a burst stays on screen
pub const PARTICLE_LIFETIME: Duration = Duration::from_secs(3);

/// Particle palette
pub const CELEBRATION_COLORS: [&str; 5] = ["#FFD700", "#FF69B4", "#00CED1", "#FF6347", "#9370DB"];

/// Particles start just above the visible area
pub const SPAWN_Y: f32 = -10.0;

/// One ephemeral particle
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub id: u32,
    /// Horizontal position, percent of width
    pub x: f32,
    pub y: f32,
    pub color: &'static str,
    /// Degrees
    pub rotation: f32,
    pub size: f32,
}

/// A batch of particles spawned together
#[derive(Clone, Debug, PartialEq)]
pub struct CelebrationBurst {
    pub id: u64,
    pub particles: Vec<Particle>,
    pub lifetime: Duration,
}

impl CelebrationBurst {
    pub fn generate<R: Rng + ?Sized>(id: u64, count: usize, rng: &mut R) -> Self {
        let particles = (0..count)
            .map(|i| Particle {
                id: i as u32,
                x: rng.gen_range(0.0..100.0),
                y: SPAWN_Y,
                color: CELEBRATION_COLORS[rng.gen_range(0..CELEBRATION_COLORS.len())],
                rotation: rng.gen_range(0.0..360.0),
                size: rng.gen_range(5.0..15.0),
            })
            .collect();

        CelebrationBurst {
            id,
            particles,
            lifetime: PARTICLE_LIFETIME,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

/// One chime note
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChimeNote {
    pub frequency_hz: f32,
    /// Offset from the start of the chime
    pub at: Duration,
}

/// Ascending success phrase (C5, E5, G5)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Chime {
    pub notes: [ChimeNote; 3],
    pub duration: Duration,
    pub start_gain: f32,
    pub end_gain: f32,
}

pub const SUCCESS_CHIME: Chime = Chime {
    notes: [
        ChimeNote {
            frequency_hz: 523.0,
            at: Duration::from_millis(0),
        },
        ChimeNote {
            frequency_hz: 659.0,
            at: Duration::from_millis(100),
        },
        ChimeNote {
            frequency_hz: 784.0,
            at: Duration::from_millis(200),
        },
    ],
    duration: Duration::from_millis(500),
    start_gain: 0.3,
    end_gain: 0.01,
};

impl Chime {
    /// Frequency sounding at `offset`, if any
    pub fn frequency_at(&self, offset: Duration) -> Option<f32> {
        if offset >= self.duration {
            return None;
        }
        self.notes
            .iter()
            .rev()
            .find(|note| note.at <= offset)
            .map(|note| note.frequency_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_burst_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let burst = CelebrationBurst::generate(1, DEFAULT_PARTICLE_COUNT, &mut rng);

        assert_eq!(burst.len(), 50);
        assert_eq!(burst.lifetime, Duration::from_secs(3));
        for (i, p) in burst.particles.iter().enumerate() {
            assert_eq!(p.id, i as u32);
            assert!((0.0..100.0).contains(&p.x));
            assert_eq!(p.y, SPAWN_Y);
            assert!(CELEBRATION_COLORS.contains(&p.color));
            assert!((0.0..360.0).contains(&p.rotation));
            assert!((5.0..15.0).contains(&p.size));
        }
    }

    #[test]
    fn test_burst_is_seed_deterministic() {
        let a = CelebrationBurst::generate(1, 10, &mut StdRng::seed_from_u64(42));
        let b = CelebrationBurst::generate(1, 10, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_chime_ascends() {
        assert_eq!(SUCCESS_CHIME.frequency_at(Duration::ZERO), Some(523.0));
        assert_eq!(SUCCESS_CHIME.frequency_at(Duration::from_millis(150)), Some(659.0));
        assert_eq!(SUCCESS_CHIME.frequency_at(Duration::from_millis(450)), Some(784.0));
        assert_eq!(SUCCESS_CHIME.frequency_at(Duration::from_millis(500)), None);
    }
}
