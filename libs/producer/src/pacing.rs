use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

/// Пауза между циклами: `uniform_int[min_steps, max_steps] * step_ms`.
///
/// По умолчанию 1..=20 шагов по 100 мс, т.е. от 100 до 2000 мс.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pacing {
    #[serde(default = "default_min_steps")]
    pub min_steps: u32,
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
}

fn default_min_steps() -> u32 {
    1
}
fn default_max_steps() -> u32 {
    20
}
fn default_step_ms() -> u64 {
    100
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            min_steps: default_min_steps(),
            max_steps: default_max_steps(),
            step_ms: default_step_ms(),
        }
    }
}

impl Pacing {
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let steps = rng.gen_range(self.min_steps..=self.max_steps);
        Duration::from_millis(self.step_ms).saturating_mul(steps)
    }

    /// Максимальная пауза в мс; `None`, если не помещается в `u64`.
    pub(crate) fn longest_ms(&self) -> Option<u64> {
        u64::from(self.max_steps).checked_mul(self.step_ms)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn default_delays_are_whole_steps_within_bounds() {
        let pacing = Pacing::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2000 {
            let ms = pacing.next_delay(&mut rng).as_millis();
            assert!((100..=2000).contains(&ms), "{ms}");
            assert_eq!(ms % 100, 0);
        }
    }

    #[test]
    fn both_bounds_are_reachable() {
        let pacing = Pacing::default();
        let mut rng = StdRng::seed_from_u64(11);
        let delays: Vec<_> = (0..5000).map(|_| pacing.next_delay(&mut rng)).collect();
        assert!(delays.contains(&Duration::from_millis(100)));
        assert!(delays.contains(&Duration::from_millis(2000)));
    }

    #[test]
    fn fixed_pacing() {
        let pacing = Pacing { min_steps: 3, max_steps: 3, step_ms: 50 };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(pacing.next_delay(&mut rng), Duration::from_millis(150));
    }

    #[test]
    fn huge_step_saturates_instead_of_overflowing() {
        let pacing = Pacing { min_steps: 20, max_steps: 20, step_ms: u64::MAX / 2 };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(pacing.next_delay(&mut rng), Duration::MAX);
        assert_eq!(pacing.longest_ms(), None);
        assert_eq!(Pacing::default().longest_ms(), Some(2000));
    }
}
