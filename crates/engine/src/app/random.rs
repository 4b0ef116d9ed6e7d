use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform draws for the synthetic actor.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Uniform index in `0..len`, or `None` for an empty range.
    fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let scaled = (self.next_unit() * len as f64).floor();
        Some((scaled.max(0.0) as usize).min(len - 1))
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }

    fn pick_index(&mut self, len: usize) -> Option<usize> {
        (**self).pick_index(len)
    }
}

#[derive(Debug)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for StdRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn pick_index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.rng.gen_range(0..len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl RandomSource for Fixed {
        fn next_unit(&mut self) -> f64 {
            self.0
        }
    }

    #[test]
    fn default_pick_index_maps_unit_draw_onto_range() {
        assert_eq!(Fixed(0.0).pick_index(4), Some(0));
        assert_eq!(Fixed(0.49).pick_index(4), Some(1));
        assert_eq!(Fixed(0.999_999).pick_index(4), Some(3));
        assert_eq!(Fixed(0.5).pick_index(0), None);
    }

    #[test]
    fn out_of_range_draws_are_clamped() {
        assert_eq!(Fixed(1.0).pick_index(3), Some(2));
        assert_eq!(Fixed(-0.5).pick_index(3), Some(0));
    }

    #[test]
    fn seeded_sources_repeat_their_sequence() {
        let mut a = StdRandom::seeded(7);
        let mut b = StdRandom::seeded(7);
        for _ in 0..32 {
            assert_eq!(a.next_unit(), b.next_unit());
            assert_eq!(a.pick_index(9), b.pick_index(9));
        }
    }

    #[test]
    fn std_random_stays_in_unit_interval() {
        let mut source = StdRandom::seeded(99);
        for _ in 0..1_000 {
            let draw = source.next_unit();
            assert!((0.0..1.0).contains(&draw));
        }
    }
}
