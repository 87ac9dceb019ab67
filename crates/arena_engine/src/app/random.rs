use rand::{Rng, RngCore};

/// Uniform sample in `[min, max)`. Empty or inverted ranges collapse to `min`.
pub(crate) fn uniform(rng: &mut dyn RngCore, min: f32, max: f32) -> f32 {
    if !(max > min) {
        return min;
    }
    rng.random_range(min..max)
}

pub(crate) fn uniform_f64(rng: &mut dyn RngCore, min: f64, max: f64) -> f64 {
    if !(max > min) {
        return min;
    }
    rng.random_range(min..max)
}

/// Uniform count in `[min, max]` inclusive.
pub(crate) fn count_between(rng: &mut dyn RngCore, min: usize, max: usize) -> usize {
    if max <= min {
        return min;
    }
    rng.random_range(min..=max)
}

pub(crate) fn chance(rng: &mut dyn RngCore, probability: f64) -> bool {
    rng.random::<f64>() < probability
}

pub(crate) fn pick<'a, T>(rng: &mut dyn RngCore, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.random_range(0..items.len()))
}
