use lencode::{Category, Observation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn level(i: usize) -> Category {
    Category::Text(format!("level_{:04}", i))
}

/// `n_rows` numeric observations over `n_levels` levels.
///
/// Level `i` has mean `i` and unit-width noise, so the between-level
/// variance grows with the number of levels.
pub fn synthetic_numeric(n_rows: usize, n_levels: usize, seed: u64) -> Vec<Observation> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_rows)
        .map(|_| {
            let i = rng.gen_range(0..n_levels);
            let y = i as f64 + rng.gen_range(-0.5..0.5);
            Observation::new(level(i), y)
        })
        .collect()
}

/// `n_rows` binary observations; the event rate rises with the level index.
pub fn synthetic_binary(n_rows: usize, n_levels: usize, seed: u64) -> Vec<Observation> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_rows)
        .map(|_| {
            let i = rng.gen_range(0..n_levels);
            let rate = (i as f64 + 1.0) / (n_levels as f64 + 2.0);
            let outcome = if rng.gen_bool(rate) { "event" } else { "none" };
            Observation::new(level(i), outcome)
        })
        .collect()
}

/// Values to encode, with roughly `unseen_share` of them never trained on.
pub fn unseen_mix(n: usize, n_levels: usize, unseen_share: f64, seed: u64) -> Vec<Category> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            if rng.gen_bool(unseen_share) {
                Category::Text(format!("unseen_{}", rng.gen_range(0..1000)))
            } else {
                level(rng.gen_range(0..n_levels))
            }
        })
        .collect()
}
