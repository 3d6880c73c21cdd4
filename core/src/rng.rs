//! Deterministic random streams keyed by string identifiers.
//!
//! Seeds are hashed to 32 bits with an order-sensitive mixing function and then
//! expanded with a Mulberry32 step. Hashing operates on UTF-16 code units so a
//! seed string names the same stream regardless of how the host encodes it.

use thiserror::Error;

/// Errors reported when the random stream is asked for an impossible draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RngError {
    /// The half-open integer range contains no values.
    #[error("integer range {min}..{max} is empty")]
    EmptyRange {
        /// Inclusive lower bound that was requested.
        min: i32,
        /// Exclusive upper bound that was requested.
        max: i32,
    },
}

/// Seeded pseudo-random stream used by every generator and actor spawner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CityRng {
    state: u32,
}

impl CityRng {
    /// Creates a stream from an arbitrary seed string.
    #[must_use]
    pub fn new(seed: &str) -> Self {
        Self {
            state: hash_seed(seed),
        }
    }

    /// Creates the stream owned by a named subsystem, keyed as `seed:subsystem`.
    #[must_use]
    pub fn for_subsystem(seed: &str, subsystem: &str) -> Self {
        Self::new(&format!("{seed}:{subsystem}"))
    }

    /// Creates the stream owned by one instance of a subsystem, keyed as `seed:subsystem:index`.
    #[must_use]
    pub fn for_instance(seed: &str, subsystem: &str, index: u64) -> Self {
        Self::new(&format!("{seed}:{subsystem}:{index}"))
    }

    /// Draws a float uniformly from `0.0..1.0`.
    pub fn next_float(&mut self) -> f64 {
        f64::from(self.step()) / 4_294_967_296.0
    }

    /// Draws an integer uniformly from the half-open range `min..max_exclusive`.
    pub fn next_int(&mut self, min: i32, max_exclusive: i32) -> Result<i32, RngError> {
        if max_exclusive <= min {
            return Err(RngError::EmptyRange {
                min,
                max: max_exclusive,
            });
        }

        let span = i64::from(max_exclusive) - i64::from(min);
        let offset = (self.next_float() * span as f64).floor() as i64;
        Ok((i64::from(min) + offset.min(span - 1)) as i32)
    }

    /// Picks one element of the slice, or `None` when it is empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = (self.next_float() * items.len() as f64).floor() as usize;
        items.get(index.min(items.len() - 1))
    }

    /// Shuffles the slice in place using Fisher-Yates.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = (self.next_float() * (i + 1) as f64).floor() as usize;
            items.swap(i, j.min(i));
        }
    }

    fn step(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6d2b_79f5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }
}

impl rand::RngCore for CityRng {
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        let low = u64::from(self.step());
        let high = u64::from(self.step());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fn hash_seed(seed: &str) -> u32 {
    let length = seed.encode_utf16().count() as u32;
    let mut hash = 1_779_033_703_u32 ^ length;
    for unit in seed.encode_utf16() {
        hash = (hash ^ u32::from(unit)).wrapping_mul(3_432_918_353);
        hash = hash.rotate_left(13);
    }
    hash = (hash ^ (hash >> 16)).wrapping_mul(2_246_822_507);
    hash = (hash ^ (hash >> 13)).wrapping_mul(3_266_489_909);
    hash ^ (hash >> 16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{Rng, RngCore};

    #[test]
    fn identical_seeds_reproduce_identical_streams() {
        let mut first = CityRng::new("markdowntown");
        let mut second = CityRng::new("markdowntown");
        for _ in 0..64 {
            assert_eq!(first.next_float().to_bits(), second.next_float().to_bits());
        }
    }

    #[test]
    fn subsystem_keys_produce_independent_streams() {
        let mut cars = CityRng::for_subsystem("seed", "cars");
        let mut trucks = CityRng::for_subsystem("seed", "trucks");
        let cars: Vec<u64> = (0..8).map(|_| cars.next_float().to_bits()).collect();
        let trucks: Vec<u64> = (0..8).map(|_| trucks.next_float().to_bits()).collect();
        assert_ne!(cars, trucks);
        assert_eq!(
            CityRng::for_instance("seed", "ambulance", 2),
            CityRng::new("seed:ambulance:2")
        );
    }

    #[test]
    fn seed_hash_is_order_sensitive() {
        assert_ne!(hash_seed("ab"), hash_seed("ba"));
        assert_ne!(hash_seed(""), hash_seed("a"));
    }

    #[test]
    fn next_int_rejects_empty_ranges() {
        let mut rng = CityRng::new("seed");
        assert_eq!(
            rng.next_int(5, 5),
            Err(RngError::EmptyRange { min: 5, max: 5 })
        );
        assert!(rng.next_int(3, -1).is_err());
    }

    #[test]
    fn next_int_is_approximately_uniform() {
        const BUCKETS: usize = 10;
        const DRAWS: usize = 100_000;
        let mut rng = CityRng::new("chi-square");
        let mut counts = [0_usize; BUCKETS];
        for _ in 0..DRAWS {
            let value = rng.next_int(-3, 7).expect("non-empty range");
            assert!((-3..7).contains(&value), "value {value} escaped range");
            counts[(value + 3) as usize] += 1;
        }

        let expected = DRAWS as f64 / BUCKETS as f64;
        let chi_square: f64 = counts
            .iter()
            .map(|&observed| {
                let delta = observed as f64 - expected;
                delta * delta / expected
            })
            .sum();
        // 9 degrees of freedom; 27.88 is the 0.999 quantile.
        assert!(chi_square < 27.88, "chi-square {chi_square} too large");
    }

    #[test]
    fn pick_and_shuffle_are_deterministic() {
        let items = ["north", "south", "east", "west"];
        let mut first = CityRng::new("pick");
        let mut second = CityRng::new("pick");
        assert_eq!(first.pick(&items), second.pick(&items));
        assert_eq!(first.pick::<u8>(&[]), None);

        let mut a = [1, 2, 3, 4, 5, 6, 7, 8];
        let mut b = a;
        CityRng::new("shuffle").shuffle(&mut a);
        CityRng::new("shuffle").shuffle(&mut b);
        assert_eq!(a, b);
        let mut sorted = a;
        sorted.sort_unstable();
        assert_eq!(sorted, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn integrates_with_rand_distributions() {
        let mut rng = CityRng::new("rand");
        for _ in 0..256 {
            let value: u8 = rng.gen_range(10..20);
            assert!((10..20).contains(&value));
        }
        let mut bytes = [0_u8; 7];
        rng.fill_bytes(&mut bytes);
        assert!(bytes.iter().any(|&byte| byte != 0));
    }

    proptest! {
        #[test]
        fn next_int_stays_within_bounds(seed in ".{0,16}", min in -1_000_i32..1_000, span in 1_i32..5_000) {
            let mut rng = CityRng::new(&seed);
            for _ in 0..32 {
                let value = rng.next_int(min, min + span).expect("non-empty range");
                prop_assert!(value >= min && value < min + span);
            }
        }

        #[test]
        fn next_float_stays_in_unit_interval(seed in ".{0,16}") {
            let mut rng = CityRng::new(&seed);
            for _ in 0..32 {
                let value = rng.next_float();
                prop_assert!((0.0..1.0).contains(&value));
            }
        }
    }
}
