//! Pluggable source of holder names and digits

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FIRST_NAMES: &[&str] = &[
    "Jane", "John", "Maria", "Oliver", "Amelia", "Liam", "Sophia", "Noah", "Emma", "Lucas",
    "Grace", "Henry", "Chloe", "Jack", "Isla", "Leo", "Ava", "Oscar", "Ruby", "Theodore",
];

const LAST_NAMES: &[&str] = &[
    "Doe", "Smith", "Johnson", "Brown", "Taylor", "Wilson", "Clarke", "Walker", "Wright",
    "Robinson", "Thompson", "Evans", "Hughes", "Edwards", "Turner", "Parker", "Collins",
    "Stewart", "Morris", "Mitchell",
];

/// Random data used to fill card fields.
///
/// Implementations must keep the shape: digits are ASCII `0-9`, letters are
/// ASCII Latin, and full names are Latin words separated by single spaces.
pub trait RandomSource {
    /// A realistic "First Last" name
    fn full_name(&mut self) -> String;

    /// Exactly `len` ASCII digits
    fn digits(&mut self, len: usize) -> String;

    /// Exactly `len` ASCII Latin letters
    fn latin_letters(&mut self, len: usize) -> String;
}

/// Default [`RandomSource`] backed by a standard RNG
pub struct Faker {
    rng: StdRng,
}

impl Faker {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick(&mut self, words: &[&'static str]) -> &'static str {
        words[self.rng.gen_range(0..words.len())]
    }
}

impl Default for Faker {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for Faker {
    fn full_name(&mut self) -> String {
        let first = self.pick(FIRST_NAMES);
        let last = self.pick(LAST_NAMES);
        format!("{} {}", first, last)
    }

    fn digits(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| char::from(b'0' + self.rng.gen_range(0..10u8)))
            .collect()
    }

    fn latin_letters(&mut self, len: usize) -> String {
        (0..len)
            .map(|i| {
                let offset = self.rng.gen_range(0..26u8);
                // Capitalised like a name so the value reads as a plausible holder.
                if i == 0 {
                    char::from(b'A' + offset)
                } else {
                    char::from(b'a' + offset)
                }
            })
            .collect()
    }
}
