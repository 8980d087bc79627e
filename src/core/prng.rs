// Minimal PRNG (no external crates).
//
// This is NOT cryptographically secure.
// It drives action sampling in host loops so rollouts are reproducible from a seed.

use crate::actions::{ActionMask, Direction};

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // Avoid a zero state.
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    #[inline]
    pub fn gen_range_usize(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        let span = (high - low) as u32;
        let v = self.next_u32() % span;
        low + v as usize
    }

    /// Uniform over all four directions, legal or not.
    pub fn any_direction(&mut self) -> Direction {
        Direction::ALL[self.gen_range_usize(0, Direction::ALL.len())]
    }

    /// Uniform over the legal directions in `mask`; `None` when nothing is legal.
    pub fn legal_direction(&mut self, mask: ActionMask) -> Option<Direction> {
        let n = mask.count();
        if n == 0 {
            return None;
        }
        let pick = self.gen_range_usize(0, n);
        mask.legal_directions().nth(pick)
    }
}
