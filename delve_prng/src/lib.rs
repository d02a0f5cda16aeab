// Seeded random streams for dungeon level generation.
//
// A level is a pure function of `(config, seed)`. `LevelRng` is the one
// place randomness enters: `generate()` builds a single stream from the
// level seed and hands it through the pipeline in stage order.
//   - Partitioning draws one `next_f64()` per split attempt (the cut
//     fraction) and one per door placement (the offset along the seam).
//   - The triangulation strategy keeps drawing from the same stream, one
//     value per candidate door.
//   - Spanning-tree reduction draws its extra-door rolls from a `fork()` of
//     the main stream, so turning loops on or off never shifts the layout.
//
// The generator is xoshiro256++ (Blackman & Vigna, 2019) with its 256-bit
// state expanded from the `u64` seed by SplitMix64. It is implemented here
// rather than pulled from a crate so that a published seed keeps producing
// the same dungeon across platforms and dependency upgrades.
//
// `delve_dungeon` re-exports this crate as `delve_dungeon::prng`.
//
// **Critical constraint: determinism.** Every method must produce identical
// output given the same prior state, regardless of platform or optimization
// level. Floats are only ever derived from integer output.

use serde::{Deserialize, Serialize};

/// A level's random stream. Serializable, so a half-finished generation
/// could be snapshotted and resumed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRng {
    s: [u64; 4],
}

impl LevelRng {
    /// The stream for a level seed.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Split off a child stream for a stage whose draw count should not
    /// disturb the stages after it. Advances `self` by exactly one draw.
    pub fn fork(&mut self) -> Self {
        Self::new(self.next_u64())
    }

    pub fn next_u64(&mut self) -> u64 {
        let [s0, s1, s2, s3] = self.s;
        let out = s0.wrapping_add(s3).rotate_left(23).wrapping_add(s0);

        let t = s1 << 17;
        let s2 = s2 ^ s0;
        let s3 = s3 ^ s1;
        let s1 = s1 ^ s2;
        let s0 = s0 ^ s3;
        self.s = [s0, s1, s2 ^ t, s3.rotate_left(45)];

        out
    }

    /// Uniform in [0, 1), from the top 53 bits. Split fractions, door
    /// offsets, and extra-door rolls all come from here.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// `true` with probability `p`. Always consumes one draw, even for
    /// `p <= 0.0` (never true) or `p >= 1.0` (always true).
    pub fn random_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
