//! Deterministic noise and random-draw primitives shared by the formation
//! animation pipeline.
//!
//! Two building blocks live here: a gradient-noise field ([`perlin2`],
//! [`perlin3`]) and a counter-based pseudo-random stream ([`SeededStream`]).
//! Both are pure functions of their inputs, with no hidden state and no
//! platform dependence, so every consumer re-deriving values per frame gets
//! identical results on every machine.

use glam::{Vec2, Vec3};
use rand_core::{RngCore, SeedableRng};

/// Weyl-sequence increment for the splitmix64 counter (2^64 / phi).
const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seed for the compile-time permutation shuffle backing the noise field.
/// Changing it changes every noise sample; keep it fixed.
const PERMUTATION_SEED: u64 = 0x5713_C0FF_EE01;

/// splitmix64 finalizer. Shared by [`SeededStream`] and the permutation
/// shuffle so the whole crate hangs off a single mixing function.
const fn mix64(mut z: u64) -> u64 {
    z ^= z >> 30;
    z = z.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z ^= z >> 27;
    z = z.wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Fisher–Yates shuffle of `0..=255`, doubled so corner lookups never wrap.
/// Runs at compile time; the table is the pinned identity of the noise field.
const fn build_permutation(seed: u64) -> [u8; 512] {
    let mut table = [0u8; 512];
    let mut i = 0;
    while i < 256 {
        table[i] = i as u8;
        i += 1;
    }
    let mut state = seed;
    let mut i = 255;
    while i > 0 {
        state = state.wrapping_add(GOLDEN_GAMMA);
        let j = (mix64(state) % (i as u64 + 1)) as usize;
        let swap = table[i];
        table[i] = table[j];
        table[j] = swap;
        i -= 1;
    }
    let mut i = 0;
    while i < 256 {
        table[256 + i] = table[i];
        i += 1;
    }
    table
}

static PERM: [u8; 512] = build_permutation(PERMUTATION_SEED);

/// Quintic interpolant, zero first and second derivative at the cell faces.
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Unit gradient from the low hash bits, dotted with the corner offset.
fn grad2(hash: u8, x: f32, y: f32) -> f32 {
    const DIAG: f32 = core::f32::consts::FRAC_1_SQRT_2;
    match hash & 7 {
        0 => (x + y) * DIAG,
        1 => (x - y) * DIAG,
        2 => (y - x) * DIAG,
        3 => (-x - y) * DIAG,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}

/// One of the twelve cube-edge gradients, normalized to unit length.
fn grad3(hash: u8, x: f32, y: f32, z: f32) -> f32 {
    const EDGE: f32 = core::f32::consts::FRAC_1_SQRT_2;
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    let s = if h & 1 == 0 { u } else { -u };
    let t = if h & 2 == 0 { v } else { -v };
    (s + t) * EDGE
}

// Unit-gradient lattice noise peaks at sqrt(dim)/2; these factors stretch the
// output to the [-1, 1] design range.
const NORM_2D: f32 = core::f32::consts::SQRT_2;
const NORM_3D: f32 = 1.154_700_5;

/// Samples the 2D gradient-noise field at `p`.
///
/// Continuous everywhere, exactly zero at integer lattice points, and bounded
/// by [-1, 1]. Same input always yields the same output.
#[must_use]
pub fn perlin2(p: Vec2) -> f32 {
    let xf = p.x.floor();
    let yf = p.y.floor();
    let xi = ((xf as i64) & 255) as usize;
    let yi = ((yf as i64) & 255) as usize;
    let x = p.x - xf;
    let y = p.y - yf;
    let u = fade(x);
    let v = fade(y);

    let a = PERM[xi] as usize + yi;
    let b = PERM[xi + 1] as usize + yi;

    let n00 = grad2(PERM[a], x, y);
    let n10 = grad2(PERM[b], x - 1.0, y);
    let n01 = grad2(PERM[a + 1], x, y - 1.0);
    let n11 = grad2(PERM[b + 1], x - 1.0, y - 1.0);

    lerp(lerp(n00, n10, u), lerp(n01, n11, u), v) * NORM_2D
}

/// Samples the 3D gradient-noise field at `p`.
///
/// Same guarantees as [`perlin2`], one dimension up.
#[must_use]
pub fn perlin3(p: Vec3) -> f32 {
    let xf = p.x.floor();
    let yf = p.y.floor();
    let zf = p.z.floor();
    let xi = ((xf as i64) & 255) as usize;
    let yi = ((yf as i64) & 255) as usize;
    let zi = ((zf as i64) & 255) as usize;
    let x = p.x - xf;
    let y = p.y - yf;
    let z = p.z - zf;
    let u = fade(x);
    let v = fade(y);
    let w = fade(z);

    let a = PERM[xi] as usize + yi;
    let aa = PERM[a] as usize + zi;
    let ab = PERM[a + 1] as usize + zi;
    let b = PERM[xi + 1] as usize + yi;
    let ba = PERM[b] as usize + zi;
    let bb = PERM[b + 1] as usize + zi;

    let n000 = grad3(PERM[aa], x, y, z);
    let n100 = grad3(PERM[ba], x - 1.0, y, z);
    let n010 = grad3(PERM[ab], x, y - 1.0, z);
    let n110 = grad3(PERM[bb], x - 1.0, y - 1.0, z);
    let n001 = grad3(PERM[aa + 1], x, y, z - 1.0);
    let n101 = grad3(PERM[ba + 1], x - 1.0, y, z - 1.0);
    let n011 = grad3(PERM[ab + 1], x, y - 1.0, z - 1.0);
    let n111 = grad3(PERM[bb + 1], x - 1.0, y - 1.0, z - 1.0);

    let nx00 = lerp(n000, n100, u);
    let nx10 = lerp(n010, n110, u);
    let nx01 = lerp(n001, n101, u);
    let nx11 = lerp(n011, n111, u);

    lerp(lerp(nx00, nx10, v), lerp(nx01, nx11, v), w) * NORM_3D
}

const UNIFORM_SCALE: f32 = 1.0 / (1u32 << 24) as f32;

/// Counter-based pseudo-random stream (splitmix64).
///
/// Two streams built from the same seed and asked for the same draw sequence
/// produce identical outputs, and [`SeededStream::discard`] jumps the counter
/// in constant time, so warm-up skips cost nothing. Every draw consumes
/// exactly one counter step, whether it goes through the inherent helpers or
/// the [`RngCore`] methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededStream {
    counter: u64,
}

impl SeededStream {
    /// Creates a stream positioned at the start of the sequence for `seed`.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { counter: seed }
    }

    fn step(&mut self) -> u64 {
        self.counter = self.counter.wrapping_add(GOLDEN_GAMMA);
        mix64(self.counter)
    }

    /// Next uniform draw in `[0, 1)`.
    pub fn next_uniform(&mut self) -> f32 {
        ((self.step() >> 40) as u32 as f32) * UNIFORM_SCALE
    }

    /// Next uniform draw in `[min, max)`.
    pub fn next_float(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_uniform()
    }

    /// Two independent draws in `[min, max)`, x first.
    pub fn next_float2(&mut self, min: f32, max: f32) -> Vec2 {
        let x = self.next_float(min, max);
        let y = self.next_float(min, max);
        Vec2::new(x, y)
    }

    /// Skips `draws` draws without generating them.
    pub fn discard(&mut self, draws: u64) {
        self.counter = self.counter.wrapping_add(GOLDEN_GAMMA.wrapping_mul(draws));
    }
}

impl RngCore for SeededStream {
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.step()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for SeededStream {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}
