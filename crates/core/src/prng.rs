// Minimal PRNG (no external crates).
//
// This is NOT cryptographically secure.
// It is used only for particle respawn and synthetic measurement noise,
// so the kernels stay deterministic per seed.

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
    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        // Marsaglia / Vigna family. Simple, fast, decent for simulation noise.
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
    pub fn next_f32_01(&mut self) -> f32 {
        // Convert to [0,1).
        let x = self.next_u32();
        (x as f32) / (u32::MAX as f32 + 1.0)
    }

    #[inline]
    pub fn next_f64_01(&mut self) -> f64 {
        let x = self.next_u32();
        (x as f64) / (u32::MAX as f64 + 1.0)
    }

    #[inline]
    pub fn gen_range_f32(&mut self, low: f32, high: f32) -> f32 {
        low + (high - low) * self.next_f32_01()
    }

    /// Standard normal sample via Box-Muller.
    ///
    /// The uniforms are floored at 1e-10 so `ln` never sees zero.
    pub fn next_gaussian(&mut self) -> f64 {
        let u1 = self.next_f64_01().max(1.0e-10);
        let u2 = self.next_f64_01().max(1.0e-10);
        (-2.0 * u1.ln()).sqrt() * (core::f64::consts::TAU * u2).cos()
    }
}
