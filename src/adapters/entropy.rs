//! Random byte source for address generation.
//!
//! - **`target_os = "espidf"`** — `esp_fill_random()`, backed by the
//!   hardware RNG (true random while the radio is on).
//! - **`not(target_os = "espidf")`** — seeded xorshift64 so simulations
//!   are reproducible.

use crate::app::ports::EntropyPort;

#[cfg(target_os = "espidf")]
pub struct HardwareRng;

#[cfg(target_os = "espidf")]
impl EntropyPort for HardwareRng {
    fn fill(&mut self, buf: &mut [u8]) {
        // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
        unsafe {
            esp_idf_svc::sys::esp_fill_random(buf.as_mut_ptr().cast(), buf.len());
        }
    }
}

/// Deterministic generator for host builds.
#[cfg(not(target_os = "espidf"))]
pub struct SimRng {
    state: u64,
}

#[cfg(not(target_os = "espidf"))]
impl SimRng {
    pub fn new(seed: u64) -> Self {
        // xorshift has a fixed point at zero.
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

#[cfg(not(target_os = "espidf"))]
impl EntropyPort for SimRng {
    fn fill(&mut self, buf: &mut [u8]) {
        for chunk in buf.chunks_mut(8) {
            let word = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }
}
