//! Demo Mode - Simulated sensor board for testing
//!
//! Generates plausible telemetry lines without a real device attached.
//! Simulates a board on a desk: slowly changing room light, background
//! noise with the occasional loud event, a stationary accelerometer and a
//! drifting temperature.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use crate::record::SensorReadings;
use crate::source::{ByteSource, ReadOutcome};
use crate::SourceError;

/// Simulated interval between samples
const SAMPLE_INTERVAL_MS: u64 = 100;

/// Simulated sensor board
pub struct DemoDevice {
    /// Simulated time of the next sample (ms)
    sim_time_ms: u64,
    /// Every Nth line is corrupted, if set
    corrupt_every: Option<u64>,
    /// Lines produced so far
    lines: u64,
    rng: StdRng,
}

impl Default for DemoDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoDevice {
    /// Create a device seeded from entropy
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a reproducible device
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            sim_time_ms: 0,
            corrupt_every: None,
            lines: 0,
            rng,
        }
    }

    /// Corrupt every `n`th line (0 disables)
    pub fn corrupt_every(mut self, n: u64) -> Self {
        self.corrupt_every = (n > 0).then_some(n);
        self
    }

    /// Generate readings for a point in simulated time
    pub fn sample(&mut self, elapsed_ms: u64) -> SensorReadings {
        let t = elapsed_ms as f64 / 1000.0;

        let light = (450.0 + 300.0 * (t / 60.0).sin() + self.rng.gen_range(-5.0..5.0)).max(0.0);

        // Mostly quiet room, 2% chance of a door slam
        let sound_pressure = if self.rng.gen_bool(0.02) {
            self.rng.gen_range(75.0..95.0)
        } else {
            40.0 + self.rng.gen_range(0.0..12.0)
        };

        // Lying flat: gravity on Z, sensor noise everywhere
        let motion_x = self.rng.gen_range(-0.05..0.05);
        let motion_y = self.rng.gen_range(-0.05..0.05);
        let motion_z = 1.0 + self.rng.gen_range(-0.05..0.05);

        let temperature = 22.0 + 0.8 * (t / 300.0).sin() + self.rng.gen_range(-0.1..0.1);

        SensorReadings {
            light,
            sound_pressure,
            motion_x,
            motion_y,
            motion_z,
            temperature,
        }
    }

    /// Produce the next newline-terminated line
    pub fn next_line(&mut self) -> String {
        let readings = self.sample(self.sim_time_ms);
        self.sim_time_ms += SAMPLE_INTERVAL_MS;
        self.lines += 1;

        let line = format_line(&readings);
        match self.corrupt_every {
            Some(n) if self.lines % n == 0 => self.corrupt(line),
            _ => line,
        }
    }

    /// Damage a line the way a flaky link would
    fn corrupt(&mut self, line: String) -> String {
        let body = line.trim_end_matches('\n');
        let damaged = match self.rng.gen_range(0..3) {
            // Lost the tail of the line
            0 => body[..body.len() / 2].to_string(),
            // Garbage in one field
            1 => {
                let mut fields: Vec<&str> = body.split(',').collect();
                let idx = self.rng.gen_range(0..fields.len());
                fields[idx] = "E#R";
                fields.join(",")
            }
            // Two lines run together
            _ => format!("{},{}", body, body),
        };
        format!("{}\n", damaged)
    }
}

fn format_line(r: &SensorReadings) -> String {
    format!(
        "{:.1},{:.1},{:.3},{:.3},{:.3},{:.2}\n",
        r.light, r.sound_pressure, r.motion_x, r.motion_y, r.motion_z, r.temperature
    )
}

/// Byte source backed by a [`DemoDevice`]
///
/// Delivers lines in randomly sized chunks so that chunk boundaries fall
/// mid-line, as they do on a real serial link.
pub struct DemoSource {
    device: DemoDevice,
    pending: Vec<u8>,
    /// Largest chunk handed out per read
    max_chunk: usize,
    /// Close after this many lines
    max_lines: Option<u64>,
    lines: u64,
    /// Real time to wait before each new line
    pacing: Option<Duration>,
    rng: StdRng,
}

impl DemoSource {
    /// Stream lines from `device` without pacing, in chunks of up to 16 bytes
    pub fn new(device: DemoDevice) -> Self {
        Self {
            device,
            pending: Vec::new(),
            max_chunk: 16,
            max_lines: None,
            lines: 0,
            pacing: None,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Close the source after `n` lines
    pub fn max_lines(mut self, n: u64) -> Self {
        self.max_lines = Some(n);
        self
    }

    /// Largest chunk size per read (at least 1)
    pub fn max_chunk(mut self, n: usize) -> Self {
        self.max_chunk = n.max(1);
        self
    }

    /// Sleep before each line to mimic a real sample rate
    pub fn pacing(mut self, interval: Duration) -> Self {
        self.pacing = Some(interval);
        self
    }
}

impl ByteSource for DemoSource {
    fn read_chunk(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<ReadOutcome, SourceError> {
        if self.pending.is_empty() {
            if self.max_lines.is_some_and(|max| self.lines >= max) {
                return Ok(ReadOutcome::Closed);
            }
            if let Some(interval) = self.pacing {
                std::thread::sleep(interval.min(timeout));
            }
            self.pending = self.device.next_line().into_bytes();
            self.lines += 1;
        }

        let limit = self.max_chunk.min(buf.len()).min(self.pending.len());
        if limit == 0 {
            return Ok(ReadOutcome::Idle);
        }
        let n = self.rng.gen_range(1..=limit);
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(ReadOutcome::Data(n))
    }
}
