use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Latency is capped so a bad config cannot stall settlement indefinitely.
const MAX_LATENCY: Duration = Duration::from_secs(5);

/// Stand-in for a real payment provider. Sleeps once, then draws success
/// with probability `success_rate`. A fixed seed makes the draw sequence
/// reproducible, which the end-to-end tests rely on to drive both outcomes.
pub struct Simulator {
    rng: Mutex<StdRng>,
    success_rate: f64,
    latency: Duration,
}

impl Simulator {
    pub fn new(success_rate: f64, latency: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
            success_rate: success_rate.clamp(0.0, 1.0),
            latency: latency.min(MAX_LATENCY),
        }
    }

    /// One settlement attempt.
    pub async fn settle(&self) -> bool {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.draw()
    }

    fn draw(&self) -> bool {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.gen_bool(self.success_rate)
    }
}
