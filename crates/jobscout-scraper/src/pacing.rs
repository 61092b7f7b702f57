//! Human-like pacing between page interactions.

use jobscout_core::PacingConfig;
use rand::Rng;
use std::time::Duration;

/// Randomized delays and cooldowns. A disabled pacer never sleeps.
#[derive(Debug, Clone)]
pub struct Pacer {
    enabled: bool,
    jitter_ms: (u64, u64),
    cooldown_every: usize,
    cooldown_ms: (u64, u64),
    redirect_cooldown_ms: (u64, u64),
}

impl Pacer {
    /// Pacer using the configured delay ranges.
    #[must_use]
    pub fn from_config(config: &PacingConfig) -> Self {
        Self {
            enabled: true,
            jitter_ms: (config.min_delay_ms, config.max_delay_ms),
            cooldown_every: config.cooldown_every,
            cooldown_ms: (config.cooldown_min_ms, config.cooldown_max_ms),
            redirect_cooldown_ms: (
                config.redirect_cooldown_min_ms,
                config.redirect_cooldown_max_ms,
            ),
        }
    }

    /// Pacer for tests and offline replay.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::from_config(&PacingConfig::default())
        }
    }

    /// Random pause within the jitter window.
    pub async fn jitter(&self) {
        self.sleep(draw(self.jitter_ms)).await;
    }

    /// Fixed wait for the page to settle after scrolling or clicking.
    pub async fn settle(&self, millis: u64) {
        self.sleep(Duration::from_millis(millis)).await;
    }

    /// Cooldown after a bot-detection redirect.
    pub async fn redirect_cooldown(&self) {
        let pause = draw(self.redirect_cooldown_ms);
        if self.enabled {
            tracing::info!("Cooling down for {:?} after redirect", pause);
        }
        self.sleep(pause).await;
    }

    /// Whether a cooldown is due after `processed` links.
    #[must_use]
    pub fn cooldown_due(&self, processed: usize) -> bool {
        self.cooldown_every > 0 && processed > 0 && processed % self.cooldown_every == 0
    }

    /// Cooldown pause every `cooldown_every` processed links.
    pub async fn periodic_cooldown(&self, processed: usize) {
        if !self.cooldown_due(processed) {
            return;
        }
        let pause = draw(self.cooldown_ms);
        if self.enabled {
            tracing::info!(processed, "Cooling pause for {:?}", pause);
        }
        self.sleep(pause).await;
    }

    async fn sleep(&self, pause: Duration) {
        if self.enabled && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::from_config(&PacingConfig::default())
    }
}

fn draw((min, max): (u64, u64)) -> Duration {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    Duration::from_millis(rand::thread_rng().gen_range(low..=high))
}
