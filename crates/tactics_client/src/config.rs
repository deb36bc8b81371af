//! Client configuration.
//!
//! Configuration is stored as RON. Every field has a default so partial
//! files are accepted.
//!
//! ```ron
//! (
//!     default_behavior: Base,
//!     confirm_actions: true,
//!     bot: (step_ms: 40, attack_ms: 150, pacing_percent: 25),
//! )
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::animation::Animation;
use crate::behavior::BehaviorKind;
use crate::error::{ClientError, Result};

/// Which animation profile is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProfileKind {
    /// Slow pacing for turns a human follows.
    #[default]
    Human,
    /// Fast pacing for bot turns.
    Bot,
    /// Near-zero durations.
    FastForward,
}

/// Animation durations in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationProfile {
    /// Duration of one step along a movement path.
    pub step_ms: u64,
    /// Attack strike.
    pub attack_ms: u64,
    /// Health bar change.
    pub damage_ms: u64,
    /// Destroyed unit or building.
    pub explosion_ms: u64,
    /// Heal, rescue, sabotage, capture, fold and barrier effects.
    pub effect_ms: u64,
    /// A unit or building appearing.
    pub spawn_ms: u64,
    /// Turn, reward and game-over banners.
    pub banner_ms: u64,
    /// Error flashes.
    pub flash_ms: u64,
    /// Scale applied to the inter-response delays, in percent.
    pub pacing_percent: u64,
}

impl AnimationProfile {
    /// Slow profile for human turns.
    #[must_use]
    pub const fn human() -> Self {
        Self {
            step_ms: 120,
            attack_ms: 400,
            damage_ms: 500,
            explosion_ms: 700,
            effect_ms: 500,
            spawn_ms: 400,
            banner_ms: 1500,
            flash_ms: 600,
            pacing_percent: 100,
        }
    }

    /// Fast profile for bot turns.
    #[must_use]
    pub const fn bot() -> Self {
        Self {
            step_ms: 60,
            attack_ms: 200,
            damage_ms: 250,
            explosion_ms: 350,
            effect_ms: 250,
            spawn_ms: 200,
            banner_ms: 800,
            flash_ms: 300,
            pacing_percent: 50,
        }
    }

    /// Near-zero profile used while fast-forwarding.
    #[must_use]
    pub const fn fast_forward() -> Self {
        Self {
            step_ms: 1,
            attack_ms: 1,
            damage_ms: 1,
            explosion_ms: 1,
            effect_ms: 1,
            spawn_ms: 1,
            banner_ms: 1,
            flash_ms: 1,
            pacing_percent: 0,
        }
    }

    /// How long `animation` plays under this profile.
    #[must_use]
    pub fn duration(&self, animation: &Animation) -> Duration {
        let ms = match animation {
            Animation::Move { path, .. } => self.step_ms * (path.len().max(1) as u64),
            Animation::Attack { .. } => self.attack_ms,
            Animation::Damage { .. } => self.damage_ms,
            Animation::Explosion { .. } => self.explosion_ms,
            Animation::Heal { .. }
            | Animation::Rescue { .. }
            | Animation::Sabotage { .. }
            | Animation::Capture { .. }
            | Animation::Fold { .. }
            | Animation::Barrier { .. } => self.effect_ms,
            Animation::Spawn { .. } | Animation::Build { .. } => self.spawn_ms,
            Animation::Banner { .. } => self.banner_ms,
            Animation::Flash { .. } => self.flash_ms,
        };
        Duration::from_millis(ms)
    }

    /// Scale an inter-response delay.
    #[must_use]
    pub const fn pace(&self, delay_ms: u64) -> Duration {
        Duration::from_millis(delay_ms * self.pacing_percent / 100)
    }

    fn longest(&self) -> u64 {
        [
            self.step_ms,
            self.attack_ms,
            self.damage_ms,
            self.explosion_ms,
            self.effect_ms,
            self.spawn_ms,
            self.banner_ms,
            self.flash_ms,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

impl Default for AnimationProfile {
    fn default() -> Self {
        Self::human()
    }
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// The behavior installed whenever the UI returns to idle.
    pub default_behavior: BehaviorKind,
    /// Whether state-changing selections need a second confirming select.
    pub confirm_actions: bool,
    /// Hover delay before the info tooltip appears.
    pub tooltip_delay_ms: u64,
    /// Hover delay before the attack radius preview appears.
    pub attack_preview_delay_ms: u64,
    /// Delay between two positionally adjacent responses.
    pub short_step_delay_ms: u64,
    /// Delay between two unrelated responses.
    pub long_step_delay_ms: u64,
    /// Profile for turns a human follows.
    pub human: AnimationProfile,
    /// Profile for bot turns.
    pub bot: AnimationProfile,
    /// Profile while fast-forwarding.
    pub fast_forward: AnimationProfile,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_behavior: BehaviorKind::Base,
            confirm_actions: false,
            tooltip_delay_ms: 500,
            attack_preview_delay_ms: 900,
            short_step_delay_ms: 150,
            long_step_delay_ms: 400,
            human: AnimationProfile::human(),
            bot: AnimationProfile::bot(),
            fast_forward: AnimationProfile::fast_forward(),
        }
    }
}

impl ClientConfig {
    /// Parse a RON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the text is not valid RON or the
    /// configuration fails [`ClientConfig::validate`].
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)
            .map_err(|e| ClientError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a RON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_ron_str(&text)
    }

    /// Serialize to pretty RON.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ClientError::Config(format!("Failed to serialize config: {e}")))
    }

    /// Check the configuration for inconsistent values.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] naming the first problem found.
    pub fn validate(&self) -> Result<()> {
        match self.default_behavior {
            BehaviorKind::Base | BehaviorKind::Design | BehaviorKind::Entity => {}
            BehaviorKind::Null => {
                return Err(ClientError::Config(
                    "default_behavior cannot be Null, input would never be accepted".into(),
                ));
            }
            other => {
                return Err(ClientError::Config(format!(
                    "default_behavior {other:?} needs a selection and cannot be the idle mode"
                )));
            }
        }
        if self.tooltip_delay_ms > self.attack_preview_delay_ms {
            return Err(ClientError::Config(format!(
                "tooltip_delay_ms ({}) must not exceed attack_preview_delay_ms ({})",
                self.tooltip_delay_ms, self.attack_preview_delay_ms
            )));
        }
        if self.short_step_delay_ms > self.long_step_delay_ms {
            return Err(ClientError::Config(format!(
                "short_step_delay_ms ({}) must not exceed long_step_delay_ms ({})",
                self.short_step_delay_ms, self.long_step_delay_ms
            )));
        }
        let slowest_ff = self.fast_forward.longest();
        for (name, profile) in [("human", &self.human), ("bot", &self.bot)] {
            if slowest_ff > profile.longest() {
                return Err(ClientError::Config(format!(
                    "fast_forward profile is slower than the {name} profile"
                )));
            }
        }
        Ok(())
    }

    /// The profile for `kind`.
    #[must_use]
    pub const fn profile(&self, kind: ProfileKind) -> &AnimationProfile {
        match kind {
            ProfileKind::Human => &self.human,
            ProfileKind::Bot => &self.bot,
            ProfileKind::FastForward => &self.fast_forward,
        }
    }
}
