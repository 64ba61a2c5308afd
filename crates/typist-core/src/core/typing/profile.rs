//! Timing and typo profile for the typing emulator.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Inclusive millisecond range a delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }

    pub fn contains(&self, duration: Duration) -> bool {
        duration >= self.min() && duration <= self.max()
    }
}

/// QWERTY neighbours used to pick a plausible wrong key.
const QWERTY_ADJACENCY: [(char, &str); 26] = [
    ('a', "sqwz"),
    ('b', "vghn"),
    ('c', "xdfv"),
    ('d', "serfcx"),
    ('e', "wsdfr"),
    ('f', "drtgvc"),
    ('g', "ftyhbv"),
    ('h', "gyujnb"),
    ('i', "ujko"),
    ('j', "huikmn"),
    ('k', "jiolm"),
    ('l', "kop"),
    ('m', "njkl"),
    ('n', "bhjm"),
    ('o', "iklp"),
    ('p', "ol"),
    ('q', "wa"),
    ('r', "edft"),
    ('s', "wazx"),
    ('t', "rfgy"),
    ('u', "yihj"),
    ('v', "cfgb"),
    ('w', "qase"),
    ('x', "zsdc"),
    ('y', "tghu"),
    ('z', "asx"),
];

fn qwerty_adjacency() -> BTreeMap<String, String> {
    QWERTY_ADJACENCY
        .iter()
        .map(|(key, near)| (key.to_string(), (*near).to_string()))
        .collect()
}

/// How the emulator paces keystrokes and injects typos.
///
/// Loaded from the `[typing]` config table; immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingProfile {
    /// Chance in [0, 1] that a keystroke is preceded by a corrected typo
    pub typo_probability: f64,
    /// Pause after the closing carriage return
    pub settle_ms: u64,
    /// Hold after every keystroke
    pub keystroke: DelayRange,
    /// Extra hold after `. , ? !`
    pub punctuation: DelayRange,
    /// Extra hold after a space
    pub whitespace: DelayRange,
    /// How long a wrong key stays on the page before the backspace
    pub typo_display: DelayRange,
    /// Hold after the backspace, before the right key
    pub typo_correction: DelayRange,
    /// Lowercase key -> neighbouring keys
    pub adjacency: BTreeMap<String, String>,
}

impl TypingProfile {
    pub const DEFAULT_TYPO_PROBABILITY: f64 = 0.03;
    const DEFAULT_SETTLE_MS: u64 = 1000;

    /// Returns the neighbouring keys for `c`, matched case-insensitively.
    pub fn substitutes(&self, c: char) -> Option<&str> {
        let mut buf = [0u8; 4];
        let key: &str = c.to_ascii_lowercase().encode_utf8(&mut buf);
        self.adjacency
            .get(key)
            .map(String::as_str)
            .filter(|near| !near.is_empty())
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Checks probabilities and ranges.
    ///
    /// # Errors
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.typo_probability) {
            bail!(
                "typing.typo_probability must be within 0..=1, got {}",
                self.typo_probability
            );
        }
        if self.settle_ms == 0 {
            bail!("typing.settle_ms must be positive");
        }
        for (name, range) in [
            ("keystroke", self.keystroke),
            ("punctuation", self.punctuation),
            ("whitespace", self.whitespace),
            ("typo_display", self.typo_display),
            ("typo_correction", self.typo_correction),
        ] {
            if range.min_ms > range.max_ms {
                bail!(
                    "typing.{name}: min_ms ({}) exceeds max_ms ({})",
                    range.min_ms,
                    range.max_ms
                );
            }
        }
        for key in self.adjacency.keys() {
            if key.chars().count() != 1 {
                bail!("typing.adjacency keys must be single characters, got {key:?}");
            }
        }
        Ok(())
    }
}

impl Default for TypingProfile {
    fn default() -> Self {
        Self {
            typo_probability: Self::DEFAULT_TYPO_PROBABILITY,
            keystroke: DelayRange::new(50, 200),
            punctuation: DelayRange::new(300, 700),
            whitespace: DelayRange::new(100, 300),
            typo_display: DelayRange::new(50, 200),
            typo_correction: DelayRange::new(200, 400),
            settle_ms: Self::DEFAULT_SETTLE_MS,
            adjacency: qwerty_adjacency(),
        }
    }
}
