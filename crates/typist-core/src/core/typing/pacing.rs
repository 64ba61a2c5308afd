//! Pacing strategies: every random draw and every duration the emulator
//! uses comes from here.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};

use super::profile::{DelayRange, TypingProfile};

/// The holds the emulator asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pause {
    Keystroke,
    Punctuation,
    Whitespace,
    TypoDisplay,
    TypoCorrection,
    Settle,
}

/// Source of timing and typo decisions.
pub trait Pacing {
    /// How long to hold for `pause`.
    fn delay(&mut self, pause: Pause) -> Duration;

    /// Whether the next keystroke gets a typo. Drawn once per character.
    fn should_typo(&mut self) -> bool;

    /// A wrong key to show before `c`, or `None` if `c` has no neighbours.
    fn pick_substitute(&mut self, c: char) -> Option<char>;
}

/// Human-like pacing drawn from a [`TypingProfile`].
#[derive(Debug, Clone)]
pub struct RandomPacing<R = StdRng> {
    profile: Arc<TypingProfile>,
    rng: R,
}

impl RandomPacing<StdRng> {
    pub fn new(profile: Arc<TypingProfile>) -> Self {
        Self::with_rng(profile, StdRng::from_entropy())
    }

    /// Reproducible pacing, for tests and demos.
    pub fn seeded(profile: Arc<TypingProfile>, seed: u64) -> Self {
        Self::with_rng(profile, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomPacing<R> {
    pub fn with_rng(profile: Arc<TypingProfile>, rng: R) -> Self {
        Self { profile, rng }
    }

    pub fn profile(&self) -> &TypingProfile {
        &self.profile
    }

    fn draw(&mut self, range: DelayRange) -> Duration {
        if range.min_ms >= range.max_ms {
            return range.min();
        }
        Duration::from_millis(self.rng.gen_range(range.min_ms..=range.max_ms))
    }
}

impl<R: Rng> Pacing for RandomPacing<R> {
    fn delay(&mut self, pause: Pause) -> Duration {
        let range = match pause {
            Pause::Keystroke => self.profile.keystroke,
            Pause::Punctuation => self.profile.punctuation,
            Pause::Whitespace => self.profile.whitespace,
            Pause::TypoDisplay => self.profile.typo_display,
            Pause::TypoCorrection => self.profile.typo_correction,
            Pause::Settle => return self.profile.settle(),
        };
        self.draw(range)
    }

    fn should_typo(&mut self) -> bool {
        self.rng.r#gen::<f64>() < self.profile.typo_probability
    }

    fn pick_substitute(&mut self, c: char) -> Option<char> {
        self.profile.substitutes(c)?.chars().choose(&mut self.rng)
    }
}

/// No keystroke delays and no typos. The settle hold is kept, since the
/// device needs it to finish the line.
#[derive(Debug, Clone, Copy)]
pub struct InstantPacing {
    settle: Duration,
}

impl InstantPacing {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }

    /// Uses the settle hold of `profile`.
    pub fn for_profile(profile: &TypingProfile) -> Self {
        Self::new(profile.settle())
    }
}

impl Default for InstantPacing {
    fn default() -> Self {
        Self::for_profile(&TypingProfile::default())
    }
}

impl Pacing for InstantPacing {
    fn delay(&mut self, pause: Pause) -> Duration {
        match pause {
            Pause::Settle => self.settle,
            _ => Duration::ZERO,
        }
    }

    fn should_typo(&mut self) -> bool {
        false
    }

    fn pick_substitute(&mut self, _c: char) -> Option<char> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pacing(seed: u64) -> RandomPacing {
        RandomPacing::seeded(Arc::new(TypingProfile::default()), seed)
    }

    #[test]
    fn test_delays_stay_within_profile_ranges() {
        let mut pacing = pacing(7);
        let profile = pacing.profile().clone();
        for _ in 0..500 {
            assert!(profile.keystroke.contains(pacing.delay(Pause::Keystroke)));
            assert!(profile.punctuation.contains(pacing.delay(Pause::Punctuation)));
            assert!(profile.whitespace.contains(pacing.delay(Pause::Whitespace)));
            assert!(profile.typo_display.contains(pacing.delay(Pause::TypoDisplay)));
            assert!(
                profile
                    .typo_correction
                    .contains(pacing.delay(Pause::TypoCorrection))
            );
        }
        assert_eq!(pacing.delay(Pause::Settle), Duration::from_secs(1));
    }

    #[test]
    fn test_typo_rate_converges_to_probability() {
        let mut pacing = pacing(42);
        let samples = 200_000;
        let hits = (0..samples).filter(|_| pacing.should_typo()).count();
        let rate = hits as f64 / f64::from(samples);
        // ~0.00038 standard deviation at p = 0.03; allow a wide margin
        assert!((rate - 0.03).abs() < 0.003, "observed typo rate {rate}");
    }

    #[test]
    fn test_substitute_comes_from_adjacency() {
        let mut pacing = pacing(3);
        for _ in 0..100 {
            let sub = pacing.pick_substitute('A').unwrap();
            assert!("sqwz".contains(sub), "unexpected substitute {sub}");
        }
        assert_eq!(pacing.pick_substitute('.'), None);
        assert_eq!(pacing.pick_substitute('5'), None);
    }

    #[test]
    fn test_zero_probability_never_typos() {
        let profile = TypingProfile {
            typo_probability: 0.0,
            ..Default::default()
        };
        let mut pacing = RandomPacing::seeded(Arc::new(profile), 1);
        assert!((0..10_000).all(|_| !pacing.should_typo()));
    }

    #[test]
    fn test_fixed_range_returns_exact_value() {
        let profile = TypingProfile {
            keystroke: DelayRange::fixed(25),
            ..Default::default()
        };
        let mut pacing = RandomPacing::seeded(Arc::new(profile), 1);
        assert_eq!(pacing.delay(Pause::Keystroke), Duration::from_millis(25));
    }

    #[test]
    fn test_instant_pacing_only_keeps_settle() {
        let mut pacing = InstantPacing::default();
        assert_eq!(pacing.delay(Pause::Keystroke), Duration::ZERO);
        assert_eq!(pacing.delay(Pause::Punctuation), Duration::ZERO);
        assert_eq!(pacing.delay(Pause::Settle), Duration::from_secs(1));
        assert!(!pacing.should_typo());
        assert_eq!(pacing.pick_substitute('a'), None);

        let profile = TypingProfile {
            settle_ms: 250,
            ..Default::default()
        };
        let mut pacing = InstantPacing::for_profile(&profile);
        assert_eq!(pacing.delay(Pause::Settle), Duration::from_millis(250));
    }
}
