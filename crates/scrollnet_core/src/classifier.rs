//! crates/scrollnet_core/src/classifier.rs
//!
//! Turns a raw swipe gesture, or an explicit emoji-button press, into an
//! interaction intent. Pure and stateless.

use crate::domain::EmojiKey;

/// Minimum travel, in logical pixels, before a gesture counts as a swipe.
pub const DEFAULT_SWIPE_THRESHOLD: f64 = 50.0;

/// Displacement from gesture start to release. Screen coordinates: `dy < 0` is upward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
    pub dx: f64,
    pub dy: f64,
}

impl Gesture {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

/// What the user meant by a gesture or button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionIntent {
    Like,
    Dislike,
    /// Advance without reacting.
    Next,
    Emoji(EmojiKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Intent(InteractionIntent),
    /// Too short to be a swipe; toggles play/pause.
    Tap,
    /// A swipe that maps to nothing (downward, or malformed input).
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classifier {
    threshold: f64,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_SWIPE_THRESHOLD)
    }
}

impl Classifier {
    /// Creates a classifier. A negative or non-finite threshold falls back to the default.
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_finite() && threshold >= 0.0 {
            threshold
        } else {
            DEFAULT_SWIPE_THRESHOLD
        };
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classifies a released gesture.
    ///
    /// The dominant axis decides; `|dx| == |dy|` counts as horizontal. Travel
    /// exactly equal to the threshold is a swipe.
    pub fn classify(&self, gesture: Gesture) -> Classification {
        let Gesture { dx, dy } = gesture;
        if !dx.is_finite() || !dy.is_finite() {
            return Classification::Ignored;
        }

        let t = self.threshold;
        if dx.abs() >= dy.abs() {
            if dx >= t && dx > 0.0 {
                return Classification::Intent(InteractionIntent::Like);
            }
            if dx <= -t && dx < 0.0 {
                return Classification::Intent(InteractionIntent::Dislike);
            }
        }
        if dy <= -t && dy < 0.0 {
            return Classification::Intent(InteractionIntent::Next);
        }
        if dx.abs() < t && dy.abs() < t {
            return Classification::Tap;
        }
        Classification::Ignored
    }

    /// Emoji buttons skip gesture classification entirely.
    pub fn press_emoji(&self, key: EmojiKey) -> InteractionIntent {
        InteractionIntent::Emoji(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(dx: f64, dy: f64) -> Classification {
        Classifier::default().classify(Gesture::new(dx, dy))
    }

    #[test]
    fn horizontal_swipes_map_to_like_and_dislike() {
        assert_eq!(classify(120.0, 10.0), Classification::Intent(InteractionIntent::Like));
        assert_eq!(classify(-120.0, -30.0), Classification::Intent(InteractionIntent::Dislike));
    }

    #[test]
    fn upward_swipe_is_next() {
        assert_eq!(classify(5.0, -200.0), Classification::Intent(InteractionIntent::Next));
    }

    #[test]
    fn diagonal_tie_favours_horizontal() {
        assert_eq!(classify(80.0, -80.0), Classification::Intent(InteractionIntent::Like));
        assert_eq!(classify(-80.0, -80.0), Classification::Intent(InteractionIntent::Dislike));
    }

    #[test]
    fn short_gesture_is_a_tap() {
        assert_eq!(classify(0.0, 0.0), Classification::Tap);
        assert_eq!(classify(49.0, -49.0), Classification::Tap);
    }

    #[test]
    fn downward_swipe_is_ignored() {
        assert_eq!(classify(10.0, 150.0), Classification::Ignored);
    }

    #[test]
    fn non_finite_input_is_ignored() {
        assert_eq!(classify(f64::NAN, 0.0), Classification::Ignored);
        assert_eq!(classify(f64::INFINITY, 0.0), Classification::Ignored);
    }

    #[test]
    fn horizontal_dominance_past_threshold_is_deterministic() {
        let classifier = Classifier::new(50.0);
        let magnitudes = [50.0, 51.0, 75.5, 200.0, 1000.0];
        let fractions = [0.0, 0.25, 0.5, 0.99, 1.0];
        for &m in &magnitudes {
            for &f in &fractions {
                for &sign_y in &[1.0, -1.0] {
                    let dy = sign_y * m * f;
                    assert_eq!(
                        classifier.classify(Gesture::new(m, dy)),
                        Classification::Intent(InteractionIntent::Like),
                        "dx={m} dy={dy}"
                    );
                    assert_eq!(
                        classifier.classify(Gesture::new(-m, dy)),
                        Classification::Intent(InteractionIntent::Dislike),
                        "dx={} dy={dy}",
                        -m
                    );
                }
            }
        }
    }

    #[test]
    fn emoji_press_bypasses_gestures() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.press_emoji(EmojiKey::Heart),
            InteractionIntent::Emoji(EmojiKey::Heart)
        );
    }

    #[test]
    fn invalid_threshold_falls_back_to_default() {
        assert_eq!(Classifier::new(-1.0).threshold(), DEFAULT_SWIPE_THRESHOLD);
        assert_eq!(Classifier::new(f64::NAN).threshold(), DEFAULT_SWIPE_THRESHOLD);
    }
}
