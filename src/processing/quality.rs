//! Size-ratio quality score.
//!
//! This is a coarse heuristic, not a perceptual metric: it only looks at how
//! much smaller the output is than the input. Aggressive reduction scores at
//! least 70 and near-lossless output tops out around 95. An SSIM-style
//! comparison of decoded pixels would be a better (and incompatible) score.

/// Scores a result from its `original` and `processed` byte sizes.
///
/// Returns `None` when the ratio cannot be formed.
pub fn quality_score(original: u64, processed: u64) -> Option<u8> {
    if original == 0 {
        return None;
    }

    let ratio = processed as f64 / original as f64;
    let score = if ratio <= 0.2 {
        70.0 + (ratio * 100.0).round()
    } else if ratio <= 0.5 {
        80.0 + (ratio * 20.0).round()
    } else if ratio <= 0.8 {
        85.0 + (ratio * 10.0).round()
    } else {
        90.0 + (ratio * 5.0).round()
    };

    Some(score.clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_values() {
        assert_eq!(quality_score(100, 0), Some(70));
        assert_eq!(quality_score(100, 10), Some(80));
        assert_eq!(quality_score(100, 20), Some(90));
        assert_eq!(quality_score(100, 30), Some(86));
        assert_eq!(quality_score(100, 50), Some(90));
        assert_eq!(quality_score(100, 60), Some(91));
        assert_eq!(quality_score(100, 80), Some(93));
        assert_eq!(quality_score(100, 90), Some(95));
        assert_eq!(quality_score(100, 100), Some(95));
    }

    #[test]
    fn growth_is_clamped() {
        assert_eq!(quality_score(100, 300), Some(100));
        assert_eq!(quality_score(100, 10_000), Some(100));
    }

    #[test]
    fn zero_original_has_no_score() {
        assert_eq!(quality_score(0, 10), None);
    }

    #[test]
    fn monotonic_within_bands_and_bounded() {
        let bands = [(0u64, 200u64), (201, 500), (501, 800), (801, 3000)];
        for (lo, hi) in bands {
            let mut previous = 0;
            for processed in lo..=hi {
                let score = quality_score(1000, processed).unwrap();
                assert!(score >= previous, "score dropped at {processed}");
                assert!(score <= 100);
                previous = score;
            }
        }
    }
}
