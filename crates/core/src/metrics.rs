//! Derived post metrics.

use regex::Regex;

/// Reading speed used for [`reading_time`].
pub const WORDS_PER_MINUTE: usize = 200;

/// Length of [`excerpt`] before the ellipsis.
pub const EXCERPT_CHARS: usize = 100;

#[allow(clippy::unwrap_used)]
static WORD_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"\w+").unwrap());

/// Estimated reading time in whole minutes, never less than 1.
///
/// Halfway cases round to the even neighbour, so 300 words read in 2 minutes
/// and 500 words in 2 minutes as well.
#[must_use]
pub fn reading_time(body: &str) -> u32 {
    let words = WORD_RE.find_iter(body).count();
    let minutes = (words as f64 / WORDS_PER_MINUTE as f64).round_ties_even() as u32;
    minutes.max(1)
}

/// Percentage of reactions that are likes, with one decimal place.
#[must_use]
pub fn engagement_ratio(likes: i32, dislikes: i32) -> f64 {
    let likes = f64::from(likes.max(0));
    let total = likes + f64::from(dislikes.max(0));
    if total == 0.0 {
        return 0.0;
    }
    (likes * 100.0 / total * 10.0).round() / 10.0
}

/// The first [`EXCERPT_CHARS`] characters of `body`, with `...` appended when cut.
#[must_use]
pub fn excerpt(body: &str) -> String {
    match body.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time(&words(400)), 2);
        assert_eq!(reading_time(&words(299)), 1);
        assert_eq!(reading_time(&words(301)), 2);
        assert_eq!(reading_time(&words(1000)), 5);
    }

    #[test]
    fn test_reading_time_floor_is_one_minute() {
        assert_eq!(reading_time(""), 1);
        assert_eq!(reading_time("just a few words"), 1);
    }

    #[test]
    fn test_reading_time_halfway_rounds_to_even() {
        assert_eq!(reading_time(&words(300)), 2);
        assert_eq!(reading_time(&words(500)), 2);
        assert_eq!(reading_time(&words(700)), 4);
    }

    #[test]
    fn test_reading_time_counts_word_runs() {
        // Apostrophes split words; underscores and digits belong to them.
        assert_eq!(WORD_RE.find_iter("don't stop_me now, 2024!").count(), 5);
    }

    #[test]
    fn test_engagement_ratio() {
        assert_eq!(engagement_ratio(0, 0), 0.0);
        assert_eq!(engagement_ratio(3, 1), 75.0);
        assert_eq!(engagement_ratio(0, 4), 0.0);
        assert_eq!(engagement_ratio(5, 0), 100.0);
        assert_eq!(engagement_ratio(1, 2), 33.3);
        assert_eq!(engagement_ratio(2, 1), 66.7);
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short"), "short");

        let exact = "a".repeat(100);
        assert_eq!(excerpt(&exact), exact);

        let long = "é".repeat(150);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), 103);
        assert!(cut.ends_with("..."));
    }
}
