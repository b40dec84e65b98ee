//! Database repositories.

pub mod category;
pub mod comment;
pub mod post;
pub mod post_reaction;

pub use category::CategoryRepository;
pub use comment::{CommentFilter, CommentRepository};
pub use post::{PostFilter, PostOrder, PostRepository};
pub use post_reaction::PostReactionRepository;

/// Build a lowercase `LIKE` pattern matching `term` anywhere, with wildcards escaped.
#[must_use]
pub fn contains_pattern(term: &str) -> String {
    format!(
        "%{}%",
        term.to_lowercase()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Rust"), "%rust%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }
}
