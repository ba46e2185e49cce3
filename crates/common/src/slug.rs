//! Slug derivation and validation
//!
//! Slugs are the primary keys of businesses and locations and appear verbatim
//! in page URLs, so they are restricted to `[a-z0-9-]`.

/// Derive a URL-safe slug from free text
///
/// Non-alphanumeric runs collapse to a single `-`; non-ASCII characters are
/// dropped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '\'' || c == '\u{2019}' {
            // "Joe's" -> "joes"
            continue;
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Check that a string is already a well-formed slug
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("The Garden Bistro"), "the-garden-bistro");
        assert_eq!(slugify("  Joe's  Pizza & Subs!  "), "joes-pizza-subs");
        assert_eq!(slugify("Café 24/7"), "caf-24-7");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("garden-bistro"));
        assert!(is_valid_slug("downtown2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-garden"));
        assert!(!is_valid_slug("garden-"));
        assert!(!is_valid_slug("garden--bistro"));
        assert!(!is_valid_slug("Garden"));
        assert!(!is_valid_slug("garden bistro"));
    }

    #[test]
    fn test_slugify_output_is_valid() {
        for name in ["Bright Smile Dental", "A+ Auto Repair", "Zen Yoga Studio #2"] {
            assert!(is_valid_slug(&slugify(name)), "{name}");
        }
    }
}
