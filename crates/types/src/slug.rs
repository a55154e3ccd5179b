//! URL-safe slug derivation.

/// Longest slug we will derive; hosting project names double as DNS labels.
const MAX_SLUG_LEN: usize = 63;

/// Derive a URL-safe slug from a display name.
///
/// Lowercases, maps every run of non-alphanumeric characters to a single
/// dash, trims leading/trailing dashes, and truncates to a DNS-label-safe
/// length. Falls back to `"server"` when nothing survives.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        "server".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn collapses_separator_runs() {
        assert_eq!(slugify("Pet Store  --  API"), "pet-store-api");
    }

    #[test]
    fn trims_edges() {
        assert_eq!(slugify("  (Weather) "), "weather");
    }

    #[test]
    fn empty_input_falls_back() {
        assert_eq!(slugify("!!!"), "server");
        assert_eq!(slugify(""), "server");
    }

    #[test]
    fn truncates_to_dns_label_length() {
        let long = "a".repeat(100);
        assert_eq!(slugify(&long).len(), 63);
    }
}
