/// Lowercase ASCII slug: alphanumerics kept, every other run of characters
/// collapsed into a single `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        let c = fold_accent(c);
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
    slug
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Uses `explicit` when given, otherwise derives the slug from `source`.
pub fn resolve_slug(explicit: Option<&str>, source: &str) -> Result<String, crate::ServiceError> {
    let slug = match explicit {
        Some(s) => s.trim().to_string(),
        None => slugify(source),
    };
    if is_valid_slug(&slug) {
        Ok(slug)
    } else {
        Err(crate::ServiceError::invalid(format!("Invalid slug '{slug}'")))
    }
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Chef's Specials"), "chef-s-specials");
        assert_eq!(slugify("  Crème Brûlée & Coffee!  "), "creme-brulee-coffee");
        assert_eq!(slugify("Summer 2025 Menu"), "summer-2025-menu");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("wine-pairing-101"));
        assert!(!is_valid_slug("Wine"));
        assert!(!is_valid_slug("-wine"));
        assert!(!is_valid_slug("wine--list"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_resolve_slug() {
        assert_eq!(resolve_slug(None, "Our Story").unwrap(), "our-story");
        assert_eq!(resolve_slug(Some(" custom "), "Our Story").unwrap(), "custom");
        assert!(resolve_slug(Some("Bad Slug"), "x").is_err());
        assert!(resolve_slug(None, "???").is_err());
    }
}
