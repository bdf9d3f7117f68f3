/// Lowercase, dash-separated form of a name, safe for file names.
/// `"Secret Door (Wood)"` → `"secret-door-wood"`
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || matches!(c, '-' | '_' | '\u{2013}' | '\u{2014}') {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Secret Door (Wood)"), "secret-door-wood");
        assert_eq!(slugify("  Trap -- Pit  "), "trap-pit");
        assert_eq!(slugify("snake_case name"), "snake-case-name");
    }

    #[test]
    fn slugify_keeps_letters_from_any_script() {
        assert_eq!(slugify("Tür Öffnen"), "tür-öffnen");
        assert_eq!(slugify("宝箱"), "宝箱");
    }

    #[test]
    fn slugify_degenerate() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }
}
