use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const ELLIPSIS: char = '\u{2026}';

/// Width of a name in terminal cells
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cut a name to at most `max_cells` cells, ending in `…` when anything
/// was dropped. Never splits a grapheme cluster.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    let Some(budget) = max_cells.checked_sub(1) else {
        return String::new();
    };
    let mut used = 0;
    let mut out: String = s
        .graphemes(true)
        .take_while(|g| {
            used += display_width(g);
            used <= budget
        })
        .collect();
    out.push(ELLIPSIS);
    out
}

/// Exactly `cells` cells wide: truncated, then right-padded with spaces
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let mut out = truncate_to_width(s, cells);
    let fill = cells.saturating_sub(display_width(&out));
    out.extend(std::iter::repeat_n(' ', fill));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_of_wide_and_combining_text() {
        assert_eq!(display_width("Door"), 4);
        assert_eq!(display_width("宝箱"), 4);
        assert_eq!(display_width("cafe\u{0301}"), 4);
    }

    #[test]
    fn truncate_keeps_short_names() {
        assert_eq!(truncate_to_width("Pit", 10), "Pit");
        assert_eq!(truncate_to_width("Pit", 3), "Pit");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate_to_width("Spike Pit", 6), "Spike\u{2026}");
        assert_eq!(truncate_to_width("Spike Pit", 1), "\u{2026}");
        assert_eq!(truncate_to_width("Spike Pit", 0), "");
    }

    #[test]
    fn truncate_stops_before_a_wide_char() {
        // each char is 2 cells; 5 cells fit two of them plus the ellipsis
        assert_eq!(truncate_to_width("宝箱宝箱", 5), "宝箱\u{2026}");
        assert_eq!(truncate_to_width("宝箱宝箱", 4), "宝\u{2026}");
    }

    #[test]
    fn pad_short_and_long() {
        assert_eq!(pad_to_width("ab", 4), "ab  ");
        assert_eq!(pad_to_width("宝箱", 5), "宝箱 ");
        assert_eq!(pad_to_width("abcdef", 4), "abc\u{2026}");
        assert_eq!(display_width(&pad_to_width("宝箱宝箱", 4)), 4);
    }
}
