//! Structural locator to style-selector translation.
//!
//! A pure string transform: each step is kept verbatim except for a trailing
//! `[n]` index, which becomes `:nth-child(n)`. Steps are joined with single
//! spaces. A `(path)[k]` wrapper contributes `:nth-child(k)` to the last step.

use super::{split_positional_wrapper, split_steps};

/// Translates a structural locator; total and deterministic for any input
pub fn to_css_selector(locator: &str) -> String {
    let locator = locator.trim();
    let (path, wrapper_position) = match split_positional_wrapper(locator) {
        Some((inner, position)) => (inner, Some(position)),
        None => (locator, None),
    };

    let (segments, _) = split_steps(path);
    let mut steps: Vec<String> = segments
        .into_iter()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(translate_step)
        .collect();

    if let (Some(position), Some(last)) = (wrapper_position, steps.last_mut()) {
        last.push_str(&format!(":nth-child({position})"));
    }

    steps.join(" ")
}

fn translate_step(step: &str) -> String {
    match trailing_index(step) {
        Some((head, index)) => format!("{head}:nth-child({index})"),
        None => step.to_string(),
    }
}

/// Splits `head[n]` into `head` and `n` when the step ends in a numeric index
fn trailing_index(step: &str) -> Option<(&str, &str)> {
    let without_close = step.strip_suffix(']')?;
    let open = without_close.rfind('[')?;
    let index = &without_close[open + 1..];
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((&step[..open], index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_suffix_becomes_nth_child() {
        assert_eq!(
            to_css_selector("/html/body/div[2]/span"),
            "html body div:nth-child(2) span"
        );
        assert_eq!(to_css_selector("//ul/li[3]"), "ul li:nth-child(3)");
    }

    #[test]
    fn test_attribute_steps_are_kept_verbatim() {
        assert_eq!(
            to_css_selector(r#"//nav/a[contains(@class,"link")]"#),
            r#"nav a[contains(@class,"link")]"#
        );
        assert_eq!(
            to_css_selector(r#"//div[contains(@class,"card")][2]"#),
            r#"div[contains(@class,"card")]:nth-child(2)"#
        );
    }

    #[test]
    fn test_positional_wrapper_applies_to_last_step() {
        assert_eq!(
            to_css_selector("(//body/ul/li)[3]"),
            "body ul li:nth-child(3)"
        );
    }

    #[test]
    fn test_slashes_inside_values_do_not_split() {
        assert_eq!(
            to_css_selector(r#"//a[contains(@title,"and/or")]"#),
            r#"a[contains(@title,"and/or")]"#
        );
    }

    #[test]
    fn test_total_on_odd_input() {
        for input in ["", "/", "//", "div", "//div[", "]]//[[", "(//x)[", "//p[-1]", "//é[1]"] {
            let first = to_css_selector(input);
            assert_eq!(first, to_css_selector(input));
        }
        assert_eq!(to_css_selector(""), "");
        assert_eq!(to_css_selector("//é[1]"), "é:nth-child(1)");
    }
}
