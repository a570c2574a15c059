use crate::markup::text;

#[cfg(test)]
mod fragment_tests {
    use super::*;

    #[test]
    fn test_join_drops_empty_fragments() {
        let result = text::join_fragments(["  Hello ", "\n\t", "world!  "]);
        assert_eq!(result, "Hello world!");
    }

    #[test]
    fn test_join_collapses_inner_whitespace() {
        let result = text::join_fragments(["Buy    now", "  and\n save"]);
        assert_eq!(result, "Buy now and save");
    }

    #[test]
    fn test_join_keeps_fragment_boundaries_as_single_spaces() {
        let result = text::join_fragments(["Line 1\n", "\nLine  2"]);
        assert_eq!(result, "Line 1 Line 2");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(text::join_fragments(Vec::<&str>::new()), "");
        assert_eq!(text::normalize_whitespace_in_segment("   "), "");
    }
}

#[cfg(test)]
mod escape_tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert_eq!(text::escape_text("a < b & c > d"), "a &lt; b &amp; c &gt; d");
    }

    #[test]
    fn test_escape_attribute() {
        assert_eq!(text::escape_attribute("say \"hi\" & go"), "say &quot;hi&quot; &amp; go");
    }
}
