//! Edit-distance similarity between template strings.

/// Levenshtein distance between `a` and `b`, if it is at most `max`
///
/// Only the diagonal band of width `2 * max + 1` is computed and the scan
/// stops as soon as a whole row exceeds `max`, so long dissimilar strings
/// are rejected without filling the full table.
pub fn bounded_levenshtein(a: &str, b: &str, max: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());

    if n.abs_diff(m) > max {
        return None;
    }
    if n == 0 || m == 0 {
        return Some(n.max(m));
    }

    let over = max + 1;
    let mut prev = vec![over; m + 1];
    let mut curr = vec![over; m + 1];
    for (j, cell) in prev.iter_mut().enumerate().take(m.min(max) + 1) {
        *cell = j;
    }

    for i in 1..=n {
        let lo = i.saturating_sub(max).max(1);
        let hi = (i + max).min(m);

        curr[lo - 1] = if lo == 1 && i <= max { i } else { over };
        let mut row_min = curr[lo - 1];

        for j in lo..=hi {
            let substitution = prev[j - 1] + usize::from(a[i - 1] != b[j - 1]);
            let value = substitution
                .min(prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(over);
            curr[j] = value;
            row_min = row_min.min(value);
        }
        if hi < m {
            curr[hi + 1] = over;
        }

        if row_min > max {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[m];
    (distance <= max).then_some(distance)
}

/// Whether two template strings belong to the same template
///
/// Exact equality is checked first. Otherwise the edit distance divided by
/// the average length must be strictly below `threshold`. Empty strings
/// never match.
pub fn is_similar(a: &str, b: &str, threshold: f64) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }

    let average = (a.chars().count() + b.chars().count()) as f64 / 2.0;
    let limit = threshold * average;
    if limit <= 0.0 {
        return false;
    }

    // Largest integer distance strictly below the limit
    let max = (limit.ceil() as usize).saturating_sub(1);
    bounded_levenshtein(a, b, max).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_distances() {
        assert_eq!(bounded_levenshtein("kitten", "sitting", 5), Some(3));
        assert_eq!(bounded_levenshtein("kitten", "sitting", 3), Some(3));
        assert_eq!(bounded_levenshtein("kitten", "sitting", 2), None);
        assert_eq!(bounded_levenshtein("", "abc", 3), Some(3));
        assert_eq!(bounded_levenshtein("abc", "abc", 0), Some(0));
        assert_eq!(bounded_levenshtein("abc", "abd", 0), None);
        assert_eq!(bounded_levenshtein("flaw", "lawn", 4), Some(2));
    }

    #[test]
    fn test_band_agrees_with_full_table() {
        let pairs = [
            ("<div><span>a</span></div>", "<div><span>b</span></div>"),
            ("<ul><li>1</li></ul>", "<ol><li>1</li><li>2</li></ol>"),
            ("abcdef", "azced"),
            ("ünïcödé", "unicode"),
        ];
        for (a, b) in pairs {
            let full = bounded_levenshtein(a, b, a.len() + b.len()).unwrap();
            for max in 0..full {
                assert_eq!(bounded_levenshtein(a, b, max), None, "{a} / {b} at {max}");
            }
            assert_eq!(bounded_levenshtein(a, b, full), Some(full));
        }
    }

    #[test]
    fn test_similarity_threshold() {
        // 40 chars, one substitution: 1 / 40 = 0.025 is not below 0.025
        let a = "a".repeat(40);
        let mut b = "a".repeat(39);
        b.push('b');
        assert!(!is_similar(&a, &b, 0.025));

        // 80 chars, one substitution: 1 / 80 is below the threshold
        let a = "a".repeat(80);
        let mut b = "a".repeat(79);
        b.push('b');
        assert!(is_similar(&a, &b, 0.025));
    }

    #[test]
    fn test_exact_and_empty() {
        assert!(is_similar("<p></p>", "<p></p>", 0.0));
        assert!(!is_similar("", "", 0.5));
        assert!(!is_similar("", "<p></p>", 1.0));
    }
}
