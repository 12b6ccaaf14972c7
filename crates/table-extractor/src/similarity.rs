//! Gestalt (Ratcliff/Obershelp) similarity of two labels.

/// Similarity ratio in `[0, 1]`: twice the number of matching characters
/// divided by the total length of both strings.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// Characters covered by the recursively found longest common blocks.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`, leftmost in `a`
/// then in `b` on ties. Returns `(start_a, start_b, len)`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut best = (alo, blo, 0);
    let mut prev = vec![0usize; width + 1];
    let mut cur = vec![0usize; width + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let col = j - blo;
            cur[col + 1] = if a[i] == b[j] { prev[col] + 1 } else { 0 };
            let k = cur[col + 1];
            if k > best.2 {
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings() {
        assert_eq!(ratio("Umsatz", "Umsatz"), 1.0);
        assert_eq!(ratio("", ""), 1.0);
    }

    #[test]
    fn test_disjoint_strings() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        // 6 shared characters out of 6 + 12
        let score = ratio("Umsatz", "Umsatzerlöse");
        assert!((score - 12.0 / 18.0).abs() < 1e-12);

        // "abcd" vs "bcde": block "bcd"
        assert!((ratio("abcd", "bcde") - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_recurses_into_both_sides() {
        // blocks "a", "cd" and "f" around the longest match
        let score = ratio("abcdef", "axcdyf");
        assert!((score - 8.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_near_miss_labels_score_high() {
        assert!(ratio("Gewinn je Aktie", "Gewinn pro Aktie") > 0.8);
        assert!(ratio("KGV", "KBV") < 0.8);
    }
}
