// Similarity scoring between natural-language queries.
//
// The score is the indel similarity `2 * lcs / (len_a + len_b)` over
// lower-cased characters. It is symmetric, 1.0 for equal inputs, and never
// grows when a character absent from the other string is inserted.

use rapidfuzz::distance::indel;

pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    if a == b {
        return 1.0;
    }

    indel::normalized_similarity(a.chars(), b.chars())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_queries_score_one() {
        assert_eq!(similarity("list all files", "list all files"), 1.0);
        assert_eq!(similarity("List ALL files", "list all files"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn test_disjoint_queries_score_zero() {
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            ("list all files", "list files"),
            ("show disk usage", "show memory usage"),
            ("ab", "ba"),
            ("compress the logs folder", "extract logs archive"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a), "{} / {}", a, b);
        }
    }

    #[test]
    fn test_score_is_bounded() {
        let score = similarity("find large files", "find big files in home");
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn test_unrelated_insertion_does_not_increase_score() {
        let base = similarity("list all files", "list files");
        let padded = similarity("list all files", "list files zzz");
        assert!(padded <= base);
    }

    #[test]
    fn test_case_is_ignored() {
        assert_eq!(
            similarity("LIST ALL Files", "list FILES"),
            similarity("list all files", "list files")
        );
    }

    #[test]
    fn test_known_ratio() {
        // 17 shared characters out of 20 + 20.
        assert_eq!(similarity("find large log files", "find large log fizqw"), 0.85);
        // 21 shared characters out of 25 + 25.
        assert_eq!(
            similarity("find large log files here", "find large log files zqwj"),
            0.84
        );
    }
}
