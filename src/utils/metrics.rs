//! Edit-distance metrics for scoring predictions against ground truth.

/// Character-level Levenshtein distance.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Edit distance divided by the length of the prediction.
///
/// An empty prediction scores `0.0` against empty truth and `1.0` otherwise.
pub fn normalized_edit_distance(predicted: &str, truth: &str) -> f32 {
    let len = predicted.chars().count();
    if len == 0 {
        return if truth.is_empty() { 0.0 } else { 1.0 };
    }
    edit_distance(predicted, truth) as f32 / len as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("HELLO", "HELLO"), 0);
    }

    #[test]
    fn test_normalized_edit_distance_divides_by_prediction() {
        assert_eq!(normalized_edit_distance("HELO", "HELLO"), 0.25);
        assert_eq!(normalized_edit_distance("", ""), 0.0);
        assert_eq!(normalized_edit_distance("", "HELLO"), 1.0);
    }
}
