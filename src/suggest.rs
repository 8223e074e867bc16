//! Repositioning suggestions for under-populated groups.

use std::fmt;

/// Groups with fewer members than this get a suggestion.
pub const MIN_GROUP_SIZE: usize = 3;

/// Shown by callers when no group is under-populated.
pub const BALANCED_MESSAGE: &str = "All groups look balanced! No repositioning needed.";

/// A small group and the brands in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Zero-based cluster id.
    pub cluster: usize,
    /// Member labels in row order.
    pub members: Vec<String>,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Group {} is small (brands: {}). Try new ideas or move closer to other groups!",
            self.cluster + 1,
            self.members.join(", ")
        )
    }
}

/// One suggestion per non-empty cluster with fewer than `min_size` members,
/// in ascending cluster order.
///
/// `assignments` and `labels` are co-indexed; extra entries on either side
/// are ignored.
pub fn suggest(assignments: &[usize], labels: &[String], min_size: usize) -> Vec<Suggestion> {
    let k = assignments.iter().max().map_or(0, |&m| m + 1);
    let mut groups: Vec<Vec<String>> = vec![Vec::new(); k];
    for (&c, label) in assignments.iter().zip(labels) {
        groups[c].push(label.clone());
    }

    groups
        .into_iter()
        .enumerate()
        .filter(|(_, members)| !members.is_empty() && members.len() < min_size)
        .map(|(cluster, members)| Suggestion { cluster, members })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("B{}", i)).collect()
    }

    #[test]
    fn test_threshold_boundary() {
        // cluster 0 has 2 members, cluster 1 has 3
        let out = suggest(&[0, 1, 0, 1, 1], &labels(5), MIN_GROUP_SIZE);
        assert_eq!(
            out,
            vec![Suggestion {
                cluster: 0,
                members: vec!["B0".into(), "B2".into()]
            }]
        );
    }

    #[test]
    fn test_text() {
        let s = Suggestion {
            cluster: 1,
            members: vec!["Nova".into(), "Zeta".into()],
        };
        assert_eq!(
            s.to_string(),
            "Group 2 is small (brands: Nova, Zeta). Try new ideas or move closer to other groups!"
        );
    }

    #[test]
    fn test_ascending_order_and_empty_clusters() {
        // cluster 1 is empty and gets no suggestion
        let out = suggest(&[2, 0, 3, 3, 3, 3], &labels(6), MIN_GROUP_SIZE);
        let ids: Vec<usize> = out.iter().map(|s| s.cluster).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn test_balanced() {
        assert!(suggest(&[0, 0, 0, 1, 1, 1], &labels(6), MIN_GROUP_SIZE).is_empty());
        assert!(suggest(&[], &[], MIN_GROUP_SIZE).is_empty());
    }
}
