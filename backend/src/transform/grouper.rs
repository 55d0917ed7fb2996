//! Group detail rows by rebate name and synthesize one header row per group.
//!
//! ```text
//! Input (detail rows)               →  Header rows (first-seen order)
//! ┌──────────────────────────────┐    ┌──────────────────────────────┐
//! │ Rebate: B, Amount: 10        │    │ Rebate: B, Level: Header     │
//! │ Rebate: A, Amount: 20        │ →  │ Rebate: A, Level: Header     │
//! │ Rebate: B, Amount: 30        │    └──────────────────────────────┘
//! └──────────────────────────────┘
//! ```
//!
//! A header row is a copy of its group's first row with the tier set to
//! `Header` and every detail-only column blanked.

use std::collections::HashMap;

use crate::models::Tier;

/// Distinct grouping-key values with the input rows belonging to each.
#[derive(Debug, Clone, Default)]
pub struct Groups {
    keys: Vec<String>,
    members: Vec<Vec<usize>>,
    lookup: HashMap<String, usize>,
}

impl Groups {
    /// Index rows by the value in column `key_idx`.
    ///
    /// Groups keep the order in which each key first appears; a row with no
    /// value at `key_idx` falls into the empty-string group.
    pub fn build(rows: &[Vec<String>], key_idx: usize) -> Self {
        let mut groups = Groups::default();
        for (row_idx, row) in rows.iter().enumerate() {
            let key = row.get(key_idx).map(String::as_str).unwrap_or("");
            let group = match groups.lookup.get(key) {
                Some(&g) => g,
                None => {
                    let g = groups.keys.len();
                    groups.lookup.insert(key.to_string(), g);
                    groups.keys.push(key.to_string());
                    groups.members.push(Vec::new());
                    g
                }
            };
            groups.members[group].push(row_idx);
        }
        groups
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Row indices of the group at `group`, in input order.
    pub fn members(&self, group: usize) -> &[usize] {
        &self.members[group]
    }

    /// First-seen position of `key`.
    pub fn rank_of(&self, key: &str) -> Option<usize> {
        self.lookup.get(key).copied()
    }
}

/// Build one header row per group from the group's first row.
///
/// `level_idx` receives [`Tier::Header`]; every index in `blank_idxs` is
/// cleared.
pub fn synthesize_headers(
    rows: &[Vec<String>],
    groups: &Groups,
    level_idx: usize,
    blank_idxs: &[usize],
) -> Vec<Vec<String>> {
    (0..groups.len())
        .filter_map(|g| groups.members(g).first())
        .map(|&first| {
            let mut header = rows[first].clone();
            header[level_idx] = Tier::Header.as_str().to_string();
            for &idx in blank_idxs {
                header[idx].clear();
            }
            header
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|v| v.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let data = rows(&[&["B", "1"], &["A", "2"], &["B", "3"], &["C", "4"]]);
        let groups = Groups::build(&data, 0);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups.rank_of("B"), Some(0));
        assert_eq!(groups.rank_of("A"), Some(1));
        assert_eq!(groups.members(0), &[0, 2]);
        assert_eq!(groups.members(1), &[1]);
        assert_eq!(groups.rank_of("C"), Some(2));
        assert_eq!(groups.rank_of("Z"), None);
    }

    #[test]
    fn test_empty_keys_share_one_group() {
        let data = rows(&[&["", "1"], &["X", "2"], &["", "3"]]);
        let groups = Groups::build(&data, 0);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups.members(0), &[0, 2]);
    }

    #[test]
    fn test_header_from_first_row_with_details_blanked() {
        let data = rows(&[
            &["X", "", "Flat", "100", "keep"],
            &["X", "", "Pct", "5", "other"],
        ]);
        let groups = Groups::build(&data, 0);
        let headers = synthesize_headers(&data, &groups, 1, &[2, 3]);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0], vec!["X", "Header", "", "", "keep"]);
    }

    #[test]
    fn test_no_rows_no_headers() {
        let groups = Groups::build(&[], 0);
        assert!(groups.is_empty());
        assert!(synthesize_headers(&[], &groups, 0, &[]).is_empty());
    }
}
