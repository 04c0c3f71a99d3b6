use crate::model::{ChangeSet, CommitRecord, Person};
use std::collections::{BTreeMap, HashSet};

/// Running totals for one window. The touched-path set only lives inside
/// the accumulator; `finalize` consumes `self`, so collapsing it into a
/// cardinality can happen exactly once.
#[derive(Debug, Default)]
pub struct Accumulator {
    count: usize,
    authors: BTreeMap<String, i64>,
    additions: i64,
    deletions: i64,
    touched: HashSet<String>,
}

#[derive(Debug)]
pub struct Totals {
    pub count: usize,
    pub authors: BTreeMap<String, i64>,
    pub changeset: ChangeSet,
}

pub fn author_key(p: &Person) -> String {
    format!("{} <{}>", p.name, p.email)
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the totals. Missing per-file counts (binary
    /// files) contribute zero.
    pub fn accumulate(&mut self, record: &CommitRecord) {
        self.count += 1;
        *self.authors.entry(author_key(&record.author)).or_insert(0) += 1;

        for f in &record.files {
            self.additions += f.additions.unwrap_or(0);
            self.deletions += f.deletions.unwrap_or(0);
            self.touched.insert(f.file.clone());
        }
    }

    pub fn finalize(self) -> Totals {
        Totals {
            count: self.count,
            authors: self.authors,
            changeset: ChangeSet {
                additions: self.additions,
                deletions: self.deletions,
                files_touched: self.touched.len(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileChange, PatchRef, Timestamps};
    use pretty_assertions::assert_eq;

    fn record(sha: &str, author: &str, files: Vec<(&str, Option<i64>, Option<i64>)>) -> CommitRecord {
        CommitRecord {
            sha: sha.into(),
            short_sha: sha.chars().take(12).collect(),
            parents: vec![],
            author: Person {
                name: author.into(),
                email: format!("{author}@example.com"),
                date: String::new(),
            },
            committer: Person {
                name: author.into(),
                email: format!("{author}@example.com"),
                date: String::new(),
            },
            timestamps: Timestamps {
                author: 0,
                commit: 0,
                author_local: String::new(),
                commit_local: String::new(),
                timezone: "utc".into(),
            },
            subject: "s".into(),
            body: String::new(),
            body_lines: None,
            files: files
                .into_iter()
                .map(|(path, additions, deletions)| FileChange {
                    file: path.into(),
                    status: "M".into(),
                    old_path: None,
                    additions,
                    deletions,
                })
                .collect(),
            diffstat_text: String::new(),
            patch_ref: PatchRef {
                embed: false,
                git_show_cmd: String::new(),
                local_patch_file: None,
                diff_url: None,
                patch_url: None,
            },
            patch: None,
            patch_clipped: None,
            pull_requests: None,
        }
    }

    #[test]
    fn accumulation_is_order_independent() {
        let a = record("a".repeat(40).as_str(), "alice", vec![("x.rs", Some(5), Some(1))]);
        let b = record("b".repeat(40).as_str(), "bob", vec![("y.rs", Some(2), Some(2)), ("x.rs", Some(1), None)]);

        let mut forward = Accumulator::new();
        forward.accumulate(&a);
        forward.accumulate(&b);
        let forward = forward.finalize();

        let mut reverse = Accumulator::new();
        reverse.accumulate(&b);
        reverse.accumulate(&a);
        let reverse = reverse.finalize();

        assert_eq!(forward.count, reverse.count);
        assert_eq!(forward.authors, reverse.authors);
        assert_eq!(forward.changeset.additions, reverse.changeset.additions);
        assert_eq!(forward.changeset.deletions, reverse.changeset.deletions);
        assert_eq!(forward.changeset.files_touched, reverse.changeset.files_touched);
    }

    #[test]
    fn files_touched_counts_distinct_paths() {
        let mut acc = Accumulator::new();
        acc.accumulate(&record(&"a".repeat(40), "alice", vec![("x.rs", Some(1), Some(0))]));
        acc.accumulate(&record(&"b".repeat(40), "alice", vec![("x.rs", Some(1), Some(0)), ("y.rs", Some(1), Some(0))]));
        acc.accumulate(&record(&"c".repeat(40), "alice", vec![("x.rs", Some(1), Some(0))]));
        let totals = acc.finalize();
        assert_eq!(totals.changeset.files_touched, 2);
        assert_eq!(totals.count, 3);
        assert_eq!(totals.authors.get("alice <alice@example.com>"), Some(&3));
    }

    #[test]
    fn missing_counts_are_treated_as_zero() {
        let mut acc = Accumulator::new();
        acc.accumulate(&record(&"a".repeat(40), "alice", vec![("blob.bin", None, None)]));
        let totals = acc.finalize();
        assert_eq!(totals.changeset.additions, 0);
        assert_eq!(totals.changeset.deletions, 0);
        assert_eq!(totals.changeset.files_touched, 1);
    }
}
