use regex::Regex;

/// One lexed line of a unified diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiffLine<'a> {
    /// `diff --git ...` — boundary between per-file sections.
    FileBoundary,
    /// `+++ b/<path>` — header naming the post-change file.
    NewFile(&'a str),
    /// `@@ -old[,n] +new[,m] @@` — carries the new-file start line.
    Hunk(u64),
    Added,
    Removed,
    Context,
    /// `+++` or `@@` lines that do not match the expected shape
    /// (e.g. `+++ /dev/null`). Skipped entirely.
    Unrecognized,
}

struct Lexer {
    path_re: Regex,
    hunk_re: Regex,
}

impl Lexer {
    fn new() -> Self {
        Self {
            path_re: Regex::new(r"^\+\+\+ b/(.*)").unwrap(),
            hunk_re: Regex::new(r"^@@ -\d+(?:,\d+)? \+(\d+)(?:,\d+)? @@").unwrap(),
        }
    }

    fn classify<'a>(&self, line: &'a str) -> DiffLine<'a> {
        if line.starts_with("diff --git") {
            DiffLine::FileBoundary
        } else if line.starts_with("+++") {
            match self.path_re.captures(line) {
                Some(caps) => DiffLine::NewFile(caps.get(1).map_or("", |m| m.as_str())),
                None => DiffLine::Unrecognized,
            }
        } else if line.starts_with("@@") {
            match self
                .hunk_re
                .captures(line)
                .and_then(|caps| caps[1].parse::<u64>().ok())
            {
                Some(start) => DiffLine::Hunk(start),
                None => DiffLine::Unrecognized,
            }
        } else if line.starts_with('+') {
            DiffLine::Added
        } else if line.starts_with('-') {
            DiffLine::Removed
        } else {
            DiffLine::Context
        }
    }
}

/// Per-file added-line numbers in new-file coordinates, in diff order.
///
/// A path that appeared in a `+++ b/` header but gained no lines keeps an
/// empty entry; a path never mentioned has none. Both resolve to "no
/// inline anchor" downstream, but the index itself keeps them apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedLineIndex {
    entries: Vec<(String, Vec<u64>)>,
}

impl ChangedLineIndex {
    fn ensure_entry(&mut self, path: &str) -> usize {
        match self.entries.iter().position(|(p, _)| p == path) {
            Some(slot) => slot,
            None => {
                self.entries.push((path.to_string(), Vec::new()));
                self.entries.len() - 1
            }
        }
    }

    fn push_line(&mut self, slot: usize, line: u64) {
        self.entries[slot].1.push(line);
    }

    /// Whether the path appeared in a diff header at all.
    pub fn contains_file(&self, path: &str) -> bool {
        self.entries.iter().any(|(p, _)| p == path)
    }

    /// Added-line numbers for a path, if the path appeared in the diff.
    pub fn lines(&self, path: &str) -> Option<&[u64]> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, lines)| lines.as_slice())
    }

    /// Paths in diff order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The changed line for `path` closest to `target`, or `None` when the
    /// path is absent or gained no lines. Ties pick the smaller line
    /// number, so identical input always resolves identically.
    pub fn nearest_line(&self, path: &str, target: i64) -> Option<u64> {
        let lines = self.lines(path)?;
        let mut best: Option<(u64, u64)> = None;
        for &candidate in lines {
            let distance = (candidate as i64).abs_diff(target);
            match best {
                Some((_, d)) if distance >= d => {}
                _ => best = Some((candidate, distance)),
            }
        }
        best.map(|(line, _)| line)
    }
}

/// Parse unified-diff text into a [`ChangedLineIndex`].
///
/// A single pass: each line is lexed into a [`DiffLine`] token, then folded
/// through an accumulator of (current file, new-file line cursor). Added
/// lines record the cursor and advance it, context lines advance it without
/// recording, removed lines leave it alone (they hold no position in the
/// new file). Every hunk header resynchronizes the cursor, so hunks need
/// not be contiguous. Malformed input never fails; unrecognizable text
/// simply contributes nothing to the index.
pub fn parse_diff(text: &str) -> ChangedLineIndex {
    let lexer = Lexer::new();
    let mut index = ChangedLineIndex::default();
    let mut current: Option<usize> = None;
    let mut cursor: u64 = 0;

    for line in text.lines() {
        match lexer.classify(line) {
            DiffLine::FileBoundary => current = None,
            DiffLine::NewFile(path) => current = Some(index.ensure_entry(path)),
            DiffLine::Hunk(start) => cursor = start,
            DiffLine::Added => {
                if let Some(slot) = current {
                    index.push_line(slot, cursor);
                    cursor += 1;
                }
            }
            DiffLine::Context => {
                if current.is_some() {
                    cursor += 1;
                }
            }
            DiffLine::Removed | DiffLine::Unrecognized => {}
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_DIFF: &str = "\
--- a/a.py
+++ b/a.py
@@ -10,2 +10,3 @@
 context
+added1
+added2
";

    #[test]
    fn test_context_occupies_position_additions_follow() {
        let index = parse_diff(SIMPLE_DIFF);
        assert_eq!(index.lines("a.py"), Some(&[11, 12][..]));
    }

    #[test]
    fn test_multiple_hunks_accumulate_in_order() {
        let diff = "\
diff --git a/src/lib.rs b/src/lib.rs
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,3 +1,4 @@
 fn one() {}
+fn added_early() {}
 fn two() {}
 fn three() {}
@@ -20,2 +21,4 @@
 fn twenty() {}
+fn added_late() {}
+fn added_later() {}
 fn twenty_one() {}
";
        let index = parse_diff(diff);
        assert_eq!(index.lines("src/lib.rs"), Some(&[2, 22, 23][..]));
    }

    #[test]
    fn test_hunk_header_resynchronizes_cursor() {
        // Second hunk starts far from where the first left off.
        let diff = "\
+++ b/f.rs
@@ -1,1 +1,2 @@
+first
 ctx
@@ -100,1 +200,2 @@
 ctx
+second
";
        let index = parse_diff(diff);
        assert_eq!(index.lines("f.rs"), Some(&[1, 201][..]));
    }

    #[test]
    fn test_independent_files_get_independent_sequences() {
        let diff = "\
diff --git a/a.rs b/a.rs
--- a/a.rs
+++ b/a.rs
@@ -1,1 +1,2 @@
 ctx
+in a
diff --git a/b.rs b/b.rs
--- a/b.rs
+++ b/b.rs
@@ -5,1 +5,2 @@
+in b
 ctx
";
        let index = parse_diff(diff);
        assert_eq!(index.lines("a.rs"), Some(&[2][..]));
        assert_eq!(index.lines("b.rs"), Some(&[5][..]));
        let files: Vec<&str> = index.files().collect();
        assert_eq!(files, ["a.rs", "b.rs"]);
    }

    #[test]
    fn test_header_without_additions_yields_empty_entry() {
        let diff = "\
diff --git a/mod.rs b/mod.rs
--- a/mod.rs
+++ b/mod.rs
@@ -3,2 +3,1 @@
 ctx
-gone
";
        let index = parse_diff(diff);
        assert!(index.contains_file("mod.rs"));
        assert_eq!(index.lines("mod.rs"), Some(&[][..]));
        assert_eq!(index.nearest_line("mod.rs", 3), None);
    }

    #[test]
    fn test_removed_lines_do_not_advance_cursor() {
        let diff = "\
+++ b/x.rs
@@ -1,3 +1,3 @@
 ctx
-removed
+replacement
 ctx
";
        let index = parse_diff(diff);
        // ctx -> 2, removed skipped, replacement lands on 2.
        assert_eq!(index.lines("x.rs"), Some(&[2][..]));
    }

    #[test]
    fn test_lines_before_any_header_are_ignored() {
        let diff = "\
+stray addition
 stray context
+++ b/real.rs
@@ -1,1 +1,2 @@
 ctx
+added
";
        let index = parse_diff(diff);
        assert_eq!(index.lines("real.rs"), Some(&[2][..]));
        assert!(!index.contains_file("stray addition"));
    }

    #[test]
    fn test_hunk_header_without_counts() {
        let diff = "\
+++ b/tiny.rs
@@ -7 +7 @@
+only
";
        let index = parse_diff(diff);
        assert_eq!(index.lines("tiny.rs"), Some(&[7][..]));
    }

    #[test]
    fn test_dev_null_header_does_not_create_entry() {
        let diff = "\
diff --git a/deleted.rs b/deleted.rs
--- a/deleted.rs
+++ /dev/null
@@ -1,2 +0,0 @@
-gone
-gone too
";
        let index = parse_diff(diff);
        assert!(index.is_empty());
    }

    #[test]
    fn test_malformed_input_degrades_to_empty_index() {
        assert!(parse_diff("").is_empty());
        assert!(parse_diff("not a diff at all\njust prose\n").is_empty());
    }

    #[test]
    fn test_file_boundary_resets_current_file() {
        // Additions after a boundary but before the next +++ go nowhere.
        let diff = "\
+++ b/a.rs
@@ -1,1 +1,2 @@
+kept
 ctx
diff --git a/b.rs b/b.rs
+orphan
";
        let index = parse_diff(diff);
        assert_eq!(index.lines("a.rs"), Some(&[1][..]));
        let files: Vec<&str> = index.files().collect();
        assert_eq!(files, ["a.rs"]);
    }

    #[test]
    fn test_sequences_are_strictly_increasing() {
        let diff = "\
+++ b/big.rs
@@ -1,5 +1,8 @@
 ctx
+a
 ctx
+b
+c
 ctx
@@ -50,2 +53,3 @@
 ctx
+d
 ctx
";
        let index = parse_diff(diff);
        let lines = index.lines("big.rs").unwrap();
        assert!(lines.windows(2).all(|w| w[0] < w[1]), "{lines:?}");
        assert_eq!(lines, &[2, 4, 5, 54]);
    }

    // --- nearest_line ---

    fn sample_index() -> ChangedLineIndex {
        parse_diff(SIMPLE_DIFF)
    }

    #[test]
    fn test_nearest_exact_match() {
        assert_eq!(sample_index().nearest_line("a.py", 11), Some(11));
    }

    #[test]
    fn test_nearest_prefers_closer_candidate() {
        // |12 - 15| = 3 beats |11 - 15| = 4.
        assert_eq!(sample_index().nearest_line("a.py", 15), Some(12));
    }

    #[test]
    fn test_nearest_tie_picks_smaller_line() {
        let index = parse_diff(
            "\
+++ b/u.rs
@@ -1,3 +1,5 @@
 ctx
+a
 ctx
+b
 ctx
",
        );
        assert_eq!(index.lines("u.rs"), Some(&[2, 4][..]));
        // 2 and 4 are equidistant from 3; the smaller line wins.
        assert_eq!(index.nearest_line("u.rs", 3), Some(2));
    }

    #[test]
    fn test_nearest_absent_file_unresolved() {
        assert_eq!(sample_index().nearest_line("missing.py", 5), None);
    }

    #[test]
    fn test_nearest_tolerates_wild_targets() {
        let index = sample_index();
        assert_eq!(index.nearest_line("a.py", 0), Some(11));
        assert_eq!(index.nearest_line("a.py", -40), Some(11));
        assert_eq!(index.nearest_line("a.py", i64::MAX / 4), Some(12));
    }

    #[test]
    fn test_nearest_is_idempotent() {
        let index = sample_index();
        let first = index.nearest_line("a.py", 15);
        for _ in 0..3 {
            assert_eq!(index.nearest_line("a.py", 15), first);
        }
    }
}
