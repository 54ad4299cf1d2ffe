//! Removes files whose names only differ in a trailing suffix, such as the
//! hash or timestamp reference managers append to downloaded PDFs.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

pub const DEFAULT_TRIM_CHARS: usize = 20;

/// The file stem without its last `trim` characters, or the whole stem when
/// it is not longer than `trim`.
pub fn duplicate_key(stem: &str, trim: usize) -> &str {
    let len = stem.chars().count();
    if len <= trim {
        return stem;
    }
    match stem.char_indices().nth(len - trim) {
        Some((end, _)) => &stem[..end],
        None => stem,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub key: String,
    /// Sorted by file name; the first one is kept.
    pub files: Vec<PathBuf>,
}

impl DuplicateGroup {
    pub fn keep(&self) -> &Path {
        &self.files[0]
    }

    pub fn extras(&self) -> &[PathBuf] {
        &self.files[1..]
    }
}

/// Groups the files of `dir` with the given extension (case-insensitive,
/// leading dot optional) by [`duplicate_key`]. Groups come back sorted by key.
pub fn group_by_key(dir: &Path, extension: &str, trim: usize) -> io::Result<Vec<DuplicateGroup>> {
    let extension = extension.trim_start_matches('.');
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .map(|e| e.to_string_lossy().eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if !matches {
            continue;
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = duplicate_key(&stem, trim).to_string();
        groups.entry(key).or_default().push(path);
    }

    Ok(groups
        .into_iter()
        .map(|(key, mut files)| {
            files.sort();
            DuplicateGroup { key, files }
        })
        .collect())
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DedupeReport {
    pub groups: usize,
    pub duplicate_groups: usize,
    /// Deleted files, or the files that would be deleted on a dry run.
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Keeps the first file of every group and deletes the rest. A failed
/// deletion is recorded and the run carries on.
pub fn remove_duplicates(groups: &[DuplicateGroup], dry_run: bool) -> DedupeReport {
    let mut report = DedupeReport {
        groups: groups.len(),
        ..DedupeReport::default()
    };

    for group in groups.iter().filter(|g| g.files.len() > 1) {
        report.duplicate_groups += 1;
        info!(key = %group.key, keep = %group.keep().display(), "duplicates found");

        for extra in group.extras() {
            if dry_run {
                report.removed.push(extra.clone());
                continue;
            }
            match fs::remove_file(extra) {
                Ok(()) => report.removed.push(extra.clone()),
                Err(e) => {
                    warn!(file = %extra.display(), error = %e, "could not delete");
                    report.failed.push((extra.clone(), e.to_string()));
                }
            }
        }
    }

    report
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use super::*;

    fn touch(dir: &TempDir, name: &str) {
        fs::write(dir.path().join(name), b"%PDF").unwrap();
    }

    #[test]
    fn should_make_key_from_stem() {
        assert_eq!(duplicate_key("Smith 2020 Lake levels-3f2a9c1d8e7b6a5f4c3", 20), "Smith 2020 Lake levels");
        assert_eq!(duplicate_key("short", 20), "short");
        assert_eq!(duplicate_key("exactly", 7), "exactly");
        assert_eq!(duplicate_key("abc", 0), "abc");
        assert_eq!(duplicate_key("Zürichsee-ab", 3), "Zürichsee");
    }

    #[test]
    fn should_group_case_insensitive_extension() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "paper-aaaa.pdf");
        touch(&dir, "paper-bbbb.PDF");
        touch(&dir, "other-cccc.pdf");
        touch(&dir, "paper-dddd.txt");
        fs::create_dir(dir.path().join("nested-eeee.pdf")).unwrap();

        let groups = group_by_key(dir.path(), ".pdf", 5).unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "other");
        assert_eq!(groups[1].key, "paper");
        assert_eq!(groups[1].files.len(), 2);
        assert!(groups[1].keep().ends_with("paper-aaaa.pdf"));
    }

    #[test]
    fn should_remove_all_but_first() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "report-1111.pdf");
        touch(&dir, "report-2222.pdf");
        touch(&dir, "report-3333.pdf");
        touch(&dir, "unique-4444.pdf");

        let groups = group_by_key(dir.path(), "pdf", 5).unwrap();
        let report = remove_duplicates(&groups, false);

        assert_eq!(report.groups, 2);
        assert_eq!(report.duplicate_groups, 1);
        assert_eq!(report.removed.len(), 2);
        assert!(report.failed.is_empty());
        assert!(dir.path().join("report-1111.pdf").exists());
        assert!(!dir.path().join("report-2222.pdf").exists());
        assert!(!dir.path().join("report-3333.pdf").exists());
        assert!(dir.path().join("unique-4444.pdf").exists());
    }

    #[test]
    fn should_not_delete_on_dry_run() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "a-11.pdf");
        touch(&dir, "a-22.pdf");

        let groups = group_by_key(dir.path(), "pdf", 3).unwrap();
        let report = remove_duplicates(&groups, true);

        assert_eq!(report.removed, vec![dir.path().join("a-22.pdf")]);
        assert!(dir.path().join("a-22.pdf").exists());
    }

    #[test]
    fn should_record_failed_deletion() {
        let dir = TempDir::new().unwrap();
        let group = DuplicateGroup {
            key: "gone".to_string(),
            files: vec![dir.path().join("gone-1.pdf"), dir.path().join("gone-2.pdf")],
        };

        let report = remove_duplicates(&[group], false);

        assert!(report.removed.is_empty());
        assert_eq!(report.failed.len(), 1);
    }
}
