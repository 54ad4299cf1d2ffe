//! Delete duplicated downloads that only differ in a trailing name suffix.

use anyhow::{bail, Context, Result};

use crate::{
    cli::DedupeArgs,
    dedupe::{group_by_key, remove_duplicates, DedupeReport},
};

pub fn dedupe_pdfs(args: &DedupeArgs) -> Result<DedupeReport> {
    let dir = &args.directory;
    if !dir.is_dir() {
        bail!("directory not found: `{}`", dir.display());
    }

    let groups = group_by_key(dir, &args.extension, args.trim)
        .with_context(|| format!("failed to list `{}`", dir.display()))?;

    for group in groups.iter().filter(|g| g.files.len() > 1) {
        println!("{}", group.key);
        println!("  keep   {}", group.keep().display());
        for extra in group.extras() {
            let verb = if args.dry_run { "would delete" } else { "delete" };
            println!("  {} {}", verb, extra.display());
        }
    }

    let report = remove_duplicates(&groups, args.dry_run);
    for (file, error) in &report.failed {
        eprintln!("Could not delete `{}`: {}", file.display(), error);
    }

    Ok(report)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn should_fail_on_missing_directory() {
        let dir = TempDir::new().unwrap();
        let args = DedupeArgs {
            directory: dir.path().join("absent"),
            extension: "pdf".to_string(),
            trim: 20,
            dry_run: true,
        };

        assert!(dedupe_pdfs(&args).is_err());
    }

    #[test]
    fn should_report_without_deleting_on_dry_run() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes-01.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("notes-02.pdf"), b"%PDF").unwrap();

        let args = DedupeArgs {
            directory: dir.path().to_path_buf(),
            extension: "pdf".to_string(),
            trim: 3,
            dry_run: true,
        };
        let report = dedupe_pdfs(&args).unwrap();

        assert_eq!(report.duplicate_groups, 1);
        assert_eq!(report.removed.len(), 1);
        assert!(dir.path().join("notes-02.pdf").exists());
    }
}
