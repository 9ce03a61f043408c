//! Project-root helpers for the CLI wrapper: default log-file resolution
//! and best-effort application-id discovery from the Gradle build files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::debug;

/// Directory under the project root that the log producer writes into
const LOG_DIR: &str = "logs";

/// Build files checked for an `applicationId`, most specific first
const BUILD_FILES: [&str; 4] = [
    "app/build.gradle.kts",
    "app/build.gradle",
    "build.gradle.kts",
    "build.gradle",
];

/// Resolve the log file to follow: an explicit path wins; otherwise the
/// newest regular file in the project's log directory. No candidate is a
/// startup failure, not a retry.
pub fn resolve_log_path(project: &Path, explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    let log_dir = project.join(LOG_DIR);
    let entries = fs::read_dir(&log_dir)
        .with_context(|| format!("no log file given and {} is not readable", log_dir.display()))?;

    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified()?;
        if newest.as_ref().is_none_or(|(ts, _)| modified > *ts) {
            newest = Some((modified, entry.path()));
        }
    }

    match newest {
        Some((_, path)) => Ok(path),
        None => bail!(
            "no log file given and {} contains no files",
            log_dir.display()
        ),
    }
}

/// Best-effort scan of the project's Gradle build files for the
/// application id. Any failure just means the package filter starts
/// without a value.
pub fn discover_application_id(project: &Path) -> Option<String> {
    // Matches both Groovy (`applicationId "com.x"`) and Kotlin DSL
    // (`applicationId = "com.x"`) forms.
    let pattern = Regex::new(r#"applicationId\s*=?\s*["']([^"']+)["']"#).ok()?;

    for candidate in BUILD_FILES {
        let path = project.join(candidate);
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        if let Some(caps) = pattern.captures(&content) {
            let app_id = caps[1].to_string();
            debug!(app_id, path = %path.display(), "discovered application id");
            return Some(app_id);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = PathBuf::from("/somewhere/app.log");
        let resolved = resolve_log_path(dir.path(), Some(explicit.clone())).unwrap();
        assert_eq!(resolved, explicit);
    }

    #[test]
    fn test_newest_file_in_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join(LOG_DIR);
        fs::create_dir(&log_dir).unwrap();

        let older = log_dir.join("run-1.log");
        let newer = log_dir.join("run-2.log");
        fs::write(&older, "old").unwrap();
        fs::write(&newer, "new").unwrap();

        let past = std::time::SystemTime::now() - std::time::Duration::from_secs(60);
        let file = fs::File::options().write(true).open(&older).unwrap();
        file.set_modified(past).unwrap();

        let resolved = resolve_log_path(dir.path(), None).unwrap();
        assert_eq!(resolved, newer);
    }

    #[test]
    fn test_missing_log_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_log_path(dir.path(), None).is_err());
    }

    #[test]
    fn test_empty_log_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(LOG_DIR)).unwrap();
        assert!(resolve_log_path(dir.path(), None).is_err());
    }

    #[test]
    fn test_discover_groovy_application_id() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("app")).unwrap();
        let mut file = fs::File::create(dir.path().join("app/build.gradle")).unwrap();
        writeln!(file, "android {{").unwrap();
        writeln!(file, "    defaultConfig {{").unwrap();
        writeln!(file, "        applicationId \"com.example.droid\"").unwrap();
        writeln!(file, "    }}").unwrap();
        writeln!(file, "}}").unwrap();

        assert_eq!(
            discover_application_id(dir.path()).as_deref(),
            Some("com.example.droid")
        );
    }

    #[test]
    fn test_discover_kotlin_dsl_application_id() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("build.gradle.kts"),
            "defaultConfig {\n    applicationId = \"com.example.kts\"\n}\n",
        )
        .unwrap();

        assert_eq!(
            discover_application_id(dir.path()).as_deref(),
            Some("com.example.kts")
        );
    }

    #[test]
    fn test_no_build_file_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(discover_application_id(dir.path()), None);
    }
}
