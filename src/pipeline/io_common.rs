// Primitives shared by the readers and writers.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::pipeline::*;

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// The prefix of all the files written during one run.
pub fn run_stamp(now: &NaiveDateTime) -> String {
    now.format("%Y-%m-%d_%H-%M").to_string()
}

/// Reads a list of full names, one per line. Blank lines are skipped.
pub fn read_name_list(path: &Path) -> PResult<Vec<String>> {
    let contents = fs::read_to_string(path).context(ReadingFileSnafu {
        path: path.display().to_string(),
    })?;
    let names: Vec<String> = contents
        .lines()
        .map(|l| l.trim_start_matches('\u{feff}').trim_end())
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect();
    debug!("read_name_list: {:?}: {} names", path, names.len());
    Ok(names)
}

/// All the CSV files under a directory, recursively, in lexical order.
pub fn find_survey_files(dir: &Path) -> PResult<Vec<PathBuf>> {
    let mut res: Vec<PathBuf> = Vec::new();
    let mut pending: Vec<PathBuf> = vec![dir.to_path_buf()];
    while let Some(d) = pending.pop() {
        let entries = fs::read_dir(&d).context(ReadingFileSnafu {
            path: d.display().to_string(),
        })?;
        for entry in entries {
            let p = entry
                .context(ReadingFileSnafu {
                    path: d.display().to_string(),
                })?
                .path();
            if p.is_dir() {
                pending.push(p);
            } else if p.extension().map(|e| e == "csv").unwrap_or(false) {
                info!("Found weekly report: {}", simplify_file_name(&p));
                res.push(p);
            }
        }
    }
    res.sort();
    if res.is_empty() {
        warn!("No weekly survey files found in {:?}", dir);
    }
    Ok(res)
}

pub fn ensure_dir(path: &Path) -> PResult<()> {
    fs::create_dir_all(path).context(WritingFileSnafu {
        path: path.display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn name_lists_skip_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("no_declaration.txt");
        fs::write(&p, "Mari Maasikas\r\n\nJaan Tamm  \n").unwrap();
        assert_eq!(
            read_name_list(&p).unwrap(),
            vec!["Mari Maasikas".to_string(), "Jaan Tamm".to_string()]
        );
    }

    #[test]
    fn surveys_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("vanad")).unwrap();
        fs::write(dir.path().join("N8.csv"), "").unwrap();
        fs::write(dir.path().join("N10.csv"), "").unwrap();
        fs::write(dir.path().join("vanad").join("N1.csv"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let names: Vec<String> = find_survey_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| simplify_file_name(p))
            .collect();
        assert_eq!(names, vec!["N10.csv", "N8.csv", "N1.csv"]);
    }

    #[test]
    fn stamps() {
        let now = NaiveDate::from_ymd_opt(2024, 12, 10)
            .unwrap()
            .and_hms_opt(9, 26, 3)
            .unwrap();
        assert_eq!(run_stamp(&now), "2024-12-10_09-26");
    }
}
