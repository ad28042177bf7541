// The list of students who need support, for import into the grading tool.

use std::path::{Path, PathBuf};

use crate::pipeline::io_common::ensure_dir;
use crate::pipeline::io_csv::write_csv_table;
use crate::pipeline::*;

pub const AUTO_COMMENT: &str = "auto_comment";

/// Only the flagged students, in survey order.
pub fn flag_table(flags: &[StudentFlag]) -> Table {
    let mut table = Table::new(vec![
        FULL_NAME.to_string(),
        USERNAME.to_string(),
        AUTO_COMMENT.to_string(),
    ]);
    for f in flags.iter().filter(|f| f.flag.is_some()) {
        table.push_row(vec![
            Cell::from_opt_str(f.full_name.as_deref()),
            Cell::from_opt_str(f.username.as_deref()),
            Cell::from_opt_str(f.flag.as_deref()),
        ]);
    }
    table
}

/// Writes the flags of a week with a byte order mark, so that spreadsheet
/// tools open it with the right encoding.
pub fn export_flags(
    output_dir: &Path,
    stamp: &str,
    week: u32,
    flags: &[StudentFlag],
    names: &OutputNames,
) -> PResult<PathBuf> {
    let dir = output_dir.join(format!("{}_{}", stamp, names.flags_directory));
    ensure_dir(&dir)?;
    let path = dir.join(format!("{}_N{}_{}.csv", stamp, week, names.flags_file));
    let table = flag_table(flags);
    write_csv_table(&path, &table, true)?;
    info!("Generated file {:?} ({} students)", path.display(), table.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::io_common::UTF8_BOM;
    use crate::pipeline::io_csv::read_csv_table;
    use std::fs;

    fn flag(name: &str, f: Option<&str>) -> StudentFlag {
        StudentFlag {
            full_name: Some(name.to_string()),
            username: Some(name.to_lowercase()),
            flag: f.map(|s| s.to_string()),
        }
    }

    #[test]
    fn only_flagged_students_are_exported() {
        let dir = tempfile::tempdir().unwrap();
        let flags = vec![
            flag("Ann", None),
            flag("Bert", Some("6.0 h mediaanist rohkem. Neutraalne enesetunne.")),
        ];
        let names = CourseVocabulary::estonian().outputs;
        let p = export_flags(dir.path(), "2024-10-01_12-00", 4, &flags, &names).unwrap();
        assert!(p.ends_with(
            "2024-10-01_12-00_Importimiseks_abi_vajavad_tudengid/2024-10-01_12-00_N4_Abi_vajavad_tudengid.csv"
        ));
        let bytes = fs::read(&p).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(
            text,
            "full_name,username,auto_comment\nBert,bert,6.0 h mediaanist rohkem. Neutraalne enesetunne.\n"
        );
    }

    #[test]
    fn no_flags_gives_a_header() {
        let t = flag_table(&[flag("Ann", None)]);
        assert!(t.is_empty());
        assert_eq!(t.header().len(), 3);
    }

    #[test]
    fn usernames_with_leading_zeros_survive_the_export() {
        let dir = tempfile::tempdir().unwrap();
        let voc = CourseVocabulary::estonian();
        let survey_path = dir.path().join("N3.csv");
        fs::write(
            &survey_path,
            "Kasutaja täisnimi,Kasutajanimi,\
             Milline oli Su enesetunne seoses selle algkursuse teemaga?,\
             Kui kaua Sul selle teema ülesannete lahendamiseks aega läks (tundides)?\n\
             Ann,ann,Väga positiivne,2\n\
             Bert,0043,Neutraalne,20\n\
             Cecil,cecil,Pigem positiivne,2\n",
        )
        .unwrap();
        let table = read_csv_table(&survey_path).unwrap();
        let survey = WeeklySurvey::from_table("N3.csv", table, &voc).unwrap();
        let flags = build_flags(&survey, &voc.feedback);
        let p = export_flags(dir.path(), "s", 3, &flags, &voc.outputs).unwrap();
        let bytes = fs::read(&p).unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert!(text.contains("Bert,0043,18.0 h mediaanist rohkem. Neutraalne enesetunne.\n"));
    }
}
