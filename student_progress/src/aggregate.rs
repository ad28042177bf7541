use log::{debug, info};

use std::collections::BTreeMap;

use snafu::prelude::*;

use crate::config::*;
use crate::error::*;
use crate::roster::Roster;
use crate::table::Cell;

/// The week number of a weekly column (`12_kohal` is week 12), if the rest of
/// the name contains the keyword.
fn week_of_column(name: &str, keyword: &str) -> Option<u32> {
    let (week, rest) = name.split_once('_')?;
    if !rest.contains(keyword) || week.is_empty() || !week.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    week.parse::<u32>().ok()
}

/// The weekly columns of the roster containing the keyword, for the weeks in
/// `[first, last]`, in roster order.
pub fn matching_week_columns(
    roster: &Roster,
    first: u32,
    last: u32,
    keyword: &str,
) -> RosterResult<Vec<String>> {
    let res: Vec<String> = roster
        .columns()
        .iter()
        .filter(|c| matches!(week_of_column(c, keyword), Some(w) if w >= first && w <= last))
        .cloned()
        .collect();
    ensure!(
        !res.is_empty(),
        NoMatchingColumnsSnafu {
            keyword: keyword.to_string(),
            first,
            last
        }
    );
    debug!("matching_week_columns: {:?}", res);
    Ok(res)
}

/// The attendance of one student over several weeks.
///
/// Missing answers count as empty strings. If more than half of the weeks
/// (plus one) are missing, the student did not respond. Otherwise the most
/// frequent answer wins. A tie that involves the "yes" answer means that the
/// student attended half of the time. Other ties go to the answer that comes
/// first in lexical order.
pub fn label_attendance(answers: &[Option<&str>], texts: &AttendanceTexts) -> String {
    let total = answers.len() as f64;
    let empty = answers
        .iter()
        .filter(|a| a.map(|s| s.is_empty()).unwrap_or(true))
        .count() as f64;
    if empty > total / 2.0 + 1.0 {
        return texts.no_response.clone();
    }
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for a in answers.iter().flatten().filter(|s| !s.is_empty()) {
        *counts.entry(*a).or_insert(0) += 1;
    }
    let max_count = match counts.values().max() {
        Some(m) => *m,
        None => return texts.no_response.clone(),
    };
    let tied: Vec<&str> = counts
        .iter()
        .filter(|(_, c)| **c == max_count)
        .map(|(s, _)| *s)
        .collect();
    if tied.len() > 1 && tied.contains(&texts.yes.as_str()) {
        return texts.split.clone();
    }
    tied[0].to_string()
}

/// The mean of the present values, None if all are missing.
pub fn mean_of_present(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().cloned().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

fn cells_by_row<'a>(roster: &'a Roster, columns: &[String]) -> Vec<Vec<&'a Cell>> {
    let indexes: Vec<usize> = columns
        .iter()
        .filter_map(|c| roster.column_index(c))
        .collect();
    roster
        .rows()
        .iter()
        .map(|r| indexes.iter().map(|i| &r.cells()[*i]).collect())
        .collect()
}

/// The most frequent attendance answer of each student over the weeks `[first, last]`.
pub fn mode_of_attendance(
    roster: &Roster,
    first: u32,
    last: u32,
    vocabulary: &CourseVocabulary,
) -> RosterResult<Vec<Cell>> {
    let columns = matching_week_columns(roster, first, last, &vocabulary.suffixes.attendance)?;
    let res = cells_by_row(roster, &columns)
        .iter()
        .map(|cells| {
            let texts: Vec<Option<String>> = cells.iter().map(|c| c.as_text()).collect();
            let answers: Vec<Option<&str>> = texts.iter().map(|t| t.as_deref()).collect();
            Cell::text(&label_attendance(&answers, &vocabulary.attendance))
        })
        .collect();
    Ok(res)
}

/// The mean time spent by each student over the weeks `[first, last]`.
pub fn mean_time_spent(
    roster: &Roster,
    first: u32,
    last: u32,
    vocabulary: &CourseVocabulary,
) -> RosterResult<Vec<Cell>> {
    let columns = matching_week_columns(roster, first, last, &vocabulary.suffixes.time_spent)?;
    let res = cells_by_row(roster, &columns)
        .iter()
        .map(|cells| {
            let values: Vec<Option<f64>> = cells.iter().map(|c| c.as_f64()).collect();
            Cell::from_opt_f64(mean_of_present(&values))
        })
        .collect();
    Ok(res)
}

/// Writes the attendance mode of the weeks `[first, last]` into the roster.
///
/// Returns the name of the new column.
pub fn add_attendance_mode_column(
    roster: &mut Roster,
    first: u32,
    last: u32,
    vocabulary: &CourseVocabulary,
) -> RosterResult<String> {
    let values = mode_of_attendance(roster, first, last, vocabulary)?;
    let name = vocabulary.suffixes.attendance_mode_column(first, last);
    info!("Adding column {:?}", name);
    roster.set_column(&name, values);
    Ok(name)
}

/// Writes the mean time spent of the weeks `[first, last]` into the roster.
///
/// Returns the name of the new column.
pub fn add_mean_time_column(
    roster: &mut Roster,
    first: u32,
    last: u32,
    vocabulary: &CourseVocabulary,
) -> RosterResult<String> {
    let values = mean_time_spent(roster, first, last, vocabulary)?;
    let name = vocabulary.suffixes.mean_time_column(first, last);
    info!("Adding column {:?}", name);
    roster.set_column(&name, values);
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    fn texts() -> AttendanceTexts {
        CourseVocabulary::estonian().attendance
    }

    fn label(answers: &[&str]) -> String {
        let a: Vec<Option<&str>> = answers
            .iter()
            .map(|s| if s.is_empty() { None } else { Some(*s) })
            .collect();
        label_attendance(&a, &texts())
    }

    #[test]
    fn most_frequent_answer() {
        assert_eq!(label(&["Jah", "Jah", "Ei"]), "Jah");
        assert_eq!(label(&["Ei", "Ei", "Jah", ""]), "Ei");
    }

    #[test]
    fn half_missing_is_not_silence() {
        // 2 missing out of 4 does not exceed 4 / 2 + 1.
        assert_eq!(label(&["Jah", "Ei", "", ""]), "Pooltel kordadel");
        assert_eq!(label(&["Ei", "", "", ""]), "Ei");
        assert_eq!(label(&["", "", "", "", "Jah"]), "Ei vastanud");
    }

    #[test]
    fn no_answers_at_all() {
        assert_eq!(label(&["", ""]), "Ei vastanud");
        assert_eq!(label(&[""]), "Ei vastanud");
    }

    #[test]
    fn ties_without_yes_are_lexical() {
        assert_eq!(
            label(&["Ei, sest ei olnud vaja", "Ei, sest ei leidnud aega"]),
            "Ei, sest ei leidnud aega"
        );
    }

    #[test]
    fn means() {
        assert_eq!(mean_of_present(&[None, None]), None);
        assert_eq!(mean_of_present(&[Some(2.0), None, Some(4.0)]), Some(3.0));
    }

    fn roster() -> Roster {
        let mut t = Table::new(
            [
                FULL_NAME, USERNAME, EMAIL, "6_kohal", "6_ajakulu", "7_kohal", "7_ajakulu",
                "11_kohal", "12_kohal", "17_kohal",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        );
        t.push_row(vec![
            Cell::text("Ann"),
            Cell::text("ann"),
            Cell::Empty,
            Cell::text("Ei"),
            Cell::Number(2.0),
            Cell::text("Jah"),
            Cell::Empty,
            Cell::text("Jah"),
            Cell::text("Jah"),
            Cell::text("Ei"),
        ]);
        t.push_row(vec![
            Cell::text("Bert"),
            Cell::text("bert"),
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
        ]);
        Roster::from_table(t).unwrap()
    }

    #[test]
    fn week_ranges_match_the_week_number() {
        let r = roster();
        assert_eq!(
            matching_week_columns(&r, 7, 12, "kohal").unwrap(),
            vec!["7_kohal", "11_kohal", "12_kohal"]
        );
        assert_eq!(
            matching_week_columns(&r, 1, 1, "kohal").map_err(|e| e.to_string()),
            Err("No \"kohal\" columns found for weeks 1-1. Run the weekly feedback analysis first.".to_string())
        );
    }

    #[test]
    fn aggregates_are_written_back() {
        let voc = CourseVocabulary::estonian();
        let mut r = roster();
        let mode = add_attendance_mode_column(&mut r, 6, 7, &voc).unwrap();
        assert_eq!(mode, "Mood_kohapeal_N6-7");
        let v: Vec<String> = r.column(&mode).unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(v, vec!["Pooltel kordadel", "Ei vastanud"]);

        let mean = add_mean_time_column(&mut r, 6, 7, &voc).unwrap();
        assert_eq!(mean, "Ajakulu_N6-7_ar_keskm");
        let v: Vec<Option<f64>> = r.column(&mean).unwrap().iter().map(|c| c.as_f64()).collect();
        assert_eq!(v, vec![Some(2.0), None]);

        // Running the aggregation again replaces the column.
        let width = r.columns().len();
        add_mean_time_column(&mut r, 6, 7, &voc).unwrap();
        assert_eq!(r.columns().len(), width);
    }

    #[test]
    fn aggregate_without_columns_fails() {
        let voc = CourseVocabulary::estonian();
        let mut r = roster();
        assert!(matches!(
            add_mean_time_column(&mut r, 8, 10, &voc),
            Err(RosterError::NoMatchingColumns { .. })
        ));
    }
}
