use log::{debug, info, warn};

use std::collections::HashMap;

use crate::config::ColumnSuffixes;
use crate::feedback::StudentFlag;
use crate::roster::Roster;
use crate::survey::WeeklySurvey;
use crate::table::Cell;

/// The values of one student that are added to the roster for one week.
#[derive(PartialEq, Debug, Clone)]
pub struct WeekRow {
    pub full_name: String,
    pub time_spent: Option<f64>,
    pub in_person: Option<String>,
    pub flag: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct MergeReport {
    /// Roster rows that received values.
    pub matched: usize,
    /// Names in the survey that are not in the roster.
    pub unmatched: Vec<String>,
    /// Names that answered more than once. Only the last answer is kept.
    pub repeated: Vec<String>,
    pub columns: Vec<String>,
}

/// Pairs the answers of a week with their flags (as returned by
/// [crate::build_flags]). Answers without a name are dropped.
pub fn derive_week_rows(survey: &WeeklySurvey, flags: &[StudentFlag]) -> Vec<WeekRow> {
    survey
        .responses()
        .iter()
        .zip(flags.iter())
        .filter_map(|(r, f)| {
            r.full_name.as_ref().map(|name| WeekRow {
                full_name: name.clone(),
                time_spent: r.time_spent,
                in_person: r.in_person.clone(),
                flag: f.flag.clone(),
            })
        })
        .collect()
}

/// Merges the columns of one week into the roster.
///
/// This is a left join keyed on the full name: the roster keeps all its rows
/// and students who did not answer get empty cells. The columns are named
/// `{week}_{suffix}`. Merging the same week again overwrites these columns
/// instead of adding new ones.
pub fn merge_week(
    roster: &mut Roster,
    week: u32,
    rows: &[WeekRow],
    suffixes: &ColumnSuffixes,
) -> MergeReport {
    let mut report = MergeReport::default();

    let mut by_name: HashMap<&str, &WeekRow> = HashMap::new();
    for r in rows {
        if by_name.insert(r.full_name.as_str(), r).is_some() {
            warn!(
                "Week {}: {} answered more than once, keeping the last answer",
                week, r.full_name
            );
            report.repeated.push(r.full_name.clone());
        }
    }

    let mut time_spent: Vec<Cell> = Vec::with_capacity(roster.len());
    let mut in_person: Vec<Cell> = Vec::with_capacity(roster.len());
    let mut problems: Vec<Cell> = Vec::with_capacity(roster.len());
    for student in roster.rows() {
        match by_name.remove(student.full_name.as_str()) {
            Some(wr) => {
                report.matched += 1;
                time_spent.push(Cell::from_opt_f64(wr.time_spent));
                in_person.push(Cell::from_opt_str(wr.in_person.as_deref()));
                problems.push(Cell::from_opt_str(wr.flag.as_deref()));
            }
            None => {
                time_spent.push(Cell::Empty);
                in_person.push(Cell::Empty);
                problems.push(Cell::Empty);
            }
        }
    }

    let mut unmatched: Vec<String> = by_name.keys().map(|s| s.to_string()).collect();
    unmatched.sort();
    if !unmatched.is_empty() {
        warn!(
            "Week {}: {} answers do not match any student of the roster: {:?}",
            week,
            unmatched.len(),
            unmatched
        );
    }
    report.unmatched = unmatched;

    for (suffix, values) in [
        (&suffixes.time_spent, time_spent),
        (&suffixes.attendance, in_person),
        (&suffixes.problems, problems),
    ] {
        let name = suffixes.week_column(week, suffix);
        debug!("merge_week: writing column {:?}", name);
        roster.set_column(&name, values);
        report.columns.push(name);
    }
    info!(
        "Week {}: merged {} answers into the roster ({} students)",
        week,
        report.matched,
        roster.len()
    );
    report
}
