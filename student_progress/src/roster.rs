use log::{debug, info, warn};

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use snafu::prelude::*;

use crate::config::*;
use crate::error::*;
use crate::progress::{label_progress, sum_points};
use crate::table::{Cell, Table};

/// One student of the roster.
#[derive(PartialEq, Debug, Clone)]
pub struct RosterRow {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub groups: Option<String>,
    /// None until the micro-credential list has been applied.
    pub micro: Option<bool>,
    /// Days since the last visit of the course, None without any visit.
    pub last_active: Option<i64>,
    // Aligned with the columns of the roster.
    cells: Vec<Cell>,
}

impl RosterRow {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

/// The persistent table of all the students of the course.
///
/// The identity fields are typed. All the other columns (grade columns,
/// weekly columns, aggregates) are kept in insertion order, and new
/// columns are only ever appended.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Roster {
    columns: Vec<String>,
    rows: Vec<RosterRow>,
}

const IDENTITY_COLUMNS: [&str; 6] = [FULL_NAME, USERNAME, EMAIL, GROUPS, MICRO, LAST_ACTIVE];

impl Roster {
    /// Builds the roster from the grades export.
    ///
    /// The full name of a student is the given name followed by the family name.
    pub fn from_grades(mut table: Table, vocabulary: &CourseVocabulary) -> RosterResult<Roster> {
        table.rename_columns(&vocabulary.grades_columns);
        let given_idx = table.require_column(&vocabulary.given_name_column, "grades")?;
        let family_idx = table.require_column(&vocabulary.family_name_column, "grades")?;
        let username_idx = table.require_column(USERNAME, "grades")?;
        let email_idx = table.require_column(EMAIL, "grades")?;
        let groups_idx = table.column_index(GROUPS);

        let identity: HashSet<usize> = [Some(username_idx), Some(email_idx), groups_idx]
            .iter()
            .flatten()
            .cloned()
            .collect();
        let (header, rows) = table.into_parts();
        let kept: Vec<usize> = (0..header.len())
            .filter(|i| !identity.contains(i))
            .collect();
        let columns: Vec<String> = kept.iter().map(|i| header[*i].clone()).collect();

        let mut res: Vec<RosterRow> = Vec::new();
        for row in rows {
            let text = |i: usize| row[i].as_text().unwrap_or_default();
            let full_name = format!("{} {}", text(given_idx), text(family_idx));
            res.push(RosterRow {
                full_name,
                username: text(username_idx),
                email: text(email_idx),
                groups: groups_idx.and_then(|i| row[i].as_text()),
                micro: None,
                last_active: None,
                cells: kept.iter().map(|i| row[*i].clone()).collect(),
            });
        }
        info!("Roster built from grades: {} students", res.len());
        Ok(Roster { columns, rows: res })
    }

    /// Reads back a roster written by [Roster::to_table].
    pub fn from_table(table: Table) -> RosterResult<Roster> {
        let name_idx = table.require_column(FULL_NAME, "roster")?;
        let username_idx = table.require_column(USERNAME, "roster")?;
        let email_idx = table.require_column(EMAIL, "roster")?;
        let groups_idx = table.column_index(GROUPS);
        let micro_idx = table.column_index(MICRO);
        let last_active_idx = table.column_index(LAST_ACTIVE);

        let (header, rows) = table.into_parts();
        let mut roster = Roster::default();
        let mut kept: Vec<usize> = Vec::new();
        for (idx, name) in header.iter().enumerate() {
            if IDENTITY_COLUMNS.contains(&name.as_str()) {
                continue;
            }
            if roster.columns.contains(name) {
                warn!("Roster::from_table: duplicate column {:?} dropped", name);
                continue;
            }
            roster.columns.push(name.clone());
            kept.push(idx);
        }
        for row in rows {
            let micro = micro_idx.and_then(|i| row[i].as_bool());
            roster.rows.push(RosterRow {
                full_name: row[name_idx].as_text().unwrap_or_default(),
                username: row[username_idx].as_text().unwrap_or_default(),
                email: row[email_idx].as_text().unwrap_or_default(),
                groups: groups_idx.and_then(|i| row[i].as_text()),
                micro,
                last_active: last_active_idx
                    .and_then(|i| row[i].as_f64())
                    .map(|x| x as i64),
                cells: kept.iter().map(|i| row[*i].clone()).collect(),
            });
        }
        Ok(roster)
    }

    /// The persisted form: the identity columns first, then all the other
    /// columns in insertion order.
    pub fn to_table(&self) -> Table {
        let mut header: Vec<String> = IDENTITY_COLUMNS.iter().map(|s| s.to_string()).collect();
        header.extend(self.columns.iter().cloned());
        let mut table = Table::new(header);
        for r in self.rows.iter() {
            let mut row = vec![
                Cell::text(&r.full_name),
                Cell::text(&r.username),
                Cell::text(&r.email),
                Cell::from_opt_str(r.groups.as_deref()),
                r.micro.map(Cell::Bool).unwrap_or(Cell::Empty),
                r.last_active
                    .map(|d| Cell::Number(d as f64))
                    .unwrap_or(Cell::Empty),
            ];
            row.extend(r.cells.iter().cloned());
            table.push_row(row);
        }
        table
    }

    pub fn rows(&self) -> &[RosterRow] {
        &self.rows
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// The cells of a column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r.cells[idx]).collect())
    }

    fn require_column(&self, name: &str) -> RosterResult<usize> {
        self.column_index(name).context(MissingColumnSnafu {
            column: name.to_string(),
            source_name: "roster".to_string(),
        })
    }

    /// Writes a column. An existing column of the same name is overwritten in
    /// place, otherwise the column is appended.
    ///
    /// The values are aligned with the rows. Missing values are empty cells.
    pub fn set_column(&mut self, name: &str, mut values: Vec<Cell>) {
        values.resize(self.rows.len(), Cell::Empty);
        match self.column_index(name) {
            Some(idx) => {
                debug!("Roster::set_column: overwriting {:?}", name);
                for (r, v) in self.rows.iter_mut().zip(values) {
                    r.cells[idx] = v;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (r, v) in self.rows.iter_mut().zip(values) {
                    r.cells.push(v);
                }
            }
        }
    }

    /// Removes the students who withdrew from the course.
    ///
    /// Returns the number of removed students.
    pub fn remove_withdrawn(&mut self, names: &[String]) -> usize {
        let excluded: HashSet<&str> = names.iter().map(|s| s.as_str()).collect();
        let before = self.rows.len();
        self.rows.retain(|r| !excluded.contains(r.full_name.as_str()));
        let removed = before - self.rows.len();
        info!(
            "Removed {} students without declaration from the roster. {} students.",
            removed,
            self.rows.len()
        );
        removed
    }

    /// Full names are the row key: they must be unique.
    pub fn ensure_unique_names(&self) -> RosterResult<()> {
        let mut seen: HashSet<&str> = HashSet::new();
        for r in self.rows.iter() {
            ensure!(
                seen.insert(r.full_name.as_str()),
                DuplicateStudentSnafu {
                    name: r.full_name.clone()
                }
            );
        }
        Ok(())
    }

    /// Marks the micro-credential students. Every student gets a value.
    pub fn attach_micro(&mut self, names: &[String]) -> usize {
        let micro: HashSet<&str> = names.iter().map(|s| s.as_str()).collect();
        info!("{} microdegree students in the list", micro.len());
        let mut count = 0;
        for r in self.rows.iter_mut() {
            let is_micro = micro.contains(r.full_name.as_str());
            if is_micro {
                count += 1;
            }
            r.micro = Some(is_micro);
        }
        count
    }

    /// Attaches to each student the number of days since their most recent
    /// event in the activity log.
    ///
    /// Students without any event get no value. Events without a name or a
    /// time are skipped. Events in the future count as today.
    pub fn attach_recency(
        &mut self,
        mut log: Table,
        vocabulary: &CourseVocabulary,
        now: NaiveDateTime,
    ) -> RosterResult<()> {
        log.rename_columns(&vocabulary.activity_columns);
        let name_idx = log.require_column(FULL_NAME, "activity log")?;
        let time_idx = log.require_column(TIME, "activity log")?;
        let format = vocabulary.activity_time_format.as_str();

        let mut last_active: HashMap<String, i64> = HashMap::new();
        for row in log.rows() {
            let (name, time) = match (row[name_idx].as_text(), row[time_idx].as_text()) {
                (Some(n), Some(t)) => (n, t),
                _ => continue,
            };
            let ts = NaiveDateTime::parse_from_str(time.trim(), format).context(
                ParseTimestampSnafu {
                    value: time.clone(),
                    format: format.to_string(),
                },
            )?;
            let days = (now - ts).num_days().max(0);
            let e = last_active.entry(name).or_insert(days);
            *e = (*e).min(days);
        }
        debug!("attach_recency: {} students in the log", last_active.len());

        let mut unseen = 0;
        for r in self.rows.iter_mut() {
            r.last_active = last_active.get(&r.full_name).cloned();
            if r.last_active.is_none() {
                unseen += 1;
            }
        }
        info!(
            "Activity log: {} students never visited the course",
            unseen
        );
        Ok(())
    }

    /// Sums grade columns into the points column of a week.
    pub fn add_points_column(
        &mut self,
        sources: &[String],
        week: u32,
        suffixes: &ColumnSuffixes,
    ) -> RosterResult<String> {
        let indexes: Vec<usize> = sources
            .iter()
            .map(|s| self.require_column(s))
            .collect::<RosterResult<Vec<usize>>>()?;
        info!("Week {}: summing columns {:?}", week, sources);
        let values: Vec<Cell> = self
            .rows
            .iter()
            .map(|r| {
                let cells: Vec<&Cell> = indexes.iter().map(|i| &r.cells[*i]).collect();
                Cell::Number(sum_points(&cells))
            })
            .collect();
        let name = suffixes.points_column(week);
        self.set_column(&name, values);
        Ok(name)
    }

    /// Labels the progress of every student on the assignment of a week.
    pub fn add_progress_column(
        &mut self,
        points_column: &str,
        defence_column: &str,
        week: u32,
        full_points: f64,
        vocabulary: &CourseVocabulary,
    ) -> RosterResult<String> {
        let points_idx = self.require_column(points_column)?;
        let defence_idx = self.require_column(defence_column)?;
        let values: Vec<Cell> = self
            .rows
            .iter()
            .map(|r| {
                let label = label_progress(&r.cells[points_idx], &r.cells[defence_idx], full_points);
                Cell::text(vocabulary.progress.text(label))
            })
            .collect();
        let name = vocabulary.suffixes.progress_column(week);
        self.set_column(&name, values);
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn s(x: &str) -> String {
        x.to_string()
    }

    fn grades() -> Table {
        let mut t = Table::new(vec![
            s("Eesnimi"),
            s("Perekonnanimi"),
            s("Kasutajanimi"),
            s("Meiliaadress"),
            s("Rühmad"),
            s("EX01 - Test 1"),
            s("EX01 - Test 2"),
            s("EX01 - Defense"),
        ]);
        let student = |g: &str, f: &str, p1: Cell, p2: Cell, d: f64| {
            vec![
                Cell::text(g),
                Cell::text(f),
                Cell::text(&g.to_lowercase()),
                Cell::text(&format!("{}@ttu.ee", g.to_lowercase())),
                Cell::text("K01"),
                p1,
                p2,
                Cell::Number(d),
            ]
        };
        t.push_row(student("Mari", "Maasikas", Cell::Number(5.0), Cell::Number(10.0), 0.0));
        t.push_row(student("Jaan", "Tamm", Cell::Number(3.0), Cell::text("-"), 0.0));
        t.push_row(student("Juku", "Juurikas", Cell::Empty, Cell::Empty, 1.0));
        t
    }

    fn roster() -> Roster {
        Roster::from_grades(grades(), &CourseVocabulary::estonian()).unwrap()
    }

    #[test]
    fn build_from_grades() {
        let r = roster();
        assert_eq!(r.len(), 3);
        assert_eq!(r.rows()[0].full_name, "Mari Maasikas");
        assert_eq!(r.rows()[0].username, "mari");
        assert_eq!(r.rows()[0].groups.as_deref(), Some("K01"));
        assert_eq!(r.rows()[0].micro, None);
        assert!(r.column_index("Eesnimi").is_some());
        assert!(r.column_index(USERNAME).is_none());
    }

    #[test]
    fn grades_without_names_fail() {
        let t = Table::new(vec![s("Kasutajanimi"), s("Meiliaadress")]);
        assert!(matches!(
            Roster::from_grades(t, &CourseVocabulary::estonian()),
            Err(RosterError::MissingColumn { .. })
        ));
    }

    #[test]
    fn withdrawn_students() {
        let mut r = roster();
        assert_eq!(r.remove_withdrawn(&[]), 0);
        assert_eq!(r.remove_withdrawn(&[s("Jaan Tamm"), s("Kedagi Pole")]), 1);
        assert_eq!(r.len(), 2);
        assert!(r.rows().iter().all(|x| x.full_name != "Jaan Tamm"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut t = grades();
        t.push_row(vec![
            Cell::text("Mari"),
            Cell::text("Maasikas"),
            Cell::text("mari2"),
            Cell::text("mari2@ttu.ee"),
        ]);
        let mut r = Roster::from_grades(t, &CourseVocabulary::estonian()).unwrap();
        assert!(matches!(
            r.ensure_unique_names(),
            Err(RosterError::DuplicateStudent { .. })
        ));
        r.remove_withdrawn(&[s("Mari Maasikas")]);
        assert!(r.ensure_unique_names().is_ok());
    }

    #[test]
    fn micro_flag_for_everyone() {
        let mut r = roster();
        assert_eq!(r.attach_micro(&[s("Juku Juurikas")]), 1);
        let flags: Vec<Option<bool>> = r.rows().iter().map(|x| x.micro).collect();
        assert_eq!(flags, vec![Some(false), Some(false), Some(true)]);
    }

    fn log_table(events: &[(&str, &str)]) -> Table {
        let mut t = Table::new(vec![s("Aeg"), s("Kasutaja täisnimi"), s("Sündmus")]);
        for (time, name) in events {
            t.push_row(vec![Cell::text(time), Cell::text(name), Cell::text("Kursust vaadati")]);
        }
        t
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 10)
            .unwrap()
            .and_hms_opt(9, 26, 0)
            .unwrap()
    }

    #[test]
    fn recency_keeps_most_recent_event() {
        let mut r = roster();
        let log = log_table(&[
            ("01/12/24, 10:00:00", "Mari Maasikas"),
            ("09/12/24, 08:00:00", "Mari Maasikas"),
            ("30/11/24, 23:59:59", "Jaan Tamm"),
            ("05/12/24, 12:00:00", "Keegi Teine"),
        ]);
        r.attach_recency(log, &CourseVocabulary::estonian(), now())
            .unwrap();
        let days: Vec<Option<i64>> = r.rows().iter().map(|x| x.last_active).collect();
        assert_eq!(days, vec![Some(1), Some(9), None]);
    }

    #[test]
    fn malformed_activity_time() {
        let mut r = roster();
        let log = log_table(&[("2024-12-01 10:00", "Mari Maasikas")]);
        assert!(matches!(
            r.attach_recency(log, &CourseVocabulary::estonian(), now()),
            Err(RosterError::ParseTimestamp { .. })
        ));
    }

    #[test]
    fn points_and_progress() {
        let voc = CourseVocabulary::estonian();
        let mut r = roster();
        let points = r
            .add_points_column(&[s("EX01 - Test 1"), s("EX01 - Test 2")], 1, &voc.suffixes)
            .unwrap();
        assert_eq!(points, "1_punktid");
        let sums: Vec<Option<f64>> = r
            .column(&points)
            .unwrap()
            .iter()
            .map(|c| c.as_f64())
            .collect();
        assert_eq!(sums, vec![Some(15.0), Some(3.0), Some(0.0)]);

        let label = r
            .add_progress_column(&points, "EX01 - Defense", 1, DEFAULT_FULL_POINTS, &voc)
            .unwrap();
        assert_eq!(label, "EX1");
        let labels: Vec<String> = r
            .column("EX1")
            .unwrap()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(labels, vec!["kaitsmata, tehtud", "alustatud, <10 p", "kaitstud"]);
    }

    #[test]
    fn progress_needs_known_columns() {
        let voc = CourseVocabulary::estonian();
        let mut r = roster();
        assert!(matches!(
            r.add_points_column(&[s("EX99")], 9, &voc.suffixes),
            Err(RosterError::MissingColumn { .. })
        ));
    }

    #[test]
    fn set_column_overwrites_in_place() {
        let mut r = roster();
        r.set_column("7_kohal", vec![Cell::text("Jah")]);
        let width = r.columns().len();
        r.set_column("7_kohal", vec![Cell::text("Ei"), Cell::text("Jah")]);
        assert_eq!(r.columns().len(), width);
        let v: Vec<String> = r.column("7_kohal").unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(v, vec!["Ei", "Jah", ""]);
    }

    #[test]
    fn persisted_form_round_trip() {
        let mut r = roster();
        r.attach_micro(&[s("Mari Maasikas")]);
        r.set_column("3_ajakulu", vec![Cell::Number(4.5)]);
        let t = r.to_table();
        assert_eq!(&t.header()[..6], &IDENTITY_COLUMNS.map(|x| x.to_string()));
        let back = Roster::from_table(t).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn persisted_text_is_read_back_verbatim() {
        // The persisted form as it comes back from a CSV file: raw text fields.
        let mut t = Table::new(IDENTITY_COLUMNS.iter().map(|x| x.to_string()).collect());
        t.push_row(
            ["Bert Tamm", "0043", "0043@ttu.ee", "K01", "true", "3"]
                .iter()
                .map(|f| Cell::raw(f))
                .collect(),
        );
        let r = Roster::from_table(t).unwrap();
        assert_eq!(r.rows()[0].username, "0043");
        assert_eq!(r.rows()[0].micro, Some(true));
        assert_eq!(r.rows()[0].last_active, Some(3));
        assert_eq!(r.to_table().rows()[0][1].to_string(), "0043");
    }
}
