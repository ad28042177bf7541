use log::{debug, info};

use snafu::prelude::*;

use crate::config::*;
use crate::error::*;
use crate::table::{Cell, Table};

/// One answer to a weekly feedback survey.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct SurveyResponse {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub groups: Option<String>,
    pub date: Option<String>,
    pub self_perception: Option<String>,
    pub usefulness: Option<String>,
    pub tempo: Option<String>,
    /// Hours spent on the week's exercises.
    pub time_spent: Option<f64>,
    /// Rating of the exercise, between 1 and 10.
    pub likability: Option<u8>,
    pub good_text: Option<String>,
    pub negative_text: Option<String>,
    pub teachers_text: Option<String>,
    pub good_teachers: Option<String>,
    pub in_person: Option<String>,
}

/// The answers of one week.
#[derive(PartialEq, Debug, Clone)]
pub struct WeeklySurvey {
    week: u32,
    responses: Vec<SurveyResponse>,
    median_time_spent: Option<f64>,
}

/// Returns the first number found in a file name.
///
/// File names are the only source of truth for the week identity, for
/// instance `logs_week05_final.csv` is week 5.
pub fn extract_week_number(file_name: &str) -> RosterResult<u32> {
    let digits: String = file_name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    ensure!(
        !digits.is_empty(),
        ParseWeekSnafu {
            file_name: file_name.to_string()
        }
    );
    digits.parse::<u32>().ok().context(WeekOutOfRangeSnafu {
        file_name: file_name.to_string(),
        digits: digits.clone(),
    })
}

/// Median of the present values, or None if there are none.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut v: Vec<f64> = values.iter().cloned().filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(|a, b| a.total_cmp(b));
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        Some((v[mid - 1] + v[mid]) / 2.0)
    } else {
        Some(v[mid])
    }
}

fn read_likability(cell: &Cell) -> Option<u8> {
    cell.as_f64()
        .filter(|x| (1.0..=10.0).contains(x))
        .map(|x| x.round() as u8)
}

impl WeeklySurvey {
    /// Builds the survey of one week from the raw export.
    ///
    /// The columns are renamed with the survey mapping of the vocabulary. Only
    /// the name of the student is required, the other answers are optional.
    pub fn from_table(
        file_name: &str,
        mut table: Table,
        vocabulary: &CourseVocabulary,
    ) -> RosterResult<WeeklySurvey> {
        let week = extract_week_number(file_name)?;
        table.rename_columns(&vocabulary.survey_columns);
        debug!("WeeklySurvey::from_table: header: {:?}", table.header());
        table.require_column(FULL_NAME, file_name)?;

        let idx = |name: &str| table.column_index(name);
        let name_idx = idx(FULL_NAME);
        let username_idx = idx(USERNAME);
        let email_idx = idx(EMAIL);
        let groups_idx = idx(GROUPS);
        let date_idx = idx(DATE);
        let self_perception_idx = idx(SELF_PERCEPTION);
        let usefulness_idx = idx(USEFULNESS);
        let tempo_idx = idx(TEMPO);
        let time_spent_idx = idx(TIME_SPENT);
        let likability_idx = idx(LIKABILITY);
        let good_text_idx = idx(GOOD_TEXT);
        let negative_text_idx = idx(NEGATIVE_TEXT);
        let teachers_text_idx = idx(TEACHERS_TEXT);
        let good_teachers_idx = idx(GOOD_TEACHERS);
        let in_person_idx = idx(IN_PERSON);

        let mut responses: Vec<SurveyResponse> = Vec::new();
        for row in table.rows() {
            let text = |i: Option<usize>| i.and_then(|i| row[i].as_text());
            let response = SurveyResponse {
                full_name: text(name_idx),
                username: text(username_idx),
                email: text(email_idx),
                groups: text(groups_idx),
                date: text(date_idx),
                self_perception: text(self_perception_idx),
                usefulness: text(usefulness_idx),
                tempo: text(tempo_idx),
                time_spent: time_spent_idx.and_then(|i| row[i].as_f64()),
                likability: likability_idx.and_then(|i| read_likability(&row[i])),
                good_text: text(good_text_idx),
                negative_text: text(negative_text_idx),
                teachers_text: text(teachers_text_idx),
                good_teachers: text(good_teachers_idx),
                in_person: text(in_person_idx),
            };
            responses.push(response);
        }
        Ok(WeeklySurvey::new(week, responses))
    }

    pub fn new(week: u32, responses: Vec<SurveyResponse>) -> WeeklySurvey {
        let times: Vec<f64> = responses.iter().filter_map(|r| r.time_spent).collect();
        let median_time_spent = median(&times);
        info!(
            "Week {}: {} responses, median time spent: {:?} hours",
            week,
            responses.len(),
            median_time_spent
        );
        WeeklySurvey {
            week,
            responses,
            median_time_spent,
        }
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn responses(&self) -> &[SurveyResponse] {
        &self.responses
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// The median hours spent by the respondents, ignoring missing answers.
    pub fn median_time_spent(&self) -> Option<f64> {
        self.median_time_spent
    }
}
