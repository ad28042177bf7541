use crate::pipeline::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "courseName")]
    pub course_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "rosterFile")]
    pub roster_file: String,
    /// Used for the submission percentage. Defaults to the size of the roster.
    #[serde(rename = "enrolledStudents")]
    pub enrolled_students: Option<usize>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct InputFiles {
    #[serde(rename = "gradesFile")]
    pub grades_file: String,
    #[serde(rename = "gradesWorksheetName")]
    pub grades_worksheet_name: Option<String>,
    #[serde(rename = "activityLog")]
    pub activity_log: String,
    #[serde(rename = "withdrawnList")]
    pub withdrawn_list: String,
    #[serde(rename = "microList")]
    pub micro_list: Option<String>,
    #[serde(rename = "surveyDirectory")]
    pub survey_directory: String,
}

/// The graded assignment of a week.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub week: u32,
    /// 0-based, inclusive.
    #[serde(rename = "firstColumnIndex")]
    pub first_column_index: usize,
    /// 0-based, exclusive.
    #[serde(rename = "lastColumnIndex")]
    pub last_column_index: usize,
    #[serde(rename = "defenceColumn")]
    pub defence_column: String,
    #[serde(rename = "fullPoints")]
    pub full_points: Option<f64>,
}

impl Assignment {
    pub fn full_points(&self) -> f64 {
        self.full_points.unwrap_or(DEFAULT_FULL_POINTS)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Aggregation {
    #[serde(rename = "firstWeek")]
    pub first_week: u32,
    #[serde(rename = "lastWeek")]
    pub last_week: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRename {
    pub from: String,
    pub to: String,
}

/// Extra column titles, for exports that do not use the default wording.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnOverrides {
    pub grades: Option<Vec<ColumnRename>>,
    pub activity: Option<Vec<ColumnRename>>,
    pub survey: Option<Vec<ColumnRename>>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CourseConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub inputs: InputFiles,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub aggregations: Vec<Aggregation>,
    #[serde(rename = "progressCharts")]
    pub progress_charts: Option<Vec<u32>>,
    #[serde(rename = "columnOverrides")]
    pub column_overrides: Option<ColumnOverrides>,
}

fn with_overrides(base: &ColumnMapping, overrides: &Option<Vec<ColumnRename>>) -> ColumnMapping {
    let mut res: ColumnMapping = overrides
        .iter()
        .flatten()
        .map(|r| (r.from.clone(), r.to.clone()))
        .collect();
    res.extend(base.iter().cloned());
    res
}

impl CourseConfig {
    /// The default vocabulary, with the column overrides taking precedence.
    pub fn vocabulary(&self) -> CourseVocabulary {
        let mut voc = CourseVocabulary::estonian();
        if let Some(o) = &self.column_overrides {
            voc.grades_columns = with_overrides(&voc.grades_columns, &o.grades);
            voc.activity_columns = with_overrides(&voc.activity_columns, &o.activity);
            voc.survey_columns = with_overrides(&voc.survey_columns, &o.survey);
        }
        voc
    }
}

/// A configuration with all the paths resolved against the directory of
/// the configuration file.
#[derive(PartialEq, Debug, Clone)]
pub struct ResolvedConfig {
    pub config: CourseConfig,
    pub root: PathBuf,
}

impl ResolvedConfig {
    pub fn path(&self, p: &str) -> PathBuf {
        self.root.join(p)
    }

    pub fn output_directory(&self) -> PathBuf {
        match &self.config.output_settings.output_directory {
            Some(d) => self.path(d),
            None => self.root.clone(),
        }
    }
}

pub fn read_config(path: &Path) -> PResult<ResolvedConfig> {
    let p = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: p.clone() })?;
    let config: CourseConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path: p.clone() })?;
    debug!("read_config: {:?}", config);
    for a in config.assignments.iter() {
        if a.first_column_index >= a.last_column_index {
            whatever!(
                "Assignment of week {}: empty column range {}..{}",
                a.week,
                a.first_column_index,
                a.last_column_index
            );
        }
    }
    for a in config.aggregations.iter() {
        if a.first_week > a.last_week {
            whatever!(
                "Aggregation: first week {} is after last week {}",
                a.first_week,
                a.last_week
            );
        }
    }
    let root = path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    Ok(ResolvedConfig { config, root })
}
