use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use student_progress::*;

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

pub mod charts;
pub mod config_reader;
pub mod export;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;

use crate::pipeline::charts::*;
use crate::pipeline::config_reader::*;
use crate::pipeline::export::export_flags;
use crate::pipeline::io_common::*;
use crate::pipeline::io_csv::*;
use crate::pipeline::io_excel::read_excel_table;

#[derive(Debug, Snafu)]
pub enum PipelineError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet or no header row in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Unsupported cell {cell} at row {row}, column {column} of {path}"))]
    ExcelCell {
        path: String,
        row: usize,
        column: usize,
        cell: String,
    },
    #[snafu(display("Error opening configuration {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing configuration {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing chart {path}"))]
    WritingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error writing CSV file {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error reading {path}"))]
    ReadingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Failed step: {step}"))]
    Roster { source: RosterError, step: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PResult<T> = Result<T, PipelineError>;

/// Reads a table from an Excel or a CSV file, depending on the extension.
///
/// Date cells of a workbook are written as text with `datetime_format`.
pub fn read_table(path: &Path, worksheet: Option<&str>, datetime_format: &str) -> PResult<Table> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "xlsx" => read_excel_table(path, worksheet, datetime_format),
        "csv" => read_csv_table(path),
        x => whatever!("Unsupported file type {:?} for {}", x, path.display()),
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct RunOptions {
    pub config_path: PathBuf,
    /// Overrides the output directory of the configuration.
    pub out: Option<PathBuf>,
    /// Reuses the roster written by a previous run.
    pub skip_roster_build: bool,
    /// The reference time for the activity log and the names of the outputs.
    pub now: NaiveDateTime,
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct RunSummary {
    pub roster_path: PathBuf,
    pub weeks: Vec<u32>,
    pub flag_files: Vec<PathBuf>,
    pub chart_files: Vec<PathBuf>,
}

fn save_roster(roster: &Roster, path: &Path) -> PResult<()> {
    write_csv_table(path, &roster.to_table(), false)?;
    debug!("save_roster: {} students written to {:?}", roster.len(), path);
    Ok(())
}

fn load_roster(path: &Path) -> PResult<Roster> {
    let table = read_csv_table(path)?;
    let roster = Roster::from_table(table).context(RosterSnafu {
        step: "reading the roster",
    })?;
    info!(
        "Roster read from {}: {} students",
        simplify_file_name(path),
        roster.len()
    );
    Ok(roster)
}

fn build_roster(rc: &ResolvedConfig, vocabulary: &CourseVocabulary, now: NaiveDateTime) -> PResult<Roster> {
    let inputs = &rc.config.inputs;
    let mut grades = read_table(
        &rc.path(&inputs.grades_file),
        inputs.grades_worksheet_name.as_deref(),
        &vocabulary.activity_time_format,
    )?;
    grades.rename_columns(&vocabulary.grades_columns);

    // The assignments refer to the positions of the grades export.
    let mut sources: Vec<(&Assignment, Vec<String>)> = Vec::new();
    for a in rc.config.assignments.iter() {
        let names = grades
            .column_names_in_range(a.first_column_index, a.last_column_index)
            .context(RosterSnafu {
                step: format!("assignment of week {}", a.week),
            })?;
        sources.push((a, names));
    }

    let mut roster = Roster::from_grades(grades, vocabulary).context(RosterSnafu {
        step: "reading the grades",
    })?;

    let withdrawn = read_name_list(&rc.path(&inputs.withdrawn_list))?;
    roster.remove_withdrawn(&withdrawn);
    roster.ensure_unique_names().context(RosterSnafu {
        step: "checking the roster",
    })?;

    match &inputs.micro_list {
        Some(p) => {
            let micro = read_name_list(&rc.path(p))?;
            let n = roster.attach_micro(&micro);
            info!("{} microdegree students in the roster", n);
        }
        None => info!("No microdegree list, skipping"),
    }

    let activity = read_table(
        &rc.path(&inputs.activity_log),
        None,
        &vocabulary.activity_time_format,
    )?;
    roster
        .attach_recency(activity, vocabulary, now)
        .context(RosterSnafu {
            step: "reading the activity log",
        })?;

    for (a, names) in sources {
        let step = format!("assignment of week {}", a.week);
        let points = roster
            .add_points_column(&names, a.week, &vocabulary.suffixes)
            .context(RosterSnafu { step: step.clone() })?;
        let progress = roster
            .add_progress_column(&points, &a.defence_column, a.week, a.full_points(), vocabulary)
            .context(RosterSnafu { step })?;
        info!("Week {}: added {:?} and {:?}", a.week, points, progress);
    }
    Ok(roster)
}

/// Logs the submission count and the median time spent of a week.
pub fn report_metrics(survey: &WeeklySurvey, enrolled: usize) {
    let percentage = if enrolled > 0 {
        100.0 * survey.len() as f64 / enrolled as f64
    } else {
        0.0
    };
    info!(
        "Metrics for week {}: feedback submissions: {}/{} ({:.1}%)",
        survey.week(),
        survey.len(),
        enrolled,
        percentage
    );
    match survey.median_time_spent() {
        Some(m) => info!("Median time spent: {} hours", m),
        None => info!("Median time spent: no answers"),
    }
}

/// Runs the whole course pipeline: builds (or reloads) the roster, processes
/// every weekly survey, then the aggregations and the progress charts.
///
/// The roster is written back after every step, so that an interrupted run
/// leaves the last complete state behind.
pub fn run_course(opts: &RunOptions) -> PResult<RunSummary> {
    let rc = read_config(&opts.config_path)?;
    let vocabulary = rc.config.vocabulary();
    let output_dir = opts.out.clone().unwrap_or_else(|| rc.output_directory());
    ensure_dir(&output_dir)?;
    let stamp = run_stamp(&opts.now);
    info!(
        "Course {:?}: writing to {:?}",
        rc.config.output_settings.course_name,
        output_dir.display()
    );

    let roster_path = output_dir.join(&rc.config.output_settings.roster_file);
    let mut roster = if opts.skip_roster_build {
        load_roster(&roster_path)?
    } else {
        let r = build_roster(&rc, &vocabulary, opts.now)?;
        save_roster(&r, &roster_path)?;
        r
    };
    let mut summary = RunSummary {
        roster_path: roster_path.clone(),
        ..Default::default()
    };

    let enrolled = rc
        .config
        .output_settings
        .enrolled_students
        .unwrap_or_else(|| roster.len());
    let survey_files = find_survey_files(&rc.path(&rc.config.inputs.survey_directory))?;
    for path in survey_files.iter() {
        let file_name = simplify_file_name(path);
        let table = read_csv_table(path)?;
        let survey = WeeklySurvey::from_table(&file_name, table, &vocabulary).context(
            RosterSnafu {
                step: format!("reading survey {}", file_name),
            },
        )?;
        if summary.weeks.contains(&survey.week()) {
            warn!(
                "Week {} appears in more than one file, {} replaces the previous answers",
                survey.week(),
                file_name
            );
        }
        report_metrics(&survey, enrolled);

        let (flags, report) = process_week(&mut roster, &survey, &vocabulary);
        debug!("run_course: {}: {:?}", file_name, report);
        summary
            .flag_files
            .push(export_flags(&output_dir, &stamp, survey.week(), &flags, &vocabulary.outputs)?);

        let charts_dir = output_dir
            .join(format!("{}_{}", stamp, vocabulary.outputs.week_charts_directory))
            .join(format!("N{}", survey.week()));
        let mut written = write_charts(&charts_dir, &stamp, &week_charts(&survey, &vocabulary))?;
        summary.chart_files.append(&mut written);

        save_roster(&roster, &roster_path)?;
        summary.weeks.push(survey.week());
    }

    for agg in rc.config.aggregations.iter() {
        let step = format!("aggregation of weeks {}-{}", agg.first_week, agg.last_week);
        add_attendance_mode_column(&mut roster, agg.first_week, agg.last_week, &vocabulary)
            .context(RosterSnafu { step: step.clone() })?;
        save_roster(&roster, &roster_path)?;
        add_mean_time_column(&mut roster, agg.first_week, agg.last_week, &vocabulary)
            .context(RosterSnafu { step })?;
        save_roster(&roster, &roster_path)?;
    }

    if let Some(weeks) = rc.config.progress_charts.as_ref().filter(|w| !w.is_empty()) {
        let charts = progress_charts(&roster, weeks, &vocabulary).context(RosterSnafu {
            step: "progress charts",
        })?;
        let interval = format!(
            "{}-{}",
            vocabulary.suffixes.progress_column(weeks[0]),
            vocabulary.suffixes.progress_column(weeks[weeks.len() - 1])
        );
        let dir = output_dir.join(format!(
            "{}_{}_{}",
            stamp, vocabulary.outputs.progress_charts_directory, interval
        ));
        let mut written = write_charts(&dir, &stamp, &charts)?;
        summary.chart_files.append(&mut written);
    }

    info!(
        "Done: {} students, {} weeks, roster in {:?}",
        roster.len(),
        summary.weeks.len(),
        roster_path.display()
    );
    Ok(summary)
}
