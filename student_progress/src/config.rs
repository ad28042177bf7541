// ********* Course vocabulary **********

// All the texts that the pipeline reads or writes: source column titles,
// sentiment keywords, label names, column suffixes and chart colours.
// A vocabulary is an immutable value passed to each stage, so that two
// course configurations can be processed side by side.

use crate::table::ColumnMapping;

/// Default number of points for a fully solved weekly exercise.
pub const DEFAULT_FULL_POINTS: f64 = 15.0;

/// Above this number of points, an exercise is considered well started.
pub const STARTED_HIGH_THRESHOLD: f64 = 10.0;

/// Minimum excess over the weekly median (in hours) that raises a flag.
pub const TIME_OVERRUN_THRESHOLD_HOURS: f64 = 5.0;

// Semantic column names shared by all sources.
pub const FULL_NAME: &str = "full_name";
pub const USERNAME: &str = "username";
pub const EMAIL: &str = "email";
pub const GROUPS: &str = "groups";
pub const MICRO: &str = "micro";
pub const LAST_ACTIVE: &str = "last_active";
pub const TIME: &str = "time";

pub const SELF_PERCEPTION: &str = "self_perception";
pub const USEFULNESS: &str = "usefulness";
pub const TEMPO: &str = "tempo";
pub const TIME_SPENT: &str = "time_spent";
pub const LIKABILITY: &str = "likability";
pub const IN_PERSON: &str = "in_person";
pub const GOOD_TEXT: &str = "good_text";
pub const NEGATIVE_TEXT: &str = "negative_text";
pub const TEACHERS_TEXT: &str = "teachers_text";
pub const GOOD_TEACHERS: &str = "good_teachers";
pub const DATE: &str = "date";

/// Completion status of one assignment for one student.
///
/// The variants are ordered by completeness.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum ProgressLabel {
    NotStarted,
    /// More than 0 and at most 10 points, not defended.
    StartedLow,
    /// More than 10 points, not defended.
    StartedHigh,
    /// Full points, not defended.
    DoneUndefended,
    Defended,
}

impl ProgressLabel {
    pub const ALL: [ProgressLabel; 5] = [
        ProgressLabel::NotStarted,
        ProgressLabel::StartedLow,
        ProgressLabel::StartedHigh,
        ProgressLabel::DoneUndefended,
        ProgressLabel::Defended,
    ];
}

/// The names given to the progress labels in the roster.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ProgressTexts {
    pub not_started: String,
    pub started_low: String,
    pub started_high: String,
    pub done_undefended: String,
    pub defended: String,
}

impl ProgressTexts {
    pub fn text(&self, label: ProgressLabel) -> &str {
        match label {
            ProgressLabel::NotStarted => &self.not_started,
            ProgressLabel::StartedLow => &self.started_low,
            ProgressLabel::StartedHigh => &self.started_high,
            ProgressLabel::DoneUndefended => &self.done_undefended,
            ProgressLabel::Defended => &self.defended,
        }
    }
}

/// Keywords and sentences used by the feedback labeler.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FeedbackTexts {
    /// Lowercase keywords that mark a neutral or negative self-perception.
    pub low_mood_keywords: Vec<String>,
    /// Appended to the title-cased self-perception answer.
    pub self_perception_suffix: String,
    /// Appended to the excess hours.
    pub time_overrun_suffix: String,
}

/// Values read and written by the attendance aggregation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AttendanceTexts {
    /// The answer meaning "attended".
    pub yes: String,
    pub split: String,
    pub no_response: String,
}

/// Suffixes and prefixes of the columns added to the roster.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnSuffixes {
    pub time_spent: String,
    pub attendance: String,
    pub problems: String,
    pub points: String,
    /// Prefix of the progress label columns (`EX7`).
    pub progress_prefix: String,
    /// `Mood_kohapeal_N1-4`
    pub attendance_mode_prefix: String,
    /// `Ajakulu_N1-4_ar_keskm`
    pub mean_time_prefix: String,
    pub mean_time_suffix: String,
}

impl ColumnSuffixes {
    pub fn week_column(&self, week: u32, suffix: &str) -> String {
        format!("{}_{}", week, suffix)
    }

    pub fn progress_column(&self, week: u32) -> String {
        format!("{}{}", self.progress_prefix, week)
    }

    pub fn points_column(&self, week: u32) -> String {
        self.week_column(week, &self.points)
    }

    pub fn attendance_mode_column(&self, first: u32, last: u32) -> String {
        format!("{}_N{}-{}", self.attendance_mode_prefix, first, last)
    }

    pub fn mean_time_column(&self, first: u32, last: u32) -> String {
        format!(
            "{}_N{}-{}_{}",
            self.mean_time_prefix, first, last, self.mean_time_suffix
        )
    }
}

/// Colour associated to a category in the charts.
pub type Palette = Vec<(String, String)>;

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Palettes {
    pub progress: Palette,
    pub self_perception: Palette,
    pub usefulness: Palette,
    pub tempo: Palette,
    pub in_person: Palette,
}

/// Explanations of some values of a histogram axis.
pub type Legend = Vec<(String, String)>;

/// The title of a chart and the stem of its file name.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ChartLabel {
    pub stem: String,
    pub title: String,
}

fn chart_label(stem: &str, title: &str) -> ChartLabel {
    ChartLabel {
        stem: stem.to_string(),
        title: title.to_string(),
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ChartTexts {
    pub self_perception: ChartLabel,
    pub time_spent: ChartLabel,
    pub usefulness: ChartLabel,
    pub tempo: ChartLabel,
    pub likability: ChartLabel,
    pub in_person: ChartLabel,
    /// Follows the week number in the weekly titles (`Tempo 3. nädalal (41)`).
    pub week_word: String,
    pub progress_all: ChartLabel,
    pub progress_micro: ChartLabel,
    pub progress_not_micro: ChartLabel,
    pub last_active: ChartLabel,
    pub likability_legend: Legend,
    pub last_active_legend: Legend,
}

/// Names of the folders and files written by a run, after the run stamp.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OutputNames {
    pub flags_directory: String,
    pub flags_file: String,
    pub week_charts_directory: String,
    pub progress_charts_directory: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CourseVocabulary {
    pub grades_columns: ColumnMapping,
    pub given_name_column: String,
    pub family_name_column: String,
    pub activity_columns: ColumnMapping,
    /// chrono format of the activity log timestamps.
    pub activity_time_format: String,
    pub survey_columns: ColumnMapping,
    pub progress: ProgressTexts,
    pub feedback: FeedbackTexts,
    pub attendance: AttendanceTexts,
    pub suffixes: ColumnSuffixes,
    pub palettes: Palettes,
    pub charts: ChartTexts,
    pub outputs: OutputNames,
}

fn mapping(pairs: &[(&str, &str)]) -> ColumnMapping {
    pairs
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
}

impl CourseVocabulary {
    /// The vocabulary of the Estonian Moodle exports.
    pub fn estonian() -> CourseVocabulary {
        CourseVocabulary {
            grades_columns: mapping(&[
                ("Rühmad", GROUPS),
                ("Kasutajanimi", USERNAME),
                ("Meiliaadress", EMAIL),
            ]),
            given_name_column: "Eesnimi".to_string(),
            family_name_column: "Perekonnanimi".to_string(),
            activity_columns: mapping(&[("Kasutaja täisnimi", FULL_NAME), ("Aeg", TIME)]),
            activity_time_format: "%d/%m/%y, %H:%M:%S".to_string(),
            survey_columns: mapping(&[
                ("Kasutaja täisnimi", FULL_NAME),
                ("Rühmad", GROUPS),
                ("Kasutajanimi", USERNAME),
                ("Meiliaadress", EMAIL),
                ("Kuupäev", DATE),
                ("Milline oli Su enesetunne seoses selle algkursuse teemaga?", SELF_PERCEPTION),
                ("Kas selle teema raames õppisid programmeerimise kohta midagi kasulikku?", USEFULNESS),
                ("Milline on aine tempo Sinu jaoks?", TEMPO),
                ("Kui kaua Sul selle teema ülesannete lahendamiseks aega läks (tundides)?", TIME_SPENT),
                ("Kuidas hindaksid selle teema ülesannet 10 palli skaalal? 10 - suurepärane ülesanne - selge, huvitav lahendada, annab ülevaate teemast  5 - enam-vähem okei ülesanne, oli nii positiivset kui negatiivset  1 - kehv ülesanne, ebahuvitav, ei tee teemat selgeks", LIKABILITY),
                ("Positiivsed mõtted ja emotsioonid seoses selle teema ja ülesandega - Mis läks hästi? Mis meeldis? Mida uut ja huvitavat teada said?  Võimalusel täpsusta, miks just nii arvad ning mis oli Sinu meelest see, mis Sinu kogemuse heaks tegi.", GOOD_TEXT),
                ("Negatiivsed mõtted ja emotsioonid seoses selle teema ja ülesandega - Mis läks halvasti? Mis ei meeldinud? Kas midagi jäi arusaamatuks või ebaselgeks?  Võimalusel põhjenda ning täpsusta, mida peaks edaspidi teisiti tegema, et Sinu kogemust parandada?", NEGATIVE_TEXT),
                ("Kas käisid jooksval nädalal loengus või praktikumides kohal?", IN_PERSON),
                ("Tagasiside praktikumidele ja abistamisele. Kas said oma küsimustele vastused? Kuidas jäid rahule abiõppejõududega?", TEACHERS_TEXT),
                ("Siin saad soovi korral abiõppejõudusid nimeliselt kiita (vali kuni 3 nime).", GOOD_TEACHERS),
            ]),
            progress: ProgressTexts {
                not_started: "alustamata".to_string(),
                started_low: "alustatud, <10 p".to_string(),
                started_high: "alustatud, >10 p".to_string(),
                done_undefended: "kaitsmata, tehtud".to_string(),
                defended: "kaitstud".to_string(),
            },
            feedback: FeedbackTexts {
                low_mood_keywords: vec!["neutraalne".to_string(), "negatiivne".to_string()],
                self_perception_suffix: "enesetunne.".to_string(),
                time_overrun_suffix: "h mediaanist rohkem.".to_string(),
            },
            attendance: AttendanceTexts {
                yes: "Jah".to_string(),
                split: "Pooltel kordadel".to_string(),
                no_response: "Ei vastanud".to_string(),
            },
            suffixes: ColumnSuffixes {
                time_spent: "ajakulu".to_string(),
                attendance: "kohal".to_string(),
                problems: "probleemid".to_string(),
                points: "punktid".to_string(),
                progress_prefix: "EX".to_string(),
                attendance_mode_prefix: "Mood_kohapeal".to_string(),
                mean_time_prefix: "Ajakulu".to_string(),
                mean_time_suffix: "ar_keskm".to_string(),
            },
            palettes: Palettes {
                progress: mapping(&[
                    ("alustamata", "#e4067e"),
                    ("alustatud, <10 p", "#aa1352"),
                    ("alustatud, >10 p", "#9396b0"),
                    ("kaitsmata, tehtud", "#342b60"),
                    ("kaitstud", "#4dbed2"),
                ]),
                self_perception: mapping(&[
                    ("Väga positiivne", "#e4067e"),
                    ("Pigem positiivne", "#aa1352"),
                    ("Neutraalne", "#4dbed2"),
                    ("Pigem negatiivne", "#342b60"),
                    ("Väga negatiivne", "#000000"),
                ]),
                usefulness: mapping(&[
                    ("Ei õppinud üldse", "#e4067e"),
                    ("Ei oska öelda", "#aa1352"),
                    ("Õppisin väga palju", "#4dbed2"),
                    ("Õppisin natuke", "#342b60"),
                ]),
                tempo: mapping(&[
                    ("Liiga rasked ülesanded", "#aa1352"),
                    ("Liiga palju ülesandeid", "#e4067e"),
                    ("Paras", "#4dbed2"),
                    ("Pisut aeglane", "#342b60"),
                ]),
                in_person: mapping(&[
                    ("Jah", "#4dbed2"),
                    ("Ei, sest ei leidnud aega", "#e4067e"),
                    ("Ei, sest ei olnud vaja", "#342b60"),
                ]),
            },
            charts: ChartTexts {
                self_perception: chart_label("Enesetunne", "Enesetunne"),
                time_spent: chart_label("Ajakulu", "Ajakulu"),
                usefulness: chart_label("Kasulikkus", "Midagi kasulikku õpitud"),
                tempo: chart_label("Tempo", "Aine tempo"),
                likability: chart_label("Hinnang_ulesandele", "Hinnang ülesandele"),
                in_person: chart_label(
                    "Kohapeal_kaimine",
                    "Loengus või praktikumis kohapeal käimine",
                ),
                week_word: "nädalal".to_string(),
                progress_all: chart_label(
                    "EX_k6ik_tudengid",
                    "Iganädalaste EX ülesannete lahendamine",
                ),
                progress_micro: chart_label("EX_mikro", "EX ülesannete lahendamine. Mikrokraad"),
                progress_not_micro: chart_label(
                    "EX_mitte_mikro",
                    "EX ülesannete lahendamine. Mitte-mikrokraad",
                ),
                last_active: chart_label(
                    "Paevi_kursuse_kulastamisest",
                    "Päevi viimasest kursuse külastamisest",
                ),
                likability_legend: mapping(&[
                    ("1", "kehv ülesanne"),
                    ("5", "enam-vähem okei"),
                    ("10", "suurepärane"),
                ]),
                last_active_legend: mapping(&[
                    ("0", "täna külastatud"),
                    ("5", "5 päeva tagasi"),
                    ("10", "10 päeva tagasi"),
                ]),
            },
            outputs: OutputNames {
                flags_directory: "Importimiseks_abi_vajavad_tudengid".to_string(),
                flags_file: "Abi_vajavad_tudengid".to_string(),
                week_charts_directory: "Graafikud_Tagasiside_n2dalati".to_string(),
                progress_charts_directory: "Graafikud_EX_progress".to_string(),
            },
        }
    }
}

impl Default for CourseVocabulary {
    fn default() -> Self {
        CourseVocabulary::estonian()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_column_names() {
        let mut suffixes = CourseVocabulary::estonian().suffixes;
        assert_eq!(suffixes.attendance_mode_column(1, 4), "Mood_kohapeal_N1-4");
        assert_eq!(suffixes.mean_time_column(1, 4), "Ajakulu_N1-4_ar_keskm");
        suffixes.attendance_mode_prefix = "Attendance".to_string();
        suffixes.mean_time_prefix = "Time".to_string();
        suffixes.mean_time_suffix = "mean".to_string();
        assert_eq!(suffixes.attendance_mode_column(2, 3), "Attendance_N2-3");
        assert_eq!(suffixes.mean_time_column(2, 3), "Time_N2-3_mean");
    }
}
