/*!
Progress labels, feedback flags and the incremental roster of a course.

The roster is a wide table with one row per student, keyed by the full name.
It is built once from the grades export, then every weekly feedback survey
adds three columns to it (`{week}_ajakulu`, `{week}_kohal`, `{week}_probleemid`).
Once several weeks are merged, aggregates over a range of weeks can be added.

This crate does not read or write files. It works on [Table] values produced
by the readers of the command line program.

```
use student_progress::*;

let vocabulary = CourseVocabulary::estonian();
let label = label_progress(&Cell::Number(12.0), &Cell::Number(0.0), DEFAULT_FULL_POINTS);
assert_eq!(vocabulary.progress.text(label), "alustatud, >10 p");
```
*/
mod aggregate;
mod config;
mod error;
mod feedback;
mod merge;
mod progress;
mod roster;
mod survey;
mod table;

pub use crate::aggregate::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::feedback::*;
pub use crate::merge::*;
pub use crate::progress::*;
pub use crate::roster::*;
pub use crate::survey::*;
pub use crate::table::*;

use log::info;

/// Runs the labelers on one week and merges the result into the roster.
///
/// Returns the flags of the week, in the order of the survey responses.
pub fn process_week(
    roster: &mut Roster,
    survey: &WeeklySurvey,
    vocabulary: &CourseVocabulary,
) -> (Vec<StudentFlag>, MergeReport) {
    info!(
        "process_week: week {} ({} responses)",
        survey.week(),
        survey.len()
    );
    let flags = build_flags(survey, &vocabulary.feedback);
    let rows = derive_week_rows(survey, &flags);
    let report = merge_week(roster, survey.week(), &rows, &vocabulary.suffixes);
    (flags, report)
}
