use snafu::Snafu;

/// Errors that stop a roster operation.
///
/// Soft coercion failures (a non-numeric point value, an unknown sentiment)
/// are never reported here: they degrade to a default label instead.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RosterError {
    #[snafu(display("No week number found in file name {file_name:?}"))]
    ParseWeek { file_name: String },

    #[snafu(display("Week number {digits} in file name {file_name:?} is out of range"))]
    WeekOutOfRange { file_name: String, digits: String },

    #[snafu(display("Cannot read activity time {value:?} (expected format {format:?})"))]
    ParseTimestamp {
        value: String,
        format: String,
        source: chrono::ParseError,
    },

    #[snafu(display("Column {column:?} is missing in {source_name}"))]
    MissingColumn { column: String, source_name: String },

    #[snafu(display("Student {name:?} appears more than once in the roster"))]
    DuplicateStudent { name: String },

    #[snafu(display(
        "No {keyword:?} columns found for weeks {first}-{last}. Run the weekly feedback analysis first."
    ))]
    NoMatchingColumns { keyword: String, first: u32, last: u32 },

    #[snafu(display("Column range {first}..{last} is outside of the header (width {width})"))]
    ColumnIndexOutOfRange {
        first: usize,
        last: usize,
        width: usize,
    },
}

pub type RosterResult<T> = Result<T, RosterError>;
