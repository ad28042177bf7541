use clap::Parser;

/// Weekly progress and feedback reports for a course.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file describing the course: the input files, the graded assignments
    /// and the week ranges to aggregate. Relative paths in it are resolved against its directory.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (directory, optional) Where the roster, the flag lists and the charts are written.
    /// Setting this option overrides the output directory of the --config file.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// If passed, the roster written by a previous run is reused and only the weekly surveys
    /// and the aggregations are processed.
    #[clap(long, takes_value = false)]
    pub skip_roster_build: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
