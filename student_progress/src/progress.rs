use log::debug;

use crate::config::*;
use crate::table::Cell;

/// A cell that could not be read as a number.
#[derive(PartialEq, Debug, Clone)]
pub struct CoercionFailure(pub Cell);

/// Reads a grade cell as a number.
///
/// A missing cell is a missing number (NaN): it compares false with
/// everything, as in the spreadsheet exports. Text that does not parse
/// is a coercion failure.
pub fn coerce_points(cell: &Cell) -> Result<f64, CoercionFailure> {
    match cell {
        Cell::Empty => Ok(f64::NAN),
        Cell::Number(x) => Ok(*x),
        Cell::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Cell::Text(_) => cell
            .as_f64()
            .or_else(|| cell.as_bool().map(|b| if b { 1.0 } else { 0.0 }))
            .ok_or_else(|| CoercionFailure(cell.clone())),
    }
}

/// The fallback policy for unreadable grades: the exercise counts as not started.
pub fn not_started_on_coercion_failure(failure: CoercionFailure) -> ProgressLabel {
    debug!("label_progress: unreadable grade {:?}, not started", failure.0);
    ProgressLabel::NotStarted
}

/// Labels the progress of a student on one assignment.
///
/// Arguments:
/// * `points` the points obtained without the defence
/// * `defence` 1 if the assignment was defended, 0 otherwise
/// * `full_points` the points of a fully solved assignment (15 for weekly
/// exercises, more for projects)
///
/// The rules are applied in order, the first match wins. A defended
/// assignment is always labeled as defended, even with zero points, but the
/// defence is only looked at once both inputs are readable numbers.
pub fn label_progress(points: &Cell, defence: &Cell, full_points: f64) -> ProgressLabel {
    let (points, defence) = match (coerce_points(points), coerce_points(defence)) {
        (Ok(p), Ok(d)) => (p, d),
        (Err(e), _) | (_, Err(e)) => return not_started_on_coercion_failure(e),
    };
    label_points(points, defence, full_points)
}

/// The decision order on numeric inputs.
pub fn label_points(points: f64, defence: f64, full_points: f64) -> ProgressLabel {
    if defence == 1.0 {
        ProgressLabel::Defended
    } else if points == 0.0 {
        ProgressLabel::NotStarted
    } else if points == full_points && defence == 0.0 {
        ProgressLabel::DoneUndefended
    } else if points > STARTED_HIGH_THRESHOLD {
        ProgressLabel::StartedHigh
    } else if points > 0.0 {
        ProgressLabel::StartedLow
    } else {
        ProgressLabel::NotStarted
    }
}

/// Sums the points of several grade columns. Unreadable or missing cells are
/// skipped, so an empty row sums to 0.
pub fn sum_points(cells: &[&Cell]) -> f64 {
    cells
        .iter()
        .filter_map(|c| c.as_f64())
        .fold(0.0, |acc, x| acc + x)
}
