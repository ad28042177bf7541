use log::{debug, info};

use crate::config::*;
use crate::survey::WeeklySurvey;

/// The flag raised for one student in one week.
#[derive(PartialEq, Debug, Clone)]
pub struct StudentFlag {
    pub full_name: Option<String>,
    pub username: Option<String>,
    /// Present only when the student reported a low mood and spent much more
    /// time than the others.
    pub flag: Option<String>,
}

/// Capitalizes the first letter of every word and lowercases the rest.
pub fn title_case(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                res.extend(c.to_lowercase());
            } else {
                res.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            res.push(c);
            in_word = false;
        }
    }
    res
}

/// Flags a neutral or negative self-perception.
///
/// The answer is matched case-insensitively against the low mood keywords
/// of the vocabulary. Positive or unknown answers are not flagged.
pub fn self_perception_flag(self_perception: &str, texts: &FeedbackTexts) -> Option<String> {
    let lowered = self_perception.to_lowercase();
    if texts
        .low_mood_keywords
        .iter()
        .any(|k| lowered.contains(k.as_str()))
    {
        Some(format!(
            "{} {}",
            title_case(&lowered),
            texts.self_perception_suffix
        ))
    } else {
        None
    }
}

/// Flags a student who spent at least 5 hours more than the median of the week.
pub fn time_overrun_flag(
    time_spent: Option<f64>,
    median_time_spent: Option<f64>,
    texts: &FeedbackTexts,
) -> Option<String> {
    let extra = time_spent? - median_time_spent?;
    if extra >= TIME_OVERRUN_THRESHOLD_HOURS {
        Some(format!("{:.1} {}", extra, texts.time_overrun_suffix))
    } else {
        None
    }
}

/// Both flags must be present, the time flag comes first.
pub fn combined_flag(self_flag: Option<&str>, time_flag: Option<&str>) -> Option<String> {
    match (self_flag, time_flag) {
        (Some(s), Some(t)) => Some(format!("{} {}", t, s)),
        _ => None,
    }
}

/// Computes the flag of every response of the week, in the order of the responses.
pub fn build_flags(survey: &WeeklySurvey, texts: &FeedbackTexts) -> Vec<StudentFlag> {
    let median = survey.median_time_spent();
    let res: Vec<StudentFlag> = survey
        .responses()
        .iter()
        .map(|r| {
            let self_flag = r
                .self_perception
                .as_deref()
                .and_then(|s| self_perception_flag(s, texts));
            let time_flag = time_overrun_flag(r.time_spent, median, texts);
            let flag = combined_flag(self_flag.as_deref(), time_flag.as_deref());
            debug!(
                "build_flags: week {}: {:?} self: {:?} time: {:?}",
                survey.week(),
                r.full_name,
                self_flag,
                time_flag
            );
            StudentFlag {
                full_name: r.full_name.clone(),
                username: r.username.clone(),
                flag,
            }
        })
        .collect();
    let flagged: Vec<&str> = res
        .iter()
        .filter(|f| f.flag.is_some())
        .filter_map(|f| f.full_name.as_deref())
        .collect();
    info!(
        "Student summary for week {}: need support: {}/{}. Students: {}",
        survey.week(),
        flagged.len(),
        survey.len(),
        flagged.join(", ")
    );
    res
}
