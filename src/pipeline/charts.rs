// Chart descriptions for the weekly surveys and the progress of the course.
//
// The charts are not drawn here: each one is written as a JSON file with the
// counts and the colours, for the plotting tool of the course.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pipeline::io_common::ensure_dir;
use crate::pipeline::*;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ChartKind {
    #[serde(rename = "pie")]
    Pie,
    #[serde(rename = "box")]
    BoxPlot,
    #[serde(rename = "histogram")]
    Histogram,
    #[serde(rename = "stackedBar")]
    StackedBar,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ChartCategory {
    pub label: String,
    pub count: usize,
    pub color: Option<String>,
}

/// One bar of a stacked bar chart. The shares are percentages.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ChartStack {
    pub label: String,
    pub categories: Vec<ChartCategory>,
    pub shares: Vec<f64>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<ChartCategory>,
    /// Raw values, for box plots.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stacks: Vec<ChartStack>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legend: Legend,
}

impl ChartSpec {
    fn new(title: String, kind: ChartKind) -> ChartSpec {
        ChartSpec {
            title,
            kind,
            categories: Vec::new(),
            values: Vec::new(),
            stacks: Vec::new(),
            legend: Vec::new(),
        }
    }
}

/// A chart and the stem of the file it is written to.
pub type NamedChart = (String, ChartSpec);

/// Counts the answers. The categories of the palette come first, in palette
/// order, then the other answers in lexical order. Missing answers and
/// categories without answers are left out.
pub fn count_categories(answers: &[Option<&str>], palette: &Palette) -> Vec<ChartCategory> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for a in answers.iter().flatten().filter(|a| !a.is_empty()) {
        *counts.entry(*a).or_insert(0) += 1;
    }
    let mut res: Vec<ChartCategory> = Vec::new();
    for (label, color) in palette.iter() {
        if let Some(count) = counts.remove(label.as_str()) {
            res.push(ChartCategory {
                label: label.clone(),
                count,
                color: Some(color.clone()),
            });
        }
    }
    for (label, count) in counts {
        res.push(ChartCategory {
            label: label.to_string(),
            count,
            color: None,
        });
    }
    res
}

/// Counts integer values, in increasing order.
pub fn count_values(values: &[i64]) -> Vec<ChartCategory> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(*v).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(v, count)| ChartCategory {
            label: v.to_string(),
            count,
            color: None,
        })
        .collect()
}

/// `Tempo 3. nädalal (41)`, stored as `Tempo_N3`.
fn week_chart(
    survey: &WeeklySurvey,
    label: &ChartLabel,
    texts: &ChartTexts,
    kind: ChartKind,
) -> (String, ChartSpec) {
    let title = format!(
        "{} {}. {} ({})",
        label.title,
        survey.week(),
        texts.week_word,
        survey.len()
    );
    (
        format!("{}_N{}", label.stem, survey.week()),
        ChartSpec::new(title, kind),
    )
}

fn pie(
    survey: &WeeklySurvey,
    label: &ChartLabel,
    texts: &ChartTexts,
    answer: impl Fn(&SurveyResponse) -> Option<&str>,
    palette: &Palette,
) -> NamedChart {
    let answers: Vec<Option<&str>> = survey.responses().iter().map(answer).collect();
    let (name, mut chart) = week_chart(survey, label, texts, ChartKind::Pie);
    chart.categories = count_categories(&answers, palette);
    (name, chart)
}

/// The charts of one week of survey answers.
pub fn week_charts(survey: &WeeklySurvey, vocabulary: &CourseVocabulary) -> Vec<NamedChart> {
    let palettes = &vocabulary.palettes;
    let texts = &vocabulary.charts;
    let mut res: Vec<NamedChart> = Vec::new();

    res.push(pie(
        survey,
        &texts.self_perception,
        texts,
        |r| r.self_perception.as_deref(),
        &palettes.self_perception,
    ));

    let (name, mut time_spent) = week_chart(survey, &texts.time_spent, texts, ChartKind::BoxPlot);
    time_spent.values = survey.responses().iter().filter_map(|r| r.time_spent).collect();
    res.push((name, time_spent));

    res.push(pie(
        survey,
        &texts.usefulness,
        texts,
        |r| r.usefulness.as_deref(),
        &palettes.usefulness,
    ));
    res.push(pie(
        survey,
        &texts.tempo,
        texts,
        |r| r.tempo.as_deref(),
        &palettes.tempo,
    ));

    let (name, mut likability) = week_chart(survey, &texts.likability, texts, ChartKind::Histogram);
    let scores: Vec<i64> = survey
        .responses()
        .iter()
        .filter_map(|r| r.likability.map(|x| x as i64))
        .collect();
    likability.categories = count_values(&scores);
    likability.legend = texts.likability_legend.clone();
    res.push((name, likability));

    res.push(pie(
        survey,
        &texts.in_person,
        texts,
        |r| r.in_person.as_deref(),
        &palettes.in_person,
    ));
    res
}

fn stacked_progress(
    roster: &Roster,
    columns: &[String],
    keep: fn(&RosterRow) -> bool,
    palette: &Palette,
) -> RosterResult<(usize, Vec<ChartStack>)> {
    let kept: Vec<&RosterRow> = roster.rows().iter().filter(|r| keep(r)).collect();
    let mut stacks: Vec<ChartStack> = Vec::new();
    for col in columns {
        let idx = roster.column_index(col).context(MissingColumnSnafu {
            column: col.clone(),
            source_name: "roster".to_string(),
        })?;
        let texts: Vec<Option<String>> = kept.iter().map(|r| r.cells()[idx].as_text()).collect();
        let answers: Vec<Option<&str>> = texts.iter().map(|t| t.as_deref()).collect();
        let categories = count_categories(&answers, palette);
        let total: usize = categories.iter().map(|c| c.count).sum();
        let shares = categories
            .iter()
            .map(|c| 100.0 * c.count as f64 / total as f64)
            .collect();
        stacks.push(ChartStack {
            label: col.clone(),
            categories,
            shares,
        });
    }
    Ok((kept.len(), stacks))
}

/// The progress of the students on the assignments of the given weeks: all
/// students, micro-credential students, the others, and the days since the
/// last visit of the course.
pub fn progress_charts(
    roster: &Roster,
    weeks: &[u32],
    vocabulary: &CourseVocabulary,
) -> RosterResult<Vec<NamedChart>> {
    let columns: Vec<String> = weeks
        .iter()
        .map(|w| vocabulary.suffixes.progress_column(*w))
        .collect();
    let interval = match (columns.first(), columns.last()) {
        (Some(a), Some(b)) => format!("{}-{}", a, b),
        _ => String::new(),
    };
    let palette = &vocabulary.palettes.progress;
    let mut res: Vec<NamedChart> = Vec::new();

    let texts = &vocabulary.charts;
    let groups: [(&ChartLabel, fn(&RosterRow) -> bool); 3] = [
        (&texts.progress_all, |_: &RosterRow| true),
        (&texts.progress_micro, |r: &RosterRow| r.micro == Some(true)),
        (&texts.progress_not_micro, |r: &RosterRow| r.micro == Some(false)),
    ];
    for (label, keep) in groups.iter() {
        let (n, stacks) = stacked_progress(roster, &columns, *keep, palette)?;
        let mut chart = ChartSpec::new(format!("{} ({})", label.title, n), ChartKind::StackedBar);
        chart.stacks = stacks;
        res.push((format!("{}_{}", label.stem, interval), chart));
    }

    let mut last_active = ChartSpec::new(
        format!("{} ({})", texts.last_active.title, roster.len()),
        ChartKind::Histogram,
    );
    let days: Vec<i64> = roster.rows().iter().filter_map(|r| r.last_active).collect();
    last_active.categories = count_values(&days);
    last_active.legend = texts.last_active_legend.clone();
    res.push((texts.last_active.stem.clone(), last_active));
    Ok(res)
}

/// Writes each chart to `{dir}/{stamp}_{name}.json`.
pub fn write_charts(dir: &Path, stamp: &str, charts: &[NamedChart]) -> PResult<Vec<PathBuf>> {
    ensure_dir(dir)?;
    let mut res: Vec<PathBuf> = Vec::new();
    for (name, chart) in charts {
        let path = dir.join(format!("{}_{}.json", stamp, name));
        let p = path.display().to_string();
        let js = serde_json::to_string_pretty(chart).context(WritingJsonSnafu { path: p.clone() })?;
        fs::write(&path, js).context(WritingFileSnafu { path: p })?;
        debug!("write_charts: {:?}", path);
        res.push(path);
    }
    info!("Wrote {} charts to {:?}", res.len(), dir.display());
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(mood: &str, hours: f64, score: u8) -> SurveyResponse {
        SurveyResponse {
            full_name: Some(format!("{} {}", mood, hours)),
            self_perception: Some(mood.to_string()),
            time_spent: Some(hours),
            likability: Some(score),
            ..Default::default()
        }
    }

    #[test]
    fn palette_order_then_lexical() {
        let palette: Palette = vec![
            ("Jah".to_string(), "#4dbed2".to_string()),
            ("Ei".to_string(), "#e4067e".to_string()),
        ];
        let cats = count_categories(
            &[Some("Ei"), Some("Muu"), None, Some("Jah"), Some("Ei"), Some("")],
            &palette,
        );
        let labels: Vec<(&str, usize)> = cats.iter().map(|c| (c.label.as_str(), c.count)).collect();
        assert_eq!(labels, vec![("Jah", 1), ("Ei", 2), ("Muu", 1)]);
        assert_eq!(cats[2].color, None);
    }

    #[test]
    fn charts_of_a_week() {
        let voc = CourseVocabulary::estonian();
        let survey = WeeklySurvey::new(
            3,
            vec![
                response("Neutraalne", 4.0, 7),
                response("Väga positiivne", 2.0, 7),
                response("Neutraalne", 6.0, 10),
            ],
        );
        let charts = week_charts(&survey, &voc);
        let names: Vec<&str> = charts.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Enesetunne_N3",
                "Ajakulu_N3",
                "Kasulikkus_N3",
                "Tempo_N3",
                "Hinnang_ulesandele_N3",
                "Kohapeal_kaimine_N3"
            ]
        );
        let mood = &charts[0].1;
        assert_eq!(mood.title, "Enesetunne 3. nädalal (3)");
        assert_eq!(mood.categories[0].label, "Väga positiivne");
        assert_eq!(mood.categories[1].count, 2);
        assert_eq!(charts[1].1.values, vec![4.0, 2.0, 6.0]);
        let scores: Vec<(&str, usize)> = charts[4]
            .1
            .categories
            .iter()
            .map(|c| (c.label.as_str(), c.count))
            .collect();
        assert_eq!(scores, vec![("7", 2), ("10", 1)]);
        // Nobody answered the tempo question.
        assert!(charts[3].1.categories.is_empty());
    }

    #[test]
    fn titles_come_from_the_vocabulary() {
        let mut voc = CourseVocabulary::estonian();
        voc.charts.week_word = "week".to_string();
        voc.charts.tempo.title = "Pace".to_string();
        voc.charts.tempo.stem = "Pace".to_string();
        voc.charts.likability_legend = vec![("1".to_string(), "bad".to_string())];
        let survey = WeeklySurvey::new(2, vec![response("Neutraalne", 1.0, 5)]);
        let charts = week_charts(&survey, &voc);
        assert_eq!(charts[3].0, "Pace_N2");
        assert_eq!(charts[3].1.title, "Pace 2. week (1)");
        assert_eq!(charts[4].1.legend, voc.charts.likability_legend);
    }

    #[test]
    fn progress_by_group() {
        let voc = CourseVocabulary::estonian();
        let mut t = Table::new(vec![
            FULL_NAME.to_string(),
            USERNAME.to_string(),
            EMAIL.to_string(),
            MICRO.to_string(),
            LAST_ACTIVE.to_string(),
            "EX1".to_string(),
        ]);
        t.push_row(vec![
            Cell::text("Ann"),
            Cell::text("ann"),
            Cell::Empty,
            Cell::Bool(true),
            Cell::Number(0.0),
            Cell::text("kaitstud"),
        ]);
        t.push_row(vec![
            Cell::text("Bert"),
            Cell::text("bert"),
            Cell::Empty,
            Cell::Bool(false),
            Cell::Number(3.0),
            Cell::text("alustamata"),
        ]);
        let roster = Roster::from_table(t).unwrap();
        let charts = progress_charts(&roster, &[1], &voc).unwrap();
        assert_eq!(charts.len(), 4);
        assert_eq!(charts[0].0, "EX_k6ik_tudengid_EX1-EX1");
        assert_eq!(charts[0].1.stacks[0].shares, vec![50.0, 50.0]);
        assert_eq!(charts[1].1.title, "EX ülesannete lahendamine. Mikrokraad (1)");
        assert_eq!(charts[1].1.stacks[0].categories[0].label, "kaitstud");
        assert_eq!(charts[3].1.categories.len(), 2);

        assert!(matches!(
            progress_charts(&roster, &[2], &voc),
            Err(RosterError::MissingColumn { .. })
        ));
    }

    #[test]
    fn charts_are_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut chart = ChartSpec::new("Ajakulu".to_string(), ChartKind::BoxPlot);
        chart.values = vec![1.0, 2.5];
        let paths = write_charts(dir.path(), "s", &[("Ajakulu_N1".to_string(), chart.clone())]).unwrap();
        assert_eq!(paths, vec![dir.path().join("s_Ajakulu_N1.json")]);
        let back: ChartSpec = serde_json::from_str(&fs::read_to_string(&paths[0]).unwrap()).unwrap();
        assert_eq!(back, chart);
    }
}
