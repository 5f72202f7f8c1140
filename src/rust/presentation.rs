//! Terminal and chart rendering of an [`Analysis`].

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, CellAlignment, Table};
use lazy_static::lazy_static;
use serde::Serialize;
use serde_json::{json, Value};
use unicode_width::UnicodeWidthStr;

use crate::analysis::{Analysis, RankedResult};
use crate::classifier::LabelMap;

pub const TITLE: &str = "Emotion analysis from text: a nine-emotion approach";
pub const DESCRIPTION: &str =
    "Enter some text and the balance of nine emotions it carries will be analyzed.";
pub const EMPTY_INPUT_WARNING: &str = "please enter some text to analyze";
pub const CHART_TITLE: &str = "emotion composition";
const BAR_WIDTH: usize = 40;

lazy_static! {
    /// Emoji display names, only applied when decoration is requested.
    static ref EMOTION_DECORATIONS: HashMap<&'static str, &'static str> = HashMap::from([
        ("joy", "喜び 😊"),
        ("sadness", "悲しみ 😢"),
        ("anticipate", "期待 ✨"),
        ("surprise", "驚き 😮"),
        ("anger", "怒り 😠"),
        ("fear", "恐れ 😨"),
        ("disgust", "嫌悪 🤢"),
        ("trust", "信頼 🤗"),
        ("neutral", "中立 😐"),
    ]);
}

/// How category names are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    pub decorate: bool,
}

impl DisplayOptions {
    pub fn display_name<'a>(&self, name: &'a str) -> &'a str {
        if self.decorate {
            EMOTION_DECORATIONS.get(name).copied().unwrap_or(name)
        } else {
            name
        }
    }
}

pub fn banner_message(analysis: &Analysis, options: DisplayOptions) -> String {
    let (name, confidence) = analysis.headline();
    format!(
        "primary emotion is 「{}」 (confidence: {})",
        options.display_name(name),
        confidence
    )
}

fn table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).apply_modifier(UTF8_ROUND_CORNERS);
    table
}

pub fn ranking_table(top: &[RankedResult], options: DisplayOptions) -> Table {
    let mut table = table();
    table.set_header(vec!["rank", "emotion", "score"]);
    for (i, entry) in top.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(options.display_name(entry.name())),
            Cell::new(entry.score.percent()).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// The model's `LABEL_<n>` → name dictionary.
pub fn label_dictionary_table(labels: &LabelMap, options: DisplayOptions) -> Table {
    let mut table = table();
    table.set_header(vec!["internal id", "label"]);
    for (identifier, name) in labels.entries() {
        table.add_row(vec![identifier, options.display_name(name).to_string()]);
    }
    table
}

/// A closed polar line chart with the radial axis fixed to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarChart {
    pub title: String,
    pub theta: Vec<String>,
    pub r: Vec<f32>,
}

impl RadarChart {
    pub const RADIAL_RANGE: [f32; 2] = [0.0, 1.0];

    pub fn from_analysis(analysis: &Analysis, options: DisplayOptions) -> Self {
        Self {
            title: CHART_TITLE.to_string(),
            theta: analysis
                .radar
                .iter()
                .map(|e| options.display_name(e.name()).to_string())
                .collect(),
            r: analysis.radar.iter().map(|e| e.score.value()).collect(),
        }
    }

    /// Points with the first one repeated at the end, so the line closes.
    pub fn closed_points(&self) -> (Vec<&str>, Vec<f32>) {
        let mut theta: Vec<&str> = self.theta.iter().map(String::as_str).collect();
        let mut r = self.r.clone();
        if let (Some(first_theta), Some(first_r)) = (theta.first().copied(), r.first().copied()) {
            theta.push(first_theta);
            r.push(first_r);
        }
        (theta, r)
    }

    /// Plotly figure (`data` + `layout`) for a `scatterpolar` line trace.
    pub fn to_plotly(&self) -> Value {
        let (theta, r) = self.closed_points();
        json!({
            "data": [{
                "type": "scatterpolar",
                "mode": "lines",
                "r": r,
                "theta": theta,
            }],
            "layout": {
                "title": { "text": self.title },
                "polar": { "radialaxis": { "visible": true, "range": Self::RADIAL_RANGE } },
                "showlegend": false,
            }
        })
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
</head>
<body>
<div id="radar" style="width:100%;height:600px;"></div>
<script>
const figure = {figure};
Plotly.newPlot("radar", figure.data, figure.layout, {{responsive: true}});
</script>
</body>
</html>
"#,
            title = self.title,
            figure = self.to_plotly(),
        )
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let body = serde_json::to_string_pretty(&self.to_plotly())?;
        fs::write(path, body)
    }

    pub fn write_html<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, self.to_html())
    }

    /// One bar per category in chart order. Names are padded by display width, so CJK
    /// and emoji names line up with ASCII ones.
    pub fn render_terminal(&self) -> String {
        let width = self.theta.iter().map(|t| t.width()).max().unwrap_or(0);
        self.theta
            .iter()
            .zip(&self.r)
            .map(|(theta, &r)| {
                let filled = (r.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize;
                format!(
                    "{}{} │{}{}│ {:.3}",
                    theta,
                    " ".repeat(width - theta.width()),
                    "█".repeat(filled),
                    " ".repeat(BAR_WIDTH - filled),
                    r
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn print_header() {
    println!("{}", TITLE.bold());
    println!("{}", DESCRIPTION);
}

pub fn print_label_dictionary(labels: &LabelMap, options: DisplayOptions) {
    println!("\n{}", "Model dictionary (id2label)".bold().underline());
    println!("The model predicts an internal id per emotion and names it through this table.");
    println!("{}", label_dictionary_table(labels, options));
}

pub fn print_analysis(analysis: &Analysis, options: DisplayOptions) {
    println!("\n{}", "Result".bold().underline());
    println!("{} {}", "info".blue().bold(), banner_message(analysis, options));

    println!("\n{}", "Emotion score top 3".bold().underline());
    println!("{}", ranking_table(&analysis.top3, options));

    println!("\n{}", "All emotions (radar)".bold().underline());
    println!("{}", RadarChart::from_analysis(analysis, options).render_terminal());
}

pub fn print_warning(msg: &str) {
    println!("{} {}", "warning".yellow().bold(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}

pub fn print_footer(homepage: &str) {
    println!("{}", "---".dimmed());
    println!(
        "{}",
        format!("This app uses the pretrained model published at {}", homepage).dimmed()
    );
}
