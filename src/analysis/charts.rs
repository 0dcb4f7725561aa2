//! Static SVG charts and a themed interactive HTML page.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use crate::analysis::distribution::{MonthlyPoint, ScoreHistogram};
use crate::config::ChartTheme;
use crate::table::models::{GroupAggregate, Score};

const WIDTH: u32 = 960;
const ROW_HEIGHT: u32 = 26;
const FONT: &str = "sans-serif";

/// Eight stops sampled from viridis.
const PALETTE: [RGBColor; 8] = [
    RGBColor(0x44, 0x01, 0x54),
    RGBColor(0x46, 0x32, 0x7e),
    RGBColor(0x36, 0x5c, 0x8d),
    RGBColor(0x27, 0x7f, 0x8e),
    RGBColor(0x1f, 0xa1, 0x87),
    RGBColor(0x4a, 0xc1, 0x6d),
    RGBColor(0xa0, 0xda, 0x39),
    RGBColor(0xfd, 0xe7, 0x25),
];

#[derive(Debug, Clone, Copy)]
pub struct Colors {
    pub background: RGBColor,
    pub text: RGBColor,
    pub grid: RGBColor,
}

impl ChartTheme {
    pub fn colors(self) -> Colors {
        match self {
            ChartTheme::Light => Colors {
                background: RGBColor(0xff, 0xff, 0xff),
                text: RGBColor(0x00, 0x00, 0x00),
                grid: RGBColor(0xcc, 0xcc, 0xcc),
            },
            ChartTheme::Dark => Colors {
                background: RGBColor(0x1f, 0x1f, 0x1f),
                text: RGBColor(0xff, 0xff, 0xff),
                grid: RGBColor(0x44, 0x44, 0x44),
            },
        }
    }
}

fn css(color: RGBColor) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn color_for(index: usize, total: usize) -> RGBColor {
    if total <= 1 {
        return PALETTE[0];
    }
    PALETTE[index * (PALETTE.len() - 1) / (total - 1)]
}

fn text_style(colors: Colors, size: u32) -> TextStyle<'static> {
    (FONT, size).into_font().color(&colors.text)
}

/// Draw onto a themed SVG canvas and return the markup.
fn render_svg<F>(size: (u32, u32), colors: Colors, draw: F) -> Result<String>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<()>,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&colors.background)?;
        draw(&root)?;
        root.present()?;
    }
    Ok(svg)
}

/// Horizontal bars over the fixed score range [-1, 1]. The first bar is
/// drawn on top.
pub fn score_bar_chart(
    title: &str,
    axis_label: &str,
    bars: &[(String, f64)],
    theme: ChartTheme,
) -> Result<String> {
    let colors = theme.colors();
    let rows = bars.len().max(1) as u32;
    let height = 140 + ROW_HEIGHT * rows;
    // Segment 0 is the bottom row.
    let labels: Vec<&str> = bars.iter().rev().map(|(label, _)| label.as_str()).collect();

    render_svg((WIDTH, height), colors, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, text_style(colors, 22))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(220)
            .build_cartesian_2d(-1.0f64..1.0f64, (0u32..rows).into_segmented())?;

        let label_of = |v: &SegmentValue<u32>| match v {
            SegmentValue::CenterOf(i) => labels
                .get(*i as usize)
                .map(|l| l.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_y_mesh()
            .bold_line_style(colors.grid)
            .light_line_style(colors.background)
            .axis_style(colors.text)
            .label_style(text_style(colors, 13))
            .axis_desc_style(text_style(colors, 15))
            .x_desc(axis_label)
            .x_labels(5)
            .y_labels(rows as usize + 1)
            .y_label_formatter(&label_of)
            .draw()?;

        let total = bars.len();
        chart.draw_series(bars.iter().rev().enumerate().map(|(row, (_, value))| {
            let rank = total - 1 - row;
            let row = row as u32;
            Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(row)),
                    (value.clamp(-1.0, 1.0), SegmentValue::Exact(row + 1)),
                ],
                color_for(rank, total).mix(0.8).filled(),
            )
        }))?;
        Ok(())
    })
}

/// Stacked columns, one per score value, stacked by author.
pub fn score_histogram_chart(histogram: &[ScoreHistogram], theme: ChartTheme) -> Result<String> {
    let colors = theme.colors();
    let max_total = Score::ALL
        .iter()
        .map(|s| histogram.iter().map(|h| h.get(*s)).sum::<u64>())
        .max()
        .unwrap_or(0)
        .max(1);

    render_svg((WIDTH, 520), colors, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption("Distribution of Scores by Politicians", text_style(colors, 22))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(
                (0u32..Score::ALL.len() as u32).into_segmented(),
                0u64..max_total,
            )?;

        let score_label = |v: &SegmentValue<u32>| match v {
            SegmentValue::CenterOf(i) => Score::ALL
                .get(*i as usize)
                .map(|s| s.value().to_string())
                .unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(colors.grid)
            .light_line_style(colors.background)
            .axis_style(colors.text)
            .label_style(text_style(colors, 13))
            .axis_desc_style(text_style(colors, 15))
            .x_desc("Score")
            .y_desc("Count")
            .x_label_formatter(&score_label)
            .draw()?;

        let mut base = vec![0u64; Score::ALL.len()];
        for (i, h) in histogram.iter().enumerate() {
            let color = color_for(i, histogram.len());
            let mut blocks = Vec::new();
            for (col, score) in Score::ALL.iter().enumerate() {
                let n = h.get(*score);
                if n == 0 {
                    continue;
                }
                let segment = col as u32;
                blocks.push(Rectangle::new(
                    [
                        (SegmentValue::Exact(segment), base[col]),
                        (SegmentValue::Exact(segment + 1), base[col] + n),
                    ],
                    color.filled(),
                ));
                base[col] += n;
            }
            chart
                .draw_series(blocks)?
                .label(h.author.as_str())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
        }

        if !histogram.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(colors.background)
                .border_style(colors.text)
                .label_font(text_style(colors, 12))
                .draw()?;
        }
        Ok(())
    })
}

/// Monthly statement counts as a line with point markers.
pub fn monthly_series_chart(series: &[MonthlyPoint], theme: ChartTheme) -> Result<String> {
    let colors = theme.colors();
    let max_count = series.iter().map(|p| p.count).max().unwrap_or(0).max(1);
    let last = series.len().saturating_sub(1).max(1);

    render_svg((WIDTH, 420), colors, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption("Fact-checked Statements per Month", text_style(colors, 22))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0usize..last, 0u64..max_count + 1)?;

        let month_label = |i: &usize| {
            series
                .get(*i)
                .map(|p| p.month.clone())
                .unwrap_or_default()
        };
        chart
            .configure_mesh()
            .bold_line_style(colors.grid)
            .light_line_style(colors.background)
            .axis_style(colors.text)
            .label_style(text_style(colors, 11))
            .axis_desc_style(text_style(colors, 15))
            .y_desc("Statements")
            .x_labels(series.len().clamp(2, 12))
            .x_label_formatter(&month_label)
            .draw()?;

        let line = PALETTE[3];
        chart.draw_series(LineSeries::new(
            series.iter().enumerate().map(|(i, p)| (i, p.count)),
            line.stroke_width(2),
        ))?;
        chart.draw_series(
            series
                .iter()
                .enumerate()
                .map(|(i, p)| Circle::new((i, p.count), 3, line.filled())),
        )?;
        Ok(())
    })
}

/// Self-contained HTML page: the average-score bar chart plus a table whose
/// rows highlight and show a tooltip on hover.
pub fn interactive_page(
    title: &str,
    groups: &[GroupAggregate],
    theme: ChartTheme,
) -> Result<String> {
    let colors = theme.colors();
    let bars: Vec<(String, f64)> = groups
        .iter()
        .map(|g| (g.key.clone(), g.average_score))
        .collect();
    let svg = score_bar_chart(title, "Average Score", &bars, theme)?;

    let rows: String = groups
        .iter()
        .map(|g| {
            let label = escape(&g.key);
            format!(
                r#"<tr class="bar" title="{label}: {score:.2}"><td>{label}</td><td>{score:.2}</td><td>{count}</td></tr>"#,
                score = g.average_score,
                count = g.count,
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="it">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ background: {bg}; color: {fg}; font-family: Roboto, sans-serif; margin: 0; padding: 24px; }}
table {{ border-collapse: collapse; margin-top: 16px; }}
td, th {{ padding: 4px 12px; border-bottom: 1px solid {grid}; }}
.bar:hover {{ background: {grid}; }}
</style>
</head>
<body>
{svg}
<table>
<tr><th>Name</th><th>Average Score</th><th>Statements</th></tr>
{rows}
</table>
</body>
</html>
"#,
        title = escape(title),
        bg = css(colors.background),
        fg = css(colors.text),
        grid = css(colors.grid),
    ))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

/// Inputs for [`render_all`].
pub struct ChartData<'a> {
    pub by_author: &'a [GroupAggregate],
    pub by_party: &'a [GroupAggregate],
    pub histogram: &'a [ScoreHistogram],
    pub monthly: &'a [MonthlyPoint],
}

/// Write every chart into `dir`. Grouped inputs are expected ranked.
pub fn render_all(dir: &Path, data: &ChartData<'_>, theme: ChartTheme) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create chart directory {}", dir.display()))?;

    let bars = |groups: &[GroupAggregate]| -> Vec<(String, f64)> {
        groups
            .iter()
            .map(|g| (g.key.clone(), g.normalized_score))
            .collect()
    };

    let outputs = [
        (
            "credibility_by_politician.svg",
            score_bar_chart(
                "Overall Credibility by Politicians",
                "Normalized Average Credibility Score",
                &bars(data.by_author),
                theme,
            )?,
        ),
        (
            "credibility_by_party.svg",
            score_bar_chart(
                "Overall Credibility by Parties",
                "Normalized Average Credibility Score",
                &bars(data.by_party),
                theme,
            )?,
        ),
        (
            "score_distribution.svg",
            score_histogram_chart(data.histogram, theme)?,
        ),
        (
            "statements_per_month.svg",
            monthly_series_chart(data.monthly, theme)?,
        ),
        (
            "interactive_scores.html",
            interactive_page(
                "Interactive Average Scores by Politicians",
                data.by_author,
                theme,
            )?,
        ),
    ];

    let mut written = Vec::with_capacity(outputs.len());
    for (name, contents) in outputs {
        let path = dir.join(name);
        write_file(&path, &contents)?;
        written.push(path);
    }

    info!(dir = %dir.display(), files = written.len(), "Charts rendered");
    Ok(written)
}
