// src/pipeline/render.rs

//! Report rendering.
//!
//! Turns a classification into the channel-agnostic `ReportPayload`: a
//! summary section, one section per non-empty group, and an HTML document
//! with the same structure for email.

use crate::models::{
    ClassificationResult, GroupMatches, ImportanceCounts, ReportLine, ReportPayload, ReportType,
    RunStats, Section,
};
use crate::utils::escape_html;

const SUMMARY_TITLE: &str = "Summary";

/// Render a classification for one run.
///
/// Pure: the same classification and run stats always give the same payload.
pub fn render(
    result: &ClassificationResult,
    report_type: ReportType,
    run_stats: &RunStats,
) -> ReportPayload {
    let mut sections = vec![summary_section(result, report_type, run_stats)];
    sections.extend(result.non_empty_groups().map(group_section));

    let mut payload = ReportPayload {
        report_type,
        sections,
        html: None,
        generated_at: run_stats.generated_at,
    };
    payload.html = Some(render_html(&payload));
    payload
}

fn text(value: impl Into<String>) -> ReportLine {
    ReportLine::Text { text: value.into() }
}

fn summary_section(
    result: &ClassificationResult,
    report_type: ReportType,
    run_stats: &RunStats,
) -> Section {
    let stats = &result.stats;
    let mut lines = vec![
        text(format!("Report: {}", report_type.label())),
        text(format!(
            "Generated at: {}",
            run_stats.generated_at.format("%Y-%m-%d %H:%M:%S")
        )),
        text(format!("Fetched: {} item(s)", run_stats.fetched)),
    ];

    if stats.matched == 0 {
        lines.push(text(report_type.empty_message()));
    } else {
        let groups = result.non_empty_groups().count();
        lines.push(text(format!(
            "Matched: {} item(s) in {} group(s), {} news, {} forum",
            stats.matched, groups, stats.news, stats.forum
        )));
        if let Some(importance) = importance_line(&stats.importance) {
            lines.push(text(importance));
        }
    }

    if !run_stats.failed_ids.is_empty() {
        lines.push(text(format!(
            "Fetch failed: {}",
            run_stats.failed_ids.join(", ")
        )));
    }

    Section {
        title: SUMMARY_TITLE.to_string(),
        heat: None,
        lines,
    }
}

/// `None` when nothing was scored.
fn importance_line(counts: &ImportanceCounts) -> Option<String> {
    let rated = counts.critical + counts.high + counts.medium + counts.low;
    if rated == 0 {
        return None;
    }
    Some(format!(
        "Importance: {} critical, {} high, {} medium, {} low, {} unrated",
        counts.critical, counts.high, counts.medium, counts.low, counts.unrated
    ))
}

fn group_section(group: &GroupMatches) -> Section {
    let lines = group
        .items
        .iter()
        .map(|item| ReportLine::Item {
            rank: item.rank,
            title: item.title.clone(),
            platform: item.platform_name.clone(),
            url: Some(item.url.trim())
                .filter(|u| !u.is_empty())
                .map(str::to_string),
        })
        .collect();

    Section {
        title: format!("{} ({})", group.display_name, group.total_count),
        heat: Some(group.total_count),
        lines,
    }
}

/// HTML document with one block per section.
fn render_html(payload: &ReportPayload) -> String {
    let headline = escape_html(&payload.headline());
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{headline}</title>\n"));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>{headline}</h1>\n"));

    for section in &payload.sections {
        html.push_str("<section>\n");
        html.push_str(&format!("<h2>{}</h2>\n", escape_html(&section.title)));
        let mut in_list = false;
        for line in &section.lines {
            match line {
                ReportLine::Text { text } => {
                    if in_list {
                        html.push_str("</ol>\n");
                        in_list = false;
                    }
                    html.push_str(&format!("<p>{}</p>\n", escape_html(text)));
                }
                ReportLine::Item {
                    rank,
                    title,
                    platform,
                    url,
                } => {
                    if !in_list {
                        html.push_str("<ol>\n");
                        in_list = true;
                    }
                    let title = escape_html(title);
                    let title = match url {
                        Some(url) => format!("<a href=\"{}\">{}</a>", escape_html(url), title),
                        None => title,
                    };
                    html.push_str(&format!(
                        "<li value=\"{}\">{} <span class=\"platform\">({})</span></li>\n",
                        rank,
                        title,
                        escape_html(platform)
                    ));
                }
            }
        }
        if in_list {
            html.push_str("</ol>\n");
        }
        html.push_str("</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}
