// src/pipeline/markup.rs

//! Text styles for the different channel families.

use crate::models::{ReportLine, ReportPayload, Section};
use crate::utils::escape_html;

use super::split::Block;

/// Heat marker for a group title by match volume.
pub fn heat_marker(heat: usize) -> &'static str {
    match heat {
        n if n >= 10 => "🔥",
        n if n >= 5 => "📈",
        _ => "📌",
    }
}

/// How section titles and item lines are written for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    /// `**bold**` and `[title](url)` links
    Markdown,
    /// Slack mrkdwn: `*bold*` and `<url|title>` links
    SlackMrkdwn,
    /// Telegram HTML parse mode
    TelegramHtml,
    /// No formatting; URLs follow the title
    Plain,
}

impl Markup {
    /// Section title with its heat marker.
    pub fn title(&self, section: &Section) -> String {
        let title = match section.heat {
            Some(heat) => format!("{} {}", heat_marker(heat), section.title),
            None => section.title.clone(),
        };
        match self {
            Markup::Markdown => format!("**{title}**"),
            Markup::SlackMrkdwn => format!("*{}*", escape_slack(&title)),
            Markup::TelegramHtml => format!("<b>{}</b>", escape_html(&title)),
            Markup::Plain => title,
        }
    }

    /// One report line.
    pub fn line(&self, line: &ReportLine) -> String {
        match line {
            ReportLine::Text { text } => match self {
                Markup::SlackMrkdwn => escape_slack(text),
                Markup::TelegramHtml => escape_html(text),
                Markup::Markdown | Markup::Plain => text.clone(),
            },
            ReportLine::Item {
                rank,
                title,
                platform,
                url,
            } => {
                let linked = match (self, url) {
                    (Markup::Markdown, Some(url)) => format!("[{title}]({url})"),
                    (Markup::SlackMrkdwn, Some(url)) => {
                        format!("<{}|{}>", url, escape_slack(title))
                    }
                    (Markup::TelegramHtml, Some(url)) => format!(
                        "<a href=\"{}\">{}</a>",
                        escape_html(url),
                        escape_html(title)
                    ),
                    (Markup::Plain, Some(url)) => format!("{title} {url}"),
                    (Markup::SlackMrkdwn, None) => escape_slack(title),
                    (Markup::TelegramHtml, None) => escape_html(title),
                    (Markup::Markdown | Markup::Plain, None) => title.clone(),
                };
                let platform = match self {
                    Markup::SlackMrkdwn => escape_slack(platform),
                    Markup::TelegramHtml => escape_html(platform),
                    Markup::Markdown | Markup::Plain => platform.clone(),
                };
                format!("{rank}. {linked} ({platform})")
            }
        }
    }

    /// Render every section into a splittable block.
    pub fn blocks(&self, payload: &ReportPayload) -> Vec<Block> {
        payload
            .sections
            .iter()
            .map(|section| Block {
                title: self.title(section),
                lines: section.lines.iter().map(|l| self.line(l)).collect(),
            })
            .collect()
    }

    /// Whole payload as one text.
    pub fn render(&self, payload: &ReportPayload) -> String {
        self.blocks(payload)
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join(super::split::SECTION_SEPARATOR)
    }
}

fn escape_slack(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(url: Option<&str>) -> ReportLine {
        ReportLine::Item {
            rank: 2,
            title: "A<B".into(),
            platform: "Weibo".into(),
            url: url.map(str::to_string),
        }
    }

    #[test]
    fn test_heat_markers() {
        assert_eq!(heat_marker(12), "🔥");
        assert_eq!(heat_marker(10), "🔥");
        assert_eq!(heat_marker(5), "📈");
        assert_eq!(heat_marker(1), "📌");
    }

    #[test]
    fn test_titles_per_style() {
        let section = Section {
            title: "AI (6)".into(),
            heat: Some(6),
            lines: Vec::new(),
        };
        assert_eq!(Markup::Markdown.title(&section), "**📈 AI (6)**");
        assert_eq!(Markup::SlackMrkdwn.title(&section), "*📈 AI (6)*");
        assert_eq!(Markup::TelegramHtml.title(&section), "<b>📈 AI (6)</b>");
        assert_eq!(Markup::Plain.title(&section), "📈 AI (6)");

        let summary = Section {
            title: "Summary".into(),
            heat: None,
            lines: Vec::new(),
        };
        assert_eq!(Markup::Plain.title(&summary), "Summary");
    }

    #[test]
    fn test_item_lines_per_style() {
        let linked = item(Some("https://x.test/1"));
        assert_eq!(
            Markup::Markdown.line(&linked),
            "2. [A<B](https://x.test/1) (Weibo)"
        );
        assert_eq!(
            Markup::SlackMrkdwn.line(&linked),
            "2. <https://x.test/1|A&lt;B> (Weibo)"
        );
        assert_eq!(
            Markup::TelegramHtml.line(&linked),
            "2. <a href=\"https://x.test/1\">A&lt;B</a> (Weibo)"
        );
        assert_eq!(Markup::Plain.line(&linked), "2. A<B https://x.test/1 (Weibo)");
        assert_eq!(Markup::Markdown.line(&item(None)), "2. A<B (Weibo)");
    }
}
