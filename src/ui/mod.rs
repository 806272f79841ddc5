//! Terminal rendering for the CLI.
//!
//! Colored status lines, spinners while a provider call is in flight, and
//! comfy-table renderings of papers, comparisons and knowledge graphs.

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::models::{ComparisonResult, KnowledgeGraphData, Paper, ResearchGap};
use crate::research::{Analysis, Section};

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Search,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Search => "🔍",
    }
}

/// Print a styled status message to stderr.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => eprintln!("{} {}", icon.green().bold(), msg),
        Status::Error => eprintln!("{} {}", icon.red().bold(), msg),
        Status::Warning => eprintln!("{} {}", icon.yellow().bold(), msg),
        Status::Info => eprintln!("{} {}", icon.cyan().bold(), msg),
        Status::Search => eprintln!("{} {}", icon.yellow(), msg),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Format a number with commas.
pub fn format_number(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Truncate text to at most `max_width` terminal columns, ending in "..." when cut.
///
/// Width is measured per character, so CJK and other wide glyphs count as two
/// columns.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }

    let budget = max_width - 3;
    let mut used = 0;
    let mut end = 0;
    for (idx, c) in text.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(1);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }

    format!("{}...", text[..end].trim_end())
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table
}

/// Search results, one row per paper, in result order.
pub fn papers_table(papers: &[Paper]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["#", "ID", "Title", "Authors", "Year", "Citations"]);

    for (index, paper) in papers.iter().enumerate() {
        let year = if paper.year > 0 {
            paper.year.to_string()
        } else {
            String::new()
        };

        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&paper.id).fg(Color::DarkGrey),
            Cell::new(truncate_with_ellipsis(&paper.title, 60)).add_attribute(Attribute::Bold),
            Cell::new(truncate_with_ellipsis(&paper.author_line(), 30)),
            Cell::new(year),
            Cell::new(format_number(paper.citation_count)),
        ]);
    }
    table
}

/// Comparison matrix: one row per aspect, one column per paper.
///
/// Papers without a point in an aspect show "N/A".
pub fn comparison_table(result: &ComparisonResult, papers: &[Paper]) -> Table {
    let mut table = new_table();

    let mut header = vec![Cell::new("Aspect").add_attribute(Attribute::Bold)];
    header.extend(
        papers
            .iter()
            .map(|p| Cell::new(p.short_label()).add_attribute(Attribute::Bold)),
    );
    table.set_header(header);

    for aspect in &result.aspects {
        let mut row = vec![Cell::new(&aspect.name).fg(Color::Cyan)];
        for paper in papers {
            let cell = match aspect.points.get(&paper.id) {
                Some(point) => Cell::new(format!(
                    "{} ({:.0}%)",
                    point.value,
                    point.confidence * 100.0
                )),
                None => Cell::new(result.display_value(&aspect.name, &paper.id))
                    .fg(Color::DarkGrey),
            };
            row.push(cell);
        }
        table.add_row(row);
    }
    table
}

/// Knowledge-graph relationships, labelled by node name.
pub fn graph_table(graph: &KnowledgeGraphData) -> Table {
    let mut table = new_table();
    table.set_header(vec!["From", "Relationship", "To", "Strength"]);

    for link in &graph.links {
        let strength = link
            .strength
            .map(|s| format!("{:.2}", s))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(graph.label_of(&link.source)),
            Cell::new(&link.label).fg(Color::Yellow),
            Cell::new(graph.label_of(&link.target)),
            Cell::new(strength),
        ]);
    }
    table
}

/// Print a comparison with its summary, matrix and synthesis.
pub fn print_comparison(result: &ComparisonResult, papers: &[Paper]) {
    print_section("Summary");
    println!("{}", result.summary);

    print_section("Comparison");
    println!("{}", comparison_table(result, papers));

    print_section("Synthesis");
    println!("{}", result.synthesis);

    if !result.research_gaps.is_empty() {
        print_section("Open Questions");
        for gap in &result.research_gaps {
            println!("  • {}", gap);
        }
    }

    if let Some(hypothesis) = &result.hypothesis {
        print_section("Hypothesis");
        println!("{}", hypothesis.italic());
    }
}

/// Print node counts per group followed by the relationship table.
pub fn print_graph(graph: &KnowledgeGraphData) {
    print_section("Knowledge Graph");
    let groups = graph
        .group_counts()
        .into_iter()
        .map(|(group, count)| format!("{} {}", count.to_string().green().bold(), group))
        .collect::<Vec<_>>()
        .join(", ");
    println!(
        "{} nodes ({}), {} links",
        graph.nodes.len(),
        groups,
        graph.links.len()
    );
    if !graph.links.is_empty() {
        println!("{}", graph_table(graph));
    }
}

pub fn print_topics(topics: &[String]) {
    print_section("Explore Next");
    for topic in topics {
        println!("  → {}", topic.cyan());
    }
}

pub fn print_gaps(gaps: &[ResearchGap]) {
    print_section("Research Gaps");
    for gap in gaps {
        println!("{}", gap.title.bold());
        println!("  {}", gap.description);
        if !gap.suggested_direction.is_empty() {
            println!("  {} {}", "Direction:".dimmed(), gap.suggested_direction);
        }
    }
}

fn print_failed<T>(title: &str, section: &Section<T>) {
    if let Some(err) = section.error() {
        print_section(title);
        print_status(Status::Warning, &format!("{} ({})", err.message, err.kind));
    }
}

/// Print every section of a full analysis; failed sections show their error.
pub fn print_analysis(analysis: &Analysis, papers: &[Paper]) {
    print_comparison(&analysis.comparison, papers);

    match &analysis.knowledge_graph {
        Section::Ready(graph) => print_graph(graph),
        failed => print_failed("Knowledge Graph", failed),
    }

    match &analysis.insights {
        Section::Ready(insights) if !insights.is_empty() => {
            print_section("Key Insights");
            for (i, insight) in insights.insights.iter().enumerate() {
                println!("  {}. {}", i + 1, insight);
            }
        }
        Section::Ready(_) => {}
        failed => print_failed("Key Insights", failed),
    }

    match &analysis.gaps {
        Section::Ready(gaps) if !gaps.is_empty() => print_gaps(gaps),
        Section::Ready(_) => {}
        failed => print_failed("Research Gaps", failed),
    }

    match &analysis.report {
        Section::Ready(report) => {
            print_section("Report");
            println!("{}", report);
        }
        failed => print_failed("Report", failed),
    }
}

/// Spinner shown while a provider call is in flight.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    ///
    /// The spinner draws nothing when stderr is not a terminal.
    pub fn new(msg: &str) -> Self {
        let pb = if std::io::stderr().is_terminal() {
            indicatif::ProgressBar::new_spinner()
        } else {
            indicatif::ProgressBar::hidden()
        };
        pb.set_style(spinner_style("{spinner:.cyan} {msg}", "⠁⠂⠄⡀⢀⠠⠐⠈ "));
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.pb.set_style(spinner_style("{spinner:.red} {msg}", "✗✗"));
        self.pb.finish_with_message(msg.to_string());
    }

    /// Remove the spinner line.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}

fn spinner_style(template: &str, ticks: &str) -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::with_template(template)
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
        .tick_chars(ticks)
}
