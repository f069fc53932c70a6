//! Terminal rendering of markdown line nodes.
use console::style;

use crate::{render_markdown, LineNode, Span};

/// Renders note content for the terminal, one output line per source line.
pub fn render_preview(content: &str, width: usize) -> String {
    render_markdown(content)
        .iter()
        .map(|node| render_node(node, width))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_node(node: &LineNode, width: usize) -> String {
    match node {
        LineNode::Heading { level: 1, text } => {
            let rule = "=".repeat(text.chars().count().clamp(1, width.max(1)));
            format!("{}\n{}", style(text).bold().underlined(), rule)
        }
        LineNode::Heading { level: 2, text } => style(text).bold().to_string(),
        LineNode::Heading { text, .. } => style(text).bold().dim().to_string(),
        LineNode::Checkbox { checked: true, text } => {
            format!("{} {}", style("[x]").green(), style(text).dim())
        }
        LineNode::Checkbox { checked: false, text } => format!("[ ] {}", text),
        LineNode::Paragraph { spans } => spans.iter().map(render_span).collect(),
        LineNode::Blank => String::new(),
    }
}

fn render_span(span: &Span) -> String {
    match span {
        Span::Text(text) => text.clone(),
        Span::Strong(text) => style(text).bold().to_string(),
        Span::Emphasis(text) => style(text).italic().to_string(),
        Span::Code(text) => style(text).cyan().to_string(),
    }
}
