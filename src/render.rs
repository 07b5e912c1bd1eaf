//! Output rendering for the chat application.
//!
//! This module provides a trait-based rendering abstraction and a plain-text
//! implementation. Assistant answers are Markdown; the plain-text renderer
//! turns them into terminal text, with ANSI styling when color is enabled.

use std::io::{self, Write};

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

use crate::sources::dedup_labels;
use crate::types::{Message, MessageRole, UploadStatus};

/// ANSI escape code for bold text (used for strong emphasis and speakers).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for code blocks and hints).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for italic text.
const ANSI_ITALIC: &str = "\x1b[3m";

/// ANSI escape code for underlined text (used for headings).
const ANSI_UNDERLINE: &str = "\x1b[4m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for source tags and inline code).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for upload success).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for yellow text (used while uploading).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (used for failures).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Print one transcript entry, with its source tags if it has any.
    fn print_message(&mut self, message: &Message);

    /// Print the upload status line.
    fn print_upload_status(&mut self, status: UploadStatus, file_name: Option<&str>);

    /// Print a hint that an answer is on its way.
    fn print_waiting(&mut self);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = io::Stdout> {
    out: W,
    use_color: bool,
}

impl PlainTextRenderer<io::Stdout> {
    /// Creates a new PlainTextRenderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer on stdout with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self { out, use_color }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn style(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    // Output is best effort: a closed terminal must not take the session down.
    fn emit(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

impl Default for PlainTextRenderer<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_message(&mut self, message: &Message) {
        let mut text = match message.role {
            MessageRole::User => {
                format!("{} {}", self.style(ANSI_BOLD, "You:"), message.content)
            }
            MessageRole::Assistant => format!(
                "{}\n{}",
                self.style(ANSI_BOLD, "Assistant:"),
                markdown_to_terminal(&message.content, self.use_color)
            ),
        };
        let labels = dedup_labels(message.sources());
        if !labels.is_empty() {
            let tags = labels
                .iter()
                .map(|label| self.style(ANSI_CYAN, &format!("[{label}]")))
                .collect::<Vec<_>>()
                .join(" ");
            text.push_str(&format!("\n{} {tags}", self.style(ANSI_DIM, "Sources:")));
        }
        text.push('\n');
        self.emit(&text);
    }

    fn print_upload_status(&mut self, status: UploadStatus, file_name: Option<&str>) {
        let color = match status {
            UploadStatus::Idle => {
                let line = self.style(ANSI_DIM, "No file uploaded yet.");
                self.emit(&line);
                return;
            }
            UploadStatus::Uploading => ANSI_YELLOW,
            UploadStatus::Success => ANSI_GREEN,
            UploadStatus::Failed => ANSI_RED,
        };
        let line = match file_name {
            Some(name) => format!(
                "{} {}",
                self.style(ANSI_BOLD, name),
                self.style(color, status.display_text())
            ),
            None => self.style(color, status.display_text()),
        };
        self.emit(&line);
    }

    fn print_waiting(&mut self) {
        let line = self.style(ANSI_DIM, "Thinking...");
        self.emit(&line);
    }

    fn print_error(&mut self, error: &str) {
        let line = self.style(ANSI_RED, &format!("Error: {error}"));
        self.emit(&line);
    }

    fn print_info(&mut self, info: &str) {
        self.emit(info);
    }
}

/// Renders Markdown as terminal text.
///
/// Headings, emphasis, inline code and code blocks are styled with ANSI codes
/// when `use_color` is set; list structure and numbering are kept either way.
pub fn markdown_to_terminal(markdown: &str, use_color: bool) -> String {
    let mut out = String::new();
    let mut styles: Vec<&'static str> = Vec::new();
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut quote_depth = 0usize;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { .. } => {
                    push_style(&mut out, &mut styles, ANSI_BOLD, use_color);
                    push_style(&mut out, &mut styles, ANSI_UNDERLINE, use_color);
                }
                Tag::Strong => push_style(&mut out, &mut styles, ANSI_BOLD, use_color),
                Tag::Emphasis => push_style(&mut out, &mut styles, ANSI_ITALIC, use_color),
                Tag::CodeBlock(_) => push_style(&mut out, &mut styles, ANSI_DIM, use_color),
                Tag::BlockQuote(_) => {
                    quote_depth += 1;
                    ensure_line_start(&mut out);
                    out.push_str(&"> ".repeat(quote_depth));
                }
                Tag::List(start) => {
                    if !lists.is_empty() {
                        ensure_line_start(&mut out);
                    }
                    lists.push(start);
                }
                Tag::Item => {
                    ensure_line_start(&mut out);
                    let indent = "  ".repeat(lists.len().saturating_sub(1));
                    let marker = match lists.last_mut() {
                        Some(Some(number)) => {
                            let marker = format!("{number}. ");
                            *number += 1;
                            marker
                        }
                        _ => "• ".to_string(),
                    };
                    out.push_str(&indent);
                    out.push_str(&marker);
                }
                _ => {}
            },
            Event::End(tag) => match tag {
                TagEnd::Heading(_) => {
                    pop_style(&mut out, &mut styles, use_color);
                    pop_style(&mut out, &mut styles, use_color);
                    end_block(&mut out);
                }
                TagEnd::Strong | TagEnd::Emphasis => pop_style(&mut out, &mut styles, use_color),
                TagEnd::CodeBlock => {
                    pop_style(&mut out, &mut styles, use_color);
                    end_block(&mut out);
                }
                TagEnd::Paragraph => {
                    if lists.is_empty() {
                        end_block(&mut out);
                    } else {
                        ensure_line_start(&mut out);
                    }
                }
                TagEnd::BlockQuote(_) => {
                    quote_depth = quote_depth.saturating_sub(1);
                    end_block(&mut out);
                }
                TagEnd::List(_) => {
                    lists.pop();
                    if lists.is_empty() {
                        end_block(&mut out);
                    }
                }
                TagEnd::Item => ensure_line_start(&mut out),
                _ => {}
            },
            Event::Text(text) => {
                for (i, line) in text.split('\n').enumerate() {
                    if i > 0 {
                        start_line(&mut out, quote_depth);
                    }
                    out.push_str(line);
                }
            }
            Event::Code(code) => {
                if use_color {
                    out.push_str(ANSI_CYAN);
                    out.push_str(&code);
                    out.push_str(ANSI_RESET);
                    out.push_str(&styles.concat());
                } else {
                    out.push('`');
                    out.push_str(&code);
                    out.push('`');
                }
            }
            Event::SoftBreak | Event::HardBreak => start_line(&mut out, quote_depth),
            Event::Rule => {
                ensure_line_start(&mut out);
                out.push_str("────────");
                end_block(&mut out);
            }
            _ => {}
        }
    }

    out.trim_end().to_string()
}

fn push_style(
    out: &mut String,
    styles: &mut Vec<&'static str>,
    style: &'static str,
    use_color: bool,
) {
    styles.push(style);
    if use_color {
        out.push_str(style);
    }
}

fn pop_style(out: &mut String, styles: &mut Vec<&'static str>, use_color: bool) {
    styles.pop();
    if use_color {
        out.push_str(ANSI_RESET);
        out.push_str(&styles.concat());
    }
}

fn start_line(out: &mut String, quote_depth: usize) {
    out.push('\n');
    out.push_str(&"> ".repeat(quote_depth));
}

fn ensure_line_start(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn end_block(out: &mut String) {
    if out.is_empty() {
        return;
    }
    ensure_line_start(out);
    if !out.ends_with("\n\n") {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Source;

    fn render(message: &Message, use_color: bool) -> String {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), use_color);
        renderer.print_message(message);
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn plain_markdown_structure() {
        let markdown = "**The project name is Vitalyze.ai.**\n\n### Key Details\n* It is a health hub.\n* It simplifies reports.\n\n1. first\n2. second";
        assert_eq!(
            markdown_to_terminal(markdown, false),
            "The project name is Vitalyze.ai.\n\nKey Details\n\n• It is a health hub.\n• It simplifies reports.\n\n1. first\n2. second"
        );
    }

    #[test]
    fn plain_markdown_keeps_inline_code_marks() {
        assert_eq!(
            markdown_to_terminal("Run `cargo doc` first.", false),
            "Run `cargo doc` first."
        );
    }

    #[test]
    fn nested_lists_are_indented() {
        let markdown = "* outer\n  * inner\n* next";
        assert_eq!(
            markdown_to_terminal(markdown, false),
            "• outer\n  • inner\n• next"
        );
    }

    #[test]
    fn colored_markdown_resets_styles() {
        let rendered = markdown_to_terminal("a **b** c", true);
        assert_eq!(rendered, format!("a {ANSI_BOLD}b{ANSI_RESET} c"));
    }

    #[test]
    fn answer_with_duplicate_sources_shows_one_tag() {
        let message = Message::answer(
            "Yes.",
            vec![
                Source::page("docs/report.pdf", 0),
                Source::page("docs/report.pdf", 0),
                Source::document("notes.docx"),
            ],
        );
        let output = render(&message, false);
        assert_eq!(
            output,
            "Assistant:\nYes.\nSources: [report.pdf (Page 1)] [notes.docx]\n\n"
        );
        assert_eq!(output, render(&message, false));
    }

    #[test]
    fn user_message_is_single_line() {
        let output = render(&Message::user("what is it?"), false);
        assert_eq!(output, "You: what is it?\n\n");
    }

    #[test]
    fn upload_status_lines() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        renderer.print_upload_status(UploadStatus::Success, Some("a.pdf"));
        renderer.print_upload_status(UploadStatus::Failed, None);
        renderer.print_upload_status(UploadStatus::Idle, None);
        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(
            output,
            "a.pdf File processed successfully!\nFailed to upload file.\nNo file uploaded yet.\n"
        );
    }
}
