//! Output rendering for assistant replies.
//!
//! [`render_message`] turns reply text into typed [`Block`]s and [`Span`]s and
//! keeps no state between calls.  The [`Renderer`] trait and its
//! [`PlainTextRenderer`] implementation put those blocks on a terminal.
//!
//! Inline formatting recognises two things: `**bold**` runs and course codes
//! such as `CSI-240`.  A bold run owns everything inside it, so a code that is
//! wrapped in `**` renders as bold and is not highlighted.  Course codes
//! never contain `*`, so a code is always either wholly inside a bold run or
//! wholly outside one.

use std::io::{self, Stdout, Write};

use crate::instructions::DEFAULT_COURSE_PREFIXES;

/// ANSI escape code for bold blue text (used for emphasis and list markers).
const ANSI_BOLD_BLUE: &str = "\x1b[1;34m";

/// ANSI escape code for course codes: light cyan on a dark blue background.
const ANSI_COURSE: &str = "\x1b[96;48;5;17m";

/// ANSI escape code for dim text (used for the waiting indicator and footer).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Erases the current line and returns the cursor to column zero.
const ERASE_LINE: &str = "\r\x1b[2K";

const BULLET_MARKERS: [&str; 2] = ["- ", "• "];

///////////////////////////////////////////// Layout ////////////////////////////////////////////

/// One inline run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    /// Unstyled text.
    Plain(String),
    /// A highlighted course code such as `CSI-240`.
    Code(String),
    /// Emphasised text with its `**` delimiters removed.
    Bold(String),
}

impl Span {
    /// The visible text of the span.
    pub fn text(&self) -> &str {
        match self {
            Span::Plain(text) | Span::Code(text) | Span::Bold(text) => text,
        }
    }
}

/// One rendered line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A line that began with `- ` or `• `.
    Bullet(Vec<Span>),
    /// A line that began with `<digits>. `; `label` holds the digits.
    Numbered {
        /// The list number as written.
        label: String,
        /// The item text.
        spans: Vec<Span>,
    },
    /// An empty or whitespace-only line.
    Spacer,
    /// Any other line.
    Paragraph(Vec<Span>),
}

/// Matches course codes: a known subject prefix, a hyphen and exactly three
/// digits, standing alone as a word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoursePattern {
    prefixes: Vec<String>,
}

impl CoursePattern {
    /// Creates a pattern for the given subject prefixes.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// The subject prefixes this pattern recognises.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Returns the byte length of a course code starting at `start`, if any.
    fn match_at(&self, text: &str, start: usize) -> Option<usize> {
        let bytes = text.as_bytes();
        if start > 0 && is_word_byte(bytes[start - 1]) {
            return None;
        }
        let rest = &bytes[start..];
        self.prefixes.iter().find_map(|prefix| {
            let prefix = prefix.as_bytes();
            let len = prefix.len() + 4;
            if prefix.is_empty() || rest.len() < len || !rest.starts_with(prefix) {
                return None;
            }
            let tail = &rest[prefix.len()..len];
            let well_formed = tail[0] == b'-' && tail[1..].iter().all(u8::is_ascii_digit);
            let ends_word = rest.get(len).is_none_or(|b| !is_word_byte(*b));
            (well_formed && ends_word).then_some(len)
        })
    }

    /// Splits text into plain and code spans.
    fn split(&self, text: &str, spans: &mut Vec<Span>) {
        let mut plain_start = 0;
        let mut index = 0;
        while index < text.len() {
            if let Some(len) = self.match_at(text, index) {
                push_plain(spans, &text[plain_start..index]);
                spans.push(Span::Code(text[index..index + len].to_string()));
                index += len;
                plain_start = index;
            } else {
                index += 1;
            }
        }
        push_plain(spans, &text[plain_start..]);
    }
}

impl Default for CoursePattern {
    fn default() -> Self {
        Self::new(DEFAULT_COURSE_PREFIXES)
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn push_plain(spans: &mut Vec<Span>, text: &str) {
    if !text.is_empty() {
        spans.push(Span::Plain(text.to_string()));
    }
}

/// A bold run may not cross these line terminators.
fn breaks_bold(c: char) -> bool {
    matches!(c, '\r' | '\u{2028}' | '\u{2029}')
}

/// Finds the leftmost, shortest `**...**` run at or after `from`.
///
/// Returns the byte range of the whole run, delimiters included.
fn find_bold(text: &str, from: usize) -> Option<(usize, usize)> {
    let mut search = from;
    while let Some(offset) = text[search..].find("**") {
        let open = search + offset;
        let body = open + 2;
        if let Some(close) = text[body..].find("**") {
            let inner = &text[body..body + close];
            if !inner.chars().any(breaks_bold) {
                return Some((open, body + close + 2));
            }
        } else {
            return None;
        }
        // "**" is ASCII, so open + 1 is a char boundary.
        search = open + 1;
    }
    None
}

/// Tokenises one line's text into spans.
pub fn format_inline(text: &str, courses: &CoursePattern) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut cursor = 0;
    while let Some((open, close)) = find_bold(text, cursor) {
        courses.split(&text[cursor..open], &mut spans);
        let inner = &text[open + 2..close - 2];
        if !inner.is_empty() {
            spans.push(Span::Bold(inner.to_string()));
        }
        cursor = close;
    }
    courses.split(&text[cursor..], &mut spans);
    spans
}

fn numbered_marker(line: &str) -> Option<(&str, &str)> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix('.')?;
    let mut chars = rest.chars();
    let space = chars.next().filter(|c| c.is_whitespace())?;
    Some((&line[..digits], &rest[space.len_utf8()..]))
}

/// Lays out one line.
pub fn render_line(line: &str, courses: &CoursePattern) -> Block {
    if let Some(rest) = BULLET_MARKERS
        .iter()
        .find_map(|marker| line.strip_prefix(marker))
    {
        return Block::Bullet(format_inline(rest, courses));
    }
    if let Some((label, rest)) = numbered_marker(line) {
        return Block::Numbered {
            label: label.to_string(),
            spans: format_inline(rest, courses),
        };
    }
    if line.chars().all(|c| c.is_whitespace() || c == '\u{feff}') {
        return Block::Spacer;
    }
    Block::Paragraph(format_inline(line, courses))
}

/// Lays out a whole reply, one block per `\n`-delimited line.
pub fn render_message(text: &str, courses: &CoursePattern) -> Vec<Block> {
    text.split('\n')
        .map(|line| render_line(line, courses))
        .collect()
}

/////////////////////////////////////////// Terminal ///////////////////////////////////////////

/// Trait for putting a conversation on screen.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Shows the greeting and numbered suggested questions.
    fn print_welcome(&mut self, title: &str, suggestions: &[String]);

    /// Echoes a user turn, e.g. when replaying a loaded transcript.
    fn print_user_turn(&mut self, text: &str);

    /// Prints a laid-out assistant turn.
    fn print_assistant_turn(&mut self, blocks: &[Block]);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when a request is sent.
    fn start_waiting(&mut self) {}

    /// Called when the request resolves, before the reply is printed.
    fn finish_waiting(&mut self) {}
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    waiting: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer that writes to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            waiting: false,
        }
    }

    /// Consumes the renderer and returns its writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn format_spans(&self, spans: &[Span]) -> String {
        spans
            .iter()
            .map(|span| match span {
                Span::Plain(text) => text.clone(),
                Span::Code(text) => self.styled(ANSI_COURSE, text),
                Span::Bold(text) => self.styled(ANSI_BOLD_BLUE, text),
            })
            .collect()
    }

    /// Formats blocks as terminal lines, each ending in a newline.
    pub fn format_blocks(&self, blocks: &[Block]) -> String {
        let mut output = String::new();
        for block in blocks {
            match block {
                Block::Bullet(spans) => {
                    output.push_str("  ");
                    output.push_str(&self.styled(ANSI_BOLD_BLUE, "•"));
                    output.push(' ');
                    output.push_str(&self.format_spans(spans));
                }
                Block::Numbered { label, spans } => {
                    output.push_str(&self.styled(ANSI_BOLD_BLUE, &format!("{label:>3}.")));
                    output.push(' ');
                    output.push_str(&self.format_spans(spans));
                }
                Block::Spacer => {}
                Block::Paragraph(spans) => output.push_str(&self.format_spans(spans)),
            }
            output.push('\n');
        }
        output
    }

    fn write(&mut self, text: &str) {
        let written = self.out.write_all(text.as_bytes());
        if let Err(err) = written.and_then(|()| self.out.flush()) {
            tracing::debug!(error = %err, "terminal write failed");
        }
    }

    fn clear_waiting(&mut self) {
        if self.waiting {
            if self.use_color {
                self.write(ERASE_LINE);
            }
            self.waiting = false;
        }
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_welcome(&mut self, title: &str, suggestions: &[String]) {
        let mut text = format!("{}\n", self.styled(ANSI_BOLD_BLUE, title));
        text.push_str(
            "Your 24/7 academic counselor. Ask about courses, prerequisites, \
             scheduling, or degree planning.\n",
        );
        if !suggestions.is_empty() {
            text.push_str("\nTry one of these (/suggest <n>):\n");
            for (index, suggestion) in suggestions.iter().enumerate() {
                text.push_str(&format!("  {}. {suggestion}\n", index + 1));
            }
        }
        text.push('\n');
        self.write(&text);
    }

    fn print_user_turn(&mut self, text: &str) {
        self.clear_waiting();
        let label = self.styled(ANSI_DIM, "you>");
        self.write(&format!("{label} {text}\n"));
    }

    fn print_assistant_turn(&mut self, blocks: &[Block]) {
        self.clear_waiting();
        let text = self.format_blocks(blocks);
        self.write(&format!("{text}\n"));
    }

    fn print_error(&mut self, error: &str) {
        self.clear_waiting();
        let text = self.styled(ANSI_RED, &format!("Error: {error}"));
        self.write(&format!("{text}\n"));
    }

    fn print_info(&mut self, info: &str) {
        self.clear_waiting();
        self.write(&format!("{info}\n"));
    }

    fn start_waiting(&mut self) {
        let text = self.styled(ANSI_DIM, "thinking...");
        if self.use_color {
            self.write(&text);
        } else {
            self.write(&format!("{text}\n"));
        }
        self.waiting = true;
    }

    fn finish_waiting(&mut self) {
        self.clear_waiting();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Span {
        Span::Plain(text.to_string())
    }

    fn code(text: &str) -> Span {
        Span::Code(text.to_string())
    }

    fn bold(text: &str) -> Span {
        Span::Bold(text.to_string())
    }

    fn render(text: &str) -> Vec<Block> {
        render_message(text, &CoursePattern::default())
    }

    #[test]
    fn bold_course_code_in_bullet() {
        assert_eq!(
            render("- **CSI-240** is required"),
            [Block::Bullet(vec![bold("CSI-240"), plain(" is required")])]
        );
    }

    #[test]
    fn course_code_in_paragraph() {
        assert_eq!(
            render("Take CSI-240 next."),
            [Block::Paragraph(vec![
                plain("Take "),
                code("CSI-240"),
                plain(" next."),
            ])]
        );
    }

    #[test]
    fn numbered_item_with_course_code() {
        assert_eq!(
            render("1. Enroll in MAT-210"),
            [Block::Numbered {
                label: "1".to_string(),
                spans: vec![plain("Enroll in "), code("MAT-210")],
            }]
        );
    }

    #[test]
    fn multi_digit_label_and_tab_separator() {
        assert_eq!(
            render("12.\tSEC-400"),
            [Block::Numbered {
                label: "12".to_string(),
                spans: vec![code("SEC-400")],
            }]
        );
    }

    #[test]
    fn malformed_markers_fall_through() {
        assert_eq!(render("1.5 credits"), [Block::Paragraph(vec![plain("1.5 credits")])]);
        assert_eq!(render("-no space"), [Block::Paragraph(vec![plain("-no space")])]);
        assert_eq!(render(" - indented"), [Block::Paragraph(vec![plain(" - indented")])]);
        assert_eq!(render("1."), [Block::Paragraph(vec![plain("1.")])]);
    }

    #[test]
    fn dot_bullet_is_stripped() {
        assert_eq!(
            render("• SEC-250 Network Security"),
            [Block::Bullet(vec![code("SEC-250"), plain(" Network Security")])]
        );
    }

    #[test]
    fn bare_bullet_marker_is_empty_bullet() {
        assert_eq!(render("- "), [Block::Bullet(vec![])]);
    }

    #[test]
    fn blank_lines_are_spacers() {
        assert_eq!(
            render("Intro\n\n   \nOutro"),
            [
                Block::Paragraph(vec![plain("Intro")]),
                Block::Spacer,
                Block::Spacer,
                Block::Paragraph(vec![plain("Outro")]),
            ]
        );
        assert_eq!(render(""), [Block::Spacer]);
    }

    #[test]
    fn byte_order_mark_line_is_spacer() {
        assert_eq!(render("\u{feff}"), [Block::Spacer]);
    }

    #[test]
    fn closed_output_does_not_panic() {
        struct Closed;

        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }

            fn flush(&mut self) -> io::Result<()> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }
        }

        let mut renderer = PlainTextRenderer::with_writer(Closed, false);
        renderer.print_info("hello");
        renderer.print_assistant_turn(&render("Take CSI-240."));
    }

    #[test]
    fn course_codes_need_word_boundaries() {
        let pattern = CoursePattern::default();
        assert_eq!(format_inline("CSI-2401", &pattern), [plain("CSI-2401")]);
        assert_eq!(format_inline("XCSI-240", &pattern), [plain("XCSI-240")]);
        assert_eq!(format_inline("CSI-24", &pattern), [plain("CSI-24")]);
        assert_eq!(format_inline("csi-240", &pattern), [plain("csi-240")]);
        assert_eq!(
            format_inline("(CSI-240/SEC-101)", &pattern),
            [
                plain("("),
                code("CSI-240"),
                plain("/"),
                code("SEC-101"),
                plain(")"),
            ]
        );
    }

    #[test]
    fn unknown_prefix_is_plain() {
        assert_eq!(
            format_inline("ENG-101", &CoursePattern::default()),
            [plain("ENG-101")]
        );
        assert_eq!(
            format_inline("ENG-101", &CoursePattern::new(["ENG"])),
            [code("ENG-101")]
        );
    }

    #[test]
    fn bold_is_shortest_leftmost() {
        let pattern = CoursePattern::default();
        assert_eq!(
            format_inline("**a** and **b**", &pattern),
            [bold("a"), plain(" and "), bold("b")]
        );
        assert_eq!(format_inline("***a**", &pattern), [bold("*a")]);
    }

    #[test]
    fn bold_encloses_sentence_with_code() {
        assert_eq!(
            format_inline("**Take CSI-240 first** then MAT-210", &CoursePattern::default()),
            [bold("Take CSI-240 first"), plain(" then "), code("MAT-210")]
        );
    }

    #[test]
    fn unmatched_delimiters_stay_plain() {
        let pattern = CoursePattern::default();
        assert_eq!(
            format_inline("**CSI-240 is hard", &pattern),
            [plain("**"), code("CSI-240"), plain(" is hard")]
        );
        assert_eq!(format_inline("****", &pattern), Vec::<Span>::new());
    }

    #[test]
    fn bold_does_not_cross_carriage_return() {
        assert_eq!(
            format_inline("**a\r**b**", &CoursePattern::default()),
            [plain("**a\r"), bold("b")]
        );
    }

    #[test]
    fn non_ascii_text_is_preserved() {
        assert_eq!(
            render("Café → CSI-160 ✓"),
            [Block::Paragraph(vec![plain("Café → "), code("CSI-160"), plain(" ✓")])]
        );
    }

    #[test]
    fn render_is_repeatable() {
        let text = "1. **Fall**: CSI-140\n- MAT-210\n\nDone.";
        assert_eq!(render(text), render(text));
        assert_eq!(render(text).len(), 4);
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn plain_output_strips_styling() {
        let renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let blocks = render("- **CSI-240** is required\n\n1. Enroll in MAT-210\nDone.");
        assert_eq!(
            renderer.format_blocks(&blocks),
            "  • CSI-240 is required\n\n  1. Enroll in MAT-210\nDone.\n"
        );
    }

    #[test]
    fn color_output_styles_codes_and_bold() {
        let renderer = PlainTextRenderer::with_writer(Vec::new(), true);
        let output = renderer.format_blocks(&render("Take **CSI-240** or SEC-101"));
        assert_eq!(
            output,
            format!(
                "Take {ANSI_BOLD_BLUE}CSI-240{ANSI_RESET} or {ANSI_COURSE}SEC-101{ANSI_RESET}\n"
            )
        );
    }

    #[test]
    fn renderer_writes_turns_and_errors() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        renderer.print_user_turn("hello");
        renderer.start_waiting();
        renderer.finish_waiting();
        renderer.print_assistant_turn(&render("Hi."));
        renderer.print_error("boom");
        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(output, "you> hello\nthinking...\nHi.\n\nError: boom\n");
    }

    #[test]
    fn welcome_lists_suggestions() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        renderer.print_welcome("Welcome", &["First?".to_string(), "Second?".to_string()]);
        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(output.starts_with("Welcome\n"));
        assert!(output.contains("  1. First?\n  2. Second?\n"));
    }
}
