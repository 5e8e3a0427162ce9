//! Colorized console reporting for the demo pipelines.

use std::fmt::Display;
use std::io::{self, Write};
use std::time::Duration;

use colored::{Color, Colorize};

use crate::generation::InferenceStats;

const SEPARATOR_WIDTH: usize = 60;

/// Writes stage headers, labelled metrics and generated text to a sink.
///
/// ```rust
/// use granite_rag::Reporter;
///
/// let mut reporter = Reporter::new(Vec::new());
/// reporter.metric("Retrieved", "2 document(s)").unwrap();
/// let out = String::from_utf8(reporter.into_inner()).unwrap();
/// assert!(out.contains("Retrieved") && out.contains("2 document(s)"));
/// ```
#[derive(Debug)]
pub struct Reporter<W: Write> {
    out: W,
}

impl Reporter<io::Stdout> {
    /// A reporter writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    /// Wrap a sink.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Return the sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// A full-width rule.
    pub fn separator(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", "=".repeat(SEPARATOR_WIDTH).as_str().bright_blue())
    }

    /// A title between two rules.
    pub fn header(&mut self, text: &str) -> io::Result<()> {
        self.separator()?;
        writeln!(self.out, "{}", text.bold().bright_magenta())?;
        self.separator()
    }

    /// A `label: value` line.
    pub fn metric(&mut self, label: &str, value: impl Display) -> io::Result<()> {
        self.metric_colored(label, value, Color::BrightGreen)
    }

    fn metric_colored(&mut self, label: &str, value: impl Display, color: Color) -> io::Result<()> {
        writeln!(
            self.out,
            "{} {}",
            format!("{label}:").as_str().bright_cyan(),
            value.to_string().as_str().color(color)
        )
    }

    /// A duration in seconds with two decimals.
    pub fn time_metric(&mut self, label: &str, elapsed: Duration) -> io::Result<()> {
        self.metric_colored(
            label,
            format!("{:.2} seconds", elapsed.as_secs_f64()),
            Color::BrightYellow,
        )
    }

    /// A throughput figure with two decimals.
    pub fn tokens_per_second(&mut self, label: &str, value: f64) -> io::Result<()> {
        self.metric_colored(label, format!("{value:.2} tokens/second"), Color::BrightYellow)
    }

    /// An uncolored line, used as a caption above [`content`](Self::content).
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    /// A block of text.
    pub fn content(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text.bright_green())
    }

    /// A success message.
    pub fn success(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", message.bright_green().bold())
    }

    /// An empty line.
    pub fn blank(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    /// The standard statistics block for one generation call.
    pub fn inference_stats(&mut self, stats: &InferenceStats) -> io::Result<()> {
        self.header("INFERENCE STATISTICS")?;
        self.time_metric("Inference time", stats.inference_time)?;
        self.metric("Input tokens", stats.input_tokens)?;
        self.metric("Generated tokens", stats.generated_tokens)?;
        self.metric("Total tokens", stats.total_tokens)?;
        self.tokens_per_second("Tokens per second", stats.tokens_per_second)
    }

    /// The generated text under its own header.
    pub fn generated_output(&mut self, text: &str) -> io::Result<()> {
        self.header("GENERATED OUTPUT")?;
        writeln!(self.out, "{}", text.bright_white())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Reporter<Vec<u8>>) -> io::Result<()>) -> String {
        let mut reporter = Reporter::new(Vec::new());
        f(&mut reporter).unwrap();
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn metric_contains_label_and_value() {
        let out = render(|r| r.metric("Input tokens", 17));
        assert!(out.contains("Input tokens:"));
        assert!(out.contains("17"));
    }

    #[test]
    fn time_metric_uses_two_decimals() {
        let out = render(|r| r.time_metric("Retrieval time", Duration::from_millis(1234)));
        assert!(out.contains("Retrieval time:"));
        assert!(out.contains("1.23 seconds"));
    }

    #[test]
    fn header_is_framed_by_separators() {
        let out = render(|r| r.header("A. RETRIEVING CONTEXT"));
        assert!(out.contains("A. RETRIEVING CONTEXT"));
        assert_eq!(out.matches(&"=".repeat(SEPARATOR_WIDTH)).count(), 2);
    }

    #[test]
    fn inference_stats_lists_every_figure() {
        let stats = InferenceStats::new(Duration::from_secs(2), 10, 30);
        let out = render(|r| r.inference_stats(&stats));
        for expected in [
            "INFERENCE STATISTICS",
            "Inference time:",
            "2.00 seconds",
            "Input tokens:",
            "Generated tokens:",
            "30",
            "Total tokens:",
            "40",
            "15.00 tokens/second",
        ] {
            assert!(out.contains(expected), "missing {expected:?} in {out}");
        }
    }

    #[test]
    fn generated_output_has_header_and_text() {
        let out = render(|r| r.generated_output("MTV is a cable channel."));
        assert!(out.contains("GENERATED OUTPUT"));
        assert!(out.contains("MTV is a cable channel."));
    }
}
