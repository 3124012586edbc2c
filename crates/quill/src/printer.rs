use std::fmt::Display;
use std::io::{self, Write};

use owo_colors::{OwoColorize, Style};
use quill_model::ModelInfo;

/// The line printed after the generated text.
pub const CLOSING_BANNER: &str =
    "==================================================";

/// Writes command output to a sink.
///
/// Only banner lines are styled, and only when colors are enabled. Model
/// text and error messages are written verbatim.
#[derive(Debug)]
pub struct Printer<W> {
    out: W,
    colored: bool,
}

impl<W: Write> Printer<W> {
    /// Creates a printer without colors.
    #[inline]
    pub fn new(out: W) -> Self {
        Self {
            out,
            colored: false,
        }
    }

    /// Enables or disables colored banners.
    #[inline]
    pub fn with_color(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Returns the underlying sink.
    #[inline]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Prints the banner shown before the writer starts.
    pub fn blog_post_start(&mut self, model: &str) -> io::Result<()> {
        let line = format!("🚀 Starting blog writer with Gemini ({model})...");
        self.banner(&line, Style::new().bright_cyan().bold())
    }

    /// Prints a finished blog post, closed by [`CLOSING_BANNER`].
    pub fn blog_post(&mut self, text: &str) -> io::Result<()> {
        self.banner("📝 BLOG POST OUTPUT:", Style::new().bright_green().bold())?;
        writeln!(self.out, "{}", text.trim_end())?;
        self.banner(CLOSING_BANNER, Style::new().bright_black())?;
        self.out.flush()
    }

    /// Prints the result of a successful key check.
    pub fn key_check_success(&mut self, text: &str) -> io::Result<()> {
        self.banner(
            "✅ SUCCESS! Gemini API is working!",
            Style::new().bright_green().bold(),
        )?;
        self.banner("📝 Response:", Style::new().bold())?;
        writeln!(self.out, "{}", text.trim_end())?;
        self.out.flush()
    }

    /// Prints a failed key check.
    pub fn key_check_error(&mut self, err: &dyn Display) -> io::Result<()> {
        self.error_line("❌ ERROR:", err)
    }

    /// Prints the models that can generate text, one `- name` per line.
    pub fn model_list(&mut self, models: &[ModelInfo]) -> io::Result<()> {
        self.banner("Available models:", Style::new().bold())?;
        for model in models.iter().filter(|m| m.can_generate) {
            writeln!(self.out, "- {}", model.name)?;
        }
        self.out.flush()
    }

    /// Prints a failed model listing.
    pub fn model_list_error(&mut self, err: &dyn Display) -> io::Result<()> {
        self.error_line("Error:", err)
    }

    fn error_line(&mut self, prefix: &str, err: &dyn Display) -> io::Result<()> {
        if self.colored {
            writeln!(self.out, "{} {err}", prefix.bright_red().bold())?;
        } else {
            writeln!(self.out, "{prefix} {err}")?;
        }
        self.out.flush()
    }

    fn banner(&mut self, line: &str, style: Style) -> io::Result<()> {
        if self.colored {
            writeln!(self.out, "{}", line.style(style))
        } else {
            writeln!(self.out, "{line}")
        }
    }
}
