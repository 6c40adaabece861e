use std::io::{self, IsTerminal, Stdout, Write};

use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};

/// Human-readable status lines with icons, colored when writing to a terminal.
///
/// Output is best effort: a failed write is logged and otherwise ignored so a
/// closed stdout never aborts a run.
pub struct Console<W: Write> {
    out: W,
    colored: bool,
}

impl Console<Stdout> {
    pub fn stdout() -> Self {
        let colored = io::stdout().is_terminal();
        Self::new(io::stdout(), colored)
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W, colored: bool) -> Self {
        Self { out, colored }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Start of a fetch or check.
    pub fn step(&mut self, message: &str) {
        self.line(Color::White, &format!("🔍 {}", message));
    }

    pub fn success(&mut self, message: &str) {
        self.line(Color::Green, &format!("✅ {}", message));
    }

    pub fn failure(&mut self, message: &str) {
        self.line(Color::Red, &format!("❌ {}", message));
    }

    pub fn warning(&mut self, message: &str) {
        self.line(Color::Yellow, &format!("⚠️ {}", message));
    }

    pub fn hint(&mut self, message: &str) {
        self.line(Color::DarkGrey, &format!("💡 {}", message));
    }

    /// Uncolored text, printed as is.
    pub fn plain(&mut self, text: &str) {
        let result = writeln!(self.out, "{}", text).and_then(|_| self.out.flush());
        if let Err(e) = result {
            tracing::debug!("Console write failed: {}", e);
        }
    }

    pub fn rule(&mut self, width: usize) {
        self.plain(&"-".repeat(width));
    }

    fn line(&mut self, color: Color, text: &str) {
        let result = if self.colored {
            execute!(
                self.out,
                SetForegroundColor(color),
                Print(text),
                ResetColor,
                Print("\n")
            )
        } else {
            writeln!(self.out, "{}", text).and_then(|_| self.out.flush())
        };

        if let Err(e) = result {
            tracing::debug!("Console write failed: {}", e);
        }
    }
}
