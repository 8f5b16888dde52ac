use crossterm::{
    cursor, execute,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::{self, Write};

/// Single-line countdown bar, redrawn in place: `████░░░░ 45% 34s`.
pub struct Bar {
    width: u16,
    total_secs: u64,
}

impl Bar {
    pub fn new(width: u16, total_secs: u64) -> Self {
        Bar { width, total_secs }
    }

    pub fn draw(&self, elapsed_secs: u64) -> io::Result<()> {
        let (filled, empty) = cells(self.width, elapsed_secs, self.total_secs);
        let pct = percent(elapsed_secs, self.total_secs);
        let remaining = self.total_secs.saturating_sub(elapsed_secs);

        let bar_filled: String = "\u{2588}".repeat(filled);
        let bar_empty: String = "\u{2591}".repeat(empty);

        let mut stdout = io::stdout();
        execute!(
            stdout,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(bar_color(remaining, self.total_secs)),
            Print(&bar_filled),
            SetForegroundColor(Color::DarkGrey),
            Print(&bar_empty),
            ResetColor,
            Print(format!(" {pct}% {elapsed_secs}s")),
        )?;
        stdout.flush()?;
        Ok(())
    }
}

fn cells(width: u16, elapsed: u64, total: u64) -> (usize, usize) {
    let progress = if total > 0 {
        (elapsed as f64 / total as f64).min(1.0)
    } else {
        1.0
    };
    let filled = (progress * width as f64) as usize;
    (filled, width as usize - filled)
}

fn percent(elapsed: u64, total: u64) -> u64 {
    if total == 0 {
        return 100;
    }
    (elapsed * 100 / total).min(100)
}

// Green, then yellow for the last fifth, red for the last minute.
fn bar_color(remaining: u64, total: u64) -> Color {
    if remaining <= 60 {
        Color::Red
    } else if remaining as f64 <= total as f64 * 0.2 {
        Color::Yellow
    } else {
        Color::Green
    }
}

/// Raw mode for the duration of a countdown, cursor hidden.
pub fn raw_on() -> io::Result<()> {
    terminal::enable_raw_mode()?;
    execute!(io::stdout(), cursor::Hide)?;
    Ok(())
}

pub fn raw_off() -> io::Result<()> {
    execute!(io::stdout(), cursor::Show)?;
    terminal::disable_raw_mode()?;
    Ok(())
}

pub fn title(text: &str) {
    let _ = execute!(
        io::stdout(),
        SetAttribute(Attribute::Bold),
        Print(text),
        SetAttribute(Attribute::Reset),
        Print("\n"),
    );
}

pub fn hint(text: &str) {
    let _ = execute!(
        io::stdout(),
        SetForegroundColor(Color::DarkGrey),
        Print(text),
        ResetColor,
        Print("\n"),
    );
}

pub fn warn(text: &str) {
    let _ = execute!(
        io::stderr(),
        SetForegroundColor(Color::Yellow),
        Print("! "),
        Print(text),
        ResetColor,
        Print("\n"),
    );
}
