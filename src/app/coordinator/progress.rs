//! Single-line transfer progress display
//!
//! The reporter redraws one terminal line in place with a carriage return.
//! With a known range it draws a fixed-width bar and a percentage; with an
//! empty range it falls back to printing the raw value and a unit label.
//! Every update is flushed immediately so long transfers show live progress.

use std::io::{self, Write};

use crate::constants::progress;

/// Rendering mode, decided once at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// `[#####-----]  50.0%`
    Bar,
    /// `12345 Bytes`
    Raw,
}

/// In-place progress display for a single transfer
#[derive(Debug)]
pub struct ProgressReporter<W: Write> {
    min: u64,
    max: u64,
    width: usize,
    fill: char,
    unit: String,
    mode: ProgressMode,
    value: u64,
    out: W,
}

impl<W: Write> ProgressReporter<W> {
    /// Create a reporter drawing to an arbitrary writer
    pub fn with_writer(
        min: u64,
        max: u64,
        width: usize,
        fill: char,
        unit: impl Into<String>,
        out: W,
    ) -> Self {
        let mode = if max <= min {
            ProgressMode::Raw
        } else {
            ProgressMode::Bar
        };
        Self {
            min,
            max,
            width,
            fill,
            unit: unit.into(),
            mode,
            value: min,
            out,
        }
    }

    /// Byte-count reporter with the default bar geometry
    pub fn for_bytes(total: u64, out: W) -> Self {
        Self::with_writer(
            0,
            total,
            progress::BAR_WIDTH,
            progress::FILL_CHAR,
            progress::DEFAULT_UNIT,
            out,
        )
    }

    /// Current rendering mode
    pub fn mode(&self) -> ProgressMode {
        self.mode
    }

    /// Fraction complete for the last value, clamped to `[0, 1]`
    ///
    /// Always `0.0` in raw mode.
    pub fn progress(&self) -> f64 {
        if self.mode == ProgressMode::Raw || self.value <= self.min {
            return 0.0;
        }
        let done = (self.value - self.min) as f64;
        let range = (self.max - self.min) as f64;
        (done / range).clamp(0.0, 1.0)
    }

    /// Record a new value and redraw
    pub fn update(&mut self, value: u64) -> io::Result<()> {
        self.value = value;
        match self.mode {
            ProgressMode::Bar => {
                let progress = self.progress();
                let ticks = ((progress * self.width as f64).round() as usize).min(self.width);
                let filled: String = std::iter::repeat(self.fill).take(ticks).collect();
                write!(
                    self.out,
                    "\r[{:-<width$}] {:5.1}%",
                    filled,
                    progress * 100.0,
                    width = self.width
                )?;
            }
            ProgressMode::Raw => {
                write!(
                    self.out,
                    "\r{:width$}\r{} {}",
                    "",
                    value,
                    self.unit,
                    width = progress::RAW_CLEAR_WIDTH
                )?;
            }
        }
        self.out.flush()
    }

    /// Finish the display with a line terminator
    pub fn done(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        self.out.flush()
    }

    /// Consume the reporter and return its writer
    pub fn into_inner(self) -> W {
        self.out
    }
}
