//! Progress bar that shares stderr with log output.
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};

const TEMPLATE: &str = "{bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}] {msg}";

/// A bar that draws nothing until [`start`] is called on it.
pub fn hidden_bar() -> ProgressBar {
    ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden())
}

/// Size the bar and begin drawing it on stderr.
pub fn start(bar: &ProgressBar, len: usize) -> Result<()> {
    bar.set_style(ProgressStyle::with_template(TEMPLATE).context("progress bar template")?);
    bar.set_length(len as u64);
    bar.set_draw_target(ProgressDrawTarget::stderr());
    Ok(())
}

/// Writer that lifts the bar off the terminal for the duration of each write.
pub struct SuspendingWriter<W> {
    bar: ProgressBar,
    inner: W,
}

impl<W: Write> SuspendingWriter<W> {
    pub fn new(bar: ProgressBar, inner: W) -> Self {
        Self { bar, inner }
    }
}

impl<W: Write> Write for SuspendingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inner = &mut self.inner;
        self.bar.suspend(|| inner.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
