//! Console progress rendering driven by pipeline notifications

use crate::Verbosity;
use catastrofe_core::ProgressObserver;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

/// Progress bars for the split and export commands
///
/// Bars are hidden in quiet mode; the first notification of a run creates
/// the bar sized to the work announced.
pub struct ConsoleProgress {
    verbosity: Verbosity,
    bar: Option<ProgressBar>,
}

impl ConsoleProgress {
    pub const fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            bar: None,
        }
    }

    fn start(&mut self, len: usize, message: &'static str) {
        let bar = if self.verbosity.should_show_output() {
            let pb = ProgressBar::new(len as u64);
            if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
                pb.set_style(style.progress_chars("█▓▒░  "));
            }
            pb.set_message(message);
            pb
        } else {
            ProgressBar::hidden()
        };
        self.bar = Some(bar);
    }

    fn println(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    /// Remove the bar from the terminal
    pub fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl ProgressObserver for ConsoleProgress {
    fn document_loaded(&mut self, path: &Path, records: usize) {
        if self.verbosity.should_show_output() {
            println!("{} {}", "Reading:".cyan(), path.display());
            println!("{} {records}", "Records found:".green());
        }
        self.start(records, "packing records");
    }

    fn record_planned(&mut self, done: usize, _total: usize) {
        if let Some(bar) = &self.bar {
            bar.set_position(done as u64);
        }
    }

    fn partition_sealed(&mut self, number: usize, records: usize, estimated_bytes: u64) {
        if self.verbosity.is_verbose() {
            self.println(format!(
                "  part {number:03}: {records} records, ~{:.1} KB",
                estimated_bytes as f64 / 1024.0
            ));
        }
    }

    fn archive_expanded(&mut self, archive: &Path, members: usize) {
        if self.verbosity.is_verbose() {
            eprintln!(
                "{} {} ({members} XML members)",
                "Expanded:".cyan(),
                archive.display()
            );
        }
    }

    fn documents_resolved(&mut self, documents: usize) {
        if documents > 0 {
            self.start(documents, "flattening documents");
        }
    }

    fn document_collected(&mut self, path: &Path, retained: usize, duplicates: usize) {
        if self.verbosity.is_verbose() {
            self.println(format!(
                "  {}: {retained} rows, {duplicates} duplicates",
                path.file_name().map_or_else(
                    || path.display().to_string(),
                    |name| name.to_string_lossy().into_owned()
                )
            ));
        }
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }
}
