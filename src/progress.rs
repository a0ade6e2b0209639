use indicatif::{ProgressBar, ProgressStyle};
use log::warn;

const BAR_TEMPLATE: &str = "{bar:40.cyan/blue} {pos}/{len} files [{elapsed_precise}] {msg}";

/// Terminal progress bar counting finished downloads.
#[derive(Clone)]
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        match ProgressStyle::with_template(BAR_TEMPLATE) {
            Ok(style) => bar.set_style(style.progress_chars("=> ")),
            Err(err) => warn!("progress: falling back to default style ({err})"),
        }
        Self { bar }
    }

    /// A bar that tracks counts without drawing anything.
    #[cfg(test)]
    pub fn hidden(total: usize) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total as u64);
        Self { bar }
    }

    pub fn complete_one(&self, name: &str) {
        self.bar.set_message(name.to_owned());
        self.bar.inc(1);
    }

    pub fn completed(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("done");
    }
}
