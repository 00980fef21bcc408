use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::LevelFilter;

use crate::error::Result;

pub struct Logger;

impl Logger {
    pub fn init(verbosity: LevelFilter) {
        let mut builder = colog::default_builder();
        builder.filter_level(verbosity);
        builder.init();
    }
}

/// Append-only debug log scoped to one generated job, named after its
/// `name_param`. Every pipeline stage records its prompt/output here.
pub struct JobLog {
    path: PathBuf,
}

impl JobLog {
    pub fn create(dir: &Path, name_param: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(format!("{name_param}.log")),
        })
    }

    pub fn append(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let stamp = Local::now().format("[%Y-%m-%d %H:%M:%S]");
        writeln!(file, "{stamp} {line}")?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
