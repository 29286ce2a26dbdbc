use std::path::{Path, PathBuf};

/// Context passed throughout the application containing global configuration
#[derive(Clone)]
pub struct Context {
    /// Enable verbose output (show command execution details)
    pub verbose: bool,

    /// Project root; every relative path resolves against it and build
    /// commands run inside it
    pub base_dir: PathBuf,
}

impl Context {
    pub fn new(base_dir: PathBuf, verbose: bool) -> Self {
        Self { verbose, base_dir }
    }

    /// Resolve a project-relative path (absolute paths pass through)
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.base_dir.join(path)
    }
}
