use crate::archive::{self, ArchiveFormat};
use crate::cmd;
use crate::config::Layout;
use crate::context::Context;
use crate::error::Error;
use crate::result::Result;
use crate::utils;
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// One step of a packaging pass, reported before it starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Build(String),
    Reset,
    Html,
    CopyDist,
    CopyManifest,
    Archive(ArchiveFormat),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Build(command) => write!(f, "Running {command}..."),
            Stage::Reset => write!(f, "Resetting package folder..."),
            Stage::Html => write!(f, "Creating html folder..."),
            Stage::CopyDist => write!(f, "Packing build output..."),
            Stage::CopyManifest => write!(f, "Packing manifest file..."),
            Stage::Archive(format) => write!(f, "Creating {} archive...", format.extension()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub skip_build: bool,
    pub archive: Option<ArchiveFormat>,
}

/// Outcome of a successful pass
#[derive(Debug, Clone)]
pub struct Summary {
    pub package_dir: PathBuf,
    /// Files copied from the build output (the manifest is not counted)
    pub files_copied: usize,
    /// `Some(true)` when the html folder was created but nothing landed in it
    pub html_empty: Option<bool>,
    pub archive: Option<PathBuf>,
}

pub struct Packager<'a> {
    ctx: &'a Context,
    layout: &'a Layout,
    options: Options,
}

impl<'a> Packager<'a> {
    pub fn new(ctx: &'a Context, layout: &'a Layout, options: Options) -> Self {
        Self {
            ctx,
            layout,
            options,
        }
    }

    /// Build, reset the package folder and fill it. `progress` is called
    /// before each stage. The first failure aborts the pass; nothing done by
    /// earlier stages is rolled back.
    pub fn run<F: FnMut(&Stage)>(&self, mut progress: F) -> Result<Summary> {
        let layout = self.layout;

        if !self.options.skip_build {
            for command in &layout.build_commands {
                if command.trim().is_empty() {
                    continue;
                }
                progress(&Stage::Build(command.clone()));
                cmd::execute(self.ctx, command)?;
            }
        }

        progress(&Stage::Reset);
        utils::reset_dir(&layout.package_dir)?;

        if let Some(html_dir) = &layout.html_dir {
            progress(&Stage::Html);
            fs::create_dir_all(html_dir)?;
        }

        progress(&Stage::CopyDist);
        if !layout.dist_dir.is_dir() {
            return Err(Error::BuildOutputMissing(layout.dist_dir.display().to_string()));
        }
        let files_copied = utils::copy_dir_contents(&layout.dist_dir, &layout.package_dir)?;

        progress(&Stage::CopyManifest);
        if !layout.manifest_path.is_file() {
            return Err(Error::ManifestNotFound(layout.manifest_path.display().to_string()));
        }
        let manifest_name = layout
            .manifest_path
            .file_name()
            .ok_or_else(|| Error::custom("Manifest path has no file name"))?;
        fs::copy(&layout.manifest_path, layout.package_dir.join(manifest_name))?;

        let html_empty = match &layout.html_dir {
            Some(html_dir) => Some(utils::is_empty_dir(html_dir)?),
            None => None,
        };

        let archive = match self.options.archive {
            Some(format) => {
                progress(&Stage::Archive(format));
                let path = layout.archive_path(format);
                archive::create(format, &layout.package_dir, &path)?;
                Some(path)
            }
            None => None,
        };

        Ok(Summary {
            package_dir: layout.package_dir.clone(),
            files_copied,
            html_empty,
            archive,
        })
    }
}
