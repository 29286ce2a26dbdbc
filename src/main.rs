mod archive;
mod args;
mod cmd;
mod config;
mod context;
mod error;
mod manifest;
mod packager;
mod platform;
mod result;
mod tpl;
mod utils;

use archive::ArchiveFormat;
use args::Args;
use config::Layout;
use context::Context;
use error::Error;
use packager::{Options, Packager, Stage};
use std::path::PathBuf;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        if let Error::CommandFailed { output, .. } = &e {
            if !output.trim().is_empty() {
                eprintln!("{}", output.trim_end());
            }
        }
        std::process::exit(e.exit_code());
    }
}

fn run() -> result::Result<()> {
    // Parse command-line arguments
    let Args {
        verbose,
        archive: archive_flag,
        format,
        no_build,
        path,
        config: config_path,
    } = Args::parse();

    // Locate the project root (directory holding manifest.json)
    let start = match path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let root = utils::find_root(&start, config::DEFAULT_MANIFEST)?;

    let ctx = Context::new(root, verbose);

    cliclack::intro("extpack")?;

    let layout = match Layout::load(&ctx, config_path.as_deref()) {
        Ok(layout) => {
            cliclack::log::info(format!(
                "Packaging {} {} from {}",
                layout.name,
                layout.version,
                ctx.base_dir.display()
            ))?;
            layout
        }
        Err(e) => {
            cliclack::outro_cancel("Failed to load configuration")?;
            return Err(e);
        }
    };

    let archive = if archive_flag {
        Some(match format {
            Some(format) => format.parse::<ArchiveFormat>()?,
            None => layout.archive_format,
        })
    } else {
        None
    };

    let options = Options {
        skip_build: no_build,
        archive,
    };

    let mut progress = Progress::new(verbose);
    let result = Packager::new(&ctx, &layout, options).run(|stage| progress.stage(stage));
    let summary = match result {
        Ok(summary) => {
            progress.finish();
            summary
        }
        Err(e) => {
            progress.fail();
            cliclack::outro_cancel("Packaging failed")?;
            return Err(e);
        }
    };

    if summary.html_empty == Some(true) {
        if let Some(html_dir) = &layout.html_dir {
            cliclack::log::warning(format!(
                "{} was created but nothing was copied into it; set `html-folder = \"\"` in {} to skip it",
                html_dir.display(),
                config::CONFIG_FILE
            ))?;
        }
    }

    cliclack::log::success(format!(
        "Copied {} files into {}",
        summary.files_copied,
        display_relative(&ctx, &summary.package_dir)
    ))?;

    if let Some(archive) = &summary.archive {
        cliclack::log::success(format!("Archive created: {}", display_relative(&ctx, archive)))?;
    }

    cliclack::outro("Package assembled successfully!")?;
    Ok(())
}

/// Terminal progress for a pass: a spinner while build commands run (unless
/// verbose, where their output streams instead), a step line for the rest.
/// Output is best effort; a closed terminal must not fail the pass.
struct Progress {
    verbose: bool,
    spinner: Option<cliclack::ProgressBar>,
}

impl Progress {
    fn new(verbose: bool) -> Self {
        Self {
            verbose,
            spinner: None,
        }
    }

    fn stage(&mut self, stage: &Stage) {
        match stage {
            Stage::Build(_) if !self.verbose => {
                self.finish();
                let spinner = cliclack::spinner();
                spinner.start(stage.to_string());
                self.spinner = Some(spinner);
            }
            _ => {
                self.finish();
                let _ = cliclack::log::step(stage.to_string());
            }
        }
    }

    fn finish(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop("Build step completed");
        }
    }

    fn fail(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error("Build step failed");
        }
    }
}

fn display_relative(ctx: &Context, path: &std::path::Path) -> String {
    path.strip_prefix(&ctx.base_dir)
        .map(PathBuf::from)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
