use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

/// Command-line arguments for the extpack tool
#[derive(Debug)]
pub struct Args {
    /// Enable verbose output
    pub verbose: bool,

    /// Compress the package folder into an archive
    pub archive: bool,

    /// Archive format override (`zip` or `tar.gz`)
    pub format: Option<String>,

    /// Skip build commands (use existing build output)
    pub no_build: bool,

    /// Project root or path to its manifest.json
    pub path: Option<PathBuf>,

    /// Alternative configuration file
    pub config: Option<PathBuf>,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse() -> Self {
        Self::from_matches(command().get_matches())
    }

    fn from_matches(matches: clap::ArgMatches) -> Self {
        Self {
            verbose: matches.get_flag("verbose"),
            archive: matches.get_flag("archive"),
            format: matches.get_one::<String>("format").cloned(),
            no_build: matches.get_flag("no-build"),
            path: matches.get_one::<String>("path").map(PathBuf::from),
            config: matches.get_one::<String>("config").map(PathBuf::from),
        }
    }
}

fn command() -> Command {
    Command::new("extpack")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build a browser extension and assemble its package folder")
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .value_name("PATH")
                .help("Project root or path to its manifest.json")
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to alternative configuration file (default: extpack.toml in the project root)")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output")
        )
        .arg(
            Arg::new("archive")
                .short('a')
                .long("archive")
                .action(ArgAction::SetTrue)
                .help("Compress the package folder into an archive")
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_name("FORMAT")
                .value_parser(["zip", "tar.gz"])
                .help("Archive format")
        )
        .arg(
            Arg::new("no-build")
                .long("no-build")
                .action(ArgAction::SetTrue)
                .help("Skip build commands (use existing build output)")
        )
}
