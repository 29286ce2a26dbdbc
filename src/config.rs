use crate::archive::ArchiveFormat;
use crate::context::Context;
use crate::error::Error;
use crate::manifest::ExtensionManifest;
use crate::platform::Platform;
use crate::result::Result;
use crate::tpl::Tpl;
use crate::utils;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "extpack.toml";
pub const DEFAULT_MANIFEST: &str = "manifest.json";
pub const DEFAULT_BUILD: &str = "yarn build";
pub const DEFAULT_DIST: &str = "dist";
pub const DEFAULT_OUTPUT_FOLDER: &str = "package";
pub const DEFAULT_HTML_FOLDER: &str = "html";
pub const DEFAULT_FILENAME: &str = "$NAME-$VERSION";

/// Raw `extpack.toml` contents; every key is optional
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PackConfig {
    #[serde(default)]
    pub build: Option<Vec<String>>,

    #[serde(default)]
    pub dist: Option<String>,

    #[serde(default)]
    pub output_folder: Option<String>,

    #[serde(default)]
    pub manifest: Option<String>,

    /// Empty string disables the html subdirectory
    #[serde(default)]
    pub html_folder: Option<String>,

    #[serde(default)]
    pub filename: Option<String>,

    #[serde(default)]
    pub archive_format: Option<ArchiveFormat>,
}

impl PackConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load `explicit` if given (must exist), otherwise `extpack.toml` in the
    /// project root when present, otherwise defaults
    pub fn load(ctx: &Context, explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                let path = ctx.resolve(path);
                if !path.is_file() {
                    return Err(Error::ConfigNotFound(path.display().to_string()));
                }
                Self::from_toml(&fs::read_to_string(&path)?)
            }
            None => {
                let path = ctx.resolve(CONFIG_FILE);
                if path.is_file() {
                    Self::from_toml(&fs::read_to_string(&path)?)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Fully resolved paths and commands for one packaging pass
#[derive(Debug, Clone)]
pub struct Layout {
    pub name: String,
    pub version: String,
    pub build_commands: Vec<String>,
    pub dist_dir: PathBuf,
    pub package_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub html_dir: Option<PathBuf>,
    pub filename: String,
    pub archive_format: ArchiveFormat,
}

impl Layout {
    /// Load the configuration and resolve it against the project root
    pub fn load(ctx: &Context, explicit_config: Option<&Path>) -> Result<Self> {
        let config = PackConfig::load(ctx, explicit_config)?;
        Self::resolve(ctx, config)
    }

    pub fn resolve(ctx: &Context, config: PackConfig) -> Result<Self> {
        let manifest_rel = config.manifest.unwrap_or_else(|| DEFAULT_MANIFEST.to_string());
        let manifest_path = ctx.resolve(&manifest_rel);

        let peek = ExtensionManifest::peek(&manifest_path);
        let name = peek.slug().unwrap_or_else(|| root_name(&ctx.base_dir));
        let version = peek.version_or_default().to_string();

        let mut tpl = Tpl::new();
        tpl.register("NAME", &name);
        tpl.register("VERSION", &version);
        tpl.register("PLATFORM", Platform::current().as_str());

        let build_commands = config
            .build
            .map(|b| tpl.parse_vec(&b))
            .unwrap_or_else(|| vec![DEFAULT_BUILD.to_string()]);

        let root = utils::normalize(&ctx.base_dir);
        let manifest_path = utils::normalize(&manifest_path);
        let dist_dir = utils::normalize(&ctx.resolve(tpl.parse(
            config.dist.as_deref().unwrap_or(DEFAULT_DIST),
        )));
        let package_dir = utils::normalize(&ctx.resolve(tpl.parse(
            config.output_folder.as_deref().unwrap_or(DEFAULT_OUTPUT_FOLDER),
        )));

        // the package folder is deleted on every run
        if package_dir == root || !package_dir.starts_with(&root) {
            return Err(Error::UnsafePath(format!(
                "output-folder {} must be a subdirectory of the project root {}",
                package_dir.display(),
                root.display()
            )));
        }
        if dist_dir.starts_with(&package_dir) || manifest_path.starts_with(&package_dir) {
            return Err(Error::UnsafePath(format!(
                "output-folder {} would delete the build output or the manifest",
                package_dir.display()
            )));
        }
        if package_dir.starts_with(&dist_dir) {
            return Err(Error::UnsafePath(format!(
                "output-folder {} must not be inside the build output {}",
                package_dir.display(),
                dist_dir.display()
            )));
        }

        let html_dir = match config.html_folder.as_deref() {
            Some("") => None,
            Some(folder) => {
                let folder = PathBuf::from(tpl.parse(folder));
                if !utils::is_plain_relative(&folder) {
                    return Err(Error::UnsafePath(format!(
                        "html-folder {} must be a relative path inside the package folder",
                        folder.display()
                    )));
                }
                Some(package_dir.join(folder))
            }
            None => Some(package_dir.join(DEFAULT_HTML_FOLDER)),
        };

        let filename = tpl.parse(config.filename.as_deref().unwrap_or(DEFAULT_FILENAME));

        Ok(Layout {
            name,
            version,
            build_commands,
            dist_dir,
            package_dir,
            manifest_path,
            html_dir,
            filename,
            archive_format: config.archive_format.unwrap_or_default(),
        })
    }

    /// Archive destination: beside the package directory, never inside it
    pub fn archive_path(&self, format: ArchiveFormat) -> PathBuf {
        let file = format!("{}.{}", self.filename, format.extension());
        match self.package_dir.parent() {
            Some(parent) => parent.join(file),
            None => PathBuf::from(file),
        }
    }
}

fn root_name(base_dir: &Path) -> String {
    base_dir
        .file_name()
        .map(|n| crate::manifest::slugify(&n.to_string_lossy()))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "extension".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_plain_layout() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(dir.path().to_path_buf(), false);

        let layout = Layout::resolve(&ctx, PackConfig::default()).unwrap();

        assert_eq!(layout.build_commands, vec!["yarn build"]);
        assert_eq!(layout.dist_dir, dir.path().join("dist"));
        assert_eq!(layout.package_dir, dir.path().join("package"));
        assert_eq!(layout.manifest_path, dir.path().join("manifest.json"));
        assert_eq!(layout.html_dir, Some(dir.path().join("package/html")));
        assert_eq!(layout.version, "0.0.0");
        assert_eq!(layout.archive_format, ArchiveFormat::Zip);
    }

    #[test]
    fn test_config_keys_and_templates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("manifest.json"),
            r#"{"name": "Focus Tab", "version": "2.1.0"}"#,
        )
        .unwrap();
        let ctx = Context::new(dir.path().to_path_buf(), false);

        let config = PackConfig::from_toml(
            r#"
            build = ["npm run build -- --out build", "echo $NAME"]
            dist = "build"
            output-folder = "out/$VERSION"
            html-folder = ""
            filename = "$NAME-v$VERSION"
            archive-format = "tar.gz"
            "#,
        )
        .unwrap();
        let layout = Layout::resolve(&ctx, config).unwrap();

        assert_eq!(layout.build_commands[1], "echo focus-tab");
        assert_eq!(layout.dist_dir, dir.path().join("build"));
        assert_eq!(layout.package_dir, dir.path().join("out/2.1.0"));
        assert!(layout.html_dir.is_none());
        assert_eq!(layout.archive_format, ArchiveFormat::TarGz);
        assert_eq!(
            layout.archive_path(ArchiveFormat::TarGz),
            dir.path().join("out/focus-tab-v2.1.0.tar.gz")
        );
    }

    fn rejected(output_folder: &str) -> bool {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(dir.path().to_path_buf(), false);
        let config = PackConfig {
            output_folder: Some(output_folder.to_string()),
            ..PackConfig::default()
        };
        matches!(Layout::resolve(&ctx, config), Err(Error::UnsafePath(_)))
    }

    #[test]
    fn test_output_folder_cannot_cover_project() {
        assert!(rejected(""));
        assert!(rejected("."));
        assert!(rejected("src/.."));
        assert!(rejected(".."));
        assert!(rejected("../sibling"));
        assert!(rejected("dist"));
        assert!(rejected("dist/package"));
        assert!(!rejected("out/package"));
    }

    #[test]
    fn test_output_folder_outside_root_rejected() {
        let outside = tempfile::tempdir().unwrap();
        assert!(rejected(&outside.path().display().to_string()));
    }

    #[test]
    fn test_output_folder_holding_manifest_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(dir.path().to_path_buf(), false);
        let config = PackConfig::from_toml(
            r#"
            manifest = "public/manifest.json"
            output-folder = "public"
            "#,
        )
        .unwrap();
        assert!(matches!(Layout::resolve(&ctx, config), Err(Error::UnsafePath(_))));
    }

    #[test]
    fn test_html_folder_must_stay_in_package() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(dir.path().to_path_buf(), false);
        for folder in ["../escape", "/tmp/elsewhere", "pages/../../up"] {
            let config = PackConfig {
                html_folder: Some(folder.to_string()),
                ..PackConfig::default()
            };
            assert!(
                matches!(Layout::resolve(&ctx, config), Err(Error::UnsafePath(_))),
                "{folder} accepted"
            );
        }

        let config = PackConfig {
            html_folder: Some("pages/html".to_string()),
            ..PackConfig::default()
        };
        let layout = Layout::resolve(&ctx, config).unwrap();
        assert_eq!(layout.html_dir, Some(dir.path().join("package/pages/html")));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(dir.path().to_path_buf(), false);

        let err = PackConfig::load(&ctx, Some(Path::new("missing.toml"))).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }

    #[test]
    fn test_default_config_file_is_optional_but_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(dir.path().to_path_buf(), false);
        assert!(PackConfig::load(&ctx, None).unwrap().build.is_none());

        fs::write(dir.path().join(CONFIG_FILE), "dist = 42").unwrap();
        let err = PackConfig::load(&ctx, None).unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }
}
