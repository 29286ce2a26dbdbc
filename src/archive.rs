use crate::error::Error;
use crate::result::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Deserialize;
use std::fs::File;
use std::io;
use std::path::Path;
use std::str::FromStr;
use tar::Builder;
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ArchiveFormat {
    #[default]
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "tar.gz")]
    TarGz,
}

impl ArchiveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarGz => "tar.gz",
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "zip" => Ok(ArchiveFormat::Zip),
            "tar.gz" | "tgz" => Ok(ArchiveFormat::TarGz),
            other => Err(Error::custom(format!("Unsupported archive format: {other}"))),
        }
    }
}

/// Compress the contents of `source_dir` (not the directory itself) into `output_path`
pub fn create(format: ArchiveFormat, source_dir: &Path, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        crate::utils::ensure_dir(parent)?;
    }

    match format {
        ArchiveFormat::Zip => create_zip_file(source_dir, output_path),
        ArchiveFormat::TarGz => create_tar_gz_file(source_dir, output_path),
    }
}

fn create_tar_gz_file(source_dir: &Path, output_path: &Path) -> Result<()> {
    let tar_gz = File::create(output_path)?;
    let enc = GzEncoder::new(tar_gz, Compression::default());
    let mut tar = Builder::new(enc);

    tar.append_dir_all(".", source_dir)?;
    tar.into_inner()?.finish()?;

    Ok(())
}

fn create_zip_file(source_dir: &Path, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut zip = ZipWriter::new(file);

    let file_options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let dir_options = SimpleFileOptions::default().unix_permissions(0o755);

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let relative = path
            .strip_prefix(source_dir)
            .map_err(|_| Error::custom(format!("{} is outside {}", path.display(), source_dir.display())))?;

        // zip entry names always use forward slashes
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_file() {
            zip.start_file(name, file_options)?;
            let mut f = File::open(path)?;
            io::copy(&mut f, &mut zip)?;
        } else if entry.file_type().is_dir() && !name.is_empty() {
            zip.add_directory(name, dir_options)?;
        }
    }

    zip.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::fs;
    use std::io::Read;

    fn sample_package(dir: &Path) {
        fs::create_dir_all(dir.join("html")).unwrap();
        fs::create_dir_all(dir.join("assets")).unwrap();
        fs::write(dir.join("manifest.json"), r#"{"name":"x"}"#).unwrap();
        fs::write(dir.join("assets/app.js"), "console.log(1)").unwrap();
    }

    #[test]
    fn test_zip_has_package_contents_at_root() {
        let tmp = tempfile::tempdir().unwrap();
        let package = tmp.path().join("package");
        sample_package(&package);
        let out = tmp.path().join("ext-1.0.0.zip");

        create(ArchiveFormat::Zip, &package, &out).unwrap();

        let mut zip = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let mut manifest = String::new();
        zip.by_name("manifest.json").unwrap().read_to_string(&mut manifest).unwrap();
        assert_eq!(manifest, r#"{"name":"x"}"#);
        assert!(zip.by_name("assets/app.js").is_ok());
        assert!(zip.by_name("html/").is_ok());

        // extracted directories must stay traversable
        let assets_mode = zip.by_name("assets/").unwrap().unix_mode().unwrap();
        assert_eq!(assets_mode & 0o111, 0o111);
        let file_mode = zip.by_name("assets/app.js").unwrap().unix_mode().unwrap();
        assert_eq!(file_mode & 0o777, 0o644);
    }

    #[test]
    fn test_tar_gz_contains_files() {
        let tmp = tempfile::tempdir().unwrap();
        let package = tmp.path().join("package");
        sample_package(&package);
        let out = tmp.path().join("out/ext.tar.gz");

        create(ArchiveFormat::TarGz, &package, &out).unwrap();

        let mut archive = tar::Archive::new(GzDecoder::new(File::open(&out).unwrap()));
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().to_string())
            .collect();
        assert!(names.iter().any(|n| n.ends_with("manifest.json")));
        assert!(names.iter().any(|n| n.ends_with("assets/app.js")));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("zip".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Zip);
        assert_eq!("tar.gz".parse::<ArchiveFormat>().unwrap().extension(), "tar.gz");
        assert!("rar".parse::<ArchiveFormat>().is_err());
    }
}
