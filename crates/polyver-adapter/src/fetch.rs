//! Download and extraction helpers shared by adapter
//! implementations.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;

use crate::error::AdapterError;

/// Stream `url` to `dest`, creating the file. Fails with
/// [`AdapterError::Download`] on a non-success status and
/// [`AdapterError::Network`] on transport errors mid-stream.
///
/// # Errors
/// See above; disk write failures surface as [`AdapterError::Disk`].
pub async fn download_to(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<(), AdapterError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| AdapterError::network_from("download request", error))?;

    if !response.status().is_success() {
        return Err(AdapterError::download(url, response.status().as_u16()));
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut downloaded: u64 = 0;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|error| AdapterError::network_from("download stream", error))?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
    }

    file.flush().await?;
    info!("Downloaded {downloaded} bytes from {url}");
    Ok(())
}

/// Extract a zip archive into `dest` on a blocking worker thread.
/// Entries with unsafe paths are skipped; unix permissions are
/// restored where the archive carries them. Existing unrelated files
/// under `dest` are left alone.
///
/// # Errors
/// [`AdapterError::Archive`] for a corrupt or unreadable archive,
/// [`AdapterError::Disk`] when extracted entries cannot be written.
pub async fn unpack_zip(archive: PathBuf, dest: PathBuf) -> Result<(), AdapterError> {
    tokio::task::spawn_blocking(move || extract_zip(&archive, &dest))
        .await
        .map_err(|error| AdapterError::archive_from("extraction task", error))?
}

/// Extract a gzip-compressed tarball into `dest` on a blocking worker
/// thread. Entries that would escape `dest` are rejected by the tar
/// reader itself.
///
/// # Errors
/// [`AdapterError::Archive`] for a corrupt or unreadable archive,
/// [`AdapterError::Disk`] when extracted entries cannot be written.
pub async fn unpack_tar_gz(archive: PathBuf, dest: PathBuf) -> Result<(), AdapterError> {
    tokio::task::spawn_blocking(move || extract_tar_gz(&archive, &dest))
        .await
        .map_err(|error| AdapterError::archive_from("extraction task", error))?
}

/// Dispatch to the right unpacker based on the archive file name.
/// `.zip`, `.tar.gz`, and `.tgz` are understood.
///
/// # Errors
/// [`AdapterError::Archive`] for an unrecognized extension, otherwise
/// as the underlying unpacker.
pub async fn unpack_archive(archive: PathBuf, dest: PathBuf) -> Result<(), AdapterError> {
    let name = archive
        .file_name()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or_default()
        .to_ascii_lowercase();
    if name.ends_with(".zip") {
        unpack_zip(archive, dest).await
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        unpack_tar_gz(archive, dest).await
    } else {
        Err(AdapterError::archive(
            "detect archive kind",
            format!("unsupported archive name {name:?}"),
        ))
    }
}

fn extract_tar_gz(tar_path: &Path, dest: &Path) -> Result<(), AdapterError> {
    let file = std::fs::File::open(tar_path)?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    archive
        .unpack(dest)
        .map_err(|error| AdapterError::archive_from("unpack tar archive", error))?;
    debug!("Extraction complete to {}", dest.display());
    Ok(())
}

fn extract_zip(zip_path: &Path, dest: &Path) -> Result<(), AdapterError> {
    let file = std::fs::File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|error| AdapterError::archive_from("read zip archive", error))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|error| AdapterError::archive_from("read zip entry", error))?;
        let Some(name) = entry.enclosed_name() else {
            warn!("Skipping zip entry with unsafe path");
            continue;
        };
        let out_path = dest.join(name);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut outfile = std::fs::File::create(&out_path)?;
            std::io::copy(&mut entry, &mut outfile)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    let _ =
                        std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode));
                }
            }
        }
    }

    debug!("Extraction complete to {}", dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::error::AdapterError;

    use super::{unpack_archive, unpack_tar_gz, unpack_zip};

    fn write_fixture_zip(path: &std::path::Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).expect("zip file should be created");
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
        for (name, data) in entries {
            writer
                .start_file(*name, options)
                .expect("entry should start");
            writer.write_all(data).expect("entry should be written");
        }
        writer.finish().expect("zip archive should be finalized");
    }

    #[tokio::test]
    async fn unpack_zip_expands_nested_entries() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let zip_path = temp.path().join("pkg.zip");
        write_fixture_zip(
            &zip_path,
            &[
                ("pkg-1.0/bin/tool", b"#!/bin/sh\n" as &[u8]),
                ("pkg-1.0/README", b"hello"),
            ],
        );

        let dest = temp.path().join("out");
        std::fs::create_dir_all(&dest).expect("dest should be created");
        unpack_zip(zip_path, dest.clone())
            .await
            .expect("zip should extract");

        assert!(dest.join("pkg-1.0").join("bin").join("tool").is_file());
        assert!(dest.join("pkg-1.0").join("README").is_file());
    }

    #[tokio::test]
    async fn unpack_zip_skips_unsafe_paths() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let zip_path = temp.path().join("unsafe.zip");
        write_fixture_zip(&zip_path, &[("../escape.txt", b"nope" as &[u8])]);

        let dest = temp.path().join("out");
        std::fs::create_dir_all(&dest).expect("dest should be created");
        unpack_zip(zip_path, dest)
            .await
            .expect("unsafe entries are skipped, not fatal");

        assert!(!temp.path().join("escape.txt").exists());
    }

    fn write_fixture_tar_gz(path: &std::path::Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).expect("tarball should be created");
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder
                .append_data(&mut header, name, *data)
                .expect("entry should be appended");
        }
        builder
            .into_inner()
            .expect("tar stream should be finalized")
            .finish()
            .expect("gzip stream should be finalized");
    }

    #[tokio::test]
    async fn unpack_tar_gz_expands_nested_entries() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let tar_path = temp.path().join("pkg.tar.gz");
        write_fixture_tar_gz(
            &tar_path,
            &[
                ("pkg-1.0/bin/tool", b"#!/bin/sh\n" as &[u8]),
                ("pkg-1.0/README", b"hello"),
            ],
        );

        let dest = temp.path().join("out");
        std::fs::create_dir_all(&dest).expect("dest should be created");
        unpack_tar_gz(tar_path, dest.clone())
            .await
            .expect("tarball should extract");

        assert!(dest.join("pkg-1.0").join("bin").join("tool").is_file());
        assert!(dest.join("pkg-1.0").join("README").is_file());
    }

    #[tokio::test]
    async fn unpack_archive_dispatches_on_extension() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let tar_path = temp.path().join("pkg.tar.gz");
        write_fixture_tar_gz(&tar_path, &[("pkg/file", b"data" as &[u8])]);

        let dest = temp.path().join("out");
        std::fs::create_dir_all(&dest).expect("dest should be created");
        unpack_archive(tar_path, dest.clone())
            .await
            .expect("tarball should be recognized and extracted");
        assert!(dest.join("pkg").join("file").is_file());

        let error = unpack_archive(temp.path().join("pkg.rar"), dest)
            .await
            .expect_err("unknown extensions are rejected");
        assert!(matches!(error, AdapterError::Archive { .. }));
    }

    #[tokio::test]
    async fn unpack_missing_archive_reports_disk_error() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let error = unpack_zip(temp.path().join("absent.zip"), temp.path().to_path_buf())
            .await
            .expect_err("missing archive cannot extract");
        assert!(matches!(
            error,
            AdapterError::Disk { .. } | AdapterError::Archive { .. }
        ));
    }
}
