//! Common test utilities and fixtures
#![allow(dead_code)]

use elocute_server::{config::ServerConfig, state::AppState};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub const BOUNDARY: &str = "elocute-test-boundary";

/// A multipart part: `(name, file_name, content)`
pub type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

/// File part named `name`
pub fn file<'a>(name: &'a str, file_name: &'a str, content: &'a [u8]) -> Part<'a> {
    (name, Some(file_name), content)
}

/// Plain text part
pub fn text<'a>(name: &'a str, value: &'a str) -> Part<'a> {
    (name, None, value.as_bytes())
}

/// Encode parts as a multipart/form-data body
pub fn multipart_body(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, file_name, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

/// Half a second of 16 kHz mono silence
pub fn wav_bytes() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..8_000 {
            writer.write_sample(0_i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// FFmpeg stand-in: answers `-version`, copies a fixture clip to its last
/// argument, exits with `exit_code`
#[cfg(unix)]
pub fn fake_converter(dir: &Path, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let fixture = dir.join("fixture.wav");
    std::fs::write(&fixture, wav_bytes()).unwrap();

    let script = dir.join("fake-ffmpeg");
    std::fs::write(
        &script,
        format!(
            "#!/bin/sh\n\
             [ \"$1\" = \"-version\" ] && {{ echo 'ffmpeg version fake'; exit 0; }}\n\
             for last; do :; done\n\
             cp \"{}\" \"$last\"\n\
             exit {}\n",
            fixture.display(),
            exit_code
        ),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

/// Configuration rooted in `dir` with a short analysis bound
pub fn test_config(dir: &Path, converter: &Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.shared.root = dir.join("shared");
    config.shared.staging_dir = dir.join("staging");
    config.converter.ffmpeg_path = converter.to_path_buf();
    config.analysis.poll_interval_ms = 50;
    config.analysis.timeout_intervals = 6;
    config.upload.max_bytes = 64 * 1024;
    config
}

pub struct TestApp {
    pub temp_dir: TempDir,
    pub config: ServerConfig,
    pub state: AppState,
}

impl TestApp {
    pub fn with_converter(converter: impl FnOnce(&Path) -> PathBuf) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let converter = converter(temp_dir.path());
        let config = test_config(temp_dir.path(), &converter);
        let state = AppState::from_config(&config);
        Self {
            temp_dir,
            config,
            state,
        }
    }

    pub fn router(&self) -> axum::Router {
        elocute_server::api::router(self.state.clone())
    }

    pub fn shared_root(&self) -> PathBuf {
        self.config.shared.root.clone()
    }

    /// Answer the first request that shows up with `response`
    pub fn spawn_engine(&self, response: &'static str) -> tokio::task::JoinHandle<bool> {
        let input = self.shared_root().join("input");
        let output = self.shared_root().join("output");
        tokio::spawn(async move {
            for _ in 0..300 {
                let request = std::fs::read_dir(&input).ok().and_then(|entries| {
                    entries
                        .flatten()
                        .map(|e| e.path())
                        .find(|p| p.extension().is_some_and(|ext| ext == "request"))
                });
                if let Some(request) = request {
                    let stem = request.file_stem().unwrap().to_string_lossy().into_owned();
                    let _ = tokio::fs::remove_file(&request).await;
                    tokio::fs::write(output.join(format!("{}.wav.result", stem)), response)
                        .await
                        .unwrap();
                    return true;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            false
        })
    }

    /// Files left in the shared directory
    pub fn residue(&self) -> Vec<String> {
        let mut names = Vec::new();
        for area in ["input", "output"] {
            if let Ok(entries) = std::fs::read_dir(self.shared_root().join(area)) {
                names.extend(
                    entries
                        .flatten()
                        .map(|e| format!("{}/{}", area, e.file_name().to_string_lossy())),
                );
            }
        }
        names
    }
}
