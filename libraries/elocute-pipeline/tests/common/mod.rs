//! Shared fixtures: WAV clips, a scripted stand-in for FFmpeg, and a
//! simulated analysis engine that answers through the shared directory.
#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Initialize tracing once so failing tests show pipeline logs
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("elocute_pipeline=debug")
        .with_test_writer()
        .try_init();
}

/// In-memory 16-bit PCM WAV of silence
pub fn wav_bytes(sample_rate: u32, channels: u16, frames: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..frames * u32::from(channels) {
            writer.write_sample(0_i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Half a second of engine-format audio
pub fn engine_clip() -> Vec<u8> {
    wav_bytes(16_000, 1, 8_000)
}

/// Whether a real FFmpeg is on PATH
pub async fn is_ffmpeg_available() -> bool {
    tokio::process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Shell script that behaves like FFmpeg for the argument contract.
///
/// `-version` always succeeds. A conversion appends its arguments to
/// `args.log` next to the script, copies a 16 kHz mono fixture to the last
/// argument, and exits with `exit_code`.
#[cfg(unix)]
pub fn fake_converter(dir: &Path, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let fixture = dir.join("fixture.wav");
    std::fs::write(&fixture, engine_clip()).unwrap();

    let script = dir.join("fake-ffmpeg");
    let body = format!(
        r#"#!/bin/sh
if [ "$1" = "-version" ]; then
  echo "ffmpeg version fake"
  exit 0
fi
echo "$@" >> "{log}"
for last; do :; done
echo "size=N/A time=00:00:00.50" >&2
if [ {code} -eq 0 ]; then
  cp "{fixture}" "$last"
else
  printf 'partial' > "$last"
fi
exit {code}
"#,
        log = dir.join("args.log").display(),
        fixture = fixture.display(),
        code = exit_code,
    );
    std::fs::write(&script, body).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

/// Arguments recorded by [`fake_converter`], one invocation per line
pub fn recorded_args(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("args.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Files left under `<root>/input` and `<root>/output`
pub fn residue(root: &Path) -> Vec<String> {
    let mut names = Vec::new();
    for area in ["input", "output"] {
        if let Ok(entries) = std::fs::read_dir(root.join(area)) {
            for entry in entries.flatten() {
                names.push(format!("{}/{}", area, entry.file_name().to_string_lossy()));
            }
        }
    }
    names.sort();
    names
}

/// What the simulated engine does with the first request it sees
#[derive(Debug, Clone)]
pub struct EngineScript {
    /// Body written to the result file
    pub response: String,
    /// Delay between picking up the request and writing the result
    pub delay: Duration,
    /// Delete the request after reading it, as the real engine does
    pub consume_request: bool,
}

impl EngineScript {
    pub fn respond(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            delay: Duration::from_millis(50),
            consume_request: true,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Watch `<root>/input` for one request and answer it.
///
/// Resolves to the parsed request descriptor, or `None` if nothing arrived
/// within a few seconds.
pub fn spawn_engine(root: &Path, script: EngineScript) -> JoinHandle<Option<serde_json::Value>> {
    let input = root.join("input");
    let output = root.join("output");

    tokio::spawn(async move {
        for _ in 0..500 {
            if let Some(request_path) = find_request(&input) {
                let raw = tokio::fs::read(&request_path).await.ok()?;
                let request: serde_json::Value = serde_json::from_slice(&raw).ok()?;
                let wav_file = request["wav_file"].as_str()?.to_string();
                assert!(
                    input.join(&wav_file).exists(),
                    "request announced before its clip was placed"
                );
                if script.consume_request {
                    let _ = tokio::fs::remove_file(&request_path).await;
                }

                tokio::time::sleep(script.delay).await;
                tokio::fs::write(output.join(format!("{}.result", wav_file)), &script.response)
                    .await
                    .ok()?;
                return Some(request);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    })
}

fn find_request(input: &Path) -> Option<PathBuf> {
    std::fs::read_dir(input)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .find(|p| p.extension().is_some_and(|ext| ext == "request"))
}
