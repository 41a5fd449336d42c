//! Shell-script stand-ins for ffmpeg and ffprobe.
//!
//! The fake prober classifies by magic bytes (`RIFF` is wav, `OggS` is ogg,
//! `ID3` is mp3). The fake transcoder writes the target format's magic bytes
//! to the output path. Like the real engine run with `-v level+<level>`, it
//! tags stderr lines with their level and prints an `[info]` line naming the
//! input unless the level is `quiet`. Inputs starting with `BROKEN` make it
//! report an `[error]` line while exiting 0, and inputs starting with `SLOW`
//! make it sleep for two seconds first.
//!
//! Write the scripts once per test binary, before any test spawns them: a
//! script still open for writing in a forked child cannot be executed.

use std::io::{self, Write};
use std::path::Path;

use crate::binaries::ResolvedBinaries;
use crate::config::TranscodeConfig;
use crate::format::MediaEngine;

const FAKE_FFPROBE: &str = r#"#!/bin/sh
for arg; do file="$arg"; done
magic=$(head -c 4 "$file" 2>/dev/null)
case "$magic" in
  RIFF) name=wav; long="WAV / WAVE (Waveform Audio)" ;;
  OggS) name=ogg; long="Ogg" ;;
  ID3*) name=mp3; long="MP2/3 (MPEG audio layer 2/3)" ;;
  *)
    printf '{"error": {"code": -1094995529, "string": "Invalid data found when processing input"}}\n'
    exit 1
    ;;
esac
printf '{"format": {"nb_streams": 1, "format_name": "%s", "format_long_name": "%s"}}\n' "$name" "$long"
"#;

const FAKE_FFMPEG: &str = r#"#!/bin/sh
if [ $# -eq 0 ]; then
  echo "ffmpeg version 6.1-fake Copyright (c) 2000-2023 the FFmpeg developers" >&2
  exit 1
fi
input=""; format=""; output=""; level=""
while [ $# -gt 0 ]; do
  case "$1" in
    -y) ;;
    -v) shift; level="$1" ;;
    -i) shift; input="$1" ;;
    -f) shift; format="$1" ;;
    *) output="$1" ;;
  esac
  shift
done
if [ ! -f "$input" ]; then
  echo "[error] $input: No such file or directory" >&2
  exit 1
fi
if [ "$level" != "level+quiet" ]; then
  echo "[info] Input #0, $format, from '$input':" >&2
fi
magic=$(head -c 6 "$input")
case "$magic" in
  BROKEN*)
    echo "[aac @ 0x5581] [error] Error while decoding stream #0:0: Invalid data found" >&2
    exit 0
    ;;
  SLOW*) sleep 2 ;;
esac
case "$format" in
  wav) printf 'RIFF\044\000\000\000WAVEfmt ' > "$output" ;;
  ogg) printf 'OggS\000\002\000\000' > "$output" ;;
  mp3) printf 'ID3\003\000\000\000\000' > "$output" ;;
  *)
    echo "[error] Requested output format '$format' is not a suitable output format" >&2
    exit 1
    ;;
esac
"#;

/// Writes fake `ffmpeg` and `ffprobe` scripts into `dir`.
pub fn write_fake_tools(dir: &Path) -> io::Result<ResolvedBinaries> {
    std::fs::create_dir_all(dir)?;
    let ffmpeg = dir.join("ffmpeg");
    let ffprobe = dir.join("ffprobe");
    write_script(&ffmpeg, FAKE_FFMPEG)?;
    write_script(&ffprobe, FAKE_FFPROBE)?;
    Ok(ResolvedBinaries::from_paths(ffmpeg, ffprobe))
}

/// Builds an engine around fake tools written into `dir`.
///
/// # Panics
///
/// Panics if the scripts cannot be written.
pub fn fake_engine_at(dir: &Path, settings: &TranscodeConfig) -> MediaEngine {
    let binaries = write_fake_tools(dir).expect("failed to write fake tools");
    MediaEngine::new(binaries, settings).expect("fake tools are not executable")
}

fn write_script(path: &Path, contents: &str) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut file = std::fs::File::create(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    drop(file);
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}
