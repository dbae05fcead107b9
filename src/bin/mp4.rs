//! `git-vid-mp4`: convert an MP4 file into a frame repository.
//!
//! Usage: `git-vid-mp4 [-q|-v] <input.mp4> <repo_path>`
//!
//! Requires `ffmpeg` and `ffprobe` on PATH. The video is scaled and padded
//! to the stream geometry before encoding.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};

use gitvid::encoder::EncodeOptions;
use gitvid::mp4::convert_mp4_to_repo;
use gitvid::notify::set_notification_level;
use gitvid::{notify, GvcError};

struct Args {
    input: PathBuf,
    repo: PathBuf,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-q" | "--quiet" => {
                set_notification_level(1);
            }
            "-v" | "--verbose" => {
                set_notification_level(3);
            }
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            _ if arg.starts_with('-') => bail!("unknown option '{arg}'"),
            _ => positional.push(PathBuf::from(arg)),
        }
    }
    if positional.len() != 2 {
        bail!("expected <input.mp4> <repo_path>");
    }
    let repo = positional.pop().unwrap_or_default();
    let input = positional.pop().unwrap_or_default();
    Ok(Args { input, repo })
}

fn print_usage() {
    eprintln!("usage: git-vid-mp4 [-q|-v] <input.mp4> <repo_path>");
    eprintln!();
    eprintln!("Converts an MP4 video into a frame repository. ffmpeg must be");
    eprintln!("installed and on PATH; the video is scaled to the stream");
    eprintln!("geometry with aspect-ratio-preserving padding.");
}

fn run() -> anyhow::Result<()> {
    let args = parse_args().inspect_err(|_| print_usage())?;
    let options = EncodeOptions::default();

    notify!(2, "input: {}\n", args.input.display());
    notify!(2, "output: {}\n", args.repo.display());

    convert_mp4_to_repo(&args.input, &args.repo, &options)
        .with_context(|| format!("converting {}", args.input.display()))?;

    notify!(
        2,
        "conversion complete; play it with: git-vid-play {}\n",
        args.repo.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("git-vid-mp4: {err:#}");
            let code = err
                .downcast_ref::<GvcError>()
                .map(GvcError::code)
                .unwrap_or(-2);
            eprintln!("{code}");
            ExitCode::FAILURE
        }
    }
}
