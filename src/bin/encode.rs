//! `git-vid-encode`: encode a raw-frame sequence into a frame repository.
//!
//! Usage: `git-vid-encode [-q|-v] <input_dir|"test"> <repo_path>`
//!
//! The input is either a directory of `frame_NNNNNN.rgb` files or the
//! literal word `test`, which synthesizes a 600-frame moving-gradient
//! sequence (ten seconds at 60 fps).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};

use gitvid::encoder::source::{DirSource, FrameSource, TestPatternSource};
use gitvid::encoder::{encode_sequence, EncodeOptions};
use gitvid::notify::set_notification_level;
use gitvid::store::GitStore;
use gitvid::{notify, GvcError};

/// Frames generated for the `test` input: ten seconds at 60 fps.
const TEST_SEQUENCE_FRAMES: u32 = 600;

struct Args {
    input: String,
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
            _ => positional.push(arg),
        }
    }
    if positional.len() != 2 {
        bail!("expected <input_dir|\"test\"> <repo_path>");
    }
    let repo = PathBuf::from(positional.pop().unwrap_or_default());
    let input = positional.pop().unwrap_or_default();
    Ok(Args { input, repo })
}

fn print_usage() {
    eprintln!("usage: git-vid-encode [-q|-v] <input_dir|\"test\"> <repo_path>");
    eprintln!();
    eprintln!("Encodes raw 1920x1080 RGB frames into a Git repository, one");
    eprintln!("commit per frame. Pass the literal word 'test' as the input to");
    eprintln!("generate a {TEST_SEQUENCE_FRAMES}-frame demonstration sequence.");
}

fn run() -> anyhow::Result<()> {
    let args = parse_args().inspect_err(|_| print_usage())?;
    let options = EncodeOptions::default();

    let mut frames: Box<dyn FrameSource> = if args.input == "test" {
        Box::new(TestPatternSource::new(options.geometry, TEST_SEQUENCE_FRAMES))
    } else {
        Box::new(
            DirSource::open(args.input.as_ref(), options.geometry)
                .with_context(|| format!("opening input directory {}", args.input))?,
        )
    };

    let store = GitStore::init(&args.repo)
        .with_context(|| format!("initializing repository {}", args.repo.display()))?;

    encode_sequence(frames.as_mut(), &store, &options).context("encoding sequence")?;
    notify!(
        2,
        "you can now play the video with: git-vid-play {}\n",
        args.repo.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("git-vid-encode: {err:#}");
            let code = err
                .downcast_ref::<GvcError>()
                .map(GvcError::code)
                .unwrap_or(-2);
            eprintln!("{code}");
            ExitCode::FAILURE
        }
    }
}
