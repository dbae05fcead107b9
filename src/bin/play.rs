//! `git-vid-play`: play a frame repository.
//!
//! Usage: `git-vid-play [-q|-v] [-m] [repo_path]`
//!
//! With a repository path, plays every commit reachable from HEAD at the
//! target frame rate. With no path, reads abbreviated commit ids (7..40 hex
//! characters, one per line) from stdin, expands them in one batch against
//! the repository in the current directory, and plays them unpaced.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};

use gitvid::notify::set_notification_level;
use gitvid::player::ProgressDisplay;
use gitvid::store::GitStore;
use gitvid::{notify, GvcError, Pacing, PlaybackStats, Player, PlayerConfig};

struct Args {
    repo: Option<PathBuf>,
    max_throughput: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut repo = None;
    let mut max_throughput = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-q" | "--quiet" => {
                set_notification_level(1);
            }
            "-v" | "--verbose" => {
                set_notification_level(3);
            }
            "-m" | "--max-throughput" => {
                max_throughput = true;
            }
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            _ if arg.starts_with('-') => bail!("unknown option '{arg}'"),
            _ if repo.is_none() => repo = Some(PathBuf::from(arg)),
            _ => bail!("more than one repository path given"),
        }
    }
    Ok(Args { repo, max_throughput })
}

fn print_usage() {
    eprintln!("usage: git-vid-play [-q|-v] [-m] [repo_path]");
    eprintln!();
    eprintln!("Plays a frame repository. Without a path, commit ids are read");
    eprintln!("from stdin (7..40 hex characters, one per line) and resolved");
    eprintln!("against the repository in the current directory; stdin playback");
    eprintln!("runs unpaced, as does -m/--max-throughput.");
}

/// Reads abbreviated commit ids from stdin; blank lines end the list.
fn read_short_ids() -> anyhow::Result<Vec<String>> {
    let mut ids = Vec::new();
    for line in std::io::stdin().lock().lines() {
        let line = line.context("reading commit ids from stdin")?;
        let id = line.trim();
        if id.is_empty() {
            break;
        }
        if id.len() < 7 || id.len() > 40 {
            bail!("'{id}' is not a 7..40-character commit id");
        }
        ids.push(id.to_owned());
    }
    Ok(ids)
}

fn report(stats: &PlaybackStats) {
    notify!(
        2,
        "playback complete: {} frames ({} skipped) in {:.2}s, {:.2} fps average\n",
        stats.frames_displayed,
        stats.frames_skipped,
        stats.elapsed.as_secs_f64(),
        stats.fps()
    );
}

fn run() -> anyhow::Result<()> {
    let args = parse_args().inspect_err(|_| print_usage())?;
    let mut config = PlayerConfig::default();
    let mut display = ProgressDisplay::new();

    let stats = match args.repo {
        Some(repo) => {
            if args.max_throughput {
                config.pacing = Pacing::MaxThroughput;
            }
            let store = GitStore::open(&repo)
                .with_context(|| format!("opening repository {}", repo.display()))?;
            Player::new(store, config)
                .play(&mut display)
                .context("playback failed")?
        }
        None => {
            // Stdin playback mirrors the batch pipeline use: ids are piped
            // in, frames come out as fast as the sink accepts them.
            config.pacing = Pacing::MaxThroughput;
            let store = GitStore::open(Path::new("."))
                .context("opening repository in the current directory")?;
            let short = read_short_ids()?;
            let commits = store.expand_oids(&short).context("expanding commit ids")?;
            Player::new(store, config)
                .play_commits(commits, &mut display)
                .context("playback failed")?
        }
    };

    report(&stats);
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("git-vid-play: {err:#}");
            let code = err
                .downcast_ref::<GvcError>()
                .map(GvcError::code)
                .unwrap_or(-2);
            eprintln!("{code}");
            ExitCode::FAILURE
        }
    }
}
