//! libgit2-backed frame store.
//!
//! Migrated from git_ops_libgit2.c (`git_init_libgit2` line 34,
//! `git_read_blob_libgit2` lines 186–285, `git_get_commit_chain_libgit2`
//! lines 287–342) and the write half of git_ops.c (`git_create_blob`,
//! `git_create_commit`), whose shelled-out `hash-object`/`mktree`/
//! `commit-tree` pipelines map onto the libgit2 blob, treebuilder and
//! commit APIs here.
//!
//! Migration decisions:
//! - The file-static `repo` handle and `repo_mutex` become an owned
//!   `Mutex<Repository>` field; libgit2 handles are not guaranteed
//!   read-thread-safe, so every operation takes the lock and the prefetcher
//!   and decoder interleave at operation granularity.
//! - `GIT_SORT_REVERSE` on the revwalk maps to `Sort::REVERSE`.
//! - `expand_hashes_batch` (player.c line 197), a single `git rev-parse`
//!   pipe, is absorbed here as [`GitStore::expand_oids`]: one lock
//!   acquisition, one revparse per id.

use std::path::Path;
use std::sync::Mutex;

use git2::{Repository, Signature, Sort};

use crate::config::MAX_OBJECT_SIZE;
use crate::error::{GvcError, Result};
use crate::notify;

use super::{FrameStore, Oid, TreeEntry, FRAME_BLOB_NAME};

/// Committer identity stamped on every frame commit.
const COMMITTER_NAME: &str = "gitvid";
const COMMITTER_EMAIL: &str = "gitvid@localhost";

/// Exclusive handle on a libgit2 repository used as a frame archive.
pub struct GitStore {
    repo: Mutex<Repository>,
}

impl GitStore {
    /// Ensures a repository exists at `path` and opens it. Idempotent on an
    /// already-initialized path, like `git init`.
    pub fn init(path: &Path) -> Result<Self> {
        let repo = Repository::init(path)
            .map_err(|e| GvcError::Store(format!("init {}: {}", path.display(), e.message())))?;
        notify!(3, "repository ready: {}\n", path.display());
        Ok(GitStore { repo: Mutex::new(repo) })
    }

    /// Opens an existing repository at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::open(path)
            .map_err(|e| GvcError::Store(format!("open {}: {}", path.display(), e.message())))?;
        notify!(3, "repository opened: {}\n", path.display());
        Ok(GitStore { repo: Mutex::new(repo) })
    }

    /// Expands abbreviated commit ids (7..40 hex characters) to full oids in
    /// one batch under a single lock acquisition. Every input must resolve to
    /// a commit.
    pub fn expand_oids(&self, short: &[String]) -> Result<Vec<Oid>> {
        let repo = self.lock();
        let mut full = Vec::with_capacity(short.len());
        for spec in short {
            let object = repo
                .revparse_single(spec)
                .map_err(|e| GvcError::Store(format!("cannot resolve '{spec}': {}", e.message())))?;
            let commit = object
                .peel_to_commit()
                .map_err(|_| GvcError::Store(format!("'{spec}' is not a commit")))?;
            full.push(from_git(commit.id())?);
        }
        Ok(full)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Repository> {
        // A poisoned store mutex means another pipeline thread panicked while
        // holding it; the repository itself is still consistent.
        match self.repo.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn to_git(oid: Oid) -> git2::Oid {
    // Infallible: the byte length always matches a sha1 oid.
    git2::Oid::from_bytes(oid.as_bytes()).unwrap_or_else(|_| git2::Oid::zero())
}

fn from_git(oid: git2::Oid) -> Result<Oid> {
    let bytes = oid.as_bytes();
    let raw: [u8; Oid::RAW_LEN] = bytes
        .try_into()
        .map_err(|_| GvcError::Store(format!("unexpected object id length {}", bytes.len())))?;
    Ok(Oid::from_bytes(raw))
}

impl FrameStore for GitStore {
    fn put_blob(&self, data: &[u8]) -> Result<Oid> {
        let repo = self.lock();
        let oid = repo.blob(data)?;
        from_git(oid)
    }

    fn put_tree(&self, entries: &[TreeEntry]) -> Result<Oid> {
        let repo = self.lock();
        let mut builder = repo.treebuilder(None)?;
        for entry in entries {
            builder.insert(entry.name.as_str(), to_git(entry.oid), entry.mode as i32)?;
        }
        let oid = builder.write()?;
        from_git(oid)
    }

    fn put_commit(&self, tree: Oid, parent: Option<Oid>, message: &str) -> Result<Oid> {
        let repo = self.lock();
        let tree = repo.find_tree(to_git(tree))?;
        let signature = Signature::now(COMMITTER_NAME, COMMITTER_EMAIL)?;

        let parent_commit = match parent {
            Some(p) => Some(repo.find_commit(to_git(p))?),
            None => None,
        };
        let parents: Vec<&git2::Commit<'_>> = parent_commit.iter().collect();

        // HEAD is advanced separately via set_head.
        let oid = repo.commit(None, &signature, &signature, message, &tree, &parents)?;
        from_git(oid)
    }

    fn set_head(&self, commit: Oid) -> Result<()> {
        let repo = self.lock();
        // Resolve the branch HEAD points at (unborn on a fresh repository)
        // and move it; falls back to master for a detached or missing HEAD.
        let branch = repo
            .find_reference("HEAD")
            .ok()
            .and_then(|head| head.symbolic_target().map(str::to_owned))
            .unwrap_or_else(|| "refs/heads/master".to_owned());
        repo.reference(&branch, to_git(commit), true, "frame commit")?;
        Ok(())
    }

    fn list_commits_oldest_first(&self) -> Result<Vec<Oid>> {
        let repo = self.lock();
        let mut walk = repo.revwalk()?;
        if walk.push_head().is_err() {
            // Unborn HEAD: an empty repository holds zero frames.
            return Ok(Vec::new());
        }
        walk.set_sorting(Sort::REVERSE)?;

        let mut commits = Vec::new();
        for oid in walk {
            commits.push(from_git(oid?)?);
        }
        Ok(commits)
    }

    fn read_frame_blob(&self, commit: Oid) -> Result<Vec<u8>> {
        let repo = self.lock();
        let commit_obj = repo
            .find_commit(to_git(commit))
            .map_err(|e| GvcError::Store(format!("commit {commit}: {}", e.message())))?;
        let tree = commit_obj.tree()?;
        let entry = tree.get_name(FRAME_BLOB_NAME).ok_or_else(|| {
            GvcError::Store(format!("no '{FRAME_BLOB_NAME}' entry in commit {commit}"))
        })?;
        let blob = repo
            .find_blob(entry.id())
            .map_err(|e| GvcError::Store(format!("blob of commit {commit}: {}", e.message())))?;
        if blob.size() > MAX_OBJECT_SIZE {
            return Err(GvcError::Memory(format!(
                "blob of commit {commit} is {} bytes, over the {MAX_OBJECT_SIZE}-byte ceiling",
                blob.size()
            )));
        }
        Ok(blob.content().to_vec())
    }
}
