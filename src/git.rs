//! Read-only inspection of a project's git repository.
//!
//! Three facts are extracted through `git2`: the remote URLs, the branch
//! `HEAD` points at and whether the working tree has uncommitted changes.
//! Nothing is ever written to the repository.

use std::path::Path;

use git2::{ErrorCode, Repository, StatusOptions};
use tracing::debug;

/// Remotes, branch and working-tree state of a repository.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GitInfo {
    /// Remote URLs in the order git lists the remotes, without duplicates
    pub remotes: Vec<String>,
    /// `None` when `HEAD` is detached
    pub branch: Option<String>,
    /// Modified, staged or untracked (but not ignored) files exist
    pub dirty: bool,
}

/// Reads [`GitInfo`] from a project root.
#[derive(Clone, Copy, Debug, Default)]
pub struct GitInspector;

impl GitInspector {
    /// Inspect the repository rooted at `root`.
    ///
    /// Returns `None` when `root` has no `.git` entry, or when the repository
    /// cannot be opened. Linked worktrees and `gitdir:` files are followed.
    #[must_use]
    pub fn inspect(root: &Path) -> Option<GitInfo> {
        if !root.join(".git").exists() {
            return None;
        }

        let repo = Repository::open(root)
            .map_err(|err| debug!(root = %root.display(), "cannot open repository: {err}"))
            .ok()?;

        Some(GitInfo {
            remotes: remote_urls(&repo),
            branch: current_branch(&repo),
            dirty: is_dirty(&repo),
        })
    }
}

fn remote_urls(repo: &Repository) -> Vec<String> {
    let Ok(names) = repo.remotes() else {
        return Vec::new();
    };

    let mut urls: Vec<String> = Vec::new();
    for name in names.iter().flatten() {
        let Ok(remote) = repo.find_remote(name) else {
            continue;
        };
        if let Some(url) = remote.url()
            && !urls.iter().any(|known| known == url)
        {
            urls.push(url.to_string());
        }
    }
    urls
}

/// The branch `HEAD` names, including an unborn branch with no commits yet.
fn current_branch(repo: &Repository) -> Option<String> {
    match repo.head() {
        Ok(head) if head.is_branch() => head.shorthand().map(str::to_string),
        Ok(_) => None,
        Err(err) if err.code() == ErrorCode::UnbornBranch => repo
            .find_reference("HEAD")
            .ok()?
            .symbolic_target()?
            .strip_prefix("refs/heads/")
            .map(str::to_string),
        Err(err) => {
            debug!("cannot resolve HEAD: {err}");
            None
        }
    }
}

fn is_dirty(repo: &Repository) -> bool {
    let mut options = StatusOptions::new();
    options
        .include_untracked(true)
        .include_ignored(false)
        .exclude_submodules(true);

    repo.statuses(Some(&mut options))
        .map(|statuses| !statuses.is_empty())
        .unwrap_or_else(|err| {
            debug!("cannot read status: {err}");
            false
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{IndexAddOption, RepositoryInitOptions, Signature};
    use std::fs;
    use tempfile::TempDir;

    fn create_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn init_repo(path: &Path) -> Repository {
        let mut options = RepositoryInitOptions::new();
        options.initial_head("main");
        Repository::init_opts(path, &options).unwrap()
    }

    fn commit_all(repo: &Repository) -> git2::Oid {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();

        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let signature = Signature::now("Test", "test@example.com").unwrap();
        let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        repo.commit(Some("HEAD"), &signature, &signature, "commit", &tree, &parents)
            .unwrap()
    }

    #[test]
    fn test_inspect_without_git_is_none() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(GitInspector::inspect(tmp.path()), None);
    }

    #[test]
    fn test_inspect_broken_git_dir_is_none() {
        let tmp = TempDir::new().unwrap();
        create_file(&tmp.path().join(".git/HEAD"), "not a ref\n");

        assert_eq!(GitInspector::inspect(tmp.path()), None);
    }

    #[test]
    fn test_remotes_without_duplicates() {
        let tmp = TempDir::new().unwrap();
        let repo = init_repo(tmp.path());
        repo.remote("origin", "git@github.com:me/indexer.git").unwrap();
        repo.remote("upstream", "https://github.com/them/indexer.git")
            .unwrap();
        repo.remote("mirror", "git@github.com:me/indexer.git").unwrap();

        let info = GitInspector::inspect(tmp.path()).unwrap();
        assert_eq!(info.remotes.len(), 2);
        assert!(info.remotes.contains(&"git@github.com:me/indexer.git".to_string()));
        assert!(info
            .remotes
            .contains(&"https://github.com/them/indexer.git".to_string()));
    }

    #[test]
    fn test_config_syntax_is_case_insensitive_with_comments() {
        let tmp = TempDir::new().unwrap();
        init_repo(tmp.path());

        let config = tmp.path().join(".git/config");
        let mut content = fs::read_to_string(&config).unwrap();
        content.push_str("[Remote \"origin\"]\n\tURL = https://example.com/b.git ; mirror\n");
        fs::write(&config, content).unwrap();

        let info = GitInspector::inspect(tmp.path()).unwrap();
        assert_eq!(info.remotes, vec!["https://example.com/b.git".to_string()]);
    }

    #[test]
    fn test_unborn_branch_without_remotes() {
        let tmp = TempDir::new().unwrap();
        init_repo(tmp.path());

        let info = GitInspector::inspect(tmp.path()).unwrap();
        assert!(info.remotes.is_empty());
        assert_eq!(info.branch.as_deref(), Some("main"));
        assert!(!info.dirty);
    }

    #[test]
    fn test_clean_and_modified_working_tree() {
        let tmp = TempDir::new().unwrap();
        let repo = init_repo(tmp.path());
        create_file(&tmp.path().join("src/main.rs"), "fn main() {}\n");

        assert!(GitInspector::inspect(tmp.path()).unwrap().dirty);

        commit_all(&repo);
        assert!(!GitInspector::inspect(tmp.path()).unwrap().dirty);

        create_file(&tmp.path().join("src/main.rs"), "fn main() { run() }\n");
        assert!(GitInspector::inspect(tmp.path()).unwrap().dirty);
    }

    #[test]
    fn test_ignored_files_do_not_make_tree_dirty() {
        let tmp = TempDir::new().unwrap();
        let repo = init_repo(tmp.path());
        create_file(&tmp.path().join(".gitignore"), "target/\n");
        commit_all(&repo);

        create_file(&tmp.path().join("target/debug/app"), "binary");

        assert!(!GitInspector::inspect(tmp.path()).unwrap().dirty);
    }

    #[test]
    fn test_detached_head_has_no_branch() {
        let tmp = TempDir::new().unwrap();
        let repo = init_repo(tmp.path());
        create_file(&tmp.path().join("README.md"), "# hi\n");
        let commit = commit_all(&repo);
        repo.set_head_detached(commit).unwrap();

        let info = GitInspector::inspect(tmp.path()).unwrap();
        assert_eq!(info.branch, None);
    }

    #[test]
    fn test_linked_worktree_shares_remotes() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main");
        let repo = init_repo(&main);
        repo.remote("origin", "https://example.com/app.git").unwrap();
        create_file(&main.join("README.md"), "# app\n");
        commit_all(&repo);

        let linked = tmp.path().join("feature");
        repo.worktree("feature", &linked, None).unwrap();

        let info = GitInspector::inspect(&linked).unwrap();
        assert_eq!(info.branch.as_deref(), Some("feature"));
        assert_eq!(info.remotes, vec!["https://example.com/app.git".to_string()]);
    }
}
