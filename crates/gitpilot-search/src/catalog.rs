//! Built-in git command catalog
//!
//! A compact catalog covering the everyday commands plus the ones people ask
//! about when something went wrong. Loaded once by `MemoryStore::with_builtin_catalog`.

use crate::store::CommandEntry;

fn entry(
    command: &str,
    description: &str,
    usage_scenario: &str,
    example: &str,
    risk_level: &str,
    category: &str,
) -> CommandEntry {
    CommandEntry {
        command: command.to_string(),
        description: description.to_string(),
        usage_scenario: usage_scenario.to_string(),
        example: example.to_string(),
        risk_level: risk_level.to_string(),
        category: category.to_string(),
    }
}

/// The built-in catalog, in declaration order.
#[must_use]
pub fn builtin() -> Vec<CommandEntry> {
    vec![
        // Basic
        entry(
            "git init",
            "Initialize a new Git repository",
            "Starting a new project",
            "git init my-project",
            "SAFE",
            "basic",
        ),
        entry(
            "git status",
            "Show working tree status",
            "Check what files changed",
            "git status",
            "SAFE",
            "basic",
        ),
        entry(
            "git add <file>",
            "Stage changes for commit",
            "Preparing files to commit",
            "git add file.txt",
            "SAFE",
            "basic",
        ),
        entry(
            "git commit -m '<message>'",
            "Commit staged changes",
            "Saving your work with a message",
            "git commit -m 'Add new feature'",
            "SAFE",
            "basic",
        ),
        entry(
            "git log",
            "Show commit history",
            "View past commits",
            "git log --oneline",
            "SAFE",
            "basic",
        ),
        entry(
            "git diff",
            "Show changes between commits or working tree",
            "See what changed in files",
            "git diff HEAD~1",
            "SAFE",
            "basic",
        ),
        entry(
            "git pull",
            "Fetch and merge from remote",
            "Get latest changes from team",
            "git pull origin main",
            "SAFE",
            "basic",
        ),
        entry(
            "git push",
            "Push commits to remote repository",
            "Share your commits with team",
            "git push origin main",
            "SAFE",
            "basic",
        ),
        // Branching
        entry(
            "git branch <name>",
            "Create a new branch",
            "Start working on a new feature",
            "git branch feature-auth",
            "SAFE",
            "branching",
        ),
        entry(
            "git checkout -b <name>",
            "Create and switch to new branch",
            "Start new feature branch quickly",
            "git checkout -b feature-api",
            "SAFE",
            "branching",
        ),
        entry(
            "git merge <branch>",
            "Merge branch into current branch",
            "Combine work from another branch",
            "git merge feature-login",
            "CAUTION",
            "branching",
        ),
        entry(
            "git branch -D <name>",
            "Force delete a branch",
            "Delete unmerged branch",
            "git branch -D abandoned-feature",
            "DANGEROUS",
            "branching",
        ),
        // Undoing changes
        entry(
            "git reset HEAD~1",
            "Undo last commit, keep changes staged",
            "Undo commit but keep work",
            "git reset HEAD~1",
            "CAUTION",
            "undo",
        ),
        entry(
            "git reset --soft HEAD~1",
            "Undo commit, keep changes staged",
            "Recommit with different message",
            "git reset --soft HEAD~1",
            "CAUTION",
            "undo",
        ),
        entry(
            "git reset --hard HEAD~1",
            "Undo commit and discard all changes",
            "Completely remove last commit",
            "git reset --hard HEAD~1",
            "DANGEROUS",
            "undo",
        ),
        entry(
            "git revert <commit>",
            "Create new commit that undoes changes",
            "Safely undo a commit in shared history",
            "git revert abc123",
            "SAFE",
            "undo",
        ),
        entry(
            "git restore <file>",
            "Restore file to last commit state",
            "Discard local changes",
            "git restore file.txt",
            "CAUTION",
            "undo",
        ),
        entry(
            "git clean -fd",
            "Remove untracked files and directories",
            "Clean up untracked files",
            "git clean -fd",
            "DANGEROUS",
            "undo",
        ),
        // Stashing
        entry(
            "git stash",
            "Temporarily save uncommitted changes",
            "Save work to switch branches",
            "git stash",
            "SAFE",
            "stash",
        ),
        entry(
            "git stash pop",
            "Apply and remove latest stash",
            "Restore stashed changes",
            "git stash pop",
            "SAFE",
            "stash",
        ),
        // Remote
        entry(
            "git push --force",
            "Force push to remote",
            "Overwrite remote history",
            "git push --force origin main",
            "DANGEROUS",
            "remote",
        ),
        entry(
            "git push --force-with-lease",
            "Safer force push",
            "Force push only if no new commits",
            "git push --force-with-lease origin feature",
            "CAUTION",
            "remote",
        ),
        // Rebase and recovery
        entry(
            "git rebase <branch>",
            "Reapply commits on top of another branch",
            "Keep linear history",
            "git rebase main",
            "CAUTION",
            "rebase",
        ),
        entry(
            "git reflog",
            "Show reference log",
            "Find lost commits",
            "git reflog",
            "SAFE",
            "recovery",
        ),
        entry(
            "git cherry-pick <commit>",
            "Apply specific commit to current branch",
            "Copy a commit from another branch",
            "git cherry-pick abc123",
            "SAFE",
            "recovery",
        ),
    ]
}
