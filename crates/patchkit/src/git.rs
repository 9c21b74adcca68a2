//! Raw git commands issued on the remote working tree.

/// Fetch all remotes and print the current tag.
pub fn describe() -> String {
    "git fetch --all >/dev/null && git describe".to_string()
}

/// List every known tag.
pub fn tags() -> String {
    "git tag".to_string()
}

/// One-line log of the commits between two tags.
///
/// An empty target logs up to `HEAD`.
pub fn log(current: &str, target: &str) -> String {
    format!("git log --oneline {current}..{target}")
}

/// Discard local changes and move to a tag.
pub fn reset_hard(tag: &str) -> String {
    format!("git reset --hard {tag}")
}

/// Apply the diff between two tags to the working tree.
pub fn diff_apply(current: &str, target: &str) -> String {
    format!("git diff {current}..{target} -- | git apply -v -")
}

/// Split command output into non-empty trimmed lines.
pub fn lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
