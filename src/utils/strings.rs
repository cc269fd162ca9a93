/// `<crate version>-<commit count>-<commit hash>`, as reported by `--version`.
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "-",
    env!("GIT_COUNT"),
    "-",
    env!("GIT_HASH")
);
