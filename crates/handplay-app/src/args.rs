//! Command line: `handplay [--swap-ok] [DIR]`.

use std::path::PathBuf;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Args {
    /// Directory the browser starts in.
    pub files_dir: Option<PathBuf>,
    pub swap_ok: bool,
}

impl Args {
    /// Parse arguments without the program name. Unknown flags are
    /// ignored; only the first positional argument is used.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Self {
        let mut parsed = Args::default();
        for arg in args {
            match arg.as_str() {
                "--swap-ok" => parsed.swap_ok = true,
                flag if flag.starts_with("--") => log::debug!("Ignoring unknown flag {flag}"),
                path if parsed.files_dir.is_none() => parsed.files_dir = Some(PathBuf::from(path)),
                extra => log::debug!("Ignoring extra argument {extra}"),
            }
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_arguments() {
        assert_eq!(parse(&[]), Args::default());
    }

    #[test]
    fn directory_and_swap() {
        let args = parse(&["--swap-ok", "/media/music"]);
        assert_eq!(args.files_dir, Some(PathBuf::from("/media/music")));
        assert!(args.swap_ok);
    }

    #[test]
    fn first_positional_wins_and_unknown_flags_are_ignored() {
        let args = parse(&["--fullscreen", "a", "b"]);
        assert_eq!(args.files_dir, Some(PathBuf::from("a")));
        assert!(!args.swap_ok);
    }
}
