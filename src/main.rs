//! Source Comment Extractor
//!
//! Prints the comments found in source files and counts them per comment style.
//! Comments inside string and character literals are ignored.
//!
//! Supported comment styles: C block comments, C++ line comments (with backslash
//! continuation), assembly `;` comments, Python `#` comments and docstrings, and
//! Rust line, doc and nested block comments.

mod category;
mod error;
mod scanner;
mod walk;

use std::borrow::Cow;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use colored::*;
use flexi_logger::{Logger, LoggerHandle};
use log::{debug, warn};

use crate::category::{CategorySet, Mode, ModeSelection, CATEGORY_LABELS};
use crate::error::{Error, Result};
use crate::scanner::{scan, CommentCount, ScanOptions};
use crate::walk::{collect_files, WalkOptions};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Extracts and counts comments in source files",
    long_about = "Extracts and counts comments in source files.\n\nModes: none, c, cc (cxx, cpp), asm, python (py), rust (rs), default (c and cc), all, auto (chosen from each file's extension)."
)]
struct Args {
    /// Files or directories to scan
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Show the line number of each comment line
    #[arg(short = 'l', long = "line", overrides_with = "no_line")]
    line: bool,

    /// Do not show line numbers
    #[arg(long = "no-line", overrides_with = "line")]
    no_line: bool,

    /// Comment styles to look for
    #[arg(short, long, value_enum, ignore_case = true, default_value = "auto")]
    mode: Mode,

    /// Add comment styles to the mode
    #[arg(short, long, value_enum, ignore_case = true, action = ArgAction::Append)]
    enable: Vec<Mode>,

    /// Remove comment styles from the mode
    #[arg(short, long, value_enum, ignore_case = true, action = ArgAction::Append)]
    disable: Vec<Mode>,

    /// Print the number of comments found (default)
    #[arg(long, overrides_with = "hide_comment_count")]
    display_comment_count: bool,

    /// Do not print the number of comments found
    #[arg(long, overrides_with = "display_comment_count")]
    hide_comment_count: bool,

    /// Print only the counts, not the comments
    #[arg(short, long)]
    quiet: bool,

    #[arg(short, long)]
    non_recursive: bool,

    #[arg(short, long, action = ArgAction::Append)]
    ignore: Vec<String>,

    #[arg(short = 'f', long)]
    filespec: Option<String>,

    #[arg(long, default_value = "1000000")]
    max_entries: usize,

    #[arg(long, default_value = "100")]
    max_depth: usize,

    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn walk_options(&self) -> Result<WalkOptions> {
        Ok(WalkOptions {
            non_recursive: self.non_recursive,
            max_depth: self.max_depth,
            max_entries: self.max_entries,
            ignore: self.ignore.clone(),
            filespec: WalkOptions::parse_filespec(self.filespec.as_deref())?,
        })
    }
}

/// A file queued for scanning. Explicit files are scanned even without a known
/// comment style, and failing to read one is fatal.
struct Target {
    path: PathBuf,
    explicit: bool,
}

#[derive(Debug, Default)]
struct RunTotals {
    files_scanned: u64,
    categories: CategorySet,
    count: CommentCount,
    error_count: usize,
}

fn write_counts<W: Write>(out: &mut W, categories: CategorySet, count: &CommentCount) -> io::Result<()> {
    for (category, label) in CATEGORY_LABELS {
        if categories.contains(category) {
            writeln!(out, "{}: {}", label, count.for_category(category))?;
        }
    }
    Ok(())
}

/// The totals block accompanies the per-file headers; warnings are always reported.
fn write_overall_summary<W: Write>(out: &mut W, totals: &RunTotals, show_totals: bool) -> io::Result<()> {
    if show_totals {
        writeln!(out, "\n{}", "Overall Summary:".blue().bold())?;
        writeln!(out, "Files scanned: {}", totals.files_scanned)?;
        write_counts(out, totals.categories, &totals.count)?;
    }
    if totals.error_count > 0 {
        writeln!(out, "\n{}: {}", "Warning".red().bold(), totals.error_count)?;
    }
    Ok(())
}

fn collect_targets(args: &Args, error_count: &mut usize) -> Result<Vec<Target>> {
    let walk_options = args.walk_options()?;
    let mut targets = Vec::new();
    for path in &args.paths {
        if !path.exists() {
            return Err(Error::PathNotFound { path: path.clone() });
        }
        if path.is_dir() {
            let files = collect_files(path, &walk_options, error_count)?;
            targets.extend(files.into_iter().map(|path| Target {
                path,
                explicit: false,
            }));
        } else {
            targets.push(Target {
                path: path.clone(),
                explicit: true,
            });
        }
    }
    Ok(targets)
}

fn run_cli<W: Write>(args: &Args, out: &mut W) -> Result<()> {
    let selection = ModeSelection::new(args.mode, args.enable.clone(), args.disable.clone());
    let display_count = args.display_comment_count || !args.hide_comment_count;
    let mut totals = RunTotals::default();

    let targets = collect_targets(args, &mut totals.error_count)?;
    let show_headers = targets.len() > 1 || args.paths.iter().any(|p| p.is_dir());

    for target in targets {
        let file_name = target
            .path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or(Cow::Borrowed(""));
        let categories = selection.resolve(&file_name);
        if categories.is_empty() && !target.explicit {
            debug!("no comment style for {}, skipping", target.path.display());
            continue;
        }

        let source = match fs::read(&target.path) {
            Ok(bytes) => bytes,
            Err(source) if target.explicit => {
                return Err(Error::Read {
                    path: target.path,
                    source,
                })
            }
            Err(err) => {
                warn!("Error reading {}: {}", target.path.display(), err);
                totals.error_count += 1;
                continue;
            }
        };

        debug!("scanning {} as {:?}", target.path.display(), categories);
        if show_headers {
            writeln!(
                out,
                "{}",
                format!("==> {} <==", target.path.display()).bright_cyan().bold()
            )?;
        }

        let options = ScanOptions {
            categories,
            line_numbers: args.line && !args.no_line,
        };
        let count = if args.quiet {
            scan(&source, options, &mut io::sink())?
        } else {
            scan(&source, options, out)?
        };

        if display_count {
            write_counts(out, categories, &count)?;
        }
        totals.files_scanned += 1;
        totals.categories |= categories;
        totals.count += count;
    }

    write_overall_summary(out, &totals, display_count && show_headers)?;
    Ok(())
}

fn init_logging(verbose: bool) -> Result<LoggerHandle> {
    let level = if verbose { "debug" } else { "warn" };
    Ok(Logger::try_with_env_or_str(level)?.start()?)
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _logger = match init_logging(args.verbose) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("{} {}", "warning:".yellow().bold(), err);
            None
        }
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = run_cli(&args, &mut out);
    let flushed = out.flush();
    match result.and_then(|()| flushed.map_err(Error::from)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::path::Path;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, content: &str) -> io::Result<()> {
        let path = dir.join(name);
        let mut file = File::create(path)?;
        write!(file, "{}", content)?;
        Ok(())
    }

    fn run_args(args: &[&str]) -> Result<String> {
        colored::control::set_override(false);
        let args = Args::parse_from(std::iter::once("comments").chain(args.iter().copied()));
        let mut out = Vec::new();
        run_cli(&args, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["comments"]);
        assert_eq!(args.paths, vec![PathBuf::from(".")]);
        assert_eq!(args.mode, Mode::Auto);
        assert!(!args.line);
        assert!(!args.hide_comment_count);
        assert!(args.enable.is_empty() && args.disable.is_empty());
    }

    #[test]
    fn test_args_last_toggle_wins() {
        let args = Args::parse_from(["comments", "--line", "--no-line"]);
        assert!(!args.line);
        let args = Args::parse_from(["comments", "--no-line", "-l"]);
        assert!(args.line);
        let args = Args::parse_from([
            "comments",
            "--hide-comment-count",
            "--display-comment-count",
        ]);
        assert!(!args.hide_comment_count);
    }

    #[test]
    fn test_args_modes_accept_aliases() {
        let args = Args::parse_from(["comments", "-m", "CPP", "-e", "asm", "-e", "py", "-d", "rs"]);
        assert_eq!(args.mode, Mode::Cc);
        assert_eq!(args.enable, vec![Mode::Asm, Mode::Python]);
        assert_eq!(args.disable, vec![Mode::Rust]);
        assert!(Args::try_parse_from(["comments", "-m", "fortran"]).is_err());
    }

    #[test]
    fn test_single_file_prints_comments_and_counts() -> Result<()> {
        let temp_dir = TempDir::new()?;
        create_test_file(temp_dir.path(), "main.c", "int x; /* a */\n// b\n")?;
        let path = temp_dir.path().join("main.c");

        let output = run_args(&[path.to_str().unwrap_or_default()])?;
        assert!(output.contains(" a \r\n"), "output: {output:?}");
        assert!(output.contains(" b\r\n"), "output: {output:?}");
        assert!(output.contains("c++ style comments: 1"), "output: {output:?}");
        assert!(output.contains("c style comments: 1"), "output: {output:?}");
        assert!(!output.contains("==>"), "single file has no header: {output:?}");
        assert!(!output.contains("Overall Summary"), "output: {output:?}");
        Ok(())
    }

    #[test]
    fn test_line_numbers_and_quiet() -> Result<()> {
        let temp_dir = TempDir::new()?;
        create_test_file(temp_dir.path(), "lib.rs", "fn f() {}\n/// doc\n")?;
        let path = temp_dir.path().join("lib.rs");
        let path = path.to_str().unwrap_or_default();

        let output = run_args(&["-l", path])?;
        assert!(output.starts_with("  doc 2\r\n"), "output: {output:?}");
        assert!(output.contains("rust style comments: 1"), "output: {output:?}");
        assert!(
            !output.contains("c++ style comments"),
            "rust mode lists only the rust count: {output:?}"
        );

        let output = run_args(&["--quiet", path])?;
        assert_eq!(output, "rust style comments: 1\n");

        let output = run_args(&["--hide-comment-count", path])?;
        assert_eq!(output, "  doc\r\n");
        Ok(())
    }

    #[test]
    fn test_explicit_mode_overrides_extension() -> Result<()> {
        let temp_dir = TempDir::new()?;
        create_test_file(temp_dir.path(), "boot.rs", "mov ax, 1 ; set\n// not asm\n")?;
        let path = temp_dir.path().join("boot.rs");

        let output = run_args(&["-q", "-m", "asm", path.to_str().unwrap_or_default()])?;
        assert_eq!(output, "asm style comments: 1\n");

        let output = run_args(&["-q", "-e", "asm", "-d", "auto", path.to_str().unwrap_or_default()])?;
        assert_eq!(output, "asm style comments: 1\n");
        Ok(())
    }

    #[test]
    fn test_explicit_unknown_extension_has_no_counts() -> Result<()> {
        let temp_dir = TempDir::new()?;
        create_test_file(temp_dir.path(), "notes.xyz", "// hidden\n")?;
        let output = run_args(&[temp_dir.path().join("notes.xyz").to_str().unwrap_or_default()])?;
        assert!(output.is_empty(), "output: {output:?}");
        Ok(())
    }

    #[test]
    fn test_directory_headers_and_totals() -> Result<()> {
        let temp_dir = TempDir::new()?;
        create_test_file(temp_dir.path(), "a.c", "/* one */\n")?;
        create_test_file(temp_dir.path(), "b.py", "# two\n\"\"\"three\"\"\"\n")?;
        create_test_file(temp_dir.path(), "c.txt", "# ignored\n")?;

        let output = run_args(&["-q", temp_dir.path().to_str().unwrap_or_default()])?;
        assert!(output.contains("a.c <=="), "output: {output:?}");
        assert!(output.contains("b.py <=="), "output: {output:?}");
        assert!(!output.contains("c.txt"), "unknown files are skipped: {output:?}");
        assert!(output.contains("Overall Summary:"), "output: {output:?}");
        assert!(output.contains("Files scanned: 2"), "output: {output:?}");
        assert!(output.contains("python style comments: 2"), "output: {output:?}");
        assert!(output.contains("c style comments: 1"), "output: {output:?}");
        Ok(())
    }

    #[test]
    fn test_directory_with_one_file_still_gets_totals() -> Result<()> {
        let temp_dir = TempDir::new()?;
        create_test_file(temp_dir.path(), "only.c", "// one
")?;

        let output = run_args(&["-q", temp_dir.path().to_str().unwrap_or_default()])?;
        assert!(output.contains("only.c <=="), "output: {output:?}");
        assert!(output.contains("Overall Summary:"), "output: {output:?}");
        assert!(output.contains("Files scanned: 1"), "output: {output:?}");

        let output = run_args(&[
            "-q",
            "--hide-comment-count",
            temp_dir.path().to_str().unwrap_or_default(),
        ])?;
        assert!(!output.contains("Overall Summary"), "output: {output:?}");
        Ok(())
    }

    #[test]
    fn test_missing_path_is_an_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let missing = temp_dir.path().join("missing.c");
        let err = run_args(&[missing.to_str().unwrap_or_default()])
            .expect_err("missing path should fail");
        assert!(matches!(err, Error::PathNotFound { .. }), "got {err:?}");
        assert!(err.to_string().contains("Path does not exist"));
        Ok(())
    }

    #[test]
    fn test_overall_summary_reports_warnings() -> io::Result<()> {
        colored::control::set_override(false);
        let totals = RunTotals {
            files_scanned: 1,
            error_count: 2,
            ..RunTotals::default()
        };
        let mut out = Vec::new();
        write_overall_summary(&mut out, &totals, false)?;
        assert_eq!(String::from_utf8_lossy(&out), "\nWarning: 2\n");
        Ok(())
    }
}
