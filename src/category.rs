//! Comment categories and the per-file mode resolution.
//!
//! A scan runs with a concrete [`CategorySet`]. The command line speaks in
//! [`Mode`]s, which may include the `auto` sentinel; [`ModeSelection`] turns
//! those into a set once per file, consulting [`classify_extension`] when needed.

use bitflags::bitflags;
use clap::ValueEnum;

bitflags! {
    /// Comment grammars enabled for a scan.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CategorySet: u8 {
        /// `/* ... */`
        const C = 1 << 0;
        /// `// ...` with backslash continuation.
        const CPP_LINE = 1 << 1;
        /// `; ...`
        const ASM = 1 << 2;
        /// `# ...` and triple-quoted docstrings.
        const PYTHON = 1 << 3;
        /// `//`, `///`, `//!` and nested `/* ... */`.
        const RUST = 1 << 4;
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        CategorySet::empty()
    }
}

/// Summary order and labels for each single category.
pub const CATEGORY_LABELS: [(CategorySet, &str); 5] = [
    (CategorySet::CPP_LINE, "c++ style comments"),
    (CategorySet::C, "c style comments"),
    (CategorySet::ASM, "asm style comments"),
    (CategorySet::PYTHON, "python style comments"),
    (CategorySet::RUST, "rust style comments"),
];

/// Mode names accepted by `--mode`, `--enable` and `--disable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    None,
    C,
    #[value(aliases = ["cxx", "cpp"])]
    Cc,
    Asm,
    #[value(alias = "py")]
    Python,
    #[value(alias = "rs")]
    Rust,
    /// C and C++ comments.
    Default,
    All,
    /// Derive the categories from each file's extension.
    Auto,
}

impl Mode {
    /// The fixed set for this mode, or `None` for [`Mode::Auto`].
    pub fn categories(self) -> Option<CategorySet> {
        let set = match self {
            Mode::None => CategorySet::empty(),
            Mode::C => CategorySet::C,
            Mode::Cc => CategorySet::CPP_LINE,
            Mode::Asm => CategorySet::ASM,
            Mode::Python => CategorySet::PYTHON,
            Mode::Rust => CategorySet::RUST,
            Mode::Default => CategorySet::C | CategorySet::CPP_LINE,
            Mode::All => CategorySet::all(),
            Mode::Auto => return None,
        };
        Some(set)
    }
}

/// Base mode plus the `--enable`/`--disable` adjustments, resolved per file.
#[derive(Debug, Clone)]
pub struct ModeSelection {
    base: Mode,
    enabled: Vec<Mode>,
    disabled: Vec<Mode>,
}

impl ModeSelection {
    pub fn new(base: Mode, enabled: Vec<Mode>, disabled: Vec<Mode>) -> Self {
        ModeSelection {
            base,
            enabled,
            disabled,
        }
    }

    /// Enables are applied before disables, so a disable always wins.
    pub fn resolve(&self, file_name: &str) -> CategorySet {
        let expand = |mode: Mode| {
            mode.categories()
                .unwrap_or_else(|| classify_extension(file_name))
        };
        let mut set = expand(self.base);
        for &mode in &self.enabled {
            set.insert(expand(mode));
        }
        for &mode in &self.disabled {
            set.remove(expand(mode));
        }
        set
    }
}

/// Default categories for a file name, chosen by its extension (case-insensitive).
///
/// A name without any `.` is assumed to be C/C++; an unknown extension yields
/// the empty set.
pub fn classify_extension(file_name: &str) -> CategorySet {
    let Some((_stem, ext)) = file_name.rsplit_once('.') else {
        return CategorySet::C | CategorySet::CPP_LINE;
    };
    match ext.to_lowercase().as_str() {
        "c" | "cpp" | "h" | "hpp" | "cc" | "hh" | "java" | "cs" | "cu" | "cuh" | "hxx"
        | "cxx" | "c++" | "h++" | "inl" | "ipp" | "tpp" => CategorySet::C | CategorySet::CPP_LINE,
        // Other languages sharing the C comment syntax
        "go" | "js" | "jsx" | "ts" | "tsx" | "swift" | "kt" | "kts" | "scala" | "sbt"
        | "proto" | "m" | "mm" => CategorySet::C | CategorySet::CPP_LINE,
        "asm" | "s" => CategorySet::ASM,
        "py" | "pyw" | "pyi" => CategorySet::PYTHON,
        "rs" => CategorySet::RUST,
        _ => CategorySet::empty(),
    }
}
