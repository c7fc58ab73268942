//! Platform-specific filesystem limits
//!
//! A [`PlatformPolicy`] is resolved once at startup and handed to the path
//! builder and the writer dispatcher, so no other module branches on the
//! target OS.

/// Device names Windows refuses as file or directory names
pub const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Room kept after the directory part for the separator, a timestamp
/// duplicate suffix, the longest extension and the `.tmp` marker
const FILE_NAME_RESERVE: usize = 40;

/// Which PDF path a platform should try first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterPreference {
    /// External native tool (wkhtmltopdf)
    Native,
    /// The page renderer's own print-to-PDF
    Renderer,
}

/// Filesystem limits and preferences for one platform
#[derive(Debug, Clone)]
pub struct PlatformPolicy {
    /// Upper bound for a full destination path, in characters
    pub max_path_len: usize,
    /// Upper bound for a single directory segment
    pub max_dir_segment_len: usize,
    /// Upper bound for a file stem derived from a page title
    pub max_filename_len: usize,
    /// Names that must never be used verbatim
    pub reserved_names: Vec<String>,
    pub preferred_writer: WriterPreference,
}

impl PlatformPolicy {
    pub fn windows() -> Self {
        Self {
            max_path_len: 200,
            max_dir_segment_len: 100,
            max_filename_len: 50,
            reserved_names: reserved_names(),
            preferred_writer: WriterPreference::Renderer,
        }
    }

    /// Unix limits are generous, but reserved names are still avoided so a
    /// mirror can be copied to a Windows machine unchanged
    pub fn unix() -> Self {
        Self {
            max_path_len: 240,
            max_dir_segment_len: 100,
            max_filename_len: 50,
            reserved_names: reserved_names(),
            preferred_writer: WriterPreference::Native,
        }
    }

    /// Policy for the platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::windows()
        } else {
            Self::unix()
        }
    }

    /// Checks `name` against the reserved set, ignoring case and any trailing
    /// dots or spaces
    pub fn is_reserved(&self, name: &str) -> bool {
        let trimmed = name.trim_end_matches(['.', ' ']);
        self.reserved_names
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(trimmed))
    }

    /// Characters available to the directory part of a destination path
    pub fn directory_budget(&self) -> usize {
        self.max_path_len
            .saturating_sub(self.max_filename_len + FILE_NAME_RESERVE)
    }
}

impl Default for PlatformPolicy {
    fn default() -> Self {
        Self::current()
    }
}

fn reserved_names() -> Vec<String> {
    RESERVED_NAMES.iter().map(|name| name.to_string()).collect()
}
