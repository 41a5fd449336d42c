//! Platform-specific executable naming and lookup.

use super::types::BinaryKind;

/// Operating environment the resolver runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    /// Any other unix-like system.
    OtherUnix,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::OtherUnix
        }
    }

    /// File names to look for, in order of preference.
    pub fn candidates(&self, kind: BinaryKind) -> Vec<String> {
        let name = kind.program_name();
        match self {
            Self::Windows => vec![format!("{}.exe", name)],
            Self::MacOs | Self::Linux | Self::OtherUnix => vec![name.to_string()],
        }
    }

    /// Command that prints the absolute path of an installed program.
    pub fn lookup_tool(&self) -> &'static str {
        match self {
            Self::Windows => "where",
            Self::MacOs | Self::Linux | Self::OtherUnix => "which",
        }
    }
}
