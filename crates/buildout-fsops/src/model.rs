//! Build targets, descriptors and copy plans.
//!
//! # Design
//! - Targets keep the host's exact names; they appear verbatim in destination folders.
//! - Plans are sorted by destination and never mutated once built.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{FsOpsError, FsOpsResult};

/// Build target identifiers as reported by the host engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BuildTarget {
    /// 32-bit Windows player.
    StandaloneWindows,
    /// 64-bit Windows player.
    StandaloneWindows64,
    /// 64-bit Linux player.
    StandaloneLinux64,
    /// macOS application bundle.
    StandaloneOsx,
    /// iOS Xcode project.
    Ios,
    /// tvOS Xcode project.
    TvOs,
    /// WebGL site.
    WebGl,
    /// Android package(s).
    Android,
    /// Any other host target; never standardized.
    Other(String),
}

impl BuildTarget {
    /// Host name of the target, as used in destination folder names.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::StandaloneWindows => "StandaloneWindows",
            Self::StandaloneWindows64 => "StandaloneWindows64",
            Self::StandaloneLinux64 => "StandaloneLinux64",
            Self::StandaloneOsx => "StandaloneOSX",
            Self::Ios => "iOS",
            Self::TvOs => "tvOS",
            Self::WebGl => "WebGL",
            Self::Android => "Android",
            Self::Other(name) => name,
        }
    }

    /// Platform family that decides the copy strategy, `None` when unsupported.
    #[must_use]
    pub const fn family(&self) -> Option<PlatformFamily> {
        match self {
            Self::StandaloneWindows | Self::StandaloneWindows64 | Self::StandaloneLinux64 => {
                Some(PlatformFamily::Desktop)
            }
            Self::StandaloneOsx => Some(PlatformFamily::MacOs),
            Self::Ios | Self::TvOs => Some(PlatformFamily::Xcode),
            Self::WebGl => Some(PlatformFamily::WebGl),
            Self::Android => Some(PlatformFamily::Android),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildTarget {
    type Err = FsOpsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(FsOpsError::invalid("target", "empty", Some(value.to_string())));
        }
        let target = match trimmed.to_ascii_lowercase().as_str() {
            "standalonewindows" | "win32" => Self::StandaloneWindows,
            "standalonewindows64" | "win64" => Self::StandaloneWindows64,
            "standalonelinux64" | "linux64" => Self::StandaloneLinux64,
            "standaloneosx" | "macos" | "osx" => Self::StandaloneOsx,
            "ios" => Self::Ios,
            "tvos" => Self::TvOs,
            "webgl" => Self::WebGl,
            "android" => Self::Android,
            _ => Self::Other(trimmed.to_string()),
        };
        Ok(target)
    }
}

/// Families of targets that share a copy strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlatformFamily {
    /// Windows and Linux players: an executable beside its data folders.
    Desktop,
    /// macOS `.app` bundles.
    MacOs,
    /// iOS and tvOS Xcode projects.
    Xcode,
    /// WebGL sites.
    WebGl,
    /// Android packages, single or split per ABI.
    Android,
}

impl PlatformFamily {
    /// Stable lowercase label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::MacOs => "macos",
            Self::Xcode => "xcode",
            Self::WebGl => "webgl",
            Self::Android => "android",
        }
    }
}

/// Everything known about one completed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDescriptor {
    target: BuildTarget,
    source_output_path: PathBuf,
    build_name: String,
    full_version: String,
}

impl BuildDescriptor {
    /// Describe a completed build.
    #[must_use]
    pub fn new(
        target: BuildTarget,
        source_output_path: impl Into<PathBuf>,
        build_name: impl Into<String>,
        full_version: impl Into<String>,
    ) -> Self {
        Self {
            target,
            source_output_path: source_output_path.into(),
            build_name: build_name.into(),
            full_version: full_version.into(),
        }
    }

    /// Target the build was made for.
    #[must_use]
    pub const fn target(&self) -> &BuildTarget {
        &self.target
    }

    /// Output location reported by the host.
    #[must_use]
    pub fn source_output_path(&self) -> &Path {
        &self.source_output_path
    }

    /// Build name used for grouping and renaming.
    #[must_use]
    pub fn build_name(&self) -> &str {
        &self.build_name
    }

    /// Full version string, without the leading `v`.
    #[must_use]
    pub fn full_version(&self) -> &str {
        &self.full_version
    }
}

/// One file to copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyEntry {
    /// File to read.
    pub source: PathBuf,
    /// File to write.
    pub destination: PathBuf,
}

impl CopyEntry {
    /// Pair a source file with its destination.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Ordered set of copies for one build with one source per destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPlan {
    source_root: PathBuf,
    destination: PathBuf,
    entries: Vec<CopyEntry>,
    excluded: Vec<PathBuf>,
}

impl CopyPlan {
    /// Build a plan sorted by destination. Identical entries are merged.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::InvalidInput`] (`rename_collision`) when two
    /// different sources map to the same destination.
    pub fn new(
        source_root: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        mut entries: Vec<CopyEntry>,
        mut excluded: Vec<PathBuf>,
    ) -> FsOpsResult<Self> {
        entries.sort_by(|a, b| {
            a.destination
                .cmp(&b.destination)
                .then_with(|| a.source.cmp(&b.source))
        });
        entries.dedup();
        if let Some(pair) = entries
            .windows(2)
            .find(|pair| pair[0].destination == pair[1].destination)
        {
            return Err(FsOpsError::invalid(
                "source_output_path",
                "rename_collision",
                Some(format!(
                    "{} and {} both map to {}",
                    pair[0].source.display(),
                    pair[1].source.display(),
                    pair[0].destination.display()
                )),
            ));
        }
        excluded.sort();
        excluded.dedup();
        Ok(Self {
            source_root: source_root.into(),
            destination: destination.into(),
            entries,
            excluded,
        })
    }

    /// Folder the plan reads from.
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Folder the plan writes into.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Copies in destination order.
    #[must_use]
    pub fn entries(&self) -> &[CopyEntry] {
        &self.entries
    }

    /// Source folders skipped while walking.
    #[must_use]
    pub fn excluded(&self) -> &[PathBuf] {
        &self.excluded
    }

    /// Number of files the plan copies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the plan copies nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Totals for a finished copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyReport {
    /// Number of files written.
    pub files_copied: u64,
    /// Number of bytes written.
    pub bytes_copied: u64,
    /// Folder the files were written into.
    pub destination: PathBuf,
}
