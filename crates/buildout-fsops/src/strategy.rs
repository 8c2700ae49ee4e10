//! Per-platform copy plans and the registry that dispatches to them.
//!
//! # Design
//! - Strategies only read the source tree; all writes happen in the copy executor.
//! - One strategy per [`PlatformFamily`]; callers may replace any of them.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};
use crate::model::{BuildDescriptor, CopyEntry, CopyPlan, PlatformFamily};

/// Folder the engine writes beside desktop players that must never ship.
pub const BACKUP_FOLDER_SUFFIX: &str = "_BackUpThisFolder_ButDontShipItWithYourGame";
/// File name suffixes of the split-ABI Android packages.
pub const ANDROID_SPLIT_SUFFIXES: [&str; 2] = [".arm64-v8a.apk", ".armeabi-v7a.apk"];
/// Folder under the destination that receives WebGL output.
pub const WEBGL_FOLDER: &str = "WebGL";

/// Maps one platform family's build output onto destination paths.
pub trait CopyStrategy: Send + Sync {
    /// Family this strategy handles.
    fn family(&self) -> PlatformFamily;

    /// List the copies needed to standardize `descriptor` into `base`.
    ///
    /// # Errors
    ///
    /// Returns an error when the source layout is missing or cannot be read.
    fn plan(&self, descriptor: &BuildDescriptor, base: &Path) -> FsOpsResult<CopyPlan>;
}

/// Windows and Linux players: copy the executable's folder, renaming the player files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopStrategy;

impl CopyStrategy for DesktopStrategy {
    fn family(&self) -> PlatformFamily {
        PlatformFamily::Desktop
    }

    fn plan(&self, descriptor: &BuildDescriptor, base: &Path) -> FsOpsResult<CopyPlan> {
        let executable = descriptor.source_output_path();
        if !executable.is_file() {
            return Err(FsOpsError::SourceNotFound {
                path: executable.to_path_buf(),
            });
        }
        let folder = executable
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let stem = executable
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| {
                FsOpsError::invalid(
                    "source_output_path",
                    "invalid_executable_name",
                    Some(executable.to_string_lossy().into_owned()),
                )
            })?;

        let backup = folder.join(format!("{stem}{BACKUP_FOLDER_SUFFIX}"));
        let excluded = vec![backup];
        let entries = walk_files(folder, &excluded)?
            .into_iter()
            .map(|relative| {
                let target = base.join(rename_player_path(&relative, stem, descriptor.build_name()));
                CopyEntry::new(folder.join(&relative), target)
            })
            .collect();

        CopyPlan::new(folder, base, entries, excluded)
    }
}

/// Replace the executable stem at the start of `relative` with `build_name`.
///
/// Only a first component equal to the stem, or the stem followed by `.` or
/// `_`, is renamed; `GameAssembly.dll` is left alone for a player named `Game`.
#[must_use]
pub fn rename_player_path(relative: &Path, stem: &str, build_name: &str) -> PathBuf {
    let mut components = relative.components();
    let Some(first) = components.next() else {
        return relative.to_path_buf();
    };
    let renamed = first
        .as_os_str()
        .to_str()
        .and_then(|name| name.strip_prefix(stem))
        .filter(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('_'))
        .map(|rest| format!("{build_name}{rest}"));
    match renamed {
        Some(name) => Path::new(&name).join(components.as_path()),
        None => relative.to_path_buf(),
    }
}

/// macOS players: copy the `.app` bundle to `<build_name>.app`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacOsStrategy;

impl CopyStrategy for MacOsStrategy {
    fn family(&self) -> PlatformFamily {
        PlatformFamily::MacOs
    }

    fn plan(&self, descriptor: &BuildDescriptor, base: &Path) -> FsOpsResult<CopyPlan> {
        let bundle = base.join(format!("{}.app", descriptor.build_name()));
        tree_plan(descriptor.source_output_path(), &bundle, base)
    }
}

/// iOS and tvOS: copy the exported Xcode project as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct XcodeStrategy;

impl CopyStrategy for XcodeStrategy {
    fn family(&self) -> PlatformFamily {
        PlatformFamily::Xcode
    }

    fn plan(&self, descriptor: &BuildDescriptor, base: &Path) -> FsOpsResult<CopyPlan> {
        tree_plan(descriptor.source_output_path(), base, base)
    }
}

/// WebGL: copy the site folder under `WebGL/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebGlStrategy;

impl CopyStrategy for WebGlStrategy {
    fn family(&self) -> PlatformFamily {
        PlatformFamily::WebGl
    }

    fn plan(&self, descriptor: &BuildDescriptor, base: &Path) -> FsOpsResult<CopyPlan> {
        tree_plan(descriptor.source_output_path(), &base.join(WEBGL_FOLDER), base)
    }
}

/// Android: copy a single package, or both split-ABI packages from an output folder.
#[derive(Debug, Clone, Copy, Default)]
pub struct AndroidStrategy;

impl CopyStrategy for AndroidStrategy {
    fn family(&self) -> PlatformFamily {
        PlatformFamily::Android
    }

    fn plan(&self, descriptor: &BuildDescriptor, base: &Path) -> FsOpsResult<CopyPlan> {
        let source = descriptor.source_output_path();
        let name = descriptor.build_name();

        // An output path with an extension names a package; without one it names the split folder.
        if let Some(ext) = source.extension() {
            if !source.is_file() {
                return Err(FsOpsError::SourceNotFound {
                    path: source.to_path_buf(),
                });
            }
            let mut file_name = OsString::from(name);
            file_name.push(".");
            file_name.push(ext);
            let entries = vec![CopyEntry::new(source, base.join(file_name))];
            return CopyPlan::new(source, base, entries, Vec::new());
        }

        if !source.is_dir() {
            return Err(FsOpsError::SourceNotFound {
                path: source.to_path_buf(),
            });
        }

        let product = source
            .file_name()
            .and_then(|product| product.to_str())
            .unwrap_or_default();
        let mut entries = Vec::with_capacity(ANDROID_SPLIT_SUFFIXES.len());
        for suffix in ANDROID_SPLIT_SUFFIXES {
            let package = find_split_package(source, product, suffix)?;
            entries.push(CopyEntry::new(package, base.join(format!("{name}{suffix}"))));
        }
        CopyPlan::new(source, base, entries, Vec::new())
    }
}

fn find_split_package(folder: &Path, product: &str, suffix: &str) -> FsOpsResult<PathBuf> {
    let listing = fs::read_dir(folder)
        .map_err(|source| FsOpsError::io("android.read_dir", folder, source))?;
    let mut candidates = Vec::new();
    for entry in listing {
        let entry = entry.map_err(|source| FsOpsError::io("android.read_entry", folder, source))?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(suffix));
        if matches && path.is_file() {
            candidates.push(path);
        }
    }
    candidates.sort();

    let expected = folder.join(format!("{product}{suffix}"));
    if candidates.contains(&expected) {
        return Ok(expected);
    }
    match candidates.len() {
        0 => Err(FsOpsError::SourceNotFound { path: expected }),
        1 => Ok(candidates.swap_remove(0)),
        _ => Err(FsOpsError::invalid(
            "source_output_path",
            "ambiguous_split_package",
            Some(folder.join(format!("*{suffix}")).to_string_lossy().into_owned()),
        )),
    }
}

fn tree_plan(source: &Path, target: &Path, base: &Path) -> FsOpsResult<CopyPlan> {
    if !source.is_dir() {
        return Err(FsOpsError::SourceNotFound {
            path: source.to_path_buf(),
        });
    }
    let entries = walk_files(source, &[])?
        .into_iter()
        .map(|relative| CopyEntry::new(source.join(&relative), target.join(relative)))
        .collect();
    CopyPlan::new(source, base, entries, Vec::new())
}

/// Relative paths of every file below `root`, skipping `excluded` folders.
fn walk_files(root: &Path, excluded: &[PathBuf]) -> FsOpsResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let skip = excluded.iter().any(|folder| entry.path() == folder);
            if skip {
                debug!(path = %entry.path().display(), "skipping excluded folder");
            }
            !skip
        });
    for entry in walker {
        let entry = entry.map_err(|source| FsOpsError::walkdir("strategy.walk", root, source))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).map_err(|_| {
            FsOpsError::invalid(
                "source_output_path",
                "strip_prefix",
                Some(entry.path().to_string_lossy().into_owned()),
            )
        })?;
        files.push(relative.to_path_buf());
    }
    Ok(files)
}

/// Copy strategies keyed by platform family.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<PlatformFamily, Arc<dyn CopyStrategy>>,
}

impl StrategyRegistry {
    /// Registry with no strategies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a strategy for every supported family.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DesktopStrategy));
        registry.register(Arc::new(MacOsStrategy));
        registry.register(Arc::new(XcodeStrategy));
        registry.register(Arc::new(WebGlStrategy));
        registry.register(Arc::new(AndroidStrategy));
        registry
    }

    /// Install `strategy` for its family, returning the one it replaced.
    pub fn register(&mut self, strategy: Arc<dyn CopyStrategy>) -> Option<Arc<dyn CopyStrategy>> {
        self.strategies.insert(strategy.family(), strategy)
    }

    /// Strategy for `family`, if one is registered.
    #[must_use]
    pub fn get(&self, family: PlatformFamily) -> Option<&dyn CopyStrategy> {
        self.strategies.get(&family).map(|strategy| &**strategy)
    }

    /// Families with a registered strategy.
    pub fn families(&self) -> impl Iterator<Item = PlatformFamily> + '_ {
        self.strategies.keys().copied()
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.strategies.keys().map(|family| family.as_str()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_files_are_renamed_by_prefix() {
        let rename = |path: &str| rename_player_path(Path::new(path), "Game", "Space Courier");
        assert_eq!(rename("Game.exe"), PathBuf::from("Space Courier.exe"));
        assert_eq!(
            rename("Game_Data/Managed/Assembly-CSharp.dll"),
            PathBuf::from("Space Courier_Data/Managed/Assembly-CSharp.dll")
        );
        assert_eq!(rename("Game"), PathBuf::from("Space Courier"));
        assert_eq!(rename("GameAssembly.dll"), PathBuf::from("GameAssembly.dll"));
        assert_eq!(rename("UnityPlayer.dll"), PathBuf::from("UnityPlayer.dll"));
        assert_eq!(rename("Data/Game.exe"), PathBuf::from("Data/Game.exe"));
    }

    #[test]
    fn default_registry_covers_every_family() {
        let registry = StrategyRegistry::with_defaults();
        for family in [
            PlatformFamily::Desktop,
            PlatformFamily::MacOs,
            PlatformFamily::Xcode,
            PlatformFamily::WebGl,
            PlatformFamily::Android,
        ] {
            let strategy = registry.get(family).expect("strategy registered");
            assert_eq!(strategy.family(), family);
        }
        assert_eq!(registry.families().count(), 5);
        assert!(StrategyRegistry::new().get(PlatformFamily::Desktop).is_none());
    }

    #[test]
    fn register_replaces_existing_strategy() {
        let mut registry = StrategyRegistry::with_defaults();
        let previous = registry.register(Arc::new(XcodeStrategy));
        assert!(previous.is_some());
        assert_eq!(format!("{registry:?}"), r#"["desktop", "macos", "xcode", "webgl", "android"]"#);
    }
}
