//! Fake platform build outputs laid out the way the engine writes them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Folder the engine writes next to desktop players and expects to stay private.
pub const BACKUP_FOLDER_SUFFIX: &str = "_BackUpThisFolder_ButDontShipItWithYourGame";

/// Write `contents` to `root/relative`, creating parent folders.
///
/// # Errors
///
/// Returns an error when a folder or the file cannot be created.
pub fn write_file(root: &Path, relative: &str, contents: &[u8]) -> Result<PathBuf> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Lay out a Windows-style desktop player for `product` under `root`.
///
/// Returns the executable path, the value the host reports as build output.
///
/// # Errors
///
/// Returns an error when the fixture cannot be written.
pub fn desktop_build(root: &Path, product: &str) -> Result<PathBuf> {
    let exe = write_file(root, &format!("{product}.exe"), b"MZ player")?;
    write_file(root, "UnityPlayer.dll", b"runtime")?;
    write_file(root, "GameAssembly.dll", b"il2cpp")?;
    write_file(
        root,
        &format!("{product}_Data/globalgamemanagers"),
        b"managers",
    )?;
    write_file(
        root,
        &format!("{product}_Data/Managed/Assembly-CSharp.dll"),
        b"scripts",
    )?;
    write_file(
        root,
        &format!("{product}{BACKUP_FOLDER_SUFFIX}/symbols.pdb"),
        b"debug symbols",
    )?;
    Ok(exe)
}

/// Lay out a macOS application bundle `<product>.app` under `root`.
///
/// # Errors
///
/// Returns an error when the fixture cannot be written.
pub fn mac_bundle(root: &Path, product: &str) -> Result<PathBuf> {
    let bundle = root.join(format!("{product}.app"));
    write_file(&bundle, "Contents/Info.plist", b"<plist/>")?;
    write_file(&bundle, &format!("Contents/MacOS/{product}"), b"\xcf\xfa\xed\xfe")?;
    write_file(&bundle, "Contents/Resources/Data/data.unity3d", &[7_u8; 4096])?;
    Ok(bundle)
}

/// Lay out an exported Xcode project folder under `root`.
///
/// # Errors
///
/// Returns an error when the fixture cannot be written.
pub fn xcode_project(root: &Path) -> Result<PathBuf> {
    let project = root.join("XcodeExport");
    write_file(&project, "Unity-iPhone.xcodeproj/project.pbxproj", b"// pbx")?;
    write_file(&project, "Classes/main.mm", b"int main() {}")?;
    write_file(&project, "Data/globalgamemanagers", b"managers")?;
    Ok(project)
}

/// Lay out a WebGL build folder under `root`.
///
/// # Errors
///
/// Returns an error when the fixture cannot be written.
pub fn webgl_build(root: &Path) -> Result<PathBuf> {
    let folder = root.join("WebGLBuild");
    write_file(&folder, "index.html", b"<html></html>")?;
    write_file(&folder, "Build/WebGLBuild.loader.js", b"loader")?;
    write_file(&folder, "Build/WebGLBuild.wasm", &[0_u8, 97, 115, 109])?;
    write_file(&folder, "TemplateData/style.css", b"body {}")?;
    Ok(folder)
}

/// Lay out a single Android package `<product><extension>` under `root`.
///
/// # Errors
///
/// Returns an error when the fixture cannot be written.
pub fn android_package(root: &Path, product: &str, extension: &str) -> Result<PathBuf> {
    write_file(root, &format!("{product}{extension}"), b"PK package")
}

/// Lay out an extension-less Android output folder holding split-ABI packages.
///
/// # Errors
///
/// Returns an error when the fixture cannot be written.
pub fn android_split(root: &Path, product: &str) -> Result<PathBuf> {
    let folder = root.join(product);
    write_file(&folder, &format!("{product}.arm64-v8a.apk"), b"PK arm64")?;
    write_file(&folder, &format!("{product}.armeabi-v7a.apk"), b"PK armv7")?;
    Ok(folder)
}
