//! Manifest path resolution for converge
//!
//! # Environment Variables
//!
//! - `CONVERGE_MANIFEST` - Explicit manifest file
//! - `CONVERGE_CONFIG_DIR` - Override config directory (e.g., `~/dotfiles/converge`)
//!
//! # Path Resolution Priority
//!
//! For the manifest:
//! 1. `--manifest` flag
//! 2. `CONVERGE_MANIFEST` environment variable
//! 3. `$CONVERGE_CONFIG_DIR/services.toml`
//! 4. `$XDG_CONFIG_HOME/converge/services.toml`, else `~/.config/converge/services.toml`
//! 5. `/etc/converge/services.toml`
//!
//! Explicit paths (1, 2) are used as given. Among 3-5 the first existing
//! file wins.

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

/// Environment variable naming the manifest file
pub const ENV_MANIFEST: &str = "CONVERGE_MANIFEST";

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "CONVERGE_CONFIG_DIR";

/// Manifest file name inside a config directory
pub const MANIFEST_FILE: &str = "services.toml";

/// System-wide config directory
pub const SYSTEM_CONFIG_DIR: &str = "/etc/converge";

/// Resolve the manifest path from the CLI flag and the process environment
pub fn manifest_path(flag: Option<&Path>) -> Result<PathBuf> {
    resolve_manifest(flag, &env_lookup, dirs::home_dir(), Path::new(SYSTEM_CONFIG_DIR))
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn user_config_dir(env: &dyn Fn(&str) -> Option<String>, home: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(dir) = env(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!("Using config dir from {}: {}", ENV_CONFIG_DIR, path.display());
        return Some(path);
    }

    if let Some(xdg_config) = env("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("converge");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Some(path);
    }

    home.map(|h| h.join(".config").join("converge"))
}

/// Resolve the manifest path against an explicit environment
fn resolve_manifest(
    flag: Option<&Path>,
    env: &dyn Fn(&str) -> Option<String>,
    home: Option<PathBuf>,
    system_dir: &Path,
) -> Result<PathBuf> {
    if let Some(path) = flag {
        let path = expand(&path.to_string_lossy());
        log::debug!("Using manifest from --manifest: {}", path.display());
        return Ok(path);
    }

    if let Some(path) = env(ENV_MANIFEST) {
        let path = expand(&path);
        log::debug!("Using manifest from {}: {}", ENV_MANIFEST, path.display());
        return Ok(path);
    }

    let mut candidates = Vec::new();
    if let Some(dir) = user_config_dir(env, home) {
        candidates.push(dir.join(MANIFEST_FILE));
    }
    candidates.push(system_dir.join(MANIFEST_FILE));

    if let Some(found) = candidates.iter().find(|p| p.is_file()) {
        log::debug!("Using manifest: {}", found.display());
        return Ok(found.clone());
    }

    let searched = candidates
        .iter()
        .map(|p| format!("  {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");
    bail!("No manifest found. Searched:\n{searched}\nUse --manifest or set {ENV_MANIFEST}.")
}

/// Expand ~ and environment variables in a path string.
///
/// # Examples
///
/// ```ignore
/// let home_path = paths::expand("~/dotfiles/services.toml");
/// let var_path = paths::expand("$HOME/services.toml");
/// ```
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn test_flag_wins_even_if_missing() {
        let env = env_of(&[(ENV_MANIFEST, "/from/env.toml")]);
        let path = resolve_manifest(
            Some(Path::new("/from/flag.toml")),
            &env,
            None,
            Path::new("/nonexistent"),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/from/flag.toml"));
    }

    #[test]
    fn test_env_manifest_over_config_dir() {
        let env = env_of(&[(ENV_MANIFEST, "/from/env.toml"), (ENV_CONFIG_DIR, "/cfg")]);
        let path = resolve_manifest(None, &env, None, Path::new("/nonexistent")).unwrap();
        assert_eq!(path, PathBuf::from("/from/env.toml"));
    }

    #[test]
    fn test_config_dir_override() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join(MANIFEST_FILE);
        touch(&manifest);

        let env = env_of(&[(ENV_CONFIG_DIR, dir.path().to_str().unwrap())]);
        let path = resolve_manifest(None, &env, None, Path::new("/nonexistent")).unwrap();
        assert_eq!(path, manifest);
    }

    #[test]
    fn test_xdg_then_home() {
        let dir = TempDir::new().unwrap();
        let xdg = dir.path().join("xdg");
        let home = dir.path().join("home");

        touch(&home.join(".config/converge").join(MANIFEST_FILE));
        let path = resolve_manifest(
            None,
            &env_of(&[]),
            Some(home.clone()),
            Path::new("/nonexistent"),
        )
        .unwrap();
        assert_eq!(path, home.join(".config/converge").join(MANIFEST_FILE));

        touch(&xdg.join("converge").join(MANIFEST_FILE));
        let env = env_of(&[("XDG_CONFIG_HOME", xdg.to_str().unwrap())]);
        let path = resolve_manifest(None, &env, Some(home), Path::new("/nonexistent")).unwrap();
        assert_eq!(path, xdg.join("converge").join(MANIFEST_FILE));
    }

    #[test]
    fn test_falls_back_to_system_dir() {
        let dir = TempDir::new().unwrap();
        let system = dir.path().join("etc");
        touch(&system.join(MANIFEST_FILE));

        let path = resolve_manifest(
            None,
            &env_of(&[]),
            Some(dir.path().join("home")),
            &system,
        )
        .unwrap();
        assert_eq!(path, system.join(MANIFEST_FILE));
    }

    #[test]
    fn test_nothing_found_lists_candidates() {
        let dir = TempDir::new().unwrap();
        let err = resolve_manifest(
            None,
            &env_of(&[]),
            Some(dir.path().to_path_buf()),
            &dir.path().join("etc"),
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No manifest found"));
        assert!(msg.contains(ENV_MANIFEST));
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/test/path");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("test").join("path"));
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$NONEXISTENT_VAR_12345/file");
        assert_eq!(result, PathBuf::from("/path/$NONEXISTENT_VAR_12345/file"));
    }
}
