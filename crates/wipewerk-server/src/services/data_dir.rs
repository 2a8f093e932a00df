// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::PathBuf;

/// Environment variable that overrides the data directory outright.
pub const DATA_DIR_ENV: &str = "WIPEWERK_DATA_DIR";

/// Return the application data directory, creating it if needed.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = resolve(|name| std::env::var(name).ok());
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Pick the data directory from the environment lookup `var`.
fn resolve(var: impl Fn(&str) -> Option<String>) -> PathBuf {
    let set = |name: &str| var(name).filter(|v| !v.is_empty());

    if let Some(dir) = set(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    if let Some(xdg) = set("XDG_DATA_HOME") {
        return PathBuf::from(xdg).join("wipewerk");
    }
    if let Some(home) = set("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("wipewerk");
    }
    // Last resort
    PathBuf::from("/tmp").join("wipewerk")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn explicit_override_wins() {
        let dir = resolve(env(&[
            (DATA_DIR_ENV, "/srv/wipewerk"),
            ("XDG_DATA_HOME", "/xdg"),
            ("HOME", "/home/op"),
        ]));
        assert_eq!(dir, PathBuf::from("/srv/wipewerk"));
    }

    #[test]
    fn xdg_then_home_then_tmp() {
        assert_eq!(
            resolve(env(&[("XDG_DATA_HOME", "/xdg"), ("HOME", "/home/op")])),
            PathBuf::from("/xdg/wipewerk")
        );
        assert_eq!(
            resolve(env(&[("HOME", "/home/op")])),
            PathBuf::from("/home/op/.local/share/wipewerk")
        );
        assert_eq!(resolve(env(&[])), PathBuf::from("/tmp/wipewerk"));
    }

    #[test]
    fn empty_values_are_ignored() {
        let dir = resolve(env(&[(DATA_DIR_ENV, ""), ("HOME", "/home/op")]));
        assert_eq!(dir, PathBuf::from("/home/op/.local/share/wipewerk"));
    }
}
