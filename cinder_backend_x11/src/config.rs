// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Connection settings read from the environment.
//!
//! | Variable             | Effect                                        |
//! |----------------------|-----------------------------------------------|
//! | `CINDER_X11_DISPLAY` | Display name to open instead of `$DISPLAY`    |
//! | `CINDER_X11_SYNC`    | Any value but `0` or empty: synchronous Xlib  |

/// Environment variable overriding the display name.
pub const DISPLAY_ENV: &str = "CINDER_X11_DISPLAY";

/// Environment variable enabling synchronous request mode.
pub const SYNC_ENV: &str = "CINDER_X11_SYNC";

/// How to open the X display.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct X11Config {
    /// Display to open; `None` uses the Xlib default.
    pub display_name: Option<String>,
    /// Round-trip every request immediately. Slow, but X errors are then
    /// reported next to the call that caused them.
    pub synchronous: bool,
}

impl X11Config {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let display_name = lookup(DISPLAY_ENV).filter(|name| !name.is_empty());
        let synchronous = lookup(SYNC_ENV).is_some_and(|v| !v.is_empty() && v != "0");
        Self {
            display_name,
            synchronous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_owned())
        }
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(X11Config::from_lookup(lookup(&[])), X11Config::default());
    }

    #[test]
    fn display_override_is_read() {
        let config = X11Config::from_lookup(lookup(&[(DISPLAY_ENV, ":1")]));
        assert_eq!(config.display_name.as_deref(), Some(":1"));
        assert!(!config.synchronous);
    }

    #[test]
    fn sync_flag_ignores_zero_and_empty() {
        for (value, expected) in [("1", true), ("yes", true), ("0", false), ("", false)] {
            let config = X11Config::from_lookup(lookup(&[(SYNC_ENV, value)]));
            assert_eq!(config.synchronous, expected, "value {value:?}");
        }
    }

    #[test]
    fn empty_display_name_falls_back_to_default() {
        let config = X11Config::from_lookup(lookup(&[(DISPLAY_ENV, "")]));
        assert_eq!(config.display_name, None);
    }
}
