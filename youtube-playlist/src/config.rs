//! Loading of the ini-style settings file.
//!
//! The settings file has an `[accounts]` section carrying the API key and a `[playlist]` section
//! describing the playlist to create:
//!
//! ```ini
//! [accounts]
//! api_key = AIza...
//!
//! [playlist]
//! title = My List
//! description = Songs from results.txt
//! # optional, defaults to public
//! privacy = unlisted
//! ```

use crate::youtube_api::PrivacyStatus;
use eyre::Context;
use ini::{Ini, ParseOption};
use std::path::Path;

/// File name of the settings file inside the configuration directory.
pub const SETTINGS_FILE: &str = "settings.cfg";

const ACCOUNTS_SECTION: &str = "accounts";
const PLAYLIST_SECTION: &str = "playlist";

/// Values read from the settings file.
///
/// Loaded once at startup and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Developer key sent along with every API request.
    pub api_key: String,
    pub playlist_title: String,
    pub playlist_description: String,
    /// Visibility of the created playlist.
    pub privacy: PrivacyStatus,
}

impl Config {
    /// Reads the settings file at `path`.
    ///
    /// Fails immediately if the file does not exist, so that nothing else (in particular, no
    /// network call) happens with a missing configuration.
    pub fn load(path: &Path) -> eyre::Result<Self> {
        if !path.exists() {
            eyre::bail!("no config file found at {}", path.display());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read settings file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parse settings file {}", path.display()))
    }

    /// Parses the contents of a settings file.
    pub fn parse(contents: &str) -> eyre::Result<Self> {
        // Values are taken literally, without ini quote or escape processing.
        let ini = Ini::load_from_str_opt(
            &literal_line_ends(contents),
            ParseOption {
                enabled_quote: false,
                enabled_escape: false,
                ..Default::default()
            },
        )
        .context("parse ini")?;

        let privacy = match ini.get_from(Some(PLAYLIST_SECTION), "privacy") {
            Some(privacy) => privacy
                .parse()
                .with_context(|| format!("parse {PLAYLIST_SECTION}.privacy"))?,
            None => PrivacyStatus::Public,
        };

        Ok(Self {
            api_key: required(&ini, ACCOUNTS_SECTION, "api_key")?,
            playlist_title: required(&ini, PLAYLIST_SECTION, "title")?,
            playlist_description: required(&ini, PLAYLIST_SECTION, "description")?,
            privacy,
        })
    }
}

/// Keeps a trailing `\` as part of its value.
///
/// rust-ini always joins a line ending in `\` with the next one, even with escapes disabled. A
/// `\r` between the two stops that, and is trimmed off the value like any other line ending.
fn literal_line_ends(contents: &str) -> String {
    let mut out = String::with_capacity(contents.len());
    for line in contents.lines() {
        out.push_str(line);
        if line.ends_with('\\') {
            out.push('\r');
        }
        out.push('\n');
    }
    out
}

fn required(ini: &Ini, section: &str, key: &str) -> eyre::Result<String> {
    let Some(properties) = ini.section(Some(section)) else {
        eyre::bail!("settings file has no [{section}] section");
    };
    let Some(value) = properties.get(key) else {
        eyre::bail!("settings file has no `{key}` in the [{section}] section");
    };
    Ok(value.to_string())
}
