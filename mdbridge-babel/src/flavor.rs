//! Markdown output flavors
//!
//! A flavor only changes how a few constructs are spelled on export. Input is
//! always accepted in every spelling, so parsing never takes a flavor.
//!
//! | flavor       | callouts                 | wiki links        |
//! |--------------|--------------------------|-------------------|
//! | `commonmark` | `> **Info**: ...`        | `[text](target)`  |
//! | `gfm`        | `> [!NOTE]`              | `[text](target)`  |
//! | `obsidian`   | `> [!info] title`        | `[[target|alias]]`|
//! | `docusaurus` | `:::info title` … `:::`  | `[text](target)`  |
//!
//! Unknown flavor names resolve to `gfm`; resolution never fails.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A named output-formatting preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Flavor {
    CommonMark,
    #[default]
    Gfm,
    Obsidian,
    Docusaurus,
}

/// How callout blocks are spelled on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalloutFormat {
    /// `> [!NOTE]` alerts
    GithubAlerts,
    /// `> [!info] Title` callouts
    ObsidianCallouts,
    /// `:::info Title` … `:::` directives
    Directives,
    /// `> **Info**: text` plain blockquotes
    BlockquoteFallback,
}

/// Output choices derived from a [`Flavor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlavorConfig {
    pub callout_format: CalloutFormat,
    pub wiki_link_serialize: bool,
}

impl Flavor {
    pub const ALL: [Flavor; 4] = [
        Flavor::CommonMark,
        Flavor::Gfm,
        Flavor::Obsidian,
        Flavor::Docusaurus,
    ];

    /// Wire name of the flavor.
    pub fn as_str(self) -> &'static str {
        match self {
            Flavor::CommonMark => "commonmark",
            Flavor::Gfm => "gfm",
            Flavor::Obsidian => "obsidian",
            Flavor::Docusaurus => "docusaurus",
        }
    }

    /// Look up a flavor by wire name, falling back to [`Flavor::Gfm`].
    pub fn parse_lenient(name: &str) -> Flavor {
        let name = name.trim();
        Flavor::ALL
            .into_iter()
            .find(|flavor| flavor.as_str().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }

    pub fn config(self) -> FlavorConfig {
        FlavorConfig::for_flavor(self)
    }
}

impl FlavorConfig {
    pub const fn for_flavor(flavor: Flavor) -> FlavorConfig {
        match flavor {
            Flavor::CommonMark => FlavorConfig {
                callout_format: CalloutFormat::BlockquoteFallback,
                wiki_link_serialize: false,
            },
            Flavor::Gfm => FlavorConfig {
                callout_format: CalloutFormat::GithubAlerts,
                wiki_link_serialize: false,
            },
            Flavor::Obsidian => FlavorConfig {
                callout_format: CalloutFormat::ObsidianCallouts,
                wiki_link_serialize: true,
            },
            Flavor::Docusaurus => FlavorConfig {
                callout_format: CalloutFormat::Directives,
                wiki_link_serialize: false,
            },
        }
    }
}

impl Default for FlavorConfig {
    fn default() -> Self {
        FlavorConfig::for_flavor(Flavor::default())
    }
}

/// Resolve an optional flavor name to its output configuration.
///
/// `None` and unrecognized names both yield the `gfm` configuration.
pub fn resolve(flavor: Option<&str>) -> FlavorConfig {
    flavor
        .map(Flavor::parse_lenient)
        .unwrap_or_default()
        .config()
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flavor {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Flavor::parse_lenient(s))
    }
}

impl Serialize for Flavor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Flavor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Flavor::parse_lenient(&name))
    }
}
