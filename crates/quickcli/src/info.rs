//! Program metadata shown by `--help` and `--version`.
//!
//! Every field has a default, so an application only sets what it cares
//! about. Use [`app_info!`](crate::app_info) to fill name, version and
//! description from the calling crate's Cargo metadata.

use chrono::Datelike;
use clap::{Arg, ArgAction, Command};
use std::path::Path;

const DEFAULT_NAME: &str = "prog";
const DEFAULT_VERSION: &str = "0.0.0";
const UNKNOWN: &str = "unknown";
const DEFAULT_EPILOG: &str = "Thats All Folks";

/// License text used when none is configured.
pub const DEFAULT_LICENSE: &str = "
  Licensed under the Apache License 2.0
  http://www.apache.org/licenses/LICENSE-2.0

  Distributed on an \"AS IS\" basis without warranties
  or conditions of any kind, either express or implied.
";

/// Program metadata.
///
/// ```rust
/// use quickcli::AppInfo;
///
/// let info = AppInfo::new()
///     .name("myapp")
///     .version("0.0.2")
///     .build_date("2019-08-13")
///     .creator("M3");
///
/// assert_eq!(info.version_message_text(), "v0.0.2 (2019-08-13)");
/// assert_eq!(info.organization_name(), "M3");
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppInfo {
    name: Option<String>,
    version: Option<String>,
    build_date: Option<String>,
    create_date: Option<String>,
    version_message: Option<String>,
    short_description: Option<String>,
    creator: Option<String>,
    organization: Option<String>,
    copyright_year: Option<i32>,
    license: Option<String>,
    description: Option<String>,
    epilog: Option<String>,
}

fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    (!value.trim().is_empty()).then_some(value)
}

impl AppInfo {
    /// Creates metadata with every field defaulted.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = non_empty(name);
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = non_empty(version);
        self
    }

    pub fn build_date(mut self, date: impl Into<String>) -> Self {
        self.build_date = non_empty(date);
        self
    }

    pub fn create_date(mut self, date: impl Into<String>) -> Self {
        self.create_date = non_empty(date);
        self
    }

    /// Overrides the text printed after the program name by `--version`.
    pub fn version_message(mut self, message: impl Into<String>) -> Self {
        self.version_message = non_empty(message);
        self
    }

    pub fn short_description(mut self, text: impl Into<String>) -> Self {
        self.short_description = non_empty(text);
        self
    }

    pub fn creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = non_empty(creator);
        self
    }

    pub fn organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = non_empty(organization);
        self
    }

    pub fn copyright_year(mut self, year: i32) -> Self {
        self.copyright_year = Some(year);
        self
    }

    pub fn license(mut self, license: impl Into<String>) -> Self {
        self.license = non_empty(license);
        self
    }

    /// Overrides the composed long description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = non_empty(description);
        self
    }

    pub fn epilog(mut self, epilog: impl Into<String>) -> Self {
        self.epilog = non_empty(epilog);
        self
    }

    // =========================================================================
    // Resolved values
    // =========================================================================

    /// Program name, defaulting to the file stem of `argv[0]`.
    pub fn program_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        std::env::args_os()
            .next()
            .as_deref()
            .map(Path::new)
            .and_then(Path::file_stem)
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| DEFAULT_NAME.to_string())
    }

    pub fn program_version(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }

    pub fn program_build_date(&self) -> &str {
        self.build_date.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn program_create_date(&self) -> &str {
        self.create_date.as_deref().unwrap_or(UNKNOWN)
    }

    /// Version text, defaulting to `v{version} ({build date})`.
    pub fn version_message_text(&self) -> String {
        match &self.version_message {
            Some(message) => message.clone(),
            None => format!(
                "v{} ({})",
                self.program_version(),
                self.program_build_date()
            ),
        }
    }

    /// One-line description, defaulting to the program name.
    pub fn program_short_description(&self) -> String {
        self.short_description
            .clone()
            .unwrap_or_else(|| self.program_name())
    }

    pub fn program_creator(&self) -> &str {
        self.creator.as_deref().unwrap_or(UNKNOWN)
    }

    /// Organization, defaulting to the creator.
    pub fn organization_name(&self) -> &str {
        self.organization
            .as_deref()
            .unwrap_or_else(|| self.program_creator())
    }

    /// Copyright year, defaulting to the current year.
    pub fn program_copyright_year(&self) -> i32 {
        self.copyright_year
            .unwrap_or_else(|| chrono::Local::now().year())
    }

    pub fn program_license(&self) -> &str {
        self.license.as_deref().unwrap_or(DEFAULT_LICENSE)
    }

    /// Long description, defaulting to a banner built from the other fields.
    pub fn program_description(&self) -> String {
        if let Some(description) = &self.description {
            return description.clone();
        }
        format!(
            "{}\n\n  Created by {} on {}.\n  Copyright {} {}. All rights reserved.\n{}\nUSAGE",
            self.program_short_description(),
            self.program_creator(),
            self.program_create_date(),
            self.program_copyright_year(),
            self.organization_name(),
            self.program_license(),
        )
    }

    pub fn program_epilog(&self) -> &str {
        self.epilog.as_deref().unwrap_or(DEFAULT_EPILOG)
    }

    /// Builds the root clap command carrying this metadata.
    ///
    /// `-V`/`--version` prints `{name} {version message}`.
    pub fn command(&self) -> Command {
        Command::new(self.program_name())
            .version(self.version_message_text())
            .about(self.program_short_description())
            .long_about(self.program_description())
            .after_help(self.program_epilog().to_string())
            .disable_version_flag(true)
            .arg(
                Arg::new("version")
                    .short('V')
                    .long("version")
                    .action(ArgAction::Version)
                    .help("Show program's version number and exit"),
            )
    }
}

/// Builds an [`AppInfo`] from the calling crate's Cargo metadata.
///
/// ```rust
/// let info = quickcli::app_info!().creator("M3");
/// assert_eq!(info.program_version(), env!("CARGO_PKG_VERSION"));
/// ```
#[macro_export]
macro_rules! app_info {
    () => {
        $crate::AppInfo::new()
            .name(env!("CARGO_PKG_NAME"))
            .version(env!("CARGO_PKG_VERSION"))
            .short_description(env!("CARGO_PKG_DESCRIPTION"))
            .creator(env!("CARGO_PKG_AUTHORS"))
    };
}
