//! Dashboard commands and their text form.
//!
//! A command line is a name followed by arguments, e.g.
//! `set-field factory_name "Factory A"`. Double quotes group words.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use inspectdesk_core::{EntityKind, PageSize, RecordId};

use crate::SessionError;

/// Tabs on the inspection page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Initial,
    Followup,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Followup => "followup",
        }
    }

    /// The collection listed under this tab.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Initial => EntityKind::Inspection,
            Self::Followup => EntityKind::Followup,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "initial" | "inspections" => Ok(Self::Initial),
            "followup" | "follow-up" | "followups" => Ok(Self::Followup),
            other => Err(format!("unknown tab: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    OpenCreateForm(EntityKind),
    OpenEditForm(EntityKind, RecordId),
    SetField { name: String, value: String },
    TogglePenalty(bool),
    ToggleFine(bool),
    ToggleFollowupResult { implemented: bool },
    SelectFactory(RecordId),
    /// `None` clears the selection.
    SelectOriginalInspection(Option<RecordId>),
    SubmitForm,
    CancelForm,
    ConfirmDelete(EntityKind, RecordId),
    View(EntityKind, RecordId),
    Search { kind: EntityKind, query: String },
    List(EntityKind),
    /// `None` exports every collection.
    Export { kind: Option<EntityKind>, dir: PathBuf },
    DownloadTemplate(PathBuf),
    ImportFactories(PathBuf),
    SwitchTab(Tab),
    SetPageSize(PageSize),
}

impl Command {
    pub const NAMES: [&'static str; 19] = [
        "open-create-form",
        "open-edit-form",
        "set-field",
        "toggle-penalty",
        "toggle-fine",
        "toggle-followup-result",
        "select-factory",
        "select-original-inspection",
        "submit-form",
        "cancel-form",
        "confirm-delete",
        "view",
        "search",
        "list",
        "export",
        "download-template",
        "import-factories",
        "switch-tab",
        "page-size",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenCreateForm(_) => "open-create-form",
            Self::OpenEditForm(..) => "open-edit-form",
            Self::SetField { .. } => "set-field",
            Self::TogglePenalty(_) => "toggle-penalty",
            Self::ToggleFine(_) => "toggle-fine",
            Self::ToggleFollowupResult { .. } => "toggle-followup-result",
            Self::SelectFactory(_) => "select-factory",
            Self::SelectOriginalInspection(_) => "select-original-inspection",
            Self::SubmitForm => "submit-form",
            Self::CancelForm => "cancel-form",
            Self::ConfirmDelete(..) => "confirm-delete",
            Self::View(..) => "view",
            Self::Search { .. } => "search",
            Self::List(_) => "list",
            Self::Export { .. } => "export",
            Self::DownloadTemplate(_) => "download-template",
            Self::ImportFactories(_) => "import-factories",
            Self::SwitchTab(_) => "switch-tab",
            Self::SetPageSize(_) => "page-size",
        }
    }

    /// Build a command from its name and arguments.
    pub fn parse(name: &str, args: &[&str]) -> Result<Self, SessionError> {
        let command = Self::NAMES
            .into_iter()
            .find(|n| *n == name)
            .ok_or_else(|| SessionError::UnknownCommand(name.to_string()))?;
        let args = Args { command, args };
        let parsed = match command {
            "open-create-form" => Self::OpenCreateForm(args.kind(0)?),
            "open-edit-form" => Self::OpenEditForm(args.kind(0)?, args.id(1)?),
            "set-field" => Self::SetField {
                name: args.required(0, "field name")?.to_string(),
                value: args.rest(1),
            },
            "toggle-penalty" => Self::TogglePenalty(args.switch(0)?),
            "toggle-fine" => Self::ToggleFine(args.switch(0)?),
            "toggle-followup-result" => Self::ToggleFollowupResult {
                implemented: args.outcome(0)?,
            },
            "select-factory" => Self::SelectFactory(args.id(0)?),
            "select-original-inspection" => Self::SelectOriginalInspection(
                args.optional(0).map(RecordId::new).filter(|id| !id.as_str().is_empty()),
            ),
            "submit-form" => Self::SubmitForm,
            "cancel-form" => Self::CancelForm,
            "confirm-delete" => Self::ConfirmDelete(args.kind(0)?, args.id(1)?),
            "view" => Self::View(args.kind(0)?, args.id(1)?),
            "search" => Self::Search {
                kind: args.kind(0)?,
                query: args.rest(1),
            },
            "list" => Self::List(args.kind(0)?),
            "export" => {
                let target = args.required(0, "record type or `all`")?;
                let kind = if target.eq_ignore_ascii_case("all") {
                    None
                } else {
                    Some(args.kind(0)?)
                };
                Self::Export {
                    kind,
                    dir: PathBuf::from(args.required(1, "directory")?),
                }
            }
            "download-template" => {
                Self::DownloadTemplate(PathBuf::from(args.required(0, "directory")?))
            }
            "import-factories" => Self::ImportFactories(PathBuf::from(args.required(0, "file")?)),
            "switch-tab" => Self::SwitchTab(args.parsed(0, "tab")?),
            "page-size" => Self::SetPageSize(args.parsed(0, "page size")?),
            _ => return Err(SessionError::UnknownCommand(name.to_string())),
        };
        Ok(parsed)
    }
}

/// Split a command line and parse it. Blank lines and `#` comments yield
/// `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, SessionError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let words = split_words(line)?;
    let Some((name, rest)) = words.split_first() else {
        return Ok(None);
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    Command::parse(name, &args).map(Some)
}

fn split_words(line: &str) -> Result<Vec<String>, SessionError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut started = false;
    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    words.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if quoted {
        return Err(SessionError::BadArguments {
            command: "parse",
            reason: "unterminated quote".to_string(),
        });
    }
    if started {
        words.push(current);
    }
    Ok(words)
}

struct Args<'a> {
    command: &'static str,
    args: &'a [&'a str],
}

impl<'a> Args<'a> {
    fn bad(&self, reason: String) -> SessionError {
        SessionError::BadArguments {
            command: self.command,
            reason,
        }
    }

    fn optional(&self, idx: usize) -> Option<&'a str> {
        self.args.get(idx).copied()
    }

    fn required(&self, idx: usize, what: &str) -> Result<&'a str, SessionError> {
        self.optional(idx)
            .ok_or_else(|| self.bad(format!("missing {what}")))
    }

    /// Everything from `idx` on, joined by single spaces.
    fn rest(&self, idx: usize) -> String {
        self.args.get(idx..).unwrap_or_default().join(" ")
    }

    fn parsed<T: FromStr<Err = String>>(&self, idx: usize, what: &str) -> Result<T, SessionError> {
        self.required(idx, what)?.parse().map_err(|e| self.bad(e))
    }

    fn kind(&self, idx: usize) -> Result<EntityKind, SessionError> {
        self.parsed(idx, "record type")
    }

    fn id(&self, idx: usize) -> Result<RecordId, SessionError> {
        let id = RecordId::new(self.required(idx, "record id")?);
        if id.as_str().is_empty() {
            return Err(self.bad("blank record id".to_string()));
        }
        Ok(id)
    }

    fn switch(&self, idx: usize) -> Result<bool, SessionError> {
        match self.required(idx, "on or off")?.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "present" | "មាន" => Ok(true),
            "off" | "no" | "false" | "absent" | "គ្មាន" => Ok(false),
            other => Err(self.bad(format!("expected on or off, got {other}"))),
        }
    }

    fn outcome(&self, idx: usize) -> Result<bool, SessionError> {
        match self.required(idx, "implemented or not-implemented")? {
            "implemented" | "អនុវត្ត" => Ok(true),
            "not-implemented" | "មិនអនុវត្ត" => Ok(false),
            other => Err(self.bad(format!(
                "expected implemented or not-implemented, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_parses_with_plausible_args() {
        let samples: [(&str, &[&str]); 19] = [
            ("open-create-form", &["inspection"]),
            ("open-edit-form", &["followup", "12"]),
            ("set-field", &["no", "INS001"]),
            ("toggle-penalty", &["on"]),
            ("toggle-fine", &["absent"]),
            ("toggle-followup-result", &["not-implemented"]),
            ("select-factory", &["3"]),
            ("select-original-inspection", &[]),
            ("submit-form", &[]),
            ("cancel-form", &[]),
            ("confirm-delete", &["users", "5"]),
            ("view", &["document", "7"]),
            ("search", &["inspection", "ins001"]),
            ("list", &["factories"]),
            ("export", &["all", "/tmp/out"]),
            ("download-template", &["/tmp/out"]),
            ("import-factories", &["/tmp/in.csv"]),
            ("switch-tab", &["followup"]),
            ("page-size", &["all"]),
        ];
        for (name, args) in samples {
            let command = Command::parse(name, args).unwrap();
            assert_eq!(command.name(), name);
        }
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert!(matches!(
            Command::parse("launch-rocket", &[]),
            Err(SessionError::UnknownCommand(_))
        ));
    }

    #[test]
    fn missing_and_bad_arguments() {
        assert!(matches!(
            Command::parse("open-edit-form", &["inspection"]),
            Err(SessionError::BadArguments { command: "open-edit-form", .. })
        ));
        assert!(matches!(
            Command::parse("toggle-penalty", &["maybe"]),
            Err(SessionError::BadArguments { .. })
        ));
        assert!(Command::parse("list", &["widgets"]).is_err());
    }

    #[test]
    fn quoted_values_and_empty_values() {
        let command = parse_line(r#"set-field factory_name "Factory A""#).unwrap();
        assert_eq!(
            command,
            Some(Command::SetField {
                name: "factory_name".into(),
                value: "Factory A".into()
            })
        );
        let cleared = parse_line(r#"set-field remarks """#).unwrap();
        assert_eq!(
            cleared,
            Some(Command::SetField {
                name: "remarks".into(),
                value: String::new()
            })
        );
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# create an inspection").unwrap(), None);
        assert!(parse_line(r#"set-field no "open"#).is_err());
    }

    #[test]
    fn export_target() {
        assert_eq!(
            Command::parse("export", &["users", "out"]).unwrap(),
            Command::Export {
                kind: Some(EntityKind::User),
                dir: PathBuf::from("out"),
            }
        );
    }

    #[test]
    fn khmer_toggle_words() {
        assert_eq!(
            Command::parse("toggle-fine", &["មាន"]).unwrap(),
            Command::ToggleFine(true)
        );
        assert_eq!(
            Command::parse("toggle-followup-result", &["អនុវត្ត"]).unwrap(),
            Command::ToggleFollowupResult { implemented: true }
        );
    }
}
