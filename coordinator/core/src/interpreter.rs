//! Tool Call Interpreter
//!
//! Turns a raw tool call (name + loosely-typed argument payload + lifecycle
//! state) into an [`OperationDescriptor`]: the short, human-facing label a
//! surface shows for the call, e.g. `Creating Button.jsx in /components`.
//!
//! Interpretation is pure and total. Payloads that do not match a known shape
//! fall back to an unrecognized descriptor that only carries the tool name, so
//! partially streamed or malformed calls always render something.
//!
//! # Recognized shapes
//!
//! | Tool | Command | Verb | Path used | Location |
//! |------|---------|------|-----------|----------|
//! | `str_replace_editor` | `create` | Creating | `path` | shown |
//! | `str_replace_editor` | `str_replace`, `insert` | Updating | `path` | shown |
//! | `file_manager` | `rename` | Renaming to | `new_path` | shown |
//! | `file_manager` | `delete` | Deleting | `path` | never |
//!
//! The label text does not depend on the call's status, so a badge does not
//! change wording when its call completes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::invocation::{is_truthy, InvocationState, ToolArgs};

/// Tool used by the agent to create and edit file contents
pub const STR_REPLACE_EDITOR: &str = "str_replace_editor";

/// Tool used by the agent to rename and delete files
pub const FILE_MANAGER: &str = "file_manager";

/// Intended effect of a recognized tool call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationVerb {
    /// A new file is being written
    Creating,
    /// An existing file is being edited in place
    Updating,
    /// A file is being moved to a new path
    RenamingTo,
    /// A file is being removed
    Deleting,
}

impl OperationVerb {
    /// Human-facing verb phrase
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creating => "Creating",
            Self::Updating => "Updating",
            Self::RenamingTo => "Renaming to",
            Self::Deleting => "Deleting",
        }
    }

    /// Icon hint a surface uses next to the label
    #[must_use]
    pub fn icon(&self) -> OperationIcon {
        match self {
            Self::Creating => OperationIcon::Create,
            Self::Updating | Self::RenamingTo | Self::Deleting => OperationIcon::Edit,
        }
    }
}

impl fmt::Display for OperationVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Icon hint for a recognized operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationIcon {
    /// "New file" glyph
    Create,
    /// "Edit file" glyph
    Edit,
}

/// Spinner or completion indicator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualStatus {
    /// Still running (spinner)
    InProgress,
    /// Completed with a truthy result (completion dot)
    Succeeded,
}

impl VisualStatus {
    /// Derive the indicator from an invocation's lifecycle and result
    #[must_use]
    pub fn from_lifecycle(state: InvocationState, result: Option<&Value>) -> Self {
        if state == InvocationState::Completed && result.is_some_and(is_truthy) {
            Self::Succeeded
        } else {
            Self::InProgress
        }
    }
}

/// Display descriptor for one tool call
///
/// Derived on demand and never stored. Recompute it whenever the underlying
/// invocation changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Raw tool identifier
    pub tool_name: String,
    /// Whether the call matched a known operation shape
    pub recognized: bool,
    /// Verb, only set when recognized
    pub verb: Option<OperationVerb>,
    /// Base name of the targeted file, only set when recognized
    pub subject: Option<String>,
    /// Containing directory (`/a/b`), absent at the root and for deletes
    pub location: Option<String>,
    /// Icon hint, only set when recognized
    pub icon: Option<OperationIcon>,
    /// Spinner or completion indicator
    pub status: VisualStatus,
}

impl OperationDescriptor {
    fn unrecognized(tool_name: &str, status: VisualStatus) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            recognized: false,
            verb: None,
            subject: None,
            location: None,
            icon: None,
            status,
        }
    }

    /// Verb phrase, if recognized
    #[must_use]
    pub fn verb_phrase(&self) -> Option<&'static str> {
        self.verb.as_ref().map(OperationVerb::as_str)
    }

    /// Whether the completion indicator should be shown
    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        self.status == VisualStatus::Succeeded
    }
}

impl fmt::Display for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.verb, &self.subject) {
            (Some(verb), Some(subject)) => {
                write!(f, "{verb} {subject}")?;
                if let Some(location) = &self.location {
                    write!(f, " in {location}")?;
                }
                Ok(())
            }
            _ => f.write_str(&self.tool_name),
        }
    }
}

/// A path split into its base name and containing directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathParts {
    /// Last non-empty segment
    pub file_name: String,
    /// `/` + remaining segments, absent when the file sits at the root
    pub directory: Option<String>,
}

/// Split a virtual-file-system path into base name and directory.
///
/// Empty segments are dropped, so leading slashes and doubled slashes are
/// tolerated. Returns `None` when nothing is left.
#[must_use]
pub fn decompose_path(path: &str) -> Option<PathParts> {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let file_name = segments.pop()?.to_string();
    let directory = (!segments.is_empty()).then(|| format!("/{}", segments.join("/")));
    Some(PathParts {
        file_name,
        directory,
    })
}

/// Interpret a tool call for display.
///
/// Never fails: anything that does not match a known shape comes back with
/// `recognized = false`.
#[must_use]
pub fn interpret(
    tool_name: &str,
    args: Option<&ToolArgs>,
    state: InvocationState,
    result: Option<&Value>,
) -> OperationDescriptor {
    let status = VisualStatus::from_lifecycle(state, result);

    let Some((verb, parts)) = args.and_then(|args| recognize(tool_name, args)) else {
        return OperationDescriptor::unrecognized(tool_name, status);
    };

    let location = match verb {
        OperationVerb::Deleting => None,
        _ => parts.directory,
    };

    OperationDescriptor {
        tool_name: tool_name.to_string(),
        recognized: true,
        verb: Some(verb),
        subject: Some(parts.file_name),
        location,
        icon: Some(verb.icon()),
        status,
    }
}

fn recognize(tool_name: &str, args: &ToolArgs) -> Option<(OperationVerb, PathParts)> {
    let command = str_arg(args, "command");

    match tool_name {
        STR_REPLACE_EDITOR => {
            let path = str_arg(args, "path")?;
            let verb = match command? {
                "create" => OperationVerb::Creating,
                "str_replace" | "insert" => OperationVerb::Updating,
                _ => return None,
            };
            Some((verb, decompose_path(path)?))
        }
        FILE_MANAGER => match command? {
            "rename" => {
                let new_path = str_arg(args, "new_path")?;
                Some((OperationVerb::RenamingTo, decompose_path(new_path)?))
            }
            "delete" => {
                let path = str_arg(args, "path")?;
                Some((OperationVerb::Deleting, decompose_path(path)?))
            }
            _ => None,
        },
        _ => None,
    }
}

fn str_arg<'a>(args: &'a ToolArgs, key: &str) -> Option<&'a str> {
    args.get(key)?.as_str().filter(|s| !s.is_empty())
}
