//! Column kind tags

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The column types a board payload can carry.
///
/// Kinds with dedicated normalization rules get their own variant; every other
/// tag (status, text, email, ...) lands in [`ColumnKind::Unknown`] and is
/// normalized by the default text rule. Matching on this enum is exhaustive,
/// so adding a variant forces every handler to take a position on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Synthetic item-id column prepended by the normalizer
    ItemId,
    /// Synthetic item-name column prepended by the normalizer
    Name,
    /// Star rating (integer in text)
    Rating,
    /// Auto-incrementing number (integer in text)
    AutoNumber,
    /// Vote count (integer in text, empty means zero)
    Vote,
    /// Checkbox (checked flag in value)
    Checkbox,
    /// Date, optionally with a time component
    Date,
    /// Dependency links to other items
    Dependency,
    /// Links to items on another board
    BoardRelation,
    /// Subtask links
    Subtasks,
    /// Dropdown selection (comma-separated labels in text)
    Dropdown,
    /// Tags (comma-separated labels in text)
    Tags,
    /// People assignments
    People,
    /// Team assignments
    Team,
    /// Attached files
    File,
    /// Web link
    Link,
    /// Numeric column
    Numbers,
    /// Creation timestamp
    CreationLog,
    /// Last-updated timestamp
    LastUpdated,
    /// Duration tracking (structured value passed through)
    Duration,
    /// Integration-managed column (structured value passed through)
    Integration,
    /// Formula column, evaluated from other columns
    Formula,
    /// Mirror column, aggregated from a connected board
    Mirror,
    /// Progress roll-up (no extractable value)
    Progress,
    /// Button (no extractable value)
    Button,
    /// Any other tag, normalized by the default text rule
    Unknown(String),
}

impl ColumnKind {
    /// Map a wire tag to its kind
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "item_id" => ColumnKind::ItemId,
            "name" => ColumnKind::Name,
            "rating" => ColumnKind::Rating,
            "auto_number" => ColumnKind::AutoNumber,
            "vote" => ColumnKind::Vote,
            "checkbox" => ColumnKind::Checkbox,
            "date" => ColumnKind::Date,
            "dependency" => ColumnKind::Dependency,
            "board_relation" => ColumnKind::BoardRelation,
            "subtasks" => ColumnKind::Subtasks,
            "dropdown" => ColumnKind::Dropdown,
            "tags" => ColumnKind::Tags,
            "people" => ColumnKind::People,
            "team" => ColumnKind::Team,
            "file" => ColumnKind::File,
            "link" => ColumnKind::Link,
            "numbers" => ColumnKind::Numbers,
            "creation_log" => ColumnKind::CreationLog,
            "last_updated" => ColumnKind::LastUpdated,
            "duration" => ColumnKind::Duration,
            "integration" => ColumnKind::Integration,
            "formula" => ColumnKind::Formula,
            "mirror" => ColumnKind::Mirror,
            "progress" => ColumnKind::Progress,
            "button" => ColumnKind::Button,
            other => ColumnKind::Unknown(other.to_string()),
        }
    }

    /// The wire tag for this kind
    pub fn as_tag(&self) -> &str {
        match self {
            ColumnKind::ItemId => "item_id",
            ColumnKind::Name => "name",
            ColumnKind::Rating => "rating",
            ColumnKind::AutoNumber => "auto_number",
            ColumnKind::Vote => "vote",
            ColumnKind::Checkbox => "checkbox",
            ColumnKind::Date => "date",
            ColumnKind::Dependency => "dependency",
            ColumnKind::BoardRelation => "board_relation",
            ColumnKind::Subtasks => "subtasks",
            ColumnKind::Dropdown => "dropdown",
            ColumnKind::Tags => "tags",
            ColumnKind::People => "people",
            ColumnKind::Team => "team",
            ColumnKind::File => "file",
            ColumnKind::Link => "link",
            ColumnKind::Numbers => "numbers",
            ColumnKind::CreationLog => "creation_log",
            ColumnKind::LastUpdated => "last_updated",
            ColumnKind::Duration => "duration",
            ColumnKind::Integration => "integration",
            ColumnKind::Formula => "formula",
            ColumnKind::Mirror => "mirror",
            ColumnKind::Progress => "progress",
            ColumnKind::Button => "button",
            ColumnKind::Unknown(tag) => tag,
        }
    }

    /// Whether columns of this kind appear in normalized output.
    ///
    /// Progress and button columns carry no extractable value and are
    /// filtered before dispatch.
    pub fn is_supported(&self) -> bool {
        !matches!(self, ColumnKind::Progress | ColumnKind::Button)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

impl Serialize for ColumnKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_tag())
    }
}

impl<'de> Deserialize<'de> for ColumnKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(ColumnKind::from_tag(&tag))
    }
}
