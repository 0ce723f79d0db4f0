//! Feed items and their per-kind payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pin::PinContext;

/// Record kinds that contribute to the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Note,
    GymSession,
    WeightEntry,
    TodoList,
    Reminder,
    Activity,
}

impl RecordKind {
    pub const ALL: [RecordKind; 6] = [
        RecordKind::Note,
        RecordKind::GymSession,
        RecordKind::WeightEntry,
        RecordKind::TodoList,
        RecordKind::Reminder,
        RecordKind::Activity,
    ];

    /// Parse from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "note" | "notes" => Some(Self::Note),
            "gym_session" | "gym" => Some(Self::GymSession),
            "weight_entry" | "weight" => Some(Self::WeightEntry),
            "todo_list" | "todo" => Some(Self::TodoList),
            "reminder" | "reminders" => Some(Self::Reminder),
            "activity" | "activities" => Some(Self::Activity),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::GymSession => "gym_session",
            Self::WeightEntry => "weight_entry",
            Self::TodoList => "todo_list",
            Self::Reminder => "reminder",
            Self::Activity => "activity",
        }
    }

    /// The feature-level pin namespace for this kind
    pub fn pin_context(&self) -> PinContext {
        let name = match self {
            Self::Note => "notes",
            Self::GymSession => "gym",
            Self::WeightEntry => "weight",
            Self::TodoList => "todo",
            Self::Reminder => "reminders",
            Self::Activity => "activities",
        };
        PinContext::new(name)
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GymExercise {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoTask {
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

/// Kind-specific payload carried by every feed item.
///
/// Serialized as `"type": "<kind>"` next to an `"extra_fields"` object, so the
/// kind of an item is always the kind of its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "extra_fields", rename_all = "snake_case")]
pub enum ExtraFields {
    Note {
        body: String,
        #[serde(default)]
        tags: Vec<String>,
    },
    GymSession {
        #[serde(default)]
        exercises: Vec<GymExercise>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_minutes: Option<u32>,
    },
    WeightEntry {
        weight_kg: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    TodoList {
        #[serde(default)]
        tasks: Vec<TodoTask>,
    },
    Reminder {
        remind_at: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notify_before_minutes: Option<u32>,
        #[serde(default)]
        delivered: bool,
    },
    Activity {
        activity_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_seconds: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        distance_meters: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        calories: Option<u32>,
    },
}

impl ExtraFields {
    pub fn kind(&self) -> RecordKind {
        match self {
            ExtraFields::Note { .. } => RecordKind::Note,
            ExtraFields::GymSession { .. } => RecordKind::GymSession,
            ExtraFields::WeightEntry { .. } => RecordKind::WeightEntry,
            ExtraFields::TodoList { .. } => RecordKind::TodoList,
            ExtraFields::Reminder { .. } => RecordKind::Reminder,
            ExtraFields::Activity { .. } => RecordKind::Activity,
        }
    }
}

/// One record as it appears on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Stable identity, unchanged by pinning
    pub id: String,
    pub owner: String,
    /// Id of the underlying record in its own table
    pub source_id: String,
    pub title: String,
    /// Ordering key for the regular slice
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl FeedItem {
    pub fn kind(&self) -> RecordKind {
        self.extra.kind()
    }
}

/// Whether an item is rendered from the pinned group or the regular slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedContext {
    Pinned,
    Feed,
}

impl FeedContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedContext::Pinned => "pinned",
            FeedContext::Feed => "feed",
        }
    }
}
