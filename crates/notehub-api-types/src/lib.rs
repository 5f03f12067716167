//! Wire models for the NoteHub notes API.

use serde::{Deserialize, Deserializer, Serialize, de::IgnoredAny};

/// A note as returned by `GET /notes/{id}` and inside listing pages.
///
/// Only `title` and `content` are guaranteed. The remaining fields are read
/// leniently: numbers and booleans become their text form, anything else is
/// dropped instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub tag: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<String>,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            tag: None,
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientText {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
    Other(IgnoredAny),
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LenientText>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        LenientText::Text(text) => Some(text),
        LenientText::Integer(number) => Some(number.to_string()),
        LenientText::Float(number) => Some(number.to_string()),
        LenientText::Flag(flag) => Some(flag.to_string()),
        LenientText::Other(_) => None,
    }))
}

/// One page of the notes listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesPage {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub total_pages: u32,
}

/// Parameters of `GET /notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    pub page: u32,
    pub per_page: u32,
    pub search: String,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub tag: Option<String>,
}

impl ListingQuery {
    /// Query string pairs in upstream order; `tag` is omitted when unfiltered.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("perPage", self.per_page.to_string()),
            ("search", self.search.clone()),
        ];
        if let Some(tag) = &self.tag {
            pairs.push(("tag", tag.clone()));
        }
        pairs
    }
}
