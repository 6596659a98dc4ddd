use serde::{Deserialize, Serialize};

/// Categorical fields a hierarchy level can be keyed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupField {
    Level,
    Category,
    Year,
}

impl GroupField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Level => "degree level",
            Self::Category => "degree name",
            Self::Year => "year",
        }
    }
}

/// One thesis row. Immutable once parsed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub level: String,
    pub category: String,
    pub year: String,
    pub title: String,
    pub downloads: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Record {
    pub fn field(&self, field: GroupField) -> &str {
        match field {
            GroupField::Level => &self.level,
            GroupField::Category => &self.category,
            GroupField::Year => &self.year,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample(category: &str, title: &str, downloads: u64) -> Record {
    Record {
        level: "Masters".to_string(),
        category: category.to_string(),
        year: "2014".to_string(),
        title: title.to_string(),
        downloads,
        author: None,
        url: None,
    }
}
