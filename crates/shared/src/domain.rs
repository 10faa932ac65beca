use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(GroupId);
id_newtype!(DeviceId);

/// Page size used on mount and by name searches.
pub const DEFAULT_PAGE_SIZE: u32 = 8;

/// Device state as reported by the remote; `text` is the display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl DeviceState {
    pub fn labelled(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRef {
    pub id: DeviceId,
    pub name: String,
    pub state: DeviceState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub devices: Vec<DeviceRef>,
}

/// Payload submitted by the edit form. `id` is absent when creating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<GroupId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl GroupDraft {
    pub fn for_group(group: &Group) -> Self {
        Self {
            id: Some(group.id.clone()),
            name: group.name.clone(),
            description: group.description.clone(),
            avatar: group.avatar.clone(),
        }
    }

    pub fn is_create(&self) -> bool {
        self.id.is_none()
    }
}

/// Substring match on the group name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameFilter {
    pub name_contains: String,
}

impl NameFilter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name_contains: name.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.name_contains.trim().is_empty()
    }
}

/// Pagination plus filter sent to the collection endpoint. Replaced wholesale
/// on every search or page action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDescriptor {
    pub page_index: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<NameFilter>,
}

impl Default for SearchDescriptor {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
            terms: None,
        }
    }
}

impl SearchDescriptor {
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    pub fn by_name(name: impl Into<String>, page_size: u32) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
            terms: Some(NameFilter::new(name)),
        }
    }

    /// Keeps the filter and replaces pagination. `page` is 1-based.
    pub fn at_page(&self, page: u32, page_size: u32) -> Self {
        Self {
            page_index: page.saturating_sub(1),
            page_size: page_size.max(1),
            terms: self.terms.clone(),
        }
    }
}

/// One fetched slice of the remote collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPage {
    #[serde(default)]
    pub data: Vec<Group>,
    pub page_index: u32,
    pub page_size: u32,
    pub total: u64,
}

impl GroupPage {
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 || self.total == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size))
    }

    /// 1-based page number for display.
    pub fn current_page(&self) -> u64 {
        u64::from(self.page_index) + 1
    }

    pub fn group(&self, group_id: &GroupId) -> Option<&Group> {
        self.data.iter().find(|group| &group.id == group_id)
    }
}
