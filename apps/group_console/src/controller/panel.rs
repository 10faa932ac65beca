//! Which secondary view is open. One variant at a time, so opening the edit
//! form closes the device detail and vice versa.

use shared::domain::{DeviceId, Group};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActivePanel {
    #[default]
    None,
    /// Edit form; `None` inside means a new group is being created.
    Editing(Option<Group>),
    ViewingDevice(DeviceId),
}

/// How the edit form was dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    Saved,
    Cancelled,
}

impl ActivePanel {
    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing(_))
    }

    pub fn edit_target(&self) -> Option<&Group> {
        match self {
            Self::Editing(target) => target.as_ref(),
            _ => None,
        }
    }

    pub fn detail_device(&self) -> Option<&DeviceId> {
        match self {
            Self::ViewingDevice(device_id) => Some(device_id),
            _ => None,
        }
    }
}
