//! Backend commands queued from the controller to the backend worker.

use shared::domain::{DeviceId, GroupDraft, GroupId, SearchDescriptor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOp {
    Save(GroupDraft),
    Remove { group_id: GroupId },
    UnbindOne { group_id: GroupId, device_id: DeviceId },
    UnbindAll { group_id: GroupId },
}

impl MutationOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Save(_) => "save_group",
            Self::Remove { .. } => "remove_group",
            Self::UnbindOne { .. } => "unbind_device",
            Self::UnbindAll { .. } => "unbind_all_devices",
        }
    }

    /// Notice shown once the remote confirms the mutation.
    pub fn success_text(&self) -> &'static str {
        match self {
            Self::Save(_) => "saved successfully",
            Self::UnbindOne { .. } => "unbound successfully",
            Self::Remove { .. } | Self::UnbindAll { .. } => "deleted successfully",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    FetchPage {
        generation: u64,
        descriptor: SearchDescriptor,
    },
    /// `refresh` is the descriptor active when the mutation was requested; it
    /// travels with the command so the follow-up fetch uses it.
    Mutate {
        op: MutationOp,
        refresh: SearchDescriptor,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchPage { .. } => "fetch_page",
            Self::Mutate { op, .. } => op.name(),
        }
    }
}
