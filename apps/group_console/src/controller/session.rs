//! Group list session: the list controller, the mutation coordinator and the
//! panel launcher over one piece of state.
//!
//! All transitions run on the caller's thread. Remote work is queued as
//! [`BackendCommand`]s and comes back through [`GroupSession::apply`].
//! Page fetches carry a generation; only the latest one may replace the page.
//! `busy` is derived from the number of dispatched-but-unsettled commands.

use std::collections::HashMap;

use crossbeam_channel::Sender;
use shared::domain::{DeviceId, GroupDraft, GroupId, GroupPage, SearchDescriptor};
use tracing::{debug, info, warn};

use crate::backend_bridge::commands::{BackendCommand, MutationOp};
use crate::config::Settings;
use crate::controller::{
    events::{Notice, UiError, UiErrorContext, UiEvent},
    orchestration::dispatch_backend_command,
    panel::{ActivePanel, FormOutcome},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub page_size: u32,
    pub device_page_size: usize,
    pub refresh_on_form_cancel: bool,
}

impl From<&Settings> for SessionOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            page_size: settings.page_size.max(1),
            device_page_size: settings.device_page_size.max(1),
            refresh_on_form_cancel: settings.refresh_on_form_cancel,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

pub struct GroupSession {
    cmd_tx: Sender<BackendCommand>,
    options: SessionOptions,
    descriptor: SearchDescriptor,
    page: Option<GroupPage>,
    generation: u64,
    in_flight: u32,
    panel: ActivePanel,
    device_pages: HashMap<GroupId, usize>,
    notices: Vec<Notice>,
    status: String,
}

impl GroupSession {
    /// Creates the session and immediately requests the first page.
    pub fn mount(cmd_tx: Sender<BackendCommand>, options: SessionOptions) -> Self {
        let mut session = Self {
            cmd_tx,
            options,
            descriptor: SearchDescriptor::with_page_size(options.page_size),
            page: None,
            generation: 0,
            in_flight: 0,
            panel: ActivePanel::None,
            device_pages: HashMap::new(),
            notices: Vec::new(),
            status: String::new(),
        };
        let initial = session.descriptor.clone();
        session.search(initial);
        session
    }

    pub fn busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn descriptor(&self) -> &SearchDescriptor {
        &self.descriptor
    }

    pub fn page(&self) -> Option<&GroupPage> {
        self.page.as_ref()
    }

    pub fn panel(&self) -> &ActivePanel {
        &self.panel
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Last queue failure, empty when the queue has been healthy.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

}

impl GroupSession {
    pub fn search(&mut self, descriptor: SearchDescriptor) {
        self.descriptor = descriptor.clone();
        self.generation += 1;
        let cmd = BackendCommand::FetchPage {
            generation: self.generation,
            descriptor,
        };
        self.dispatch(cmd);
    }

    /// Filters by name and returns to the first page. Safe per keystroke:
    /// superseded responses are discarded by generation.
    pub fn search_by_name(&mut self, name: &str) {
        let descriptor = SearchDescriptor::by_name(name, self.options.page_size);
        self.search(descriptor);
    }

    /// `page` is 1-based.
    pub fn change_page(&mut self, page: u32, page_size: u32) {
        let descriptor = self.descriptor.at_page(page, page_size);
        self.search(descriptor);
    }

    pub fn change_page_size(&mut self, current: u32, size: u32) {
        let descriptor = self.descriptor.at_page(current, size);
        self.search(descriptor);
    }

}

impl GroupSession {
    pub fn save_group(&mut self, draft: GroupDraft) {
        self.mutate(MutationOp::Save(draft));
    }

    pub fn remove(&mut self, group_id: GroupId) {
        self.mutate(MutationOp::Remove { group_id });
    }

    pub fn unbind_one(&mut self, group_id: GroupId, device_id: DeviceId) {
        self.mutate(MutationOp::UnbindOne {
            group_id,
            device_id,
        });
    }

    pub fn unbind_all(&mut self, group_id: GroupId) {
        self.mutate(MutationOp::UnbindAll { group_id });
    }

    fn mutate(&mut self, op: MutationOp) {
        let cmd = BackendCommand::Mutate {
            op,
            refresh: self.descriptor.clone(),
        };
        self.dispatch(cmd);
    }

}

impl GroupSession {
    pub fn open_create(&mut self) {
        self.panel = ActivePanel::Editing(None);
    }

    /// Opens the edit form for a group on the current page.
    pub fn open_edit(&mut self, group_id: &GroupId) -> bool {
        let Some(group) = self.page.as_ref().and_then(|page| page.group(group_id)) else {
            return false;
        };
        self.panel = ActivePanel::Editing(Some(group.clone()));
        true
    }

    /// Close signal from the edit form. A save always refreshes the page; a
    /// cancel refreshes only when `refresh_on_form_cancel` is set.
    pub fn close_edit(&mut self, outcome: FormOutcome) {
        if !self.panel.is_editing() {
            return;
        }
        self.panel = ActivePanel::None;
        if outcome == FormOutcome::Saved || self.options.refresh_on_form_cancel {
            let descriptor = self.descriptor.clone();
            self.search(descriptor);
        }
    }

    pub fn open_device_detail(&mut self, device_id: DeviceId) {
        self.panel = ActivePanel::ViewingDevice(device_id);
    }

    pub fn close_device_detail(&mut self) {
        if self.panel.detail_device().is_some() {
            self.panel = ActivePanel::None;
        }
    }

}

impl GroupSession {
    /// 0-based device sub-page shown for a group.
    pub fn device_page(&self, group_id: &GroupId) -> usize {
        self.device_pages.get(group_id).copied().unwrap_or(0)
    }

    pub fn set_device_page(&mut self, group_id: &GroupId, sub_page: usize) -> bool {
        let Some(group) = self.page.as_ref().and_then(|page| page.group(group_id)) else {
            return false;
        };
        let last = last_sub_page(group.devices.len(), self.options.device_page_size);
        self.device_pages.insert(group_id.clone(), sub_page.min(last));
        true
    }

}

impl GroupSession {
    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Info(message) => debug!("backend: {message}"),
            UiEvent::Error(error) => {
                if error.context() == UiErrorContext::BackendStartup {
                    // Nothing queued so far will ever be answered.
                    warn!(abandoned = self.in_flight, "backend worker unavailable");
                    self.in_flight = 0;
                    self.status = error.message().to_string();
                }
                self.notices.push(Notice::Error(error.message().to_string()));
            }
            UiEvent::PageLoaded { generation, page } => {
                if generation == self.generation {
                    self.replace_page(page);
                } else {
                    debug!(generation, current = self.generation, "discarding stale group page");
                }
                self.settle();
            }
            UiEvent::PageFailed { generation, error } => {
                if generation == self.generation {
                    self.report_failure(&error);
                } else {
                    debug!(generation, current = self.generation, "ignoring stale fetch failure");
                }
                self.settle();
            }
            UiEvent::MutationSettled {
                op,
                refresh,
                result,
            } => {
                match result {
                    Ok(()) => {
                        info!(op = op.name(), "group mutation committed");
                        self.notices
                            .push(Notice::Success(op.success_text().to_string()));
                        if matches!(op, MutationOp::Save(_)) && self.panel.is_editing() {
                            self.panel = ActivePanel::None;
                        }
                        // Queue the refresh before settling so busy stays set.
                        self.search(refresh);
                    }
                    Err(error) => {
                        if matches!(op, MutationOp::Save(_)) && error.is_rejection() {
                            // The form stays open; tell the user why.
                            self.notices.push(Notice::Error(error.message().to_string()));
                        } else {
                            self.report_failure(&error);
                        }
                    }
                }
                self.settle();
            }
        }
    }

    fn replace_page(&mut self, page: GroupPage) {
        let per_page = self.options.device_page_size;
        self.device_pages.retain(|group_id, sub_page| {
            match page.group(group_id) {
                Some(group) => {
                    *sub_page = (*sub_page).min(last_sub_page(group.devices.len(), per_page));
                    true
                }
                None => false,
            }
        });
        self.page = Some(page);
    }

    /// Rejections keep the last good page silently; transport failures get a
    /// generic notice so the user knows to retry.
    fn report_failure(&mut self, error: &UiError) {
        if error.is_rejection() {
            debug!("remote rejected request: {}", error.message());
        } else {
            self.notices
                .push(Notice::Error("request failed; please retry".to_string()));
        }
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        if dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) {
            self.in_flight += 1;
            self.status.clear();
        } else {
            self.notices.push(Notice::Error(self.status.clone()));
        }
    }

    fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}

fn last_sub_page(device_count: usize, per_page: usize) -> usize {
    device_count.saturating_sub(1) / per_page.max(1)
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
