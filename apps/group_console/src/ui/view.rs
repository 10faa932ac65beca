//! Renders the session as plain text for the console.

use std::fmt::Write as _;

use shared::domain::{DeviceRef, Group, GroupPage};

use crate::controller::{panel::ActivePanel, session::GroupSession};
use crate::ui::status::badge_for_label;

pub const PAGE_SIZE_OPTIONS: [u32; 4] = [8, 16, 40, 80];

/// Pagination controls are hidden when everything fits on one page.
pub fn shows_pagination(page: &GroupPage) -> bool {
    page.total_pages() > 1
}

pub fn pagination_summary(page: &GroupPage) -> String {
    format!(
        "total {} records, page {}/{}",
        page.total,
        page.current_page(),
        page.total_pages()
    )
}

pub fn device_page_count(device_count: usize, per_page: usize) -> usize {
    device_count.div_ceil(per_page.max(1))
}

/// Devices on 0-based sub-page `sub_page`; empty when out of range.
pub fn device_slice(devices: &[DeviceRef], sub_page: usize, per_page: usize) -> &[DeviceRef] {
    let per_page = per_page.max(1);
    let start = sub_page.saturating_mul(per_page).min(devices.len());
    let end = start.saturating_add(per_page).min(devices.len());
    &devices[start..end]
}

pub fn render_device(device: &DeviceRef) -> String {
    let badge = badge_for_label(&device.state.text)
        .map(|badge| format!("[{badge}] "))
        .unwrap_or_default();
    format!("{} ({}) {badge}{}", device.name, device.id, device.state.text)
}

fn render_group(out: &mut String, group: &Group, sub_page: usize, per_page: usize) {
    let _ = writeln!(out, "# {} {}", group.id, group.name);
    if let Some(avatar) = &group.avatar {
        let _ = writeln!(out, "  avatar: {avatar}");
    }
    for device in device_slice(&group.devices, sub_page, per_page) {
        let _ = writeln!(out, "  - {}", render_device(device));
    }
    let pages = device_page_count(group.devices.len(), per_page);
    if pages > 1 {
        let _ = writeln!(out, "  devices page {}/{}", sub_page + 1, pages);
    }
}

pub fn render_session(session: &GroupSession) -> String {
    let mut out = String::new();
    if !session.status().is_empty() {
        let _ = writeln!(out, "status: {}", session.status());
    }
    if session.busy() {
        out.push_str("(loading...)\n");
    }

    match session.page() {
        Some(page) if page.page_size > 0 => {
            let per_page = session.options().device_page_size;
            for group in &page.data {
                render_group(&mut out, group, session.device_page(&group.id), per_page);
            }
            if page.data.is_empty() {
                out.push_str("no groups\n");
            }
            if shows_pagination(page) {
                let _ = writeln!(out, "{}", pagination_summary(page));
                let sizes: Vec<String> = PAGE_SIZE_OPTIONS.iter().map(u32::to_string).collect();
                let _ = writeln!(out, "page sizes: {}", sizes.join(", "));
            }
        }
        _ => {}
    }

    match session.panel() {
        ActivePanel::None => {}
        ActivePanel::Editing(None) => out.push_str("[new group form open]\n"),
        ActivePanel::Editing(Some(group)) => {
            let _ = writeln!(out, "[editing group {} \"{}\"]", group.id, group.name);
        }
        ActivePanel::ViewingDevice(device_id) => {
            let _ = writeln!(out, "[device detail: {device_id}]");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{DeviceId, DeviceState};

    fn devices(count: usize) -> Vec<DeviceRef> {
        (0..count)
            .map(|i| DeviceRef {
                id: DeviceId::new(format!("d{i}")),
                name: format!("dev {i}"),
                state: DeviceState::labelled("离线"),
            })
            .collect()
    }

    #[test]
    fn summary_reports_one_based_page() {
        let page = GroupPage {
            data: Vec::new(),
            page_index: 1,
            page_size: 8,
            total: 17,
        };
        assert_eq!(pagination_summary(&page), "total 17 records, page 2/3");
        assert!(shows_pagination(&page));
    }

    #[test]
    fn single_page_hides_pagination() {
        let page = GroupPage {
            data: Vec::new(),
            page_index: 0,
            page_size: 8,
            total: 8,
        };
        assert!(!shows_pagination(&page));
    }

    #[test]
    fn device_slices_are_four_wide() {
        let list = devices(6);
        assert_eq!(device_slice(&list, 0, 4).len(), 4);
        assert_eq!(device_slice(&list, 1, 4)[0].id, DeviceId::from("d4"));
        assert!(device_slice(&list, 5, 4).is_empty());
        assert_eq!(device_page_count(list.len(), 4), 2);
        assert_eq!(device_page_count(0, 4), 0);
    }

    #[test]
    fn device_line_includes_badge_only_for_known_labels() {
        let mut device = devices(1).remove(0);
        assert!(render_device(&device).contains("[error]"));
        device.state = DeviceState::labelled("维护中");
        assert!(!render_device(&device).contains('['));
    }
}
