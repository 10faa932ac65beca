//! Line-oriented console commands and how they drive the session.

use shared::domain::{DeviceId, GroupDraft, GroupId};
use thiserror::Error;

use crate::controller::{panel::FormOutcome, session::GroupSession};

pub const HELP: &str = "\
commands:
  search [name]             filter by name (empty clears the filter)
  page <n> [size]           go to page n (1-based)
  size <n>                  change page size, keeping the current page
  new                       open the create form
  edit <group-id>           open the edit form
  save <name> [description] submit the open form
  cancel                    close the form without saving
  delete <group-id>         delete a group
  unbind <group-id> <device-id>
  unbind-all <group-id>
  device <device-id>        open the device detail panel
  close                     close the device detail panel
  devices <group-id> <n>    show device page n of a group
  show | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Search(String),
    Page { page: u32, size: Option<u32> },
    Size(u32),
    New,
    Edit(GroupId),
    Save { name: String, description: Option<String> },
    Cancel,
    Delete(GroupId),
    Unbind { group_id: GroupId, device_id: DeviceId },
    UnbindAll(GroupId),
    Device(DeviceId),
    Close,
    Devices { group_id: GroupId, page: usize },
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'; type 'help'")]
    Unknown(String),
    #[error("missing argument: {0}")]
    Missing(&'static str),
    #[error("'{0}' is not a positive number")]
    NotANumber(String),
}

pub fn parse(line: &str) -> Result<ConsoleCommand, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(ParseError::Empty);
    };
    let rest: Vec<&str> = words.collect();
    let arg = |index: usize, name: &'static str| -> Result<&str, ParseError> {
        rest.get(index).copied().ok_or(ParseError::Missing(name))
    };

    let command = match head {
        "search" => ConsoleCommand::Search(rest.join(" ")),
        "page" => ConsoleCommand::Page {
            page: positive(arg(0, "page")?)?,
            size: rest.get(1).map(|raw| positive(raw)).transpose()?,
        },
        "size" => ConsoleCommand::Size(positive(arg(0, "size")?)?),
        "new" => ConsoleCommand::New,
        "edit" => ConsoleCommand::Edit(GroupId::from(arg(0, "group-id")?)),
        "save" => ConsoleCommand::Save {
            name: arg(0, "name")?.to_string(),
            description: (rest.len() > 1).then(|| rest[1..].join(" ")),
        },
        "cancel" => ConsoleCommand::Cancel,
        "delete" => ConsoleCommand::Delete(GroupId::from(arg(0, "group-id")?)),
        "unbind" => ConsoleCommand::Unbind {
            group_id: GroupId::from(arg(0, "group-id")?),
            device_id: DeviceId::from(arg(1, "device-id")?),
        },
        "unbind-all" => ConsoleCommand::UnbindAll(GroupId::from(arg(0, "group-id")?)),
        "device" => ConsoleCommand::Device(DeviceId::from(arg(0, "device-id")?)),
        "close" => ConsoleCommand::Close,
        "devices" => ConsoleCommand::Devices {
            group_id: GroupId::from(arg(0, "group-id")?),
            page: positive(arg(1, "page")?)? as usize,
        },
        "show" => ConsoleCommand::Show,
        "help" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(command)
}

fn positive(raw: &str) -> Result<u32, ParseError> {
    match raw.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ParseError::NotANumber(raw.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Print(String),
    Quit,
}

pub fn run(session: &mut GroupSession, command: ConsoleCommand) -> Flow {
    match command {
        ConsoleCommand::Search(name) => session.search_by_name(&name),
        ConsoleCommand::Page { page, size } => {
            let size = size.unwrap_or(session.descriptor().page_size);
            session.change_page(page, size);
        }
        ConsoleCommand::Size(size) => {
            let current = session.descriptor().page_index + 1;
            session.change_page_size(current, size);
        }
        ConsoleCommand::New => session.open_create(),
        ConsoleCommand::Edit(group_id) => {
            if !session.open_edit(&group_id) {
                return Flow::Print(format!("group {group_id} is not on this page"));
            }
        }
        ConsoleCommand::Save { name, description } => {
            if !session.panel().is_editing() {
                return Flow::Print("no form is open; use 'new' or 'edit'".to_string());
            }
            let draft = match session.panel().edit_target() {
                Some(group) => GroupDraft {
                    name,
                    description: description.or_else(|| group.description.clone()),
                    ..GroupDraft::for_group(group)
                },
                None => GroupDraft {
                    name,
                    description,
                    ..GroupDraft::default()
                },
            };
            session.save_group(draft);
        }
        ConsoleCommand::Cancel => session.close_edit(FormOutcome::Cancelled),
        ConsoleCommand::Delete(group_id) => session.remove(group_id),
        ConsoleCommand::Unbind {
            group_id,
            device_id,
        } => session.unbind_one(group_id, device_id),
        ConsoleCommand::UnbindAll(group_id) => session.unbind_all(group_id),
        ConsoleCommand::Device(device_id) => session.open_device_detail(device_id),
        ConsoleCommand::Close => session.close_device_detail(),
        ConsoleCommand::Devices { group_id, page } => {
            if !session.set_device_page(&group_id, page.saturating_sub(1)) {
                return Flow::Print(format!("group {group_id} is not on this page"));
            }
        }
        ConsoleCommand::Show => {}
        ConsoleCommand::Help => return Flow::Print(HELP.to_string()),
        ConsoleCommand::Quit => return Flow::Quit,
    }
    Flow::Continue
}
