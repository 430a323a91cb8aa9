//! Keyboard shortcuts for the description editor.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Backspace,
    Char(char),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        meta: false,
        shift: false,
        alt: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn platform(self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_ctrl(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers {
                ctrl: true,
                ..Modifiers::NONE
            },
        }
    }

    pub fn with_meta(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers {
                meta: true,
                ..Modifiers::NONE
            },
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EditCommand {
    Commit,
    Cancel,
    Insert(char),
    Newline,
    Backspace,
}

/// Maps a key press in the editor to a command. Platform-modified keys other
/// than Enter are left to the host (copy, paste, undo).
pub fn edit_command(input: KeyInput) -> Option<EditCommand> {
    match input.key {
        Key::Enter if input.modifiers.platform() => Some(EditCommand::Commit),
        Key::Enter => Some(EditCommand::Newline),
        Key::Escape => Some(EditCommand::Cancel),
        _ if input.modifiers.platform() => None,
        Key::Backspace => Some(EditCommand::Backspace),
        Key::Char(c) => Some(EditCommand::Insert(c)),
    }
}

/// Applies a text-editing command to `buffer`. Returns `false` for `Commit`
/// and `Cancel`, which the caller handles.
pub fn apply_to_buffer(buffer: &mut String, command: EditCommand) -> bool {
    match command {
        EditCommand::Insert(c) => buffer.push(c),
        EditCommand::Newline => buffer.push('\n'),
        EditCommand::Backspace => {
            buffer.pop();
        }
        EditCommand::Commit | EditCommand::Cancel => return false,
    }
    true
}
