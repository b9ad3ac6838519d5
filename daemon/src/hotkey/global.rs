//! System-wide keyboard capture via rdev
//!
//! rdev reports platform-independent key identifiers; they are translated
//! to the virtual-key codes used by the key table. Keys rdev cannot
//! identify are dropped: their raw code is platform-specific (an X11
//! keycode on Linux) and would alias unrelated entries of the table.

use rdev::{Event, EventType, Key};
use tracing::warn;

use super::listener::{CaptureError, CaptureSource, EventSink, KeyEvent};
use crate::keys::{code_of, KeyCode};

/// Capture source backed by the OS keyboard hook
#[derive(Debug, Default)]
pub struct GlobalCapture;

impl CaptureSource for GlobalCapture {
    fn name(&self) -> &'static str {
        "global"
    }

    fn run(self: Box<Self>, sink: EventSink) -> Result<(), CaptureError> {
        // rdev::listen never returns on success; after shutdown the
        // callback just stops forwarding.
        rdev::listen(move |event: Event| {
            let key_event = match event.event_type {
                EventType::KeyPress(key) => virtual_key(key).map(KeyEvent::Down),
                EventType::KeyRelease(key) => virtual_key(key).map(KeyEvent::Up),
                _ => None,
            };
            if let Some(key_event) = key_event {
                if !sink.send(key_event) && !sink.is_closed() {
                    warn!("dropped key event");
                }
            }
        })
        .map_err(|e| CaptureError::Listen(format!("{e:?}")))
    }
}

fn virtual_key(key: Key) -> Option<KeyCode> {
    let name = match key {
        Key::ControlLeft => "ctrl",
        Key::ControlRight => "rctrl",
        Key::ShiftLeft => "shift",
        Key::ShiftRight => "rshift",
        Key::Alt => "alt",
        Key::AltGr => "ralt",
        Key::MetaLeft => "win",
        Key::MetaRight => "rwin",
        Key::Tab => "tab",
        Key::Return => "enter",
        Key::Escape => "esc",
        Key::Space => "space",
        Key::Backspace => "backspace",
        Key::LeftArrow => "left",
        Key::RightArrow => "right",
        Key::UpArrow => "up",
        Key::DownArrow => "down",
        Key::Num0 => "0",
        Key::Num1 => "1",
        Key::Num2 => "2",
        Key::Num3 => "3",
        Key::Num4 => "4",
        Key::Num5 => "5",
        Key::Num6 => "6",
        Key::Num7 => "7",
        Key::Num8 => "8",
        Key::Num9 => "9",
        Key::KeyA => "a",
        Key::KeyB => "b",
        Key::KeyC => "c",
        Key::KeyD => "d",
        Key::KeyE => "e",
        Key::KeyF => "f",
        Key::KeyG => "g",
        Key::KeyH => "h",
        Key::KeyI => "i",
        Key::KeyJ => "j",
        Key::KeyK => "k",
        Key::KeyL => "l",
        Key::KeyM => "m",
        Key::KeyN => "n",
        Key::KeyO => "o",
        Key::KeyP => "p",
        Key::KeyQ => "q",
        Key::KeyR => "r",
        Key::KeyS => "s",
        Key::KeyT => "t",
        Key::KeyU => "u",
        Key::KeyV => "v",
        Key::KeyW => "w",
        Key::KeyX => "x",
        Key::KeyY => "y",
        Key::KeyZ => "z",
        Key::F1 => "f1",
        Key::F2 => "f2",
        Key::F3 => "f3",
        Key::F4 => "f4",
        Key::F5 => "f5",
        Key::F6 => "f6",
        Key::F7 => "f7",
        Key::F8 => "f8",
        Key::F9 => "f9",
        Key::F10 => "f10",
        Key::F11 => "f11",
        Key::F12 => "f12",
        _ => return None,
    };
    code_of(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_translate_to_table_codes() {
        assert_eq!(virtual_key(Key::ControlLeft), Some(KeyCode(162)));
        assert_eq!(virtual_key(Key::ShiftRight), Some(KeyCode(161)));
        assert_eq!(virtual_key(Key::KeyC), Some(KeyCode(67)));
        assert_eq!(virtual_key(Key::F12), Some(KeyCode(123)));
    }

    #[test]
    fn test_unidentified_keys_are_dropped() {
        // X11 volume keys; as raw codes they would read as f10..f12
        assert_eq!(virtual_key(Key::Unknown(121)), None);
        assert_eq!(virtual_key(Key::Unknown(122)), None);
        assert_eq!(virtual_key(Key::Unknown(123)), None);
        // X11 codes that would alias the modifier range
        assert_eq!(virtual_key(Key::Unknown(162)), None);
        assert_eq!(virtual_key(Key::Unknown(70_000)), None);
        assert_eq!(virtual_key(Key::CapsLock), None);
    }
}
