//! Virtual key codes, character tables and character resolution.
//!
//! Codes are macOS virtual key codes for the ANSI US layout. They identify
//! physical key positions, not the characters a layout assigns to them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyCode(pub u16);

/// Keys addressed by name rather than by the character they type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NamedKey {
    // Modifiers
    ShiftLeft,
    ShiftRight,
    CapsLock,
    ControlLeft,
    ControlRight,
    OptionLeft,
    OptionRight,
    CommandLeft,
    CommandRight,
    Function,

    // Control and navigation
    Tab,
    Escape,
    Delete,
    ForwardDelete,
    Return,
    Enter,
    Space,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    // Keypad digits
    Keypad0,
    Keypad1,
    Keypad2,
    Keypad3,
    Keypad4,
    Keypad5,
    Keypad6,
    Keypad7,
    Keypad8,
    Keypad9,
}

impl NamedKey {
    /// Generic shift, resolved to the right-hand key.
    pub const SHIFT: NamedKey = NamedKey::ShiftRight;
    /// Generic control, resolved to the right-hand key.
    pub const CONTROL: NamedKey = NamedKey::ControlRight;
    /// Generic option, resolved to the right-hand key.
    pub const OPTION: NamedKey = NamedKey::OptionRight;
    /// Generic command, resolved to the right-hand key.
    pub const COMMAND: NamedKey = NamedKey::CommandRight;

    /// Every named key, in declaration order.
    pub const ALL: [NamedKey; 47] = [
        NamedKey::ShiftLeft,
        NamedKey::ShiftRight,
        NamedKey::CapsLock,
        NamedKey::ControlLeft,
        NamedKey::ControlRight,
        NamedKey::OptionLeft,
        NamedKey::OptionRight,
        NamedKey::CommandLeft,
        NamedKey::CommandRight,
        NamedKey::Function,
        NamedKey::Tab,
        NamedKey::Escape,
        NamedKey::Delete,
        NamedKey::ForwardDelete,
        NamedKey::Return,
        NamedKey::Enter,
        NamedKey::Space,
        NamedKey::ArrowLeft,
        NamedKey::ArrowRight,
        NamedKey::ArrowUp,
        NamedKey::ArrowDown,
        NamedKey::Home,
        NamedKey::End,
        NamedKey::PageUp,
        NamedKey::PageDown,
        NamedKey::F1,
        NamedKey::F2,
        NamedKey::F3,
        NamedKey::F4,
        NamedKey::F5,
        NamedKey::F6,
        NamedKey::F7,
        NamedKey::F8,
        NamedKey::F9,
        NamedKey::F10,
        NamedKey::F11,
        NamedKey::F12,
        NamedKey::Keypad0,
        NamedKey::Keypad1,
        NamedKey::Keypad2,
        NamedKey::Keypad3,
        NamedKey::Keypad4,
        NamedKey::Keypad5,
        NamedKey::Keypad6,
        NamedKey::Keypad7,
        NamedKey::Keypad8,
        NamedKey::Keypad9,
    ];

    /// The physical key code for this key.
    pub const fn code(self) -> KeyCode {
        let code = match self {
            NamedKey::ShiftLeft => 56,
            NamedKey::ShiftRight => 60,
            NamedKey::CapsLock => 57,
            NamedKey::ControlLeft => 59,
            NamedKey::ControlRight => 62,
            NamedKey::OptionLeft => 58,
            NamedKey::OptionRight => 61,
            NamedKey::CommandLeft => 55,
            NamedKey::CommandRight => 54,
            NamedKey::Function => 63,
            NamedKey::Tab => 48,
            NamedKey::Escape => 53,
            NamedKey::Delete => 51,
            NamedKey::ForwardDelete => 117,
            NamedKey::Return => 36,
            NamedKey::Enter => 76,
            NamedKey::Space => 49,
            NamedKey::ArrowLeft => 123,
            NamedKey::ArrowRight => 124,
            NamedKey::ArrowUp => 126,
            NamedKey::ArrowDown => 125,
            NamedKey::Home => 115,
            NamedKey::End => 119,
            NamedKey::PageUp => 116,
            NamedKey::PageDown => 121,
            NamedKey::F1 => 122,
            NamedKey::F2 => 120,
            NamedKey::F3 => 99,
            NamedKey::F4 => 118,
            NamedKey::F5 => 96,
            NamedKey::F6 => 97,
            NamedKey::F7 => 98,
            NamedKey::F8 => 100,
            NamedKey::F9 => 101,
            NamedKey::F10 => 109,
            NamedKey::F11 => 103,
            NamedKey::F12 => 111,
            NamedKey::Keypad0 => 82,
            NamedKey::Keypad1 => 83,
            NamedKey::Keypad2 => 84,
            NamedKey::Keypad3 => 85,
            NamedKey::Keypad4 => 86,
            NamedKey::Keypad5 => 87,
            NamedKey::Keypad6 => 88,
            NamedKey::Keypad7 => 89,
            NamedKey::Keypad8 => 91,
            NamedKey::Keypad9 => 92,
        };
        KeyCode(code)
    }

    /// Look up the named key for a code.
    pub fn from_keycode(code: KeyCode) -> Option<NamedKey> {
        NamedKey::ALL.into_iter().find(|key| key.code() == code)
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            NamedKey::ShiftLeft
                | NamedKey::ShiftRight
                | NamedKey::CapsLock
                | NamedKey::ControlLeft
                | NamedKey::ControlRight
                | NamedKey::OptionLeft
                | NamedKey::OptionRight
                | NamedKey::CommandLeft
                | NamedKey::CommandRight
                | NamedKey::Function
        )
    }

    /// Check if this is a function key.
    pub fn is_function_key(&self) -> bool {
        matches!(
            self,
            NamedKey::F1
                | NamedKey::F2
                | NamedKey::F3
                | NamedKey::F4
                | NamedKey::F5
                | NamedKey::F6
                | NamedKey::F7
                | NamedKey::F8
                | NamedKey::F9
                | NamedKey::F10
                | NamedKey::F11
                | NamedKey::F12
        )
    }
}

/// Characters typed by each key without modifiers.
///
/// Values are unique; resolution scans in this order.
pub const UNSHIFTED: &[(KeyCode, char)] = &[
    (KeyCode(0), 'a'),
    (KeyCode(1), 's'),
    (KeyCode(2), 'd'),
    (KeyCode(3), 'f'),
    (KeyCode(4), 'h'),
    (KeyCode(5), 'g'),
    (KeyCode(6), 'z'),
    (KeyCode(7), 'x'),
    (KeyCode(8), 'c'),
    (KeyCode(9), 'v'),
    (KeyCode(11), 'b'),
    (KeyCode(12), 'q'),
    (KeyCode(13), 'w'),
    (KeyCode(14), 'e'),
    (KeyCode(15), 'r'),
    (KeyCode(16), 'y'),
    (KeyCode(17), 't'),
    (KeyCode(18), '1'),
    (KeyCode(19), '2'),
    (KeyCode(20), '3'),
    (KeyCode(21), '4'),
    (KeyCode(22), '6'),
    (KeyCode(23), '5'),
    (KeyCode(24), '='),
    (KeyCode(25), '9'),
    (KeyCode(26), '7'),
    (KeyCode(27), '-'),
    (KeyCode(28), '8'),
    (KeyCode(29), '0'),
    (KeyCode(30), ']'),
    (KeyCode(31), 'o'),
    (KeyCode(32), 'u'),
    (KeyCode(33), '['),
    (KeyCode(34), 'i'),
    (KeyCode(35), 'p'),
    (KeyCode(37), 'l'),
    (KeyCode(38), 'j'),
    (KeyCode(39), '\''),
    (KeyCode(40), 'k'),
    (KeyCode(41), ';'),
    (KeyCode(42), '\\'),
    (KeyCode(43), ','),
    (KeyCode(44), '/'),
    (KeyCode(45), 'n'),
    (KeyCode(46), 'm'),
    (KeyCode(47), '.'),
    (KeyCode(49), ' '),
    (KeyCode(50), '`'),
];

/// Characters that need shift, mapped to the base character of their key.
pub const SHIFTED: &[(char, char)] = &[
    ('~', '`'),
    ('!', '1'),
    ('@', '2'),
    ('#', '3'),
    ('$', '4'),
    ('%', '5'),
    ('^', '6'),
    ('&', '7'),
    ('*', '8'),
    ('(', '9'),
    (')', '0'),
    ('_', '-'),
    ('+', '='),
    ('{', '['),
    ('}', ']'),
    ('|', '\\'),
    (':', ';'),
    ('"', '\''),
    ('<', ','),
    ('>', '.'),
    ('?', '/'),
];

/// Input addressed to the keyboard: a character or a named key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A character, resolved through the layout tables.
    Char(char),
    /// A named key, used by code directly.
    Named(NamedKey),
}

impl From<char> for Symbol {
    fn from(c: char) -> Self {
        Symbol::Char(c)
    }
}

impl From<NamedKey> for Symbol {
    fn from(key: NamedKey) -> Self {
        Symbol::Named(key)
    }
}

/// A resolved key: the code to post and whether shift must accompany it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyStroke {
    /// Physical key.
    pub code: KeyCode,
    /// Whether the shift flag is required.
    pub shift: bool,
}

impl Symbol {
    /// Resolve to a key stroke. `None` means the character has no key.
    pub fn stroke(self) -> Option<KeyStroke> {
        match self {
            Symbol::Char(c) => resolve(c),
            Symbol::Named(key) => Some(KeyStroke {
                code: key.code(),
                shift: false,
            }),
        }
    }
}

/// Find the key (and shift state) that types `c`.
///
/// Shifted punctuation resolves through its base character; uppercase ASCII
/// letters resolve through their lowercase form. Shift never compounds.
pub fn resolve(c: char) -> Option<KeyStroke> {
    if let Some(&(_, base)) = SHIFTED.iter().find(|(shifted, _)| *shifted == c) {
        return resolve(base).map(|stroke| KeyStroke {
            code: stroke.code,
            shift: true,
        });
    }

    if c.is_ascii_uppercase() {
        return resolve(c.to_ascii_lowercase()).map(|stroke| KeyStroke {
            code: stroke.code,
            shift: true,
        });
    }

    UNSHIFTED
        .iter()
        .find(|(_, value)| *value == c)
        .map(|&(code, _)| KeyStroke { code, shift: false })
}

/// The character a key types without modifiers.
pub fn char_for(code: KeyCode) -> Option<char> {
    UNSHIFTED
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|&(_, c)| c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_unshifted_table_is_one_to_one() {
        let codes: HashSet<_> = UNSHIFTED.iter().map(|(code, _)| *code).collect();
        let chars: HashSet<_> = UNSHIFTED.iter().map(|(_, c)| *c).collect();
        assert_eq!(codes.len(), UNSHIFTED.len());
        assert_eq!(chars.len(), UNSHIFTED.len());
    }

    #[test]
    fn test_shifted_bases_exist_unshifted() {
        for (shifted, base) in SHIFTED {
            assert!(
                UNSHIFTED.iter().any(|(_, c)| c == base),
                "{shifted:?} maps to missing base {base:?}"
            );
        }
    }

    #[test]
    fn test_resolve_unshifted_characters() {
        for &(code, c) in UNSHIFTED {
            assert_eq!(resolve(c), Some(KeyStroke { code, shift: false }));
        }
    }

    #[test]
    fn test_resolve_shifted_characters() {
        for &(shifted, base) in SHIFTED {
            let stroke = resolve(shifted).unwrap();
            assert!(stroke.shift);
            assert_eq!(char_for(stroke.code), Some(base));
        }
    }

    #[test]
    fn test_resolve_uppercase_letters() {
        for upper in 'A'..='Z' {
            let lower = resolve(upper.to_ascii_lowercase()).unwrap();
            assert_eq!(
                resolve(upper),
                Some(KeyStroke {
                    code: lower.code,
                    shift: true
                })
            );
        }
    }

    #[test]
    fn test_resolve_unmapped() {
        assert_eq!(resolve('é'), None);
        assert_eq!(resolve('\n'), None);
        assert_eq!(resolve('€'), None);
        assert_eq!(resolve('Ω'), None);
    }

    #[test]
    fn test_digits_resolve_to_top_row() {
        assert_eq!(resolve('1').unwrap().code, KeyCode(18));
        assert_eq!(resolve('0').unwrap().code, KeyCode(29));
        assert_eq!(
            resolve('!').unwrap(),
            KeyStroke {
                code: KeyCode(18),
                shift: true
            }
        );
    }

    #[test]
    fn test_named_key_codes_unique_and_reversible() {
        let codes: HashSet<_> = NamedKey::ALL.iter().map(|key| key.code()).collect();
        assert_eq!(codes.len(), NamedKey::ALL.len());
        for key in NamedKey::ALL {
            assert_eq!(NamedKey::from_keycode(key.code()), Some(key));
        }
    }

    #[test]
    fn test_named_key_aliases() {
        assert_eq!(NamedKey::SHIFT, NamedKey::ShiftRight);
        assert_eq!(NamedKey::CONTROL.code(), KeyCode(62));
        assert_eq!(NamedKey::OPTION.code(), KeyCode(61));
        assert_eq!(NamedKey::COMMAND.code(), KeyCode(54));
        assert!(NamedKey::SHIFT.is_modifier());
        assert!(NamedKey::F12.is_function_key());
        assert!(!NamedKey::Tab.is_modifier());
    }

    #[test]
    fn test_symbol_strokes() {
        assert_eq!(
            Symbol::from(NamedKey::Return).stroke(),
            Some(KeyStroke {
                code: KeyCode(36),
                shift: false
            })
        );
        assert_eq!(Symbol::from('A').stroke().map(|s| s.shift), Some(true));
        assert_eq!(Symbol::from('ü').stroke(), None);
    }
}
