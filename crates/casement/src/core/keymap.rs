//! Translation of keycodes to ASCII under the live modifier state.

use std::ops::Add;

use super::keycodes::*;

/// Modifier key state.
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Mods {
    /// Shift is active.
    pub shift: bool,
    /// Control is active.
    pub ctrl: bool,
    /// Alt is active.
    pub alt: bool,
}

impl Mods {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    /// Shift only.
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
    };

    /// Control only.
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
    };

    /// Derive modifier state from a key-pressed predicate.
    pub fn from_pressed(pressed: impl Fn(u32) -> bool) -> Self {
        Self {
            shift: pressed(KEY_LEFTSHIFT) || pressed(KEY_RIGHTSHIFT),
            ctrl: pressed(KEY_LEFTCTRL) || pressed(KEY_RIGHTCTRL),
            alt: pressed(KEY_LEFTALT) || pressed(KEY_RIGHTALT),
        }
    }
}

impl Add<Self> for Mods {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self {
            shift: self.shift || other.shift,
            ctrl: self.ctrl || other.ctrl,
            alt: self.alt || other.alt,
        }
    }
}

/// US layout: keycode, plain character, shifted character.
const LAYOUT: &[(u32, char, char)] = &[
    (KEY_1, '1', '!'),
    (KEY_2, '2', '@'),
    (KEY_3, '3', '#'),
    (KEY_4, '4', '$'),
    (KEY_5, '5', '%'),
    (KEY_6, '6', '^'),
    (KEY_7, '7', '&'),
    (KEY_8, '8', '*'),
    (KEY_9, '9', '('),
    (KEY_0, '0', ')'),
    (KEY_MINUS, '-', '_'),
    (KEY_EQUAL, '=', '+'),
    (KEY_BACKSPACE, '\x08', '\x08'),
    (KEY_TAB, '\t', '\t'),
    (KEY_Q, 'q', 'Q'),
    (KEY_W, 'w', 'W'),
    (KEY_E, 'e', 'E'),
    (KEY_R, 'r', 'R'),
    (KEY_T, 't', 'T'),
    (KEY_Y, 'y', 'Y'),
    (KEY_U, 'u', 'U'),
    (KEY_I, 'i', 'I'),
    (KEY_O, 'o', 'O'),
    (KEY_P, 'p', 'P'),
    (KEY_LEFTBRACE, '[', '{'),
    (KEY_RIGHTBRACE, ']', '}'),
    (KEY_ENTER, '\n', '\n'),
    (KEY_A, 'a', 'A'),
    (KEY_S, 's', 'S'),
    (KEY_D, 'd', 'D'),
    (KEY_F, 'f', 'F'),
    (KEY_G, 'g', 'G'),
    (KEY_H, 'h', 'H'),
    (KEY_J, 'j', 'J'),
    (KEY_K, 'k', 'K'),
    (KEY_L, 'l', 'L'),
    (KEY_SEMICOLON, ';', ':'),
    (KEY_APOSTROPHE, '\'', '"'),
    (KEY_GRAVE, '`', '~'),
    (KEY_BACKSLASH, '\\', '|'),
    (KEY_Z, 'z', 'Z'),
    (KEY_X, 'x', 'X'),
    (KEY_C, 'c', 'C'),
    (KEY_V, 'v', 'V'),
    (KEY_B, 'b', 'B'),
    (KEY_N, 'n', 'N'),
    (KEY_M, 'm', 'M'),
    (KEY_COMMA, ',', '<'),
    (KEY_DOT, '.', '>'),
    (KEY_SLASH, '/', '?'),
    (KEY_SPACE, ' ', ' '),
];

/// Translate a keycode to ASCII. Control combined with a letter yields the
/// matching control character; alt suppresses the translation.
pub fn ascii(code: u32, mods: Mods) -> Option<char> {
    if mods.alt {
        return None;
    }
    let &(_, plain, shifted) = LAYOUT.iter().find(|(c, _, _)| *c == code)?;
    if mods.ctrl {
        return plain
            .is_ascii_lowercase()
            .then(|| char::from(plain as u8 - b'a' + 1));
    }
    Some(if mods.shift { shifted } else { plain })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate() {
        assert_eq!(ascii(KEY_A, Mods::NONE), Some('a'));
        assert_eq!(ascii(KEY_A, Mods::SHIFT), Some('A'));
        assert_eq!(ascii(KEY_1, Mods::SHIFT), Some('!'));
        assert_eq!(ascii(KEY_C, Mods::CTRL), Some('\x03'));
        assert_eq!(ascii(KEY_1, Mods::CTRL), None);
        assert_eq!(
            ascii(
                KEY_A,
                Mods {
                    alt: true,
                    ..Mods::NONE
                }
            ),
            None
        );
        assert_eq!(ascii(KEY_LEFTSHIFT, Mods::NONE), None);
        assert_eq!(ascii(BTN_LEFT, Mods::NONE), None);
    }

    #[test]
    fn mods_from_table() {
        let pressed = [KEY_RIGHTSHIFT, KEY_LEFTCTRL];
        let m = Mods::from_pressed(|c| pressed.contains(&c));
        assert_eq!(m, Mods::SHIFT + Mods::CTRL);
    }
}
