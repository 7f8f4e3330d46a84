// Key map and classification of raw key events
//
// The keyboard hook delivers events for any key on the keyboard. Only the four
// drive keys mean anything here; everything else classifies as Ignored.

/// The four keys that drive the base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveKey {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
}

impl DriveKey {
    pub const ALL: [DriveKey; 4] = [
        DriveKey::Forward,
        DriveKey::Backward,
        DriveKey::TurnLeft,
        DriveKey::TurnRight,
    ];

    /// Key bound to this drive key
    pub fn binding(self) -> char {
        match self {
            DriveKey::Forward => 'w',
            DriveKey::Backward => 's',
            DriveKey::TurnLeft => 'a',
            DriveKey::TurnRight => 'd',
        }
    }

    pub(crate) fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Identifier of a physical key as reported by the keyboard hook
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyId {
    Char(char),
    /// Non-character keys (modifiers, function keys, Esc, arrows, ...)
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub action: KeyAction,
    pub id: KeyId,
}

impl RawKeyEvent {
    pub fn down(id: KeyId) -> Self {
        Self {
            action: KeyAction::Down,
            id,
        }
    }

    pub fn up(id: KeyId) -> Self {
        Self {
            action: KeyAction::Up,
            id,
        }
    }
}

/// Result of classifying a raw key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    Recognized(DriveKey),
    Ignored,
}

/// Map a raw key id onto a drive key.
///
/// Characters are ASCII case-folded so a press made with Shift held and a
/// release made after Shift was let go still name the same key.
pub fn classify(id: &KeyId) -> Classified {
    let KeyId::Char(c) = id else {
        return Classified::Ignored;
    };
    let c = c.to_ascii_lowercase();
    DriveKey::ALL
        .into_iter()
        .find(|key| key.binding() == c)
        .map_or(Classified::Ignored, Classified::Recognized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wasd_recognized() {
        assert_eq!(
            classify(&KeyId::Char('w')),
            Classified::Recognized(DriveKey::Forward)
        );
        assert_eq!(
            classify(&KeyId::Char('s')),
            Classified::Recognized(DriveKey::Backward)
        );
        assert_eq!(
            classify(&KeyId::Char('a')),
            Classified::Recognized(DriveKey::TurnLeft)
        );
        assert_eq!(
            classify(&KeyId::Char('d')),
            Classified::Recognized(DriveKey::TurnRight)
        );
    }

    #[test]
    fn test_uppercase_folds() {
        assert_eq!(
            classify(&KeyId::Char('W')),
            Classified::Recognized(DriveKey::Forward)
        );
    }

    #[test]
    fn test_other_keys_ignored() {
        assert_eq!(classify(&KeyId::Char('q')), Classified::Ignored);
        assert_eq!(classify(&KeyId::Char('1')), Classified::Ignored);
        assert_eq!(classify(&KeyId::Named("Shift".into())), Classified::Ignored);
        assert_eq!(classify(&KeyId::Named("Esc".into())), Classified::Ignored);
        assert_eq!(classify(&KeyId::Named("F5".into())), Classified::Ignored);
    }

    #[test]
    fn test_bits_are_distinct() {
        let all = DriveKey::ALL.iter().fold(0u8, |acc, k| {
            assert_eq!(acc & k.bit(), 0);
            acc | k.bit()
        });
        assert_eq!(all, 0b1111);
    }
}
