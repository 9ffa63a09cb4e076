//! The command keyword vocabulary.
//!
//! Commands are recognized by which keywords appear, independent of order.
//! Every keyword has a dense index below 64 so a whole sentence's keyword
//! set fits in one `u64`.

/// A recognized command keyword (or the catch-all classes at the end).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Keyword {
    Nothing,
    Skip,
    Defer,
    To,
    Lower,
    Layer,
    Change,
    Replace,
    Profile,
    Edit,
    Layout,
    Config,
    File,
    Close,
    App,
    Lock,
    Move,
    Turn,
    Strafe,
    Look,
    Mouse,
    Wheel,
    Add,
    Remove,
    Hold,
    Toggle,
    Force,
    Reset,
    Confirm,
    Menu,
    Back,
    Default,
    Set,
    Last,
    Repeat,
    Prev,
    Next,
    Hotspot,
    Select,
    Left,
    Right,
    Up,
    Down,
    Wrap,
    NoWrap,
    Stepped,
    Smooth,
    Jump,
    With,
    /// Connective noise ("the", "and", ...).
    Filler,
    /// Skippable, but usable as a name when no unknown word exists.
    Ignored,
    /// "temp"/"temporary" marker for variable assignment.
    Temp,
    /// A literal integer (repeat count, wheel steps).
    Integer,
    /// Not in the vocabulary: a candidate entity name.
    Unknown,
}

impl Keyword {
    #[must_use]
    pub(crate) fn bit(self) -> u64 {
        1u64 << (self as u8)
    }
}

/// A set of keywords as a bit mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct KeywordSet(pub u64);

impl KeywordSet {
    pub(crate) fn insert(&mut self, kw: Keyword) {
        self.0 |= kw.bit();
    }

    #[must_use]
    pub(crate) fn contains(self, kw: Keyword) -> bool {
        self.0 & kw.bit() != 0
    }

    #[must_use]
    pub(crate) fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// True when every member of `self` is in `allowed`.
    #[must_use]
    pub(crate) fn within(self, allowed: KeywordSet) -> bool {
        self.0 & !allowed.0 == 0
    }
}

/// Builds a [`KeywordSet`] from a list.
pub(crate) fn set_of(kws: &[Keyword]) -> KeywordSet {
    let mut s = KeywordSet::default();
    for &kw in kws {
        s.insert(kw);
    }
    s
}

/// Classification of one word, after folding direction+wrap suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WordClass {
    pub keyword: Keyword,
    /// A second keyword for joined diagonals ("UpLeft" sets Up and Left).
    pub extra: Option<Keyword>,
    /// Wrap flag carried by a fused suffix ("LeftWrap", "DownNoWrap").
    pub wrap: Option<bool>,
}

impl WordClass {
    fn plain(keyword: Keyword) -> Self {
        Self {
            keyword,
            extra: None,
            wrap: None,
        }
    }
}

/// Classifies a single sanitized word.
#[must_use]
pub(crate) fn classify(word: &str) -> WordClass {
    let lower = word.to_ascii_lowercase();

    // Fused direction + wrap suffix ("leftwrap", "upnowrap").
    for (base, kw) in [
        ("left", Keyword::Left),
        ("right", Keyword::Right),
        ("up", Keyword::Up),
        ("down", Keyword::Down),
    ] {
        if let Some(rest) = lower.strip_prefix(base) {
            match rest {
                "" => return WordClass::plain(kw),
                "wrap" => {
                    return WordClass {
                        keyword: kw,
                        extra: None,
                        wrap: Some(true),
                    };
                }
                "nowrap" => {
                    return WordClass {
                        keyword: kw,
                        extra: None,
                        wrap: Some(false),
                    };
                }
                _ => {}
            }
        }
    }

    // Joined diagonals.
    let diagonal = match lower.as_str() {
        "upleft" | "leftup" => Some((Keyword::Up, Keyword::Left)),
        "upright" | "rightup" => Some((Keyword::Up, Keyword::Right)),
        "downleft" | "leftdown" => Some((Keyword::Down, Keyword::Left)),
        "downright" | "rightdown" => Some((Keyword::Down, Keyword::Right)),
        _ => None,
    };
    if let Some((a, b)) = diagonal {
        return WordClass {
            keyword: a,
            extra: Some(b),
            wrap: None,
        };
    }

    if lower.bytes().all(|b| b.is_ascii_digit()) && !lower.is_empty() {
        return WordClass::plain(Keyword::Integer);
    }

    let kw = match lower.as_str() {
        "nothing" => Keyword::Nothing,
        "skip" | "empty" | "null" | "blank" | "none" => Keyword::Skip,
        "defer" => Keyword::Defer,
        "to" => Keyword::To,
        "lower" => Keyword::Lower,
        "layer" | "layers" => Keyword::Layer,
        "change" => Keyword::Change,
        "replace" => Keyword::Replace,
        "profile" => Keyword::Profile,
        "edit" => Keyword::Edit,
        "layout" => Keyword::Layout,
        "config" | "configuration" => Keyword::Config,
        "file" => Keyword::File,
        "close" => Keyword::Close,
        "app" | "application" => Keyword::App,
        "lock" => Keyword::Lock,
        "move" | "movement" => Keyword::Move,
        "turn" => Keyword::Turn,
        "strafe" => Keyword::Strafe,
        "look" => Keyword::Look,
        "mouse" | "cursor" => Keyword::Mouse,
        "wheel" => Keyword::Wheel,
        "add" => Keyword::Add,
        "remove" => Keyword::Remove,
        "hold" => Keyword::Hold,
        "toggle" => Keyword::Toggle,
        "force" | "forced" => Keyword::Force,
        "reset" => Keyword::Reset,
        "confirm" => Keyword::Confirm,
        "menu" => Keyword::Menu,
        "back" => Keyword::Back,
        "default" | "defaults" => Keyword::Default,
        "set" => Keyword::Set,
        "last" => Keyword::Last,
        "repeat" => Keyword::Repeat,
        "prev" | "previous" => Keyword::Prev,
        "next" => Keyword::Next,
        "hotspot" | "hotspots" => Keyword::Hotspot,
        "select" => Keyword::Select,
        "wrap" => Keyword::Wrap,
        "nowrap" => Keyword::NoWrap,
        "stepped" | "step" => Keyword::Stepped,
        "smooth" => Keyword::Smooth,
        "jump" => Keyword::Jump,
        "with" => Keyword::With,
        "the" | "this" | "a" | "an" | "of" | "on" | "in" | "for" | "and" | "it" => Keyword::Filler,
        "key" | "bind" | "button" | "item" => Keyword::Ignored,
        "temp" | "temporary" | "temporarily" => Keyword::Temp,
        _ => Keyword::Unknown,
    };
    WordClass::plain(kw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("REPLACE").keyword, Keyword::Replace);
        assert_eq!(classify("Replace").keyword, Keyword::Replace);
    }

    #[test]
    fn test_fused_wrap_suffix() {
        let c = classify("LeftWrap");
        assert_eq!(c.keyword, Keyword::Left);
        assert_eq!(c.wrap, Some(true));
        let c = classify("downnowrap");
        assert_eq!(c.keyword, Keyword::Down);
        assert_eq!(c.wrap, Some(false));
    }

    #[test]
    fn test_joined_diagonal() {
        let c = classify("UpLeft");
        assert_eq!(c.keyword, Keyword::Up);
        assert_eq!(c.extra, Some(Keyword::Left));
    }

    #[test]
    fn test_integer_and_unknown() {
        assert_eq!(classify("42").keyword, Keyword::Integer);
        assert_eq!(classify("MyLayerName").keyword, Keyword::Unknown);
    }

    #[test]
    fn test_keyword_set_within() {
        let found = set_of(&[Keyword::Defer, Keyword::To, Keyword::Lower]);
        let allowed = set_of(&[
            Keyword::Defer,
            Keyword::To,
            Keyword::Lower,
            Keyword::Layer,
        ]);
        assert!(found.within(allowed));
        assert!(!allowed.within(found));
    }
}
