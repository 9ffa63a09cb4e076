//! The sentence parser: free-form profile strings to [`Command`]s.
//!
//! Recognition is first-match-wins over a fixed strategy: chat macros, key
//! combos, cycle names, variable assignment, keyword-driven special
//! commands, special movement binds, key-bind names, and finally encoded key
//! sequences. Anything unrecognized is reported and demoted to
//! [`Command::DoNothing`] so consumers never observe an invalid command.

use padmux_core::{CycleId, Dir4, Dir8, HotspotId, KeyBindId, LayerId, MenuId, StringId, VariableId};

use crate::command::{Command, WheelMotion};
use crate::keys::names_to_combo;
use crate::vkseq::encode_sequence;
use crate::words::{Keyword, KeywordSet, classify, set_of};

/// Context flags for where the command string came from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseFlags {
    /// Layer-stack commands (defer, remove-layer) are only legal on buttons.
    pub allow_button_actions: bool,
    /// Hold-layer commands are only legal on press-phase button actions.
    pub allow_hold_actions: bool,
    /// The string is assigned to a multi-directional input.
    pub allow_4dir_actions: bool,
}

/// Name resolution and interning services supplied by the input map.
pub trait ParseContext {
    fn hotspot_id(&self, name: &str) -> Option<HotspotId>;
    fn keybind_id(&self, name: &str) -> Option<KeyBindId>;
    /// Commands for the reserved movement bind names (MoveF, TurnL, ...).
    fn special_movement_command(&self, name: &str) -> Option<Command>;
    fn cycle_id(&self, name: &str) -> Option<CycleId>;
    fn layer_id(&self, name: &str) -> Option<LayerId>;
    fn menu_id(&self, name: &str) -> Option<MenuId>;
    fn variable_id(&self, name: &str) -> Option<VariableId>;
    /// Interns a byte string (key sequences, chat text) and returns its ID.
    fn intern_bytes(&mut self, bytes: &[u8]) -> StringId;
    /// Records a recoverable parse/reference error.
    fn report_error(&mut self, message: String);

    fn intern_str(&mut self, text: &str) -> StringId {
        self.intern_bytes(text.as_bytes())
    }
}

/// Splits a property value into sanitized words: whitespace- and
/// comma-separated, with wrapping quotes and brackets stripped.
#[must_use]
pub fn split_into_words(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .map(|w| w.trim_matches(|c: char| matches!(c, '"' | '\'' | '(' | ')' | '[' | ']')))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Sentence analysis ───────────────────────────────────────────────

#[derive(Debug, Default)]
struct Sentence {
    found: KeywordSet,
    unknowns: Vec<usize>,
    integer: Option<usize>,
    ignored: Option<usize>,
    second_layer: Option<usize>,
    wrap: bool,
    wrap_specified: bool,
    count: i16,
    rejected: bool,
}

impl Sentence {
    fn analyze(words: &[String]) -> Sentence {
        let mut s = Sentence {
            count: 1,
            ..Sentence::default()
        };
        let mut with_allows_second = false;
        for (i, word) in words.iter().enumerate() {
            let class = classify(word);
            if let Some(wrap) = class.wrap {
                s.wrap = wrap;
                s.wrap_specified = true;
            }
            match class.keyword {
                Keyword::Filler | Keyword::To => {}
                Keyword::With => {
                    // "Replace <a> with <b>": the word after "with" is the
                    // one context where a second name is legal.
                    if i + 1 < words.len() && s.found.contains(Keyword::Replace) {
                        s.second_layer = Some(i + 1);
                        with_allows_second = true;
                    }
                }
                Keyword::Ignored | Keyword::Temp => {
                    s.ignored = Some(i);
                    if class.keyword == Keyword::Temp {
                        s.found.insert(Keyword::Temp);
                    }
                }
                Keyword::Wrap => {
                    s.wrap = true;
                    s.wrap_specified = true;
                    s.ignored = Some(i);
                }
                Keyword::NoWrap => {
                    s.wrap = false;
                    s.wrap_specified = true;
                    s.ignored = Some(i);
                }
                Keyword::Integer => {
                    if s.integer.is_some() {
                        s.rejected = true;
                    }
                    s.integer = Some(i);
                    s.count = word.parse::<i32>().unwrap_or(1).clamp(1, 0x7FFF) as i16;
                    s.found.insert(Keyword::Integer);
                }
                Keyword::Unknown => {
                    s.unknowns.push(i);
                    let allowed_extra = usize::from(with_allows_second);
                    if s.unknowns.len() > 1 + allowed_extra {
                        s.rejected = true;
                    }
                    s.found.insert(Keyword::Unknown);
                }
                kw => {
                    s.found.insert(kw);
                    if let Some(extra) = class.extra {
                        s.found.insert(extra);
                    }
                }
            }
        }
        // With no real unknown word, an otherwise-skippable word may serve
        // as the entity name ("Toggle Wrap" toggles a layer named Wrap).
        if s.unknowns.is_empty()
            && let Some(ignored) = s.ignored
        {
            s.unknowns.push(ignored);
        }
        s
    }

    fn has(&self, kw: Keyword) -> bool {
        self.found.contains(kw)
    }

    fn dir_flags(&self) -> (bool, bool, bool, bool) {
        (
            self.has(Keyword::Left),
            self.has(Keyword::Right),
            self.has(Keyword::Up),
            self.has(Keyword::Down),
        )
    }

    fn dir4(&self) -> Option<Dir4> {
        match self.dir_flags() {
            (true, false, false, false) => Some(Dir4::Left),
            (false, true, false, false) => Some(Dir4::Right),
            (false, false, true, false) => Some(Dir4::Up),
            (false, false, false, true) => Some(Dir4::Down),
            _ => None,
        }
    }

    fn dir8(&self) -> Option<Dir8> {
        match self.dir_flags() {
            (true, false, false, false) => Some(Dir8::Left),
            (false, true, false, false) => Some(Dir8::Right),
            (false, false, true, false) => Some(Dir8::Up),
            (false, false, false, true) => Some(Dir8::Down),
            (true, false, true, false) => Some(Dir8::UpLeft),
            (false, true, true, false) => Some(Dir8::UpRight),
            (true, false, false, true) => Some(Dir8::DownLeft),
            (false, true, false, true) => Some(Dir8::DownRight),
            _ => None,
        }
    }

    fn has_any_dir(&self) -> bool {
        let (l, r, u, d) = self.dir_flags();
        l || r || u || d
    }

    fn unknown_word<'w>(&self, words: &'w [String]) -> Option<&'w str> {
        self.unknowns
            .iter()
            .find(|&&i| Some(i) != self.second_layer)
            .map(|&i| words[i].as_str())
    }
}

const DIRS: [Keyword; 4] = [Keyword::Left, Keyword::Right, Keyword::Up, Keyword::Down];

fn with_dirs(base: &[Keyword]) -> KeywordSet {
    let mut s = set_of(base);
    for d in DIRS {
        s.insert(d);
    }
    s
}

// ── Special (keyword-driven) commands ───────────────────────────────

/// Tries to recognize a keyword-driven command. Returns `None` when the words
/// match no pattern (the caller falls through to key binds / sequences), and
/// `Some(Command::Invalid)` when a pattern matched but a name failed to
/// resolve (already reported).
#[allow(clippy::too_many_lines)]
fn special_command(
    words: &[String],
    flags: ParseFlags,
    ctx: &mut dyn ParseContext,
) -> Option<Command> {
    if words.is_empty() {
        return None;
    }
    // Single words are normally entity names or keys, not commands; the
    // exceptions are the inert words and directional templates assigned to
    // multi-directional inputs.
    if words.len() == 1 {
        match classify(&words[0]).keyword {
            Keyword::Nothing | Keyword::Skip => {}
            Keyword::Defer if flags.allow_button_actions => {}
            Keyword::Move
            | Keyword::Turn
            | Keyword::Strafe
            | Keyword::Look
            | Keyword::Mouse
            | Keyword::Wheel
                if flags.allow_4dir_actions => {}
            _ => return None,
        }
    }

    let s = Sentence::analyze(words);
    if s.rejected {
        ctx.report_error(format!("ambiguous repeated words in command '{}'", words.join(" ")));
        return Some(Command::Invalid);
    }
    if s.found == KeywordSet::default() {
        return None;
    }

    // "= Skip" / "= Nothing"
    if s.has(Keyword::Skip) && s.found.count() == 1 {
        return Some(Command::Empty);
    }
    if s.has(Keyword::Nothing) && s.found.count() == 1 {
        return Some(Command::DoNothing);
    }

    // "= Defer [to] [lower] [layers]"
    if flags.allow_button_actions
        && s.has(Keyword::Defer)
        && s.found.within(set_of(&[Keyword::Defer, Keyword::Lower, Keyword::Layer]))
    {
        return Some(Command::Defer);
    }

    // "= [Change] Profile"
    if s.has(Keyword::Profile)
        && s.found.within(set_of(&[Keyword::Change, Keyword::Replace, Keyword::Profile]))
    {
        return Some(Command::ChangeProfile);
    }

    // "= [Edit] Layout"
    if s.has(Keyword::Layout)
        && s.found.within(set_of(&[Keyword::Change, Keyword::Edit, Keyword::Layout]))
    {
        return Some(Command::EditLayout);
    }

    // "= [Change] Config [File]"
    if s.has(Keyword::Config)
        && s.found.within(set_of(&[
            Keyword::Change,
            Keyword::Edit,
            Keyword::Config,
            Keyword::File,
        ]))
    {
        return Some(Command::ChangeTargetConfigSyncFile);
    }

    // "= Close App"
    if s.has(Keyword::Close) && s.has(Keyword::App) && s.found.count() == 2 {
        return Some(Command::QuitApp);
    }

    // "= Lock Movement"
    if s.has(Keyword::Lock) && s.has(Keyword::Move) && s.found.count() == 2 {
        return Some(Command::StartAutoRun { multi_dir: true });
    }

    // "= Move Mouse|Cursor to <hotspot>"
    if s.has(Keyword::Move)
        && s.has(Keyword::Mouse)
        && !s.has_any_dir()
        && s.has(Keyword::Unknown)
        && s.found.within(set_of(&[Keyword::Move, Keyword::Mouse, Keyword::Unknown]))
    {
        let name = s.unknown_word(words).expect("unknown present");
        return Some(match ctx.hotspot_id(name) {
            Some(hotspot) if hotspot.0 != 0 => Command::MoveMouseToHotspot { hotspot },
            _ => {
                ctx.report_error(format!("hotspot '{name}' not found"));
                Command::Invalid
            }
        });
    }

    // "= [Force] Remove [Layer]" with no name: remove the calling layer.
    if flags.allow_button_actions
        && s.has(Keyword::Remove)
        && s.found.within(set_of(&[Keyword::Remove, Keyword::Layer, Keyword::Force]))
    {
        return Some(Command::RemoveControlsLayer {
            layer: LayerId(0),
            forced: s.has(Keyword::Force),
        });
    }

    // Layer operations carrying a layer name.
    let layer_ops = set_of(&[
        Keyword::Layer,
        Keyword::Add,
        Keyword::Remove,
        Keyword::Hold,
        Keyword::Toggle,
        Keyword::Replace,
        Keyword::Force,
        Keyword::Unknown,
    ]);
    if s.has(Keyword::Unknown)
        && (s.has(Keyword::Add)
            || s.has(Keyword::Remove)
            || s.has(Keyword::Hold)
            || s.has(Keyword::Toggle)
            || s.has(Keyword::Replace))
        && s.found.within(layer_ops)
    {
        let name = s.unknown_word(words).expect("unknown present");
        let Some(layer) = ctx.layer_id(name) else {
            ctx.report_error(format!("layer '{name}' not found"));
            return Some(Command::Invalid);
        };
        if s.has(Keyword::Replace) {
            let Some(second_idx) = s.second_layer else {
                ctx.report_error("replace layer requires 'with <layer>'".to_string());
                return Some(Command::Invalid);
            };
            let second = &words[second_idx];
            let Some(new) = ctx.layer_id(second) else {
                ctx.report_error(format!("layer '{second}' not found"));
                return Some(Command::Invalid);
            };
            return Some(Command::ReplaceControlsLayer { old: layer, new });
        }
        if s.has(Keyword::Remove) {
            return Some(Command::RemoveControlsLayer {
                layer,
                forced: s.has(Keyword::Force),
            });
        }
        if s.has(Keyword::Hold) {
            if !flags.allow_hold_actions {
                ctx.report_error("hold layer is only valid as a press action".to_string());
                return Some(Command::Invalid);
            }
            return Some(Command::HoldControlsLayer { layer });
        }
        if s.has(Keyword::Toggle) {
            return Some(Command::ToggleControlsLayer { layer });
        }
        return Some(Command::AddControlsLayer { layer });
    }

    // "Set <cycle> Default to Last"
    if s.has(Keyword::Set)
        && s.has(Keyword::Default)
        && s.has(Keyword::Last)
        && s.has(Keyword::Unknown)
        && s.found.within(set_of(&[
            Keyword::Set,
            Keyword::Default,
            Keyword::Last,
            Keyword::Unknown,
        ]))
    {
        let name = s.unknown_word(words).expect("unknown present");
        return Some(match ctx.cycle_id(name) {
            Some(cycle) => Command::KeyBindCycleSetDefault { cycle },
            None => {
                ctx.report_error(format!("key bind cycle '{name}' not found"));
                Command::Invalid
            }
        });
    }

    // "Reset <menu> [to Default]" / "Reset <cycle>"
    if s.has(Keyword::Reset)
        && s.has(Keyword::Unknown)
        && s.found.within(set_of(&[
            Keyword::Reset,
            Keyword::Default,
            Keyword::Menu,
            Keyword::Unknown,
        ]))
    {
        let name = s.unknown_word(words).expect("unknown present");
        if let Some(menu) = ctx.menu_id(name) {
            return Some(Command::MenuReset { menu });
        }
        if let Some(cycle) = ctx.cycle_id(name) {
            return Some(Command::KeyBindCycleReset { cycle });
        }
        ctx.report_error(format!("'{name}' is neither a menu nor a key bind cycle"));
        return Some(Command::Invalid);
    }

    // "Confirm <menu> [and Close]"
    if s.has(Keyword::Confirm)
        && s.has(Keyword::Unknown)
        && s.found.within(set_of(&[
            Keyword::Confirm,
            Keyword::Menu,
            Keyword::Close,
            Keyword::Unknown,
        ]))
    {
        let name = s.unknown_word(words).expect("unknown present");
        return Some(match ctx.menu_id(name) {
            Some(menu) => Command::MenuConfirm {
                menu,
                close: s.has(Keyword::Close),
            },
            None => {
                ctx.report_error(format!("menu '{name}' not found"));
                Command::Invalid
            }
        });
    }

    // "Edit <menu> [<dir>]"
    if s.has(Keyword::Edit)
        && s.has(Keyword::Unknown)
        && s.found.within(with_dirs(&[Keyword::Edit, Keyword::Menu, Keyword::Unknown]))
    {
        let name = s.unknown_word(words).expect("unknown present");
        return Some(match ctx.menu_id(name) {
            Some(menu) => Command::MenuEdit {
                menu,
                dir: s.dir4(),
            },
            None => {
                ctx.report_error(format!("menu '{name}' not found"));
                Command::Invalid
            }
        });
    }

    // "Menu <menu> Back"
    if s.has(Keyword::Back)
        && s.has(Keyword::Unknown)
        && s.found.within(set_of(&[Keyword::Menu, Keyword::Back, Keyword::Unknown]))
    {
        let name = s.unknown_word(words).expect("unknown present");
        return Some(match ctx.menu_id(name) {
            Some(menu) => Command::MenuBack { menu },
            None => {
                ctx.report_error(format!("menu '{name}' not found"));
                Command::Invalid
            }
        });
    }

    // "Close <menu>"
    if s.has(Keyword::Close)
        && s.has(Keyword::Unknown)
        && s.found.within(set_of(&[Keyword::Close, Keyword::Menu, Keyword::Unknown]))
    {
        let name = s.unknown_word(words).expect("unknown present");
        return Some(match ctx.menu_id(name) {
            Some(menu) => Command::MenuClose { menu },
            None => {
                ctx.report_error(format!("menu '{name}' not found"));
                Command::Invalid
            }
        });
    }

    // "<cycle> Repeat|Last"
    if (s.has(Keyword::Repeat) || s.has(Keyword::Last))
        && s.has(Keyword::Unknown)
        && s.found.within(set_of(&[Keyword::Repeat, Keyword::Last, Keyword::Unknown]))
    {
        let name = s.unknown_word(words).expect("unknown present");
        return Some(match ctx.cycle_id(name) {
            Some(cycle) => Command::KeyBindCycleLast { cycle },
            None => {
                ctx.report_error(format!("key bind cycle '{name}' not found"));
                Command::Invalid
            }
        });
    }

    // "<cycle> Prev|Next [Wrap|NoWrap] [N]"
    if (s.has(Keyword::Prev) || s.has(Keyword::Next))
        && s.has(Keyword::Unknown)
        && s.found.within(set_of(&[
            Keyword::Prev,
            Keyword::Next,
            Keyword::Integer,
            Keyword::Unknown,
        ]))
    {
        let name = s.unknown_word(words).expect("unknown present");
        let Some(cycle) = ctx.cycle_id(name) else {
            ctx.report_error(format!("key bind cycle '{name}' not found"));
            return Some(Command::Invalid);
        };
        return Some(if s.has(Keyword::Prev) {
            Command::KeyBindCyclePrev {
                cycle,
                wrap: s.wrap,
                count: s.count,
            }
        } else {
            Command::KeyBindCycleNext {
                cycle,
                wrap: s.wrap,
                count: s.count,
            }
        });
    }

    // "[Select] <menu> <dir> [Wrap|NoWrap] [and Close]"
    if s.has(Keyword::Unknown)
        && s.dir4().is_some()
        && s.found.within(with_dirs(&[
            Keyword::Select,
            Keyword::Menu,
            Keyword::Close,
            Keyword::Unknown,
        ]))
    {
        let name = s.unknown_word(words).expect("unknown present");
        if let Some(menu) = ctx.menu_id(name) {
            return Some(Command::MenuSelect {
                menu,
                dir: s.dir4().expect("checked"),
                wrap: s.wrap,
                and_close: s.has(Keyword::Close),
            });
        }
        // A cycle name with a bare direction is not a command; fall through
        // so the words can still match a key sequence.
        return None;
    }

    // "Hotspot <dir>"
    if s.has(Keyword::Hotspot)
        && s.dir8().is_some()
        && s.found.within(with_dirs(&[Keyword::Hotspot, Keyword::Select, Keyword::Mouse]))
    {
        return Some(Command::HotspotSelect {
            dir: s.dir8().expect("checked"),
            wrap: s.wrap,
        });
    }

    // "Move|Turn <dir>" / "Strafe <dir>" / "Look <dir>"
    if s.has(Keyword::Turn)
        && s.dir4().is_some()
        && s.found.within(with_dirs(&[Keyword::Move, Keyword::Turn]))
    {
        return Some(Command::MoveTurn {
            dir: s.dir4().expect("checked"),
        });
    }
    if s.has(Keyword::Strafe)
        && s.dir4().is_some()
        && s.found.within(with_dirs(&[Keyword::Move, Keyword::Strafe]))
    {
        return Some(Command::MoveStrafe {
            dir: s.dir4().expect("checked"),
        });
    }
    if s.has(Keyword::Look)
        && s.dir4().is_some()
        && s.found.within(with_dirs(&[Keyword::Move, Keyword::Look]))
    {
        return Some(Command::MoveLook {
            dir: s.dir4().expect("checked"),
        });
    }
    if s.has(Keyword::Move)
        && !s.has(Keyword::Mouse)
        && !s.has(Keyword::Wheel)
        && s.dir4().is_some()
        && s.found.within(with_dirs(&[Keyword::Move]))
    {
        return Some(Command::MoveTurn {
            dir: s.dir4().expect("checked"),
        });
    }

    // "[Move] [Mouse] Wheel [Stepped|Smooth|Jump] [N] <dir>"
    if s.has(Keyword::Wheel)
        && s.dir4().is_some()
        && s.found.within(with_dirs(&[
            Keyword::Move,
            Keyword::Mouse,
            Keyword::Wheel,
            Keyword::Stepped,
            Keyword::Smooth,
            Keyword::Jump,
            Keyword::Integer,
        ]))
    {
        let motion = if s.has(Keyword::Smooth) {
            WheelMotion::Smooth
        } else if s.has(Keyword::Jump) {
            WheelMotion::Jump
        } else {
            WheelMotion::Stepped
        };
        return Some(Command::MouseWheel {
            dir: s.dir4().expect("checked"),
            motion,
            count: s.count,
        });
    }

    // "[Move] Mouse <dir>"
    if s.has(Keyword::Mouse)
        && s.dir8().is_some()
        && s.found.within(with_dirs(&[Keyword::Move, Keyword::Mouse]))
    {
        return Some(Command::MoveMouse {
            dir: s.dir8().expect("checked"),
        });
    }

    None
}

// ── Variable assignment ─────────────────────────────────────────────

/// Recognizes `Set [temp] <var> to <text...>`.
fn parse_set_variable(ctx: &mut dyn ParseContext, words: &[String]) -> Option<Command> {
    if words.len() < 2 || classify(&words[0]).keyword != Keyword::Set {
        return None;
    }
    let mut idx = 1;
    let temporary = classify(&words[idx]).keyword == Keyword::Temp;
    if temporary {
        idx += 1;
    }
    let name = words.get(idx)?;
    // "Set X Default to Last" belongs to the cycle grammar.
    if words[idx..]
        .iter()
        .any(|w| classify(w).keyword == Keyword::Default)
    {
        return None;
    }
    let variable = ctx.variable_id(name)?;
    idx += 1;
    if words.get(idx).map(|w| classify(w).keyword) == Some(Keyword::To) {
        idx += 1;
    }
    let value = words[idx..].join(" ");
    let string = ctx.intern_str(&value);
    Some(Command::SetVariable {
        variable,
        string,
        temporary,
    })
}

// ── Chat macros ─────────────────────────────────────────────────────

/// Parses a chat-box macro (leading `/` or `>`), folding `\n` continuations
/// into carriage-return-separated lines, each opened with `>` as needed.
fn parse_chat_macro(ctx: &mut dyn ParseContext, text: &str) -> Command {
    if text.len() <= 1 {
        return Command::DoNothing;
    }
    // A `/` right after the raw-text marker is redundant.
    let mut first = true;
    let mut out = String::with_capacity(text.len() + 4);
    for part in text.split("\\n") {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if first {
            if let Some(rest) = part.strip_prefix(">/") {
                out.push('>');
                out.push_str(rest);
            } else {
                out.push_str(part);
            }
            first = false;
        } else {
            if !part.starts_with('>') {
                out.push('>');
            }
            out.push_str(part);
        }
        out.push('\r');
    }
    if out.is_empty() {
        return Command::DoNothing;
    }
    let string = ctx.intern_str(&out);
    Command::ChatBoxString { string }
}

// ── Entry points ────────────────────────────────────────────────────

/// Parses a full command string.
///
/// Never returns [`Command::Invalid`]: unrecognizable strings are reported
/// through the context and demoted to [`Command::DoNothing`].
pub fn parse_command(ctx: &mut dyn ParseContext, text: &str, flags: ParseFlags) -> Command {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    if trimmed.starts_with('/') || trimmed.starts_with('>') {
        return parse_chat_macro(ctx, trimmed);
    }

    let words = split_into_words(trimmed);
    if words.is_empty() {
        return Command::Empty;
    }

    if let Some(combo) = names_to_combo(&words) {
        return Command::TapKey { combo };
    }

    if let Some(cycle) = ctx.cycle_id(trimmed) {
        return Command::KeyBindCycleNext {
            cycle,
            wrap: true,
            count: 1,
        };
    }

    if let Some(cmd) = parse_set_variable(ctx, &words) {
        return cmd;
    }

    if let Some(cmd) = special_command(&words, flags, ctx) {
        if cmd == Command::Invalid {
            return Command::DoNothing;
        }
        return cmd;
    }

    if let Some(cmd) = ctx.special_movement_command(trimmed) {
        return cmd;
    }

    if let Some(bind) = ctx.keybind_id(trimmed) {
        return Command::TriggerKeyBind { bind };
    }

    if let Some(seq) = encode_sequence(&words, ctx) {
        let string = ctx.intern_bytes(&seq);
        return Command::VkSequence { string };
    }

    ctx.report_error(format!("unrecognized command '{trimmed}'"));
    Command::DoNothing
}

/// Parses a key-bind value: key binds hold direct input only (chat macros,
/// key taps, other binds, sequences), never special commands.
pub fn parse_keybind_command(ctx: &mut dyn ParseContext, text: &str) -> Command {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    if trimmed.starts_with('/') || trimmed.starts_with('>') {
        return parse_chat_macro(ctx, trimmed);
    }

    let words = split_into_words(trimmed);
    if words.is_empty() {
        return Command::Empty;
    }
    if words.len() == 1 {
        match classify(&words[0]).keyword {
            Keyword::Nothing => return Command::DoNothing,
            Keyword::Skip => return Command::Empty,
            _ => {}
        }
    }

    if let Some(combo) = names_to_combo(&words) {
        return Command::TapKey { combo };
    }

    if let Some(bind) = ctx.keybind_id(trimmed) {
        return Command::TriggerKeyBind { bind };
    }

    if let Some(seq) = encode_sequence(&words, ctx) {
        let string = ctx.intern_bytes(&seq);
        return Command::VkSequence { string };
    }

    ctx.report_error(format!("unrecognized key bind value '{trimmed}'"));
    Command::Empty
}

// ── Test support ────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use std::collections::HashMap;

    /// A [`ParseContext`] over plain hash maps for tests.
    #[derive(Default)]
    pub(crate) struct StubContext {
        pub hotspots: HashMap<String, u16>,
        pub keybinds: HashMap<String, u16>,
        pub cycles: HashMap<String, u16>,
        pub layers: HashMap<String, u16>,
        pub menus: HashMap<String, u16>,
        pub variables: HashMap<String, u16>,
        pub strings: Vec<Vec<u8>>,
        pub errors: Vec<String>,
    }

    fn lookup(map: &HashMap<String, u16>, name: &str) -> Option<u16> {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, &v)| v)
    }

    impl ParseContext for StubContext {
        fn hotspot_id(&self, name: &str) -> Option<HotspotId> {
            lookup(&self.hotspots, name).map(HotspotId)
        }
        fn keybind_id(&self, name: &str) -> Option<KeyBindId> {
            lookup(&self.keybinds, name).map(KeyBindId)
        }
        fn special_movement_command(&self, _name: &str) -> Option<Command> {
            None
        }
        fn cycle_id(&self, name: &str) -> Option<CycleId> {
            lookup(&self.cycles, name).map(CycleId)
        }
        fn layer_id(&self, name: &str) -> Option<LayerId> {
            lookup(&self.layers, name).map(LayerId)
        }
        fn menu_id(&self, name: &str) -> Option<MenuId> {
            lookup(&self.menus, name).map(MenuId)
        }
        fn variable_id(&self, name: &str) -> Option<VariableId> {
            lookup(&self.variables, name).map(VariableId)
        }
        fn intern_bytes(&mut self, bytes: &[u8]) -> StringId {
            if let Some(i) = self.strings.iter().position(|s| s == bytes) {
                return StringId(i as u16);
            }
            self.strings.push(bytes.to_vec());
            StringId((self.strings.len() - 1) as u16)
        }
        fn report_error(&mut self, message: String) {
            self.errors.push(message);
        }
    }
}
