//! Inbound events and their interpretation.
//!
//! Transports deliver either free text or a button press carrying callback
//! data. Both are normalised into `UserInput` before any stage looks at them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::catalog::EffortLevel;
use crate::domain::foundation::{ChatId, UserId, ValidationError};
use crate::domain::profile::ScalingPreference;
use crate::domain::planning::ExportFormat;

/// One inbound message or button press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inbound {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub event: InboundEvent,
}

impl Inbound {
    pub fn text(chat_id: ChatId, user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            user_id,
            event: InboundEvent::Text(text.into()),
        }
    }

    pub fn button(chat_id: ChatId, user_id: UserId, action: &Action) -> Self {
        Self {
            chat_id,
            user_id,
            event: InboundEvent::Button(action.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InboundEvent {
    Text(String),
    Button(String),
}

/// Slash commands, recognised in every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Restart,
    Favorites,
    Profile,
    Quick,
    Help,
}

impl FromStr for Command {
    type Err = ValidationError;

    /// Accepts `/start`, `/start@SomeBot` and friends.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s
            .trim()
            .strip_prefix('/')
            .and_then(|rest| rest.split_whitespace().next())
            .map(|w| w.split('@').next().unwrap_or(w).to_lowercase())
            .ok_or_else(|| ValidationError::invalid_format("command", "missing leading '/'"))?;
        match word.as_str() {
            "start" => Ok(Command::Start),
            "restart" | "reset" => Ok(Command::Restart),
            "favorites" | "favourites" => Ok(Command::Favorites),
            "profile" => Ok(Command::Profile),
            "quick" => Ok(Command::Quick),
            "help" => Ok(Command::Help),
            other => Err(ValidationError::invalid_format(
                "command",
                format!("unknown command '/{}'", other),
            )),
        }
    }
}

/// Button callback payloads.
///
/// `Display` produces the callback data and `FromStr` parses it back, so the
/// keyboard a reply carries is exactly what the next turn receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    MenuCount(u8),
    Effort(Option<EffortLevel>),
    PickDish(String),
    TakeAll,
    Reshuffle,
    FromFavorites,
    ToggleSide(String),
    Done,
    Confirm,
    Swap,
    SwapPick(usize),
    SwapAccept,
    SwapNext,
    Twice(usize),
    Persons(u32),
    PersonsManual,
    PersonsProfile,
    OpenProfile,
    ProfileUse,
    ProfileNew,
    Scaling(ScalingPreference),
    Prev,
    Next,
    Export,
    Format(ExportFormat),
    ToggleSaveFavorites,
    FavAdd,
    FavDelete,
    FavPickAdd(String),
    FavPickDelete(String),
    Back,
    RestartYes,
    RestartNo,
    QuickRandom,
    QuickAccept,
    QuickNext,
    Cancel,
    Retry,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::MenuCount(n) => write!(f, "count:{}", n),
            Action::Effort(Some(e)) => write!(f, "effort:{}", e),
            Action::Effort(None) => f.write_str("effort:any"),
            Action::PickDish(name) => write!(f, "dish:{}", name),
            Action::TakeAll => f.write_str("take_all"),
            Action::Reshuffle => f.write_str("reshuffle"),
            Action::FromFavorites => f.write_str("from_favorites"),
            Action::ToggleSide(name) => write!(f, "side:{}", name),
            Action::Done => f.write_str("done"),
            Action::Confirm => f.write_str("confirm"),
            Action::Swap => f.write_str("swap"),
            Action::SwapPick(i) => write!(f, "swap_pick:{}", i),
            Action::SwapAccept => f.write_str("swap_accept"),
            Action::SwapNext => f.write_str("swap_next"),
            Action::Twice(i) => write!(f, "twice:{}", i),
            Action::Persons(n) => write!(f, "persons:{}", n),
            Action::PersonsManual => f.write_str("persons_manual"),
            Action::PersonsProfile => f.write_str("persons_profile"),
            Action::OpenProfile => f.write_str("profile"),
            Action::ProfileUse => f.write_str("profile_use"),
            Action::ProfileNew => f.write_str("profile_new"),
            Action::Scaling(p) => write!(f, "scaling:{}", p.as_str()),
            Action::Prev => f.write_str("prev"),
            Action::Next => f.write_str("next"),
            Action::Export => f.write_str("export"),
            Action::Format(fmt_) => write!(f, "format:{}", fmt_),
            Action::ToggleSaveFavorites => f.write_str("toggle_save_favorites"),
            Action::FavAdd => f.write_str("fav_add"),
            Action::FavDelete => f.write_str("fav_delete"),
            Action::FavPickAdd(name) => write!(f, "fav_pick_add:{}", name),
            Action::FavPickDelete(name) => write!(f, "fav_pick_delete:{}", name),
            Action::Back => f.write_str("back"),
            Action::RestartYes => f.write_str("restart_yes"),
            Action::RestartNo => f.write_str("restart_no"),
            Action::QuickRandom => f.write_str("quick_random"),
            Action::QuickAccept => f.write_str("quick_accept"),
            Action::QuickNext => f.write_str("quick_next"),
            Action::Cancel => f.write_str("cancel"),
            Action::Retry => f.write_str("retry"),
        }
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::invalid_format("action", format!("unrecognised '{}'", s));
        let (head, arg) = match s.split_once(':') {
            Some((head, arg)) => (head, Some(arg)),
            None => (s, None),
        };
        let number = |arg: Option<&str>| arg.and_then(|a| a.trim().parse::<u64>().ok());
        let text = |arg: Option<&str>| {
            arg.map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
        };

        let action = match (head, arg) {
            ("count", arg) => Action::MenuCount(number(arg).and_then(|n| u8::try_from(n).ok()).ok_or_else(invalid)?),
            ("effort", Some("any")) => Action::Effort(None),
            ("effort", Some(level)) => Action::Effort(Some(level.parse()?)),
            ("dish", arg) => Action::PickDish(text(arg).ok_or_else(invalid)?),
            ("side", arg) => Action::ToggleSide(text(arg).ok_or_else(invalid)?),
            ("swap_pick", arg) => Action::SwapPick(number(arg).ok_or_else(invalid)? as usize),
            ("twice", arg) => Action::Twice(number(arg).ok_or_else(invalid)? as usize),
            ("persons", arg) => Action::Persons(number(arg).and_then(|n| u32::try_from(n).ok()).ok_or_else(invalid)?),
            ("scaling", Some(pref)) => Action::Scaling(pref.parse()?),
            ("format", Some(fmt_)) => Action::Format(fmt_.parse().map_err(|_| invalid())?),
            ("fav_pick_add", arg) => Action::FavPickAdd(text(arg).ok_or_else(invalid)?),
            ("fav_pick_delete", arg) => Action::FavPickDelete(text(arg).ok_or_else(invalid)?),
            ("take_all", None) => Action::TakeAll,
            ("reshuffle", None) => Action::Reshuffle,
            ("from_favorites", None) => Action::FromFavorites,
            ("done", None) => Action::Done,
            ("confirm", None) => Action::Confirm,
            ("swap", None) => Action::Swap,
            ("swap_accept", None) => Action::SwapAccept,
            ("swap_next", None) => Action::SwapNext,
            ("persons_manual", None) => Action::PersonsManual,
            ("persons_profile", None) => Action::PersonsProfile,
            ("profile", None) => Action::OpenProfile,
            ("profile_use", None) => Action::ProfileUse,
            ("profile_new", None) => Action::ProfileNew,
            ("prev", None) => Action::Prev,
            ("next", None) => Action::Next,
            ("export", None) => Action::Export,
            ("toggle_save_favorites", None) => Action::ToggleSaveFavorites,
            ("fav_add", None) => Action::FavAdd,
            ("fav_delete", None) => Action::FavDelete,
            ("back", None) => Action::Back,
            ("restart_yes", None) => Action::RestartYes,
            ("restart_no", None) => Action::RestartNo,
            ("quick_random", None) => Action::QuickRandom,
            ("quick_accept", None) => Action::QuickAccept,
            ("quick_next", None) => Action::QuickNext,
            ("cancel", None) => Action::Cancel,
            ("retry", None) => Action::Retry,
            _ => return Err(invalid()),
        };
        Ok(action)
    }
}

/// What a stage handler gets to look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Command(Command),
    Action(Action),
    Text(String),
    /// A button whose callback data no longer parses (e.g. an old keyboard).
    Unrecognised(String),
}

impl UserInput {
    pub fn from_event(event: &InboundEvent) -> Self {
        match event {
            InboundEvent::Button(data) => data
                .parse::<Action>()
                .map(UserInput::Action)
                .unwrap_or_else(|_| UserInput::Unrecognised(data.clone())),
            InboundEvent::Text(text) => {
                let trimmed = text.trim();
                if trimmed.starts_with('/') {
                    trimmed
                        .parse::<Command>()
                        .map(UserInput::Command)
                        .unwrap_or_else(|_| UserInput::Unrecognised(trimmed.to_string()))
                } else {
                    UserInput::Text(trimmed.to_string())
                }
            }
        }
    }

    /// Free text parsed as a positive whole number.
    pub fn as_number(&self) -> Option<u32> {
        match self {
            UserInput::Text(text) => text.trim().parse::<u32>().ok(),
            _ => None,
        }
    }

    /// Short description for logs (never the full text).
    pub fn log_label(&self) -> String {
        match self {
            UserInput::Command(c) => format!("command:{:?}", c),
            UserInput::Action(a) => format!("action:{}", a),
            UserInput::Text(t) => format!("text({} chars)", t.chars().count()),
            UserInput::Unrecognised(_) => "unrecognised".to_string(),
        }
    }
}
