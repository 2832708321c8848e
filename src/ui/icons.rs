use crate::entity::EntityKind;
use crate::pattern::PatternKind;

pub struct Icons;

impl Icons {
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const LINK: &str = "🔗";
    pub const BRAIN: &str = "🧠";
    pub const EYE: &str = "👀";
    pub const NEW: &str = "✨";
    pub const DATABASE: &str = "🗄️";
    pub const PERSON: &str = "👤";
    pub const NOTE: &str = "📝";
    pub const FOLDER: &str = "📁";
    pub const BOOK: &str = "📖";
    pub const TICKET: &str = "🎫";
    pub const MAIL: &str = "✉️";
    pub const PHONE: &str = "📱";
    pub const CALENDAR: &str = "📅";
    pub const BULB: &str = "💡";
    pub const BOLT: &str = "⚡";
    pub const GLOBE: &str = "🌍";
    pub const THINKING: &str = "🤔";

    pub fn for_entity(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::Contact => Self::PERSON,
            EntityKind::Snippet => Self::NOTE,
            EntityKind::Project => Self::FOLDER,
            EntityKind::Abbreviation => Self::BOOK,
        }
    }

    pub fn for_pattern(kind: PatternKind) -> &'static str {
        match kind {
            PatternKind::TicketId => Self::TICKET,
            PatternKind::Email => Self::MAIL,
            PatternKind::Url => Self::LINK,
            PatternKind::Phone => Self::PHONE,
            PatternKind::Date => Self::CALENDAR,
            PatternKind::Acronym => Self::BOOK,
        }
    }
}
