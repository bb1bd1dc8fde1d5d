//! Named-action ids bound in the built-in command tables. These are the
//! `action` byte of each action-table record (`core_keymap::Action::Named`);
//! `nav::translate` maps them onto a `NavCommand`.

pub const A_F_LINE: u16 = 1;
pub const A_B_LINE: u16 = 2;
pub const A_F_SCREEN: u16 = 3;
pub const A_B_SCREEN: u16 = 4;
pub const A_F_HALF_SCREEN: u16 = 5;
pub const A_B_HALF_SCREEN: u16 = 6;
pub const A_GOTO_LINE: u16 = 7;
pub const A_GOTO_END: u16 = 8;
pub const A_GOTO_START: u16 = 9;
pub const A_REPEAT_SEARCH: u16 = 10;
pub const A_REPEAT_SEARCH_REV: u16 = 11;
pub const A_DIGIT: u16 = 12;
pub const A_SEARCH_FORW: u16 = 13;
pub const A_SEARCH_BACK: u16 = 14;
pub const A_FILTER: u16 = 15;
pub const A_OPT_TOGGLE: u16 = 16;
pub const A_SETMARK: u16 = 17;
pub const A_CLRMARK: u16 = 18;
pub const A_GOMARK: u16 = 19;
pub const A_PIPE: u16 = 20;
pub const A_EXAMINE: u16 = 21;
pub const A_SHELL: u16 = 22;
pub const A_FIRSTCMD: u16 = 23;
pub const A_QUIT: u16 = 24;
pub const A_REPAINT: u16 = 25;
pub const A_STATUS: u16 = 26;
pub const A_BRACKET: u16 = 27;
pub const A_INTERRUPT: u16 = 28;
