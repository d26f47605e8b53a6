pub mod draft_form;
pub mod form;
pub mod keybindings_help;
pub mod preview;
pub mod result;
