pub mod assets;
pub mod campaign;
pub mod catalog;
pub mod events;
pub mod layout;
pub mod manifest;
pub mod preview;
pub mod prompts;
pub mod suggestions;
