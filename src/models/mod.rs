// Module exports for models

pub mod event;
pub mod offset;
pub mod settings;
