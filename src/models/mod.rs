pub mod deploy;
pub mod events;
