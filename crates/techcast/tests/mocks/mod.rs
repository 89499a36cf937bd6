pub mod notifier;
pub mod speech;
pub mod transcoder;
