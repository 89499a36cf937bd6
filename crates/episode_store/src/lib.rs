//! # Episode Store
//!
//! This crate owns the on-disk layout of a daily podcast episode: the
//! script the audio stage reads, the final audio it writes and the video
//! produced from it. Every artifact is keyed by the calendar date of the
//! episode.
//!
//! The [`EpisodeStore`] trait abstracts the layout so the pipeline can be
//! exercised against a scratch directory in tests.

mod domain;
mod store;

pub use domain::{ArtifactKind, EpisodeDate};
pub use store::local::LocalEpisodeStore;
pub use store::{ArtifactStatus, EpisodeStore};
