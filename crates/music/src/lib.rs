//! HTTP clients for the music metadata providers.
//!
//! - [`spotify`]: Spotify Web API (OAuth, search, tracks, audio features,
//!   playlists) and the [`catalog::SpotifyCatalog`] adapter used by the
//!   auto-linker.
//! - [`getsongbpm`]: tempo-only fallback when Spotify has no audio features.

pub mod catalog;
pub mod getsongbpm;
pub mod spotify;
