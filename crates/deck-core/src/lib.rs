//! deck-core — the playback core of lofideck.
//!
//! Holds everything that is not terminal UI: the station catalog, the
//! playback intent store, the video-widget port boundary, the reconciler
//! that converges the two, plus configuration and local persistence.

pub mod catalog;
pub mod config;
pub mod intent;
pub mod platform;
pub mod reconciler;
pub mod storage;
pub mod widget;
