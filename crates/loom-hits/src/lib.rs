// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Unique hit tracking over time-bucketed sets.
//!
//! Hits are recorded as set members in one bucket per active window unit
//! (hour, day, month). Unique counts over a window union the buckets it
//! covers inside the store, so a session seen several times in the window
//! counts once.
//!
//! # Usage
//!
//! ```ignore
//! use loom_hits::{Hits, Scope, Window, WindowUnit};
//!
//! let config = loom_hits_config::load_config()?;
//! let hits = Hits::connect(config).await?;
//! let articles = hits.tracker("article")?;
//!
//! articles.hit(&article_id.into(), "view", &[user_id.into()]).await?;
//! let week = Window::new(WindowUnit::Days, 7)?;
//! let viewers = articles.unique_count(&Scope::Namespace, "view", &week).await?;
//! ```

pub mod client;
pub mod error;
pub mod global;
pub mod logging;
pub mod recorder;
pub mod store;
pub mod trackable;
pub mod tracker;

pub use client::Hits;
pub use error::{HitsError, Result};
pub use recorder::{HitOutcome, HitRecorder};
pub use store::{HitStore, MemoryStore, RedisStore};
pub use trackable::{Trackable, Tracked};
pub use tracker::{Series, Tracker};

pub use loom_hits_config::{load_config, HitsConfig};
pub use loom_hits_core::{Namespace, Scope, Subject, Window, WindowUnit};
