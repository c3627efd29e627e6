// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod logging;
mod namespaces;
mod store;
mod windows;

pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use namespaces::{NamespacesConfig, NamespacesConfigLayer};
pub use store::{StoreConfig, StoreConfigLayer, DEFAULT_STORE_URL};
pub use windows::{WindowsConfig, WindowsConfigLayer, DEFAULT_UNION_TTL_SECS};
