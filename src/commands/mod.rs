// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Command implementations

mod convert;
mod inspect;
mod migrate;

pub use convert::*;
pub use inspect::*;
pub use migrate::*;
