// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQL access, one module per table family. Callers hold the store's
//! write guard where ordering matters; these functions only move data.

pub mod clusters;
pub mod meta;
pub mod vectors;
