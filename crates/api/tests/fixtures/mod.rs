// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Test fixtures for server integration tests
//!
//! This module provides abalone rows, trained artifacts and a running server
//! bound to an OS-assigned port.

pub mod abalone;

pub use abalone::*;
