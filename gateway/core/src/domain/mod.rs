// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod principal;
pub mod session;
pub mod token;
pub mod authorization;
pub mod tool;
pub mod audit;
pub mod vault;
pub mod mcp;
pub mod error;
