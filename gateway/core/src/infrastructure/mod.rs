// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod token_vault;
pub mod audit_logger;
pub mod rate_limiter;
pub mod authenticator;
pub mod session_manager;
pub mod request_verifier;
