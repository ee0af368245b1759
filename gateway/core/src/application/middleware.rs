// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The user-extensible middleware chain.
//!
//! Middlewares run after authentication and authorization, in
//! registration order. Each sees the current request and the security
//! context, and either passes a (possibly transformed) request on or
//! blocks the call. Blocking is a distinct verdict, not an absent
//! request.

use async_trait::async_trait;

use crate::domain::mcp::Request;
use crate::domain::tool::SecurityContext;

/// What a middleware decided to do with the request.
#[derive(Debug)]
pub enum MiddlewareVerdict {
    /// Pass this (possibly transformed) request to the next stage.
    Continue(Request),

    /// Stop the pipeline; the call fails with `blocked_by_middleware`.
    Block,
}

/// One stage in the request pipeline.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, request: Request, ctx: &SecurityContext) -> MiddlewareVerdict;
}

/// Adapter for plain closures.
pub struct MiddlewareFn<F>(pub F);

#[async_trait]
impl<F> Middleware for MiddlewareFn<F>
where
    F: Fn(Request, &SecurityContext) -> MiddlewareVerdict + Send + Sync,
{
    async fn handle(&self, request: Request, ctx: &SecurityContext) -> MiddlewareVerdict {
        (self.0)(request, ctx)
    }
}
