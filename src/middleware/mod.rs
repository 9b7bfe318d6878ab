// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, security headers).

pub mod dispatcher_auth;
pub mod security;

pub use dispatcher_auth::require_dispatcher_token;
pub use security::add_security_headers;
