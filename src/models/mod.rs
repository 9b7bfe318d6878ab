// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod command;
pub mod usage;
pub mod user;

pub use command::{AdminAction, Command, CommandReply};
pub use usage::{UsageEvent, UsageStats};
pub use user::{UserId, UserRecord};
