// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod dispatcher;
pub mod gateway;
pub mod ledger;
pub mod registry;

pub use dispatcher::dispatch;
pub use gateway::{Completion, ModelGateway, OpenAiGateway};
pub use ledger::UsageLedger;
pub use registry::{authorize, Access, AuthorizationRegistry};
