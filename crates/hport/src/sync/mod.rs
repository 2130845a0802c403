// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Condition and event variable records shared between processes.

mod condition_variable;
mod event_variable;

pub use condition_variable::{ConditionListener, ConditionNotifier, ConditionVariableData, Signal};
pub use event_variable::{EventListener, EventNotifier, EventVariableData};
