// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Service descriptions and CaPro messages.

mod message;
mod service_description;

pub use message::{CaproMessage, CaproMessageType};
pub use service_description::{ServiceDescription, INVALID_ID, WILDCARD};
