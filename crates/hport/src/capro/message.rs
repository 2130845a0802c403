// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Offer / stop-offer messages forwarded to interface ports.

use super::ServiceDescription;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaproMessageType {
    Offer,
    StopOffer,
}

impl fmt::Display for CaproMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offer => write!(f, "OFFER"),
            Self::StopOffer => write!(f, "STOP_OFFER"),
        }
    }
}

/// A single CaPro notification about a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaproMessage {
    pub message_type: CaproMessageType,
    pub service: ServiceDescription,
}

impl CaproMessage {
    #[must_use]
    pub const fn offer(service: ServiceDescription) -> Self {
        Self {
            message_type: CaproMessageType::Offer,
            service,
        }
    }

    #[must_use]
    pub const fn stop_offer(service: ServiceDescription) -> Self {
        Self {
            message_type: CaproMessageType::StopOffer,
            service,
        }
    }
}

impl fmt::Display for CaproMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.message_type, self.service)
    }
}
