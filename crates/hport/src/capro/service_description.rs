// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic identity of a port.
//!
//! A description is a `(service, event, instance)` triple. Any position set to
//! [`WILDCARD`] matches every value in that position; `0` is reserved as the
//! invalid id. Equality is exact, matching is wildcard-aware per position.

use std::fmt;

/// Id matching any value in its position.
pub const WILDCARD: u16 = u16::MAX;

/// Reserved, never-valid id.
pub const INVALID_ID: u16 = 0;

/// `(service, event, instance)` triple identifying a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ServiceDescription {
    service_id: u16,
    event_id: u16,
    instance_id: u16,
}

impl ServiceDescription {
    #[must_use]
    pub const fn new(service_id: u16, event_id: u16, instance_id: u16) -> Self {
        Self {
            service_id,
            event_id,
            instance_id,
        }
    }

    /// Description matching every offered topic.
    #[must_use]
    pub const fn any() -> Self {
        Self::new(WILDCARD, WILDCARD, WILDCARD)
    }

    #[must_use]
    pub const fn service_id(&self) -> u16 {
        self.service_id
    }

    #[must_use]
    pub const fn event_id(&self) -> u16 {
        self.event_id
    }

    #[must_use]
    pub const fn instance_id(&self) -> u16 {
        self.instance_id
    }

    /// `false` if any position carries [`INVALID_ID`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.service_id != INVALID_ID
            && self.event_id != INVALID_ID
            && self.instance_id != INVALID_ID
    }

    /// Wildcard-aware comparison.
    ///
    /// Invalid descriptions never match anything, not even themselves.
    #[must_use]
    pub const fn matches(&self, other: &Self) -> bool {
        self.is_valid()
            && other.is_valid()
            && id_matches(self.service_id, other.service_id)
            && id_matches(self.event_id, other.event_id)
            && id_matches(self.instance_id, other.instance_id)
    }
}

const fn id_matches(a: u16, b: u16) -> bool {
    a == WILDCARD || b == WILDCARD || a == b
}

impl fmt::Display for ServiceDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            DisplayId(self.service_id),
            DisplayId(self.event_id),
            DisplayId(self.instance_id)
        )
    }
}

struct DisplayId(u16);

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == WILDCARD {
            write!(f, "*")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let a = ServiceDescription::new(1, 1, 1);
        assert!(a.matches(&ServiceDescription::new(1, 1, 1)));
        assert!(!a.matches(&ServiceDescription::new(1, 1, 2)));
    }

    #[test]
    fn test_wildcard_match_per_position() {
        let query = ServiceDescription::new(1, WILDCARD, 3);
        assert!(query.matches(&ServiceDescription::new(1, 7, 3)));
        assert!(query.matches(&ServiceDescription::new(1, 8, 3)));
        assert!(!query.matches(&ServiceDescription::new(2, 7, 3)));
        assert!(ServiceDescription::any().matches(&ServiceDescription::new(4, 5, 6)));
    }

    #[test]
    fn test_invalid_never_matches() {
        let invalid = ServiceDescription::new(0, 1, 1);
        assert!(!invalid.is_valid());
        assert!(!invalid.matches(&invalid));
        assert!(!ServiceDescription::any().matches(&invalid));
        assert!(!ServiceDescription::default().is_valid());
    }

    #[test]
    fn test_equality_is_exact() {
        assert_ne!(
            ServiceDescription::new(1, WILDCARD, 1),
            ServiceDescription::new(1, 2, 1)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ServiceDescription::new(1, WILDCARD, 3).to_string(), "1/*/3");
    }
}
