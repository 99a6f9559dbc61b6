//! Auth types shared across Unilink services.
//!
//! Provides the `IdentityHeaders` extractor for gateway-injected identity.

pub mod identity;
