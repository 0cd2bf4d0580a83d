//! Integration tests for vaultsync-b2
//!
//! Uses wiremock to simulate the B2 native API and verifies end-to-end
//! behavior of authorization, listings, uploads, downloads and
//! version deletes through the `IRemoteStore` implementation.

mod common;

mod test_authorize;
mod test_listing;
mod test_transfer;
mod test_versions;
