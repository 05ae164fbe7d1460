/*! Integration tests for Strongroom.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - vault: End-to-end crypto over real key files and the file store
 * - secrets: Ownership, sharing, and expiry scenarios on durable storage
 * - account: Registration, login, lockout, and password lifecycle flows
 * - registry: Session-driven secret loading into the shared registry
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("strongroom=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod account;
mod helpers;
mod registry;
mod secrets;
mod vault;
