/*! Integration tests for Accord.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - identity: `user@host` parsing and quoting
 * - options: option map validation
 * - privileges: role grant tables
 * - setup: end-to-end provisioning against the in-memory cluster
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("accord=info".parse().unwrap()))
        .with_test_writer()
        .try_init();
}

mod helpers;
mod privileges;
mod setup;
