/*! Integration tests for Trellis.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - backend: Tests for each AtomicExecutor implementation (in-memory, SQL, remote)
 * - codec: Tests for raw operation names and argument lists sent to an executor
 * - tree: Tests for the TreeEngine operations, run against the executor picked
 *   by the TEST_BACKEND env var
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("trellis=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod codec;
mod helpers;
