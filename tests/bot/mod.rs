//! Bot integration tests, driven through the local platform.

mod dispatch_tests;
mod enablement_tests;
mod lifecycle_tests;
mod permission_tests;
