//! Token-store and repository tests against a real PostgreSQL.
//!
//! Set `TEST_DATABASE_URL` to a scratch database to run them; without it every test
//! returns early. Fixtures are unique per test, so the suite can share one database
//! and run in parallel.

mod concurrency_test;
mod helpers;
mod repository_test;
