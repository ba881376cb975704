//! Property-based tests for the `ConnManager` core library

mod crypto_tests;
mod exchange_tests;
mod launcher_tests;
mod search_tests;
mod store_tests;
