//! Helpers for preparing throwaway databases in tests.
pub mod prepare_env;
