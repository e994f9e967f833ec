//! Some utility modules live here. See individual sub-modules for more info.

#[macro_use]
pub(crate) mod macro_logger;

pub mod config;
pub mod logger;

#[cfg(test)]
pub(crate) mod test_utils;
