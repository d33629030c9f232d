#![doc = include_str!("../README.md")]

pub mod logger;
pub mod messaging;
pub mod platform;

#[cfg(test)]
pub mod test_support;
