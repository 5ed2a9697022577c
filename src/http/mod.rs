pub mod error;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
