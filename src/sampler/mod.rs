pub mod bank;
pub mod loader;
pub mod source;

pub use bank::{BankManifest, BankSample, InstrumentBank};
pub use loader::{SampleError, load_sample};
pub use source::InstrumentSource;

#[cfg(test)]
mod tests;
