//! Concrete implementations of the engine traits.

mod rust;
pub use self::rust::RustCrypto;
