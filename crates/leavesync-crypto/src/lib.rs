pub mod cipher;
pub mod error;
pub mod key;
pub mod signature;

pub use cipher::{decrypt, encrypt};
pub use error::CryptoError;
pub use key::CallbackKey;
pub use signature::{signature as sign, verify};
