mod secret;

pub use secret::{deserialize_optional_secret, SecretString};
