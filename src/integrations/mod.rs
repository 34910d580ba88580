//! External service integrations.

pub mod clients {
    pub use crate::clients::*;
}
