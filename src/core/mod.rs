// Domain-layer modules and shared errors/models
pub mod capability {
    pub use crate::capability::*;
}

pub mod errors {
    pub use crate::errors::*;
}

pub mod handoff {
    pub use crate::handoff::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod normalizer {
    pub use crate::normalizer::*;
}

pub mod orchestrator {
    pub use crate::orchestrator::*;
}

pub mod validation {
    pub use crate::validation::*;
}
