//! Built-in fuzzy-number representations
//!
//! - [`qrofn`] - q-rung orthopair fuzzy numbers (scalar degrees)
//! - [`ivqrofn`] - interval-valued q-rung orthopair fuzzy numbers
//!
//! Each submodule exposes a `registration()` returning the complete
//! strategy + template pair for its mtype; [`register_builtins`] installs
//! them all atomically.

pub mod ivqrofn;
pub mod qrofn;

pub use ivqrofn::{IvqrofnStrategy, IvqrofnTemplate};
pub use qrofn::{QrofnStrategy, QrofnTemplate};

use crate::error::FuzzResult;
use crate::registry::FuzznumRegistry;

/// Register every built-in mtype in one transaction
pub fn register_builtins(registry: &FuzznumRegistry) -> FuzzResult<()> {
    registry.batch_register(vec![qrofn::registration(), ivqrofn::registration()])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_builtins() {
        let registry = FuzznumRegistry::new();
        register_builtins(&registry).unwrap();
        assert!(registry.contains_strategy("qrofn"));
        assert!(registry.contains_template("qrofn"));
        assert!(registry.contains_strategy("ivqrofn"));
        assert!(registry.contains_template("ivqrofn"));
    }
}
