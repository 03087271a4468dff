//! Extension interface
//!
//! Native functionality reaches the engine through extensions: each
//! extension contributes function definitions (name, declared parameter
//! reference-ness, handler) to the registry during engine construction,
//! before any execution begins. An environment materializes the registered
//! definitions into its own symbol-keyed lookup tables at creation.

use crate::core::value::Val;
use crate::interp::call::NativeHandler;

/// A native parameter declaration. `by_ref` decides, at dispatch time,
/// whether the corresponding argument binding resolves to a cell or a value.
#[derive(Debug, Clone)]
pub struct NativeParam {
    pub name: &'static [u8],
    pub by_ref: bool,
    pub default: Option<Val>,
}

impl NativeParam {
    pub fn by_value(name: &'static [u8]) -> Self {
        Self {
            name,
            by_ref: false,
            default: None,
        }
    }

    pub fn by_ref(name: &'static [u8]) -> Self {
        Self {
            name,
            by_ref: true,
            default: None,
        }
    }

    pub fn with_default(name: &'static [u8], default: Val) -> Self {
        Self {
            name,
            by_ref: false,
            default: Some(default),
        }
    }
}

/// One registered native function.
pub struct NativeFunctionDef {
    pub name: &'static [u8],
    pub params: Vec<NativeParam>,
    pub handler: NativeHandler,
}

/// A provider of native functions, registered once at engine construction.
pub trait Extension {
    fn name(&self) -> &'static str;

    fn functions(&self) -> Vec<NativeFunctionDef>;
}
