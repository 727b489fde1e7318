//! Opaque implementation-address handle
//!
//! The only module that converts between raw pointers and the numeric
//! handle used everywhere else. Other modules compare handles for equality
//! and never reinterpret them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of a method implementation in the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImplAddr(usize);

impl ImplAddr {
    pub fn from_raw(addr: usize) -> Self {
        Self(addr)
    }

    pub fn from_ptr(ptr: *const u8) -> Self {
        Self(ptr as usize)
    }

    pub fn as_raw(&self) -> usize {
        self.0
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.0 as *const u8
    }

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ImplAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}
