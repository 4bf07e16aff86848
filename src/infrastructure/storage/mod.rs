mod core;
mod storage_port_impl;

pub use self::core::*;
pub use storage_port_impl::FsStoragePort;
