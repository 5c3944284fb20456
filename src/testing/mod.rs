//! # 测试框架模块
//!
//! 提供单元测试使用的策略桩和存储 Mock

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
