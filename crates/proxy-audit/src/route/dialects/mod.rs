pub mod generic;
pub mod v1;
pub mod v2;

pub use generic::GenericDialect;
pub use v1::V1Dialect;
pub use v2::V2Dialect;
