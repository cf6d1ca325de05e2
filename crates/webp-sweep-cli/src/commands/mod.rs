pub mod compare;
pub mod convert;
pub mod sweep;
