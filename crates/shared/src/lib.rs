pub mod domain;
pub mod entities;
pub mod error;
pub mod protocol;
