pub mod hash;
pub mod json;
pub mod jwt;
