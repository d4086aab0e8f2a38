pub mod attack;
pub mod config;
pub mod consts;
pub mod error;
pub mod machine;
pub mod scorer;
