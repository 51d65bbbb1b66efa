pub mod character;
pub mod frame;
