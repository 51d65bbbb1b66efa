pub mod command;
pub mod decode;
pub mod generate;
pub mod info;
pub mod stream;
