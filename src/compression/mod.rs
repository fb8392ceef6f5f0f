pub mod vbyte;
pub mod codec;
