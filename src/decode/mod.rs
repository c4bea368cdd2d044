pub mod codec;
pub mod convert;
pub mod factory;
pub mod packet;
pub mod testsrc;
pub mod video;
