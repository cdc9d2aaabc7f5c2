pub mod helper;

pub mod special;
