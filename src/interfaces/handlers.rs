pub mod galleries;
pub mod home;
pub mod system;
