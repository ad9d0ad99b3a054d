pub mod callback;
pub mod home;
pub mod login;
