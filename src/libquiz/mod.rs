pub mod fixture;
pub mod flow;
pub mod question;
pub mod session;
pub mod source;
