pub mod chat;
pub mod classify;
pub mod doctor;
pub mod gateway;
pub mod onboard;
