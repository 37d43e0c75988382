pub mod admin;
pub mod card;
pub mod lifecycle;
pub mod passenger;
pub mod session;
pub mod two_factor;
pub mod virtual_card;
