pub mod auth;
pub mod cards;
pub mod extract;
pub mod health;
pub mod passengers;
pub mod users;
pub mod virtual_cards;
