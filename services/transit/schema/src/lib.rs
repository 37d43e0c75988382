pub mod admin_users;
pub mod cards;
pub mod passengers;
pub mod verification_tokens;
