pub mod db;
pub mod mail;
pub mod password;
pub mod qr;
pub mod system;
