pub mod auth;
pub mod firestore;
