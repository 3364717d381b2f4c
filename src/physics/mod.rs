pub mod atmosphere;
pub mod ramjet;
