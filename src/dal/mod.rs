pub mod establishment_db;
