// Middleware applied around the API router

pub mod cors;

pub use cors::*;
