//! API response types shared by all routes

pub mod response;
