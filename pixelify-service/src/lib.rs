//! pixelify-service: turn a submitted image into a character description
//! (and optionally a generated image) and keep a short history of results.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
