//! HTTP handlers

pub mod console;
pub mod pages;
pub mod redirect;
