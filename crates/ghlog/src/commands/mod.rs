//! Command implementations

pub mod doctor;

pub mod generate;

pub mod info;
