//! Prometheus Provisioner Library
//!
//! This crate provides the core functionality for the Prometheus
//! provisioner, which installs, configures and supervises Prometheus and
//! Alertmanager by converging an ordered collection of host resources.

pub mod config;
pub mod converge;
pub mod error;
pub mod executor;
pub mod journal;
pub mod platform;
pub mod recipes;
pub mod resources;
pub mod services;
pub mod templates;
pub mod validation;
