//! # IFC Space Viewer
//!
//! A terminal client for inspecting the spaces (rooms) of an IFC building
//! model through an analysis backend.
//!
//! ## Features
//!
//! - Upload IFC models and browse their spaces
//! - Filter by level, numeric ranges and custom properties
//! - Group spaces by a property with per-group totals
//! - Pick spaces in a 2D/3D wireframe viewer
//! - Color spaces by property value or ventilation compliance
//! - Export to CSV, JSON and Excel; import property updates back
//!
//! ## Example
//!
//! ```no_run
//! use ifc_space_viewer::exchange::{export_file, Format};
//! use ifc_space_viewer::store::SpaceRepository;
//! use std::path::Path;
//!
//! let repository = SpaceRepository::new();
//! let spaces = repository.filtered_spaces();
//! export_file(Format::Csv, &spaces, Path::new("spaces.csv")).expect("Failed to export");
//! ```

pub mod api;
pub mod color;
pub mod config;
pub mod error;
pub mod exchange;
pub mod logging;
pub mod model;
pub mod scene;
pub mod store;
pub mod ui;
