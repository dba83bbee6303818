//! blackbook CLI - Command-line interface library
//!
//! This library provides the CLI functionality for blackbook:
//! - Generate: Build a report from a catalog template and a request file
//! - Templates: List the templates in a catalog
//!
//! # Library Usage
//!
//! ```ignore
//! use blackbook_cli::{generate_command, run_cli};
//!
//! // Run the full CLI
//! run_cli()?;
//!
//! // Or build programmatically
//! let output = generate_command(&catalog, "classic.docx", &request, None, None)?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Build a report
//! blackbook generate --catalog templates.json --template classic.docx --request req.json
//!
//! # List templates
//! blackbook templates --catalog templates.json --format json
//! ```

pub mod app;
pub mod request;

pub use app::{generate_command, run_cli, templates_command, OutputFormat};
pub use request::{ReportRequest, UploadedFile};
