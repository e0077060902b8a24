//! # yojitsu-render
//!
//! Output writers for yojitsu comparison workbooks.
//!
//! This crate provides:
//! - Excel (XLSX) output with tier fills, weekday colours and conditional formats
//! - An implementation of the core `Renderer` trait
//!
//! ## Example
//!
//! ```rust,ignore
//! use yojitsu_core::Renderer;
//! use yojitsu_render::XlsxRenderer;
//!
//! let bytes = XlsxRenderer::new().render(&generation.workbook)?;
//! std::fs::write("予実管理表_2025年度.xlsx", bytes)?;
//! ```

pub mod excel;

pub use excel::XlsxRenderer;
