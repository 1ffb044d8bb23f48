//! Core library for codefix
//!
//! This crate implements the **Functional Core** of the codefix application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The codefix project uses a two-crate architecture to enforce separation of concerns:
//!
//! - **`codefix_core`** (this crate): Pure transformation functions with zero I/O
//! - **`codefix`**: I/O operations and orchestration (the Imperative Shell)
//!
//! ## Functional Core Principles
//!
//! All functions in this crate adhere to these principles:
//!
//! - **Pure functions**: Same input always produces the same output
//! - **No side effects**: No I/O operations, no external state mutations
//! - **Deterministic**: Behavior is predictable and reproducible
//! - **Testable**: Can be tested with simple fixture data, no mocking required
//!
//! # Module Organization
//!
//! - [`codegen`]: Transformations applied around model-based code generation —
//!   prompt assembly before the model call, and decoded-output post-processing
//!   (balanced-brace trimming, echoed-prompt stripping) after it.
//!
//! The module contains:
//!
//! - **Domain models**: Structured types representing generation requests
//! - **Transformation functions**: Pure functions over prompt and decoded text
//! - **Comprehensive tests**: Unit tests using fixture data (no mocking)
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use codefix_core::codegen::extract_first_block;
//!
//! let decoded = "int add(int a, int b) {\n    return a + b;\n}\nint unused() {}";
//! let block = extract_first_block(decoded);
//! assert!(block.ends_with('}'));
//! ```
//!
//! The key insight of this pattern: **text transformation logic should be pure
//! and ignorant of which model produced the text or which transport returns it**.

pub mod codegen;
