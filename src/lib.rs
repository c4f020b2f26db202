//! Multi-file OpenAPI document model.
//!
//! A document can live in one file or be spread over a directory: path items
//! under `paths/`, reusable components under `components/<category>/`, and a
//! main file (`openapi.yaml` and friends) at the top. [`Assembler`] reads such
//! a tree into a [`Document`], the [`mutations`] keep its route table and file
//! layout consistent while it is edited, and [`Serializer`] writes it back.
//! Files whose content did not change are written back byte for byte.

pub mod assembler;
pub mod codec;
pub mod components;
pub mod config;
pub mod diagnostics;
pub mod disk;
pub mod document;
pub mod error;
pub mod hasher;
pub mod ledger;
pub mod mutations;
pub mod naming;
pub mod path_group;
pub mod reference;
pub mod serializer;
pub mod spec;
pub mod tree;
pub mod types;

pub use crate::assembler::{Assembler, MAIN_FILE_NAMES};
pub use crate::codec::{Codec, Codecs, Format};
pub use crate::components::{Category, Component, ComponentFiles, Components};
pub use crate::config::Config;
pub use crate::document::Document;
pub use crate::error::Error;
pub use crate::ledger::HashLedger;
pub use crate::path_group::PathGroup;
pub use crate::reference::{RefOr, ReferenceTarget, parse_reference};
pub use crate::serializer::Serializer;
pub use crate::tree::{FileNode, FileTree};
pub use crate::types::{ContentHash, HttpMethod};
