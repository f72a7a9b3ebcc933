//! State Management Module
//!
//! Saving and restoring bus graph configuration documents.

pub mod persistence;

pub use persistence::{
    apply_document, load_configuration, save_configuration, to_document, BusSection,
    ConfigDocument, EffectSection, LoadReport, ParameterSection,
};
