//! Text Normalizer (C1) and Slot Registry & Extractor (C2) for the
//! receptionist turn pipeline.

pub mod entities;
pub mod normalizer;
pub mod slots;

mod error;

pub use entities::{extract_entities, EntityHints, Urgency};
pub use error::{Result, TextError};
pub use normalizer::{normalize, NormalizedText};
pub use slots::{apply_extracted_slots, extract_slots, ExtractedSlot};
