use super::shape::Shape;

slotmap::new_key_type! {
    /// Unique identifier for a compound in the topology store.
    pub struct CompoundId;
}

/// An unstructured group of shapes of any kind.
#[derive(Debug, Clone, Default)]
pub struct CompoundData {
    /// The member shapes.
    pub shapes: Vec<Shape>,
}
