//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing a physical collection of an entity.
#[derive(Clone, Copy, Debug)]
pub struct Collection;

/// Marker type describing a settlement of an entity.
#[derive(Clone, Copy, Debug)]
pub struct Settlement;
