//! Marker types describing what an instant or a value relates to.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing an entity deletion.
#[derive(Clone, Copy, Debug)]
pub struct Deletion;

/// Marker type describing a settlement of some debt.
#[derive(Clone, Copy, Debug)]
pub struct Settlement;

/// Marker type describing an expiration of something.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;
