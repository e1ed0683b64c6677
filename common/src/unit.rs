//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing a billing cycle generation.
#[derive(Clone, Copy, Debug)]
pub struct Generation;

/// Marker type describing a payment due deadline.
#[derive(Clone, Copy, Debug)]
pub struct Due;

/// Marker type describing a payment issuance.
#[derive(Clone, Copy, Debug)]
pub struct Issuance;
